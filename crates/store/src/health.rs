//! Event store health checks and schema initialization.

use crate::client::StoreClient;
use monitor_core::{Error, Result};
use tracing::{debug, error};

/// Check store connection health.
pub async fn check_connection(client: &StoreClient) -> bool {
    match client.inner().query("SELECT 1").fetch_one::<u8>().await {
        Ok(_) => {
            debug!("Event store connection healthy");
            true
        }
        Err(e) => {
            error!("Event store health check failed: {}", e);
            false
        }
    }
}

/// Create the database and tables if they do not exist.
///
/// Runs at startup before the server accepts traffic; ingestion never
/// creates schema lazily.
pub async fn ensure_schema(client: &StoreClient) -> Result<()> {
    use crate::schema::all_ddl;

    for ddl in all_ddl() {
        client
            .inner()
            .query(ddl)
            .execute()
            .await
            .map_err(|e| Error::store_unavailable(format!("DDL failed: {}", e)))?;
    }

    debug!("Event store schema ensured");
    Ok(())
}
