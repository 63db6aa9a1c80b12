//! User-agent enrichment.
//!
//! Parses the request User-Agent into browser/OS/device fields. Parsing
//! never fails the pipeline: anything woothee cannot resolve degrades to
//! the unknown marker.

use monitor_core::{Enrichment, UNKNOWN};
use woothee::parser::Parser;

/// Maps a woothee field to our enrichment convention.
fn resolved(value: &str) -> String {
    if value.is_empty() || value == "UNKNOWN" {
        UNKNOWN.to_string()
    } else {
        value.to_string()
    }
}

/// User-agent enricher backed by woothee (~7us/parse).
pub struct UaEnricher {
    parser: Parser,
}

impl UaEnricher {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    /// Parse a User-Agent header into enrichment fields.
    ///
    /// Geo fields stay at the unknown marker; the caller fills them from
    /// the IP lookup. The raw header is always preserved as-is.
    pub fn parse(&self, user_agent: &str) -> Enrichment {
        let mut enrichment = Enrichment::unknown();
        enrichment.user_agent = user_agent.to_string();

        if user_agent.is_empty() {
            return enrichment;
        }

        if let Some(result) = self.parser.parse(user_agent) {
            enrichment.browser_name = resolved(result.name);
            enrichment.browser_version = resolved(&result.version);
            enrichment.os_name = resolved(result.os);
            enrichment.os_version = resolved(&result.os_version);
            enrichment.device_vendor = resolved(result.vendor);

            // woothee categories: pc, smartphone, mobilephone, crawler,
            // appliance, misc
            enrichment.device_model = match result.category {
                "pc" => "desktop".to_string(),
                "smartphone" | "mobilephone" => "mobile".to_string(),
                "crawler" => "bot".to_string(),
                "appliance" => "other".to_string(),
                _ => UNKNOWN.to_string(),
            };
        }

        enrichment
    }
}

impl Default for UaEnricher {
    fn default() -> Self {
        Self::new()
    }
}
