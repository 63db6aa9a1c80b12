//! Core types, schemas, and validation for the monitoring engine.

pub mod error;
pub mod events;
pub mod limits;
pub mod tenant;
pub mod window;

pub use error::{Error, Result, CODE_FAILURE, CODE_SUCCESS};
pub use events::*;
pub use tenant::*;
pub use window::*;
