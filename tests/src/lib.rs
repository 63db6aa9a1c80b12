//! Integration test support: mocks, fixtures and server setup.

pub mod mocks;
