//! Infrastructure layer for Parley.
//!
//! Contains implementations of the port traits defined in `parley-core`:
//! SQLite storage, HTTP clients for the inference gateway, the enrichment
//! services and the analytics platform, plus configuration loading.

pub mod config;
pub mod remote;
pub mod sqlite;
