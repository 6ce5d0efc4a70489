//! User-defined command shortcuts: resolution and management.

pub mod resolver;
pub mod service;
