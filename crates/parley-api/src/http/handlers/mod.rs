//! REST API handlers, one module per resource.

pub mod chat;
pub mod message;
pub mod model;
pub mod shortcut;
pub mod subscription;
pub mod user;
