//! Shared domain types for Parley.
//!
//! This crate contains the core domain types used across the Parley platform:
//! User, Subscription, Model, Shortcut, Chat, Message, the wire shapes of the
//! remote collaborators, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod analytics;
pub mod chat;
pub mod config;
pub mod enrich;
pub mod error;
pub mod llm;
pub mod model;
pub mod pipeline;
pub mod shortcut;
pub mod user;
