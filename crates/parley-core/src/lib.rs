//! Business logic and repository trait definitions for Parley.
//!
//! This crate defines the "ports" (repository and remote-service traits)
//! that the infrastructure layer implements, and the message orchestration
//! pipeline built on them. It depends only on `parley-types` -- never on
//! `parley-infra` or any database/IO crate.

pub mod analytics;
pub mod chat;
pub mod enrich;
pub mod llm;
pub mod message;
pub mod quota;
pub mod repository;
pub mod service;
pub mod shortcut;

#[cfg(test)]
pub(crate) mod testing;
