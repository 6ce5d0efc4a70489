//! Chat and message persistence for Parley.
//!
//! `ChatRepository` is the storage port; `ConversationStore` layers
//! membership scoping, title generation and history shaping on top.

pub mod repository;
pub mod service;
