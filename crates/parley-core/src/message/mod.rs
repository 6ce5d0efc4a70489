//! Inbound message handling.

pub mod orchestrator;
