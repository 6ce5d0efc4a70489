//! Inference gateway abstractions for Parley.
//!
//! - `InferenceGateway`: RPITIT trait for the remote model-serving client
//! - `BoxInferenceGateway`: Object-safe wrapper for dynamic dispatch
//! - `TitleGenerator`: unbilled system call that names new chats

pub mod box_gateway;
pub mod gateway;
pub mod title;
