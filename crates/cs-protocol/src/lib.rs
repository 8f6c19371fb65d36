//! cs-protocol: Wire types for the chat reply stream.
//!
//! This crate defines the request body sent to the chat endpoint, the raw
//! payload carried by each `data:` frame, and the typed events the client
//! hands to its interpreter.

pub mod message;
pub mod request;

pub use message::{EventKind, FramePayload, StreamEvent};
pub use request::ChatRequest;
