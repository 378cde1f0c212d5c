//! Protocol module for the on-demand chat API
//!
//! This module defines the request and response documents exchanged with the
//! session and query endpoints, and the event frames of a streaming response.

pub mod types;

pub use types::{
    ContextField, CreateSessionRequest, CreateSessionResponse, FinalResponse, ModelConfigsBody,
    QueryRequest, SessionData, StreamEvent, STREAM_COMPLETED_MESSAGE, STREAM_COMPLETED_STATUS,
};
