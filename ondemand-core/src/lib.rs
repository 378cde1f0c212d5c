//! On-demand chat client core
//!
//! This crate opens a chat session, submits a query against it, and turns
//! the response into one normalized JSON document carrying the caller's
//! context metadata. The response arrives either as a single document
//! (`sync`) or as a stream of `data:` event frames (`stream`); see
//! [`query::streaming`] for how the stream is aggregated.

pub mod config;
pub mod error;
pub mod http;
pub mod protocol;
pub mod query;
pub mod run;
pub mod session;

pub use config::{ClientConfig, QueryConfig};
pub use error::{ClientError, ClientResult};
pub use protocol::{ContextField, FinalResponse, SessionData};
pub use query::{LineAssembly, QueryOutcome, QuerySubmitter, ResponseMode};
pub use run::{ChatRun, RunOutcome};
pub use session::SessionManager;

/// Returns the version of the client library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
