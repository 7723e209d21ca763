//! reqres-core: login form demo server
//!
//! Three fixed behaviors behind one listener:
//! - `GET /` serves a static HTML login form
//! - `POST /login` buffers the body to end of stream and echoes it back as JSON
//! - everything else gets a plain-text 404

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod body;
pub mod error;
pub mod handlers;
pub mod request;
pub mod response;
pub mod server;
pub mod service;

// Re-exports
pub use error::{Error, Result};
pub use handlers::{LoginReceipt, Route};
pub use request::{Method, Request, RequestBuilder};
pub use response::{Response, ResponseBuilder, StatusCode};
pub use server::{ConnectionTracker, Server, ServerConfig, ServerHandle};
pub use service::dispatch;
