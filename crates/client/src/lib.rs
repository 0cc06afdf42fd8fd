#![deny(unsafe_code)]

//! HTTP transport for the finance assistant chat service.

pub mod error;
pub mod http;
mod wire;

pub use error::{ClientError, ClientResult};
pub use http::{DEFAULT_REQUEST_TIMEOUT, HttpChatService, HttpClientConfig};
