//! Unified error type.

use std::net::AddrParseError;

use crate::response::Response;

/// The error type returned by verbrouter's own fallible operations.
///
/// Application-level rejections (401, 405, 422, etc.) are expressed as HTTP
/// [`Response`] values, not as `Error`s. This type surfaces
/// method parsing and infrastructure failures: binding to a port or accepting
/// a connection.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported method `{0}`")]
    UnknownMethod(String),

    #[error("invalid bind address `{addr}`: {source}")]
    Addr {
        addr: String,
        #[source]
        source: AddrParseError,
    },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// A failure raised by a handler or middleware.
///
/// The router never inspects it: whatever a handler returns as `Err` reaches
/// the caller of [`Dispatch::call`](crate::Dispatch::call) and can be
/// downcast back to its concrete type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// What every chain step resolves to.
pub type Outcome = Result<Response, BoxError>;
