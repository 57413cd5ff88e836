//! Error type for request construction and multipart building.
//!
//! # Design
//! Everything a test author can get wrong while describing a request lands
//! here as a recoverable value. JSON encode/decode failures are left out on
//! purpose: those helpers panic, see [`crate::json`]. A handler that fails is
//! not an error either; axum renders handler errors into the response, so they
//! show up on the [`Recorder`](crate::Recorder) as status and body.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by `Client` and the multipart builder.
#[derive(Debug, Error)]
pub enum Error {
    /// The verb is not one of GET, POST, PUT, PATCH or DELETE.
    #[error("unsupported HTTP method `{0}`")]
    UnsupportedMethod(String),

    /// The URL path does not start with `/`.
    #[error("invalid path `{0}`: must start with `/`")]
    InvalidPath(String),

    /// A route parameter was bound but the path has no placeholder for it.
    #[error("route parameter `{0}` has no placeholder in the path")]
    UnknownParam(String),

    /// The path has a placeholder that no bound value fills.
    #[error("placeholder `{0}` in the path has no bound value")]
    UnboundParam(String),

    /// A route parameter is bound to the empty string, which no path segment
    /// can carry.
    #[error("route parameter `{0}` is bound to an empty value")]
    EmptyParam(String),

    /// The same route parameter name appears twice.
    #[error("route parameter `{0}` is declared more than once")]
    DuplicateParam(String),

    #[error("invalid header name `{0}`")]
    InvalidHeaderName(String),

    #[error("invalid value for header `{0}`")]
    InvalidHeaderValue(String),

    /// The rendered path and query did not form a valid request target.
    #[error("failed to build request: {0}")]
    Request(#[from] axum::http::Error),

    /// The handler's response body could not be read back.
    #[error("failed to read response body: {0}")]
    ResponseBody(#[source] axum::Error),

    #[error("failed to open `{}`: {source}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read `{}`: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing a part or the closing boundary of a multipart body failed.
    #[error("failed to finalize multipart body: {0}")]
    WriteFinalization(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
