//! HTTP verbs and the in-memory response recorder.
//!
//! # Design
//! `Verb` is the closed set of methods the client knows how to send. Parsing
//! a verb name never falls back to GET: an unknown name is an
//! [`Error::UnsupportedMethod`]. `Recorder` is the fully buffered response a
//! handler produced, so tests can inspect it synchronously after the call.

use std::fmt;
use std::str::FromStr;

use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::json::{self, Dict};

/// HTTP method for a synthetic request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    pub fn as_method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Patch => Method::PATCH,
            Verb::Delete => Method::DELETE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive: `"get"`, `"GET"` and `"Get"` all parse.
impl FromStr for Verb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Verb::Get, Verb::Post, Verb::Put, Verb::Patch, Verb::Delete]
            .into_iter()
            .find(|verb| verb.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnsupportedMethod(s.to_string()))
    }
}

/// A handler's response, captured in memory.
#[derive(Debug, Clone)]
pub struct Recorder {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Recorder {
    pub(crate) fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Value of a response header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserializes the body into `T`.
    ///
    /// # Panics
    /// Panics if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "response body is not valid JSON for the requested type: {e}; body: {}",
                self.text()
            )
        })
    }

    /// Decodes the body into an untyped JSON object.
    ///
    /// # Panics
    /// Panics if the body is not a JSON object.
    pub fn dict(&self) -> Dict {
        json::decode(&self.body)
    }
}
