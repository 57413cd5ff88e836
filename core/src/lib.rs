//! White-box test client for axum handlers.
//!
//! # Overview
//! Builds synthetic requests (method, path, route parameters, query string,
//! headers, body), runs a single handler against them in process and captures
//! the response in a [`Recorder`]. No listener is bound and no network I/O
//! happens.
//!
//! # Design
//! - [`Client`] carries default headers only; per-call headers override them.
//! - [`Url`] binds route parameters by name so a handler reading `Path<..>`
//!   sees them exactly as the router would have extracted them.
//! - Unknown verb names are an error, never a silent GET.
//! - [`json`] helpers panic on malformed fixtures; [`multipart`] and request
//!   construction return [`Error`] values.

pub mod client;
pub mod error;
pub mod http;
pub mod json;
pub mod multipart;
pub mod url;

pub use client::Client;
pub use error::{Error, Result};
pub use http::{Recorder, Verb};
pub use json::Dict;
pub use multipart::{form_data, MultipartForm, MultipartWriter};
pub use url::Url;
