//! Synthetic request client: drive an axum handler without a socket.
//!
//! # Design
//! `Client` holds only its default headers. Every call resolves the URL
//! descriptor into a route template and a concrete target, mounts the handler
//! on a single-route `Router` at that template and pushes one request through
//! it with `oneshot`. The router then extracts `Path` bindings and
//! `MatchedPath` exactly as it would in production, while the test targets one
//! handler directly. The response is buffered into a [`Recorder`] before the
//! call returns; nothing is spawned and nothing outlives the call.
//!
//! Handler errors are not surfaced as `Err`: axum turns them into responses,
//! so a failing handler shows up as the status and body it rendered.

use axum::body::Body;
use axum::handler::Handler;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};
use axum::routing::any;
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use tower::ServiceExt;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::http::{Recorder, Verb};
use crate::url::Url;

/// In-process client for exercising axum handlers.
///
/// Construct one per test fixture and share it by reference. Default headers
/// are applied to every request before the per-call headers, which win on
/// collision.
#[derive(Debug, Clone)]
pub struct Client {
    headers: HeaderMap,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// A client sending `Content-Type: application/json` by default.
    pub fn new() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self { headers }
    }

    /// A client without default headers.
    pub fn empty() -> Self {
        Self {
            headers: HeaderMap::new(),
        }
    }

    pub fn default_headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Merges `headers` into the defaults; a name already present is replaced.
    pub fn set_headers(&mut self, headers: &[(&str, &str)]) -> Result<()> {
        merge_headers(&mut self.headers, headers)
    }

    /// Sends a request whose method is given by name, e.g. `"get"` or `"PUT"`.
    ///
    /// Fails with [`Error::UnsupportedMethod`] for any other name.
    pub async fn request<H, T>(
        &self,
        verb: &str,
        url: &Url,
        handler: H,
        body: impl Into<Bytes>,
        headers: &[(&str, &str)],
    ) -> Result<Recorder>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        let verb = verb.parse()?;
        self.execute(verb, url, handler, body, headers).await
    }

    pub async fn execute<H, T>(
        &self,
        verb: Verb,
        url: &Url,
        handler: H,
        body: impl Into<Bytes>,
        headers: &[(&str, &str)],
    ) -> Result<Recorder>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.request_with_state(verb, url, handler, (), body, headers)
            .await
    }

    /// Like [`Client::execute`], for handlers that extract `State<S>`.
    pub async fn request_with_state<H, T, S>(
        &self,
        verb: Verb,
        url: &Url,
        handler: H,
        state: S,
        body: impl Into<Bytes>,
        headers: &[(&str, &str)],
    ) -> Result<Recorder>
    where
        H: Handler<T, S>,
        T: 'static,
        S: Clone + Send + Sync + 'static,
    {
        let route = url.route()?;

        let mut merged = self.headers.clone();
        merge_headers(&mut merged, headers)?;

        let mut request = Request::builder()
            .method(verb.as_method())
            .uri(route.target.as_str())
            .body(Body::from(body.into()))?;
        *request.headers_mut() = merged;

        debug!(
            method = %verb,
            uri = %route.target,
            route = %route.template,
            "dispatching request"
        );
        trace!(headers = ?request.headers(), "request headers");

        let router: Router = Router::new()
            .route(&route.template, any(handler))
            .with_state(state);
        let response = match router.oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };

        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(Error::ResponseBody)?
            .to_bytes();

        debug!(status = %parts.status, len = body.len(), "handler responded");
        Ok(Recorder::new(parts.status, parts.headers, body))
    }

    pub async fn get<H, T>(
        &self,
        url: &Url,
        handler: H,
        body: impl Into<Bytes>,
        headers: &[(&str, &str)],
    ) -> Result<Recorder>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.execute(Verb::Get, url, handler, body, headers).await
    }

    pub async fn post<H, T>(
        &self,
        url: &Url,
        handler: H,
        body: impl Into<Bytes>,
        headers: &[(&str, &str)],
    ) -> Result<Recorder>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.execute(Verb::Post, url, handler, body, headers).await
    }

    pub async fn put<H, T>(
        &self,
        url: &Url,
        handler: H,
        body: impl Into<Bytes>,
        headers: &[(&str, &str)],
    ) -> Result<Recorder>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.execute(Verb::Put, url, handler, body, headers).await
    }

    pub async fn patch<H, T>(
        &self,
        url: &Url,
        handler: H,
        body: impl Into<Bytes>,
        headers: &[(&str, &str)],
    ) -> Result<Recorder>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.execute(Verb::Patch, url, handler, body, headers).await
    }

    pub async fn delete<H, T>(
        &self,
        url: &Url,
        handler: H,
        body: impl Into<Bytes>,
        headers: &[(&str, &str)],
    ) -> Result<Recorder>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.execute(Verb::Delete, url, handler, body, headers).await
    }
}

fn merge_headers(into: &mut HeaderMap, headers: &[(&str, &str)]) -> Result<()> {
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| Error::InvalidHeaderName(name.to_string()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| Error::InvalidHeaderValue(name.as_str().to_string()))?;
        into.insert(name, value);
    }
    Ok(())
}
