//! URL descriptor: path, route parameter bindings and query string.
//!
//! # Design
//! Route parameters are kept as `(name, value)` pairs so names and values can
//! never drift out of alignment. The query string keeps insertion order and a
//! repeated key overwrites its earlier value in place, so rendering is
//! deterministic. The query string is rendered verbatim; callers pass values
//! that are already safe in a request target. Route parameter values are
//! percent-encoded as path segments, so after axum decodes them the handler
//! reads back exactly the bound string.

use std::collections::HashSet;
use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::{Error, Result};

/// Everything but RFC 3986 unreserved characters, minus `.` so `.` and `..`
/// values never read as dot segments.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'~');

/// Describes the request target of a synthetic request.
///
/// The path may contain placeholders in either `:id` or `{id}` form. Each
/// bound parameter must name one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Url {
    path: String,
    params: Vec<(String, String)>,
    query: Vec<(String, String)>,
}

impl Url {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
            query: Vec::new(),
        }
    }

    /// Builds a descriptor from a path, its route bindings and a query string.
    pub fn with<P, Q, K1, V1, K2, V2>(path: impl Into<String>, params: P, query: Q) -> Self
    where
        P: IntoIterator<Item = (K1, V1)>,
        Q: IntoIterator<Item = (K2, V2)>,
        K1: Into<String>,
        V1: Into<String>,
        K2: Into<String>,
        V2: Into<String>,
    {
        let url = params
            .into_iter()
            .fold(Self::new(path), |url, (k, v)| url.param(k, v));
        query.into_iter().fold(url, |url, (k, v)| url.query(k, v))
    }

    /// Binds route parameter `name` to `value`, replacing an earlier binding.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        upsert(&mut self.params, name.into(), value.into());
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        upsert(&mut self.query, key.into(), value.into());
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|(k, _)| k.as_str())
    }

    pub fn param_values(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|(_, v)| v.as_str())
    }

    pub fn query_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.query.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Resolves placeholders against the bound parameters.
    pub(crate) fn route(&self) -> Result<Route> {
        if !self.path.starts_with('/') {
            return Err(Error::InvalidPath(self.path.clone()));
        }

        let mut seen = HashSet::new();
        let mut template = Vec::new();
        let mut concrete = Vec::new();
        for segment in self.path.split('/') {
            match placeholder(segment) {
                Some(name) => {
                    if !seen.insert(name) {
                        return Err(Error::DuplicateParam(name.to_string()));
                    }
                    let value = self
                        .params
                        .iter()
                        .find(|(k, _)| *k == name)
                        .map(|(_, v)| v.as_str())
                        .ok_or_else(|| Error::UnboundParam(name.to_string()))?;
                    if value.is_empty() {
                        return Err(Error::EmptyParam(name.to_string()));
                    }
                    template.push(format!("{{{name}}}"));
                    concrete.push(utf8_percent_encode(value, SEGMENT).to_string());
                }
                None if is_literal(segment) => {
                    template.push(segment.to_string());
                    concrete.push(segment.to_string());
                }
                None => return Err(Error::InvalidPath(self.path.clone())),
            }
        }

        if let Some(name) = self.param_names().find(|name| !seen.contains(name)) {
            return Err(Error::UnknownParam(name.to_string()));
        }

        let mut target = concrete.join("/");
        append_query(&mut target, &self.query);
        Ok(Route {
            template: template.join("/"),
            target,
        })
    }
}

/// Renders the wire path: the path as given, plus `?k=v&...` when the query
/// is non-empty.
impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rendered = self.path.clone();
        append_query(&mut rendered, &self.query);
        f.write_str(&rendered)
    }
}

/// A descriptor resolved for dispatch: the axum route template the handler is
/// mounted on and the concrete request target that matches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Route {
    pub template: String,
    pub target: String,
}

fn placeholder(segment: &str) -> Option<&str> {
    segment
        .strip_prefix(':')
        .or_else(|| segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
        .filter(|name| {
            !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        })
}

/// Segments axum would read as captures or wildcards must be placeholders.
fn is_literal(segment: &str) -> bool {
    !(segment.starts_with(':')
        || segment.starts_with('*')
        || segment.contains('{')
        || segment.contains('}'))
}

fn append_query(out: &mut String, query: &[(String, String)]) {
    for (i, (k, v)) in query.iter().enumerate() {
        out.push(if i == 0 { '?' } else { '&' });
        out.push_str(k);
        out.push('=');
        out.push_str(v);
    }
}

fn upsert(pairs: &mut Vec<(String, String)>, key: String, value: String) {
    match pairs.iter_mut().find(|(k, _)| *k == key) {
        Some(slot) => slot.1 = value,
        None => pairs.push((key, value)),
    }
}
