//! Request and response values passed between pages, the worker and the network

use crate::error::{NewswError, NewswResult};
use serde::de::DeserializeOwned;
use std::fmt;
use url::Url;

/// An ordered header list. Names compare case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header, keeping any existing values for the same name
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// First value for `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for Headers {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// An outgoing request. Method and headers pass through the worker unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: String,
    url: Url,
    headers: Headers,
}

impl Request {
    /// Create a request; the method is normalized to upper case
    pub fn new(method: &str, url: Url) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            url,
            headers: Headers::new(),
        }
    }

    /// A GET request for `url`
    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    /// Parse `url` relative to `base` (absolute URLs ignore the base)
    pub fn parse(method: &str, url: &str, base: &Url) -> NewswResult<Self> {
        let url = base
            .join(url)
            .map_err(|e| NewswError::invalid_url(url, e))?;
        Ok(Self::new(method, url))
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// URL as the cache sees it; fragments never reach the server
    pub fn cache_url(&self) -> Url {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url
    }

    /// Identity used to key the cache store
    pub fn cache_key(&self) -> String {
        format!("{} {}", self.method, self.cache_url())
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// A response.
///
/// The body has exactly one consumer. `Response` is deliberately not `Clone`:
/// when both the cache and the requester need the payload, call
/// [`Response::duplicate`] first.
#[derive(Debug, PartialEq, Eq)]
pub struct Response {
    status: u16,
    status_text: String,
    url: Url,
    headers: Headers,
    body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, url: Url, headers: Headers, body: Vec<u8>) -> Self {
        Self {
            status,
            status_text: reason_phrase(status).to_string(),
            url,
            headers,
            body,
        }
    }

    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = status_text.into();
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Whether the status is in the 2xx range
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Length of the body without consuming it
    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    /// Explicitly copy the response, body included
    pub fn duplicate(&self) -> Self {
        Self {
            status: self.status,
            status_text: self.status_text.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }

    /// Consume the response, yielding the raw body
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// Consume the response as UTF-8 text (lossy)
    pub fn text(self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Consume the response, parsing the body as JSON
    pub fn json<T: DeserializeOwned>(self) -> NewswResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Canonical reason phrase for common status codes
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        426 => "Upgrade Required",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "",
    }
}
