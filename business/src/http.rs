//! Credentialed HTTP client for the users API.
//!
//! All requests from one `HttpClient` share a single `reqwest::Client` with a
//! cookie store, so a session cookie set by the server is replayed on every
//! later call. Responses are read fully into a plain `Response` before being
//! handed back; callers never hold a live connection.

use std::collections::HashMap;

use log::debug;
use thiserror::Error;

use crate::BusinessConfig;

/// Longest body excerpt kept in error messages.
const BODY_EXCERPT_LEN: usize = 200;

/// HTTP method for requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Start of the body as lossy UTF-8, for error messages.
    pub fn body_excerpt(&self) -> String {
        let text = String::from_utf8_lossy(&self.body);
        let text = text.trim();
        match text.char_indices().nth(BODY_EXCERPT_LEN) {
            Some((cut, _)) => format!("{}…", &text[..cut]),
            None => text.to_owned(),
        }
    }
}

/// Transport-level failure: the request never produced a response.
#[derive(Debug, Clone, Error)]
#[error("HTTP error: {message}")]
pub struct HttpError {
    pub message: String,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type HttpResult<T> = Result<T, HttpError>;

/// Shared client bound to one API root.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: String,
    authorization: Option<String>,
}

impl HttpClient {
    pub fn new(config: &BusinessConfig) -> HttpResult<Self> {
        let inner = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| HttpError::new(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner,
            base_url: config.api_base_url().to_owned(),
            authorization: config.authorization().map(str::to_owned),
        })
    }

    /// Absolute URL for a path relative to the API root.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::Get, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::Post, path)
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.request(Method::Put, path)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.request(Method::Delete, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = RequestBuilder::new(self.inner.clone(), method, self.url(path))
            .header("accept", "application/json");
        match &self.authorization {
            Some(value) => builder.header("authorization", value.as_str()),
            None => builder,
        }
    }
}

/// A request under construction.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    client: reqwest::Client,
    method: Method,
    url: String,
    headers: HashMap<String, String>,
    query: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl RequestBuilder {
    fn new(client: reqwest::Client, method: Method, url: String) -> Self {
        Self {
            client,
            method,
            url,
            headers: HashMap::new(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Target URL with the query string rendered, for display.
    pub fn display_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }
        let query: Vec<String> = self
            .query
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        format!("{}?{}", self.url, query.join("&"))
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Append a query parameter. Order is preserved.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_vec(value)?);
        self.headers
            .insert("content-type".to_owned(), "application/json".to_owned());
        Ok(self)
    }

    pub async fn send(self) -> HttpResult<Response> {
        debug!("{} {} {:?}", self.method.as_str(), self.url, self.query);

        let mut request = match self.method {
            Method::Get => self.client.get(&self.url),
            Method::Post => self.client.post(&self.url),
            Method::Put => self.client.put(&self.url),
            Method::Delete => self.client.delete(&self.url),
        };

        if !self.query.is_empty() {
            request = request.query(&self.query);
        }

        for (name, value) in &self.headers {
            request = request.header(name, value);
        }

        if let Some(body) = self.body {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| HttpError::new(e.to_string()))?;

        let status = response.status().as_u16();

        let body = response
            .bytes()
            .await
            .map_err(|e| HttpError::new(e.to_string()))?
            .to_vec();

        Ok(Response { status, body })
    }
}
