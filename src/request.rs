//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::{Extensions, HeaderMap, Method, Uri};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty};

use crate::error::{BoxError, Error};

/// Type-erased request body handed to handlers.
///
/// When an observer is installed this is the capturing body, so whatever a
/// handler reads is also what gets logged.
pub type Body = UnsyncBoxBody<Bytes, BoxError>;

/// An incoming HTTP request, with the path parameters matched by the router.
pub struct Request {
    inner: http::Request<Body>,
    params: HashMap<String, String>,
}

impl Request {
    pub(crate) fn new(inner: http::Request<Body>, params: HashMap<String, String>) -> Self {
        Self { inner, params }
    }

    pub fn method(&self) -> &Method { self.inner.method() }
    pub fn uri(&self) -> &Uri { self.inner.uri() }
    pub fn path(&self) -> &str { self.inner.uri().path() }
    pub fn query(&self) -> Option<&str> { self.inner.uri().query() }
    pub fn headers(&self) -> &HeaderMap { self.inner.headers() }
    pub fn extensions(&self) -> &Extensions { self.inner.extensions() }

    /// Case-insensitive header lookup. Non-UTF-8 values are skipped.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Reads the whole body.
    ///
    /// The body can be read once; later calls return an empty buffer.
    pub async fn body(&mut self) -> Result<Bytes, Error> {
        let body = std::mem::replace(
            self.inner.body_mut(),
            Empty::new().map_err(|never| match never {}).boxed_unsync(),
        );
        let collected = body.collect().await.map_err(Error::Body)?;
        Ok(collected.to_bytes())
    }
}
