//! The per-exchange record.
//!
//! One [`ExchangeRecord`] is built per request, filled in as the exchange
//! progresses, and handed by value to the renderers when the response has
//! been replayed. It is never shared between requests.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

use http::header::HOST;

/// Header name → value, as seen on the inbound request.
///
/// Lookups through [`ExchangeRecord::header`] ignore case. Only one value is
/// kept per name: when a header repeats, the last value wins.
pub type Headers = BTreeMap<String, String>;

/// Authentication scheme established by an upstream stage (e.g. `"Bearer"`).
///
/// Insert it into the request extensions and it is appended to the recorded
/// URL as `, authType=<scheme>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthScheme(pub String);

/// Name of the authenticated caller, appended as `, principalName=<name>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal(pub String);

/// Everything known about one request/response exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExchangeRecord {
    method: String,
    url: String,
    headers: Headers,
    request_body: Option<String>,
    http_status: u16,
    response_body: Option<String>,
    duration_ms: u64,
}

impl ExchangeRecord {
    pub fn new(method: impl Into<String>, url: impl Into<String>, headers: Headers) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers,
            request_body: None,
            http_status: 0,
            response_body: None,
            duration_ms: 0,
        }
    }

    /// Snapshots method, URL and headers from the request head.
    ///
    /// Call this before the request is handed on, so later mutation by the
    /// handler cannot leak into the record.
    pub fn from_request<B>(req: &http::Request<B>) -> Self {
        let mut headers = Headers::new();
        for (name, value) in req.headers() {
            headers.insert(
                name.as_str().to_owned(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
        Self::new(req.method().as_str(), build_url(req), headers)
    }

    pub fn method(&self) -> &str { &self.method }
    pub fn url(&self) -> &str { &self.url }
    pub fn headers(&self) -> &Headers { &self.headers }
    pub fn request_body(&self) -> Option<&str> { self.request_body.as_deref() }
    pub fn http_status(&self) -> u16 { self.http_status }
    pub fn response_body(&self) -> Option<&str> { self.response_body.as_deref() }
    pub fn duration_ms(&self) -> u64 { self.duration_ms }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// An empty body leaves the field unset.
    pub fn set_request_body(&mut self, body: String) {
        if !body.is_empty() {
            self.request_body = Some(body);
        }
    }

    /// An empty body leaves the field unset.
    pub fn set_response_body(&mut self, body: String) {
        if !body.is_empty() {
            self.response_body = Some(body);
        }
    }

    pub fn set_http_status(&mut self, status: u16) {
        self.http_status = status;
    }

    pub fn set_duration(&mut self, elapsed: Duration) {
        self.duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    }
}

/// `scheme://host/path?query[, authType=…][, principalName=…]`
///
/// Absolute-form URIs (proxies, HTTP/2) carry their own scheme and
/// authority. Origin-form URIs only have a path, so the host comes from the
/// `Host` header and the scheme defaults to `http`.
fn build_url<B>(req: &http::Request<B>) -> String {
    let uri = req.uri();
    let mut url = String::new();

    match (uri.scheme_str(), uri.authority()) {
        (Some(scheme), Some(authority)) => {
            url.push_str(scheme);
            url.push_str("://");
            url.push_str(authority.host());
            if let Some(port) = authority.port_u16() {
                let _ = write!(url, ":{port}");
            }
        }
        _ => {
            if let Some(host) = req.headers().get(HOST).and_then(|h| h.to_str().ok()) {
                url.push_str("http://");
                url.push_str(host);
            }
        }
    }

    url.push_str(uri.path());
    if let Some(query) = uri.query() {
        url.push('?');
        url.push_str(query);
    }

    if let Some(AuthScheme(scheme)) = req.extensions().get::<AuthScheme>() {
        url.push_str(", authType=");
        url.push_str(scheme);
    }
    if let Some(Principal(name)) = req.extensions().get::<Principal>() {
        url.push_str(", principalName=");
        url.push_str(name);
    }

    url
}
