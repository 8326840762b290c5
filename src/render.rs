//! Renderings of an [`ExchangeRecord`].
//!
//! Two independent outputs:
//!
//! - [`to_curl`] rebuilds the request as a `curl` command line that can be
//!   pasted into a POSIX shell. It uses the real header values.
//! - [`to_json`] writes the whole exchange as indented JSON, with headers
//!   passed through a [`Redactor`] first.
//!
//! Both report failure to the caller instead of deciding what to do about it.
//! [`write_curl`] renders into any [`fmt::Write`] sink and fails when the sink
//! does; [`to_curl`] renders into a `String`, which in practice never fails.

use std::borrow::Cow;
use std::fmt::{self, Write as _};

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::record::{ExchangeRecord, Headers};
use crate::redact::Redactor;

// ── curl ──────────────────────────────────────────────────────────────────────

/// `curl -v -X<METHOD> -H '<name>: <value>' ... -d'<body>' '<url>'`
///
/// `content-length` is left out; curl computes its own. The `-d` segment is
/// only written for a POST with a non-empty body. Quotes are escaped in header
/// names, header values and the body; the URL is written as recorded.
pub fn to_curl(record: &ExchangeRecord) -> Result<String, fmt::Error> {
    let mut curl = String::new();
    write_curl(&mut curl, record)?;
    Ok(curl)
}

/// Writes the [`to_curl`] rendering of `record` into `out`.
pub fn write_curl<W: fmt::Write>(out: &mut W, record: &ExchangeRecord) -> fmt::Result {
    write!(out, "curl -v -X{}", record.method())?;

    for (name, value) in record.headers() {
        if name.eq_ignore_ascii_case("content-length") {
            continue;
        }
        write!(out, " -H '{}: {}'", escape_quotes(name), escape_quotes(value))?;
    }

    if record.method().eq_ignore_ascii_case("post") {
        if let Some(body) = record.request_body().filter(|b| !b.is_empty()) {
            write!(out, " -d'{}'", escape_quotes(body))?;
        }
    }

    write!(out, " '{}'", record.url())
}

/// Makes `s` safe inside a single-quoted shell word: each `'` closes the
/// quote, emits a double-quoted `'`, and reopens.
pub fn escape_quotes(s: &str) -> Cow<'_, str> {
    if s.contains('\'') {
        Cow::Owned(s.replace('\'', r#"'"'"'"#))
    } else {
        Cow::Borrowed(s)
    }
}

// ── JSON ──────────────────────────────────────────────────────────────────────

/// The record as indented JSON, headers redacted.
///
/// Keys, in order: `method`, `url`, `headers`, `request`, `httpStatus`,
/// `response`, `durationMs`. Absent bodies are written as `null`.
pub fn to_json(record: &ExchangeRecord, redactor: &Redactor) -> serde_json::Result<String> {
    let view = StructuredRecord { record, headers: redactor.redact(record.headers()) };
    serde_json::to_string_pretty(&view)
}

/// Field-by-field view written by hand so the output shape does not drift
/// with the record's internals.
struct StructuredRecord<'a> {
    record: &'a ExchangeRecord,
    headers: Headers,
}

impl Serialize for StructuredRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_struct("ExchangeRecord", 7)?;
        out.serialize_field("method", self.record.method())?;
        out.serialize_field("url", self.record.url())?;
        out.serialize_field("headers", &self.headers)?;
        out.serialize_field("request", &self.record.request_body())?;
        out.serialize_field("httpStatus", &self.record.http_status())?;
        out.serialize_field("response", &self.record.response_body())?;
        out.serialize_field("durationMs", &self.record.duration_ms())?;
        out.end()
    }
}
