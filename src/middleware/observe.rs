//! Request/response observation.
//!
//! [`Observer::observe`] wraps exactly one call into downstream handling and
//! records the exchange around it:
//!
//! ```text
//! snapshot head ─► "=> POST http://…" (INFO)
//!       │
//! wrap request body in a capture
//!       │
//! ┌─ timer ─────────────────┐
//! │ next(request).await?    │   errors propagate untouched
//! └─────────────────────────┘
//!       │
//! read captured request body, status
//! drain response body through a capture, replay it
//!       │
//! curl line (TRACE), JSON record (INFO, redacted)
//! ```
//!
//! Nothing here can fail the exchange. If rendering breaks, a WARN line is
//! written instead and the response goes out as the handler built it. If the
//! handler fails, or its future is dropped, no record is written at all.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use bytes::Bytes;
use http::HeaderMap;
use http_body_util::{BodyExt, Collected, Either};
use hyper::body::{Body, Frame, SizeHint};
use tracing::{Level, enabled, info, trace, warn};

use crate::capture::{self, Capture, CaptureBody};
use crate::config::ObserverConfig;
use crate::record::ExchangeRecord;
use crate::redact::Redactor;
use crate::render;

/// Response body handed back by [`Observer::observe`].
///
/// `Left` is the replayed, fully buffered body when response capture is on.
/// `Right` is the handler's own body, passed through when it is off.
pub type ObservedBody<B> = Either<ReplayBody, B>;

/// A response body that was drained through a capture, played back.
///
/// Yields the buffered data, then the trailers the handler sent, if any. The
/// size hint is the one the handler's body reported, so the connection frames
/// the replay the same way it would have framed the original.
#[derive(Debug)]
pub struct ReplayBody {
    data: Option<Bytes>,
    trailers: Option<HeaderMap>,
    hint: SizeHint,
}

impl ReplayBody {
    fn new(collected: Collected<Bytes>, hint: SizeHint) -> Self {
        let trailers = collected.trailers().cloned();
        let data = Some(collected.to_bytes()).filter(|data| !data.is_empty());
        Self { data, trailers, hint }
    }
}

impl Body for ReplayBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, Infallible>>> {
        let this = self.get_mut();
        let frame = if let Some(data) = this.data.take() {
            Frame::data(data)
        } else if let Some(trailers) = this.trailers.take() {
            Frame::trailers(trailers)
        } else {
            return Poll::Ready(None);
        };
        Poll::Ready(Some(Ok(frame)))
    }

    fn is_end_stream(&self) -> bool {
        self.data.is_none() && self.trailers.is_none()
    }

    fn size_hint(&self) -> SizeHint {
        match &self.data {
            Some(_) => self.hint.clone(),
            None => SizeHint::with_exact(0),
        }
    }
}

/// Logs every exchange that passes through it.
///
/// Cheap to clone; clones share one read-only configuration.
#[derive(Clone, Debug)]
pub struct Observer {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    config: ObserverConfig,
    redactor: Redactor,
}

impl Observer {
    pub fn new(config: ObserverConfig) -> Self {
        let redactor = config.redactor();
        Self { inner: Arc::new(Inner { config, redactor }) }
    }

    pub fn config(&self) -> &ObserverConfig { &self.inner.config }

    /// Runs `next` once on `req` and records the exchange.
    ///
    /// The handler sees the request body through a [`CaptureBody`]: every
    /// byte arrives exactly as sent. The returned response carries the same
    /// status, headers and body bytes the handler produced.
    ///
    /// `next`'s error is returned as-is. So is a failure of the response body
    /// stream while it is being replayed, converted through `Into<E>`.
    pub async fn observe<B, F, Fut, R, E>(
        &self,
        req: http::Request<B>,
        next: F,
    ) -> Result<http::Response<ObservedBody<R>>, E>
    where
        B: Body<Data = Bytes> + Unpin,
        F: FnOnce(http::Request<CaptureBody<B>>) -> Fut,
        Fut: Future<Output = Result<http::Response<R>, E>>,
        R: Body<Data = Bytes> + Unpin,
        R::Error: Into<E>,
    {
        let config = &self.inner.config;

        let mut record = ExchangeRecord::from_request(&req);
        info!("=> {} {}", record.method(), record.url());

        let request_charset = capture::charset(req.headers());
        let request_capture = Capture::new(config.max_payload_length);
        let req = req.map(|body| CaptureBody::new(body, request_capture.clone()));

        let started = Instant::now();
        let response = next(req).await?;
        record.set_duration(started.elapsed());

        record.set_request_body(request_capture.contents(&request_charset));
        record.set_http_status(response.status().as_u16());

        let response = if config.include_response_payload {
            let response_charset = capture::charset(response.headers());
            let response_capture = Capture::new(config.max_payload_length);
            let (parts, body) = response.into_parts();
            let hint = body.size_hint();

            let collected = CaptureBody::new(body, response_capture.clone())
                .collect()
                .await
                .map_err(Into::into)?;

            record.set_response_body(response_capture.contents(&response_charset));
            http::Response::from_parts(parts, Either::Left(ReplayBody::new(collected, hint)))
        } else {
            response.map(Either::Right)
        };

        self.emit(record);
        Ok(response)
    }

    fn emit(&self, record: ExchangeRecord) {
        if enabled!(Level::TRACE) {
            log_curl(render::to_curl(&record));
        }

        if enabled!(Level::INFO) {
            log_json(render::to_json(&record, &self.inner.redactor));
        }
    }
}

fn log_curl(rendered: Result<String, fmt::Error>) {
    match rendered {
        Ok(curl) => trace!("{curl}"),
        Err(_) => warn!("could not log curl request"),
    }
}

fn log_json(rendered: serde_json::Result<String>) {
    match rendered {
        Ok(json) => info!("{json}"),
        Err(e) => warn!(error = %e, "could not log request and response as json"),
    }
}

impl Default for Observer {
    fn default() -> Self { Self::new(ObserverConfig::default()) }
}
