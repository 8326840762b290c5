//! Bounded body capture.
//!
//! A [`CaptureBody`] sits between a body and whoever polls it. Every frame is
//! handed through untouched: same bytes, same chunking, same trailers, same
//! end-of-stream. On the side, a copy of the data bytes is appended to a
//! [`Capture`] buffer until the buffer reaches its byte limit. Anything past
//! the limit is dropped on the floor, so memory stays bounded no matter how
//! large the payload is.
//!
//! The same wrapper is used in both directions:
//!
//! ```text
//! client ──► CaptureBody<request body>  ──► handler reads it
//! handler ─► CaptureBody<response body> ──► replayed to the client
//! ```
//!
//! The handler owns the request once it is called, so the buffer lives behind
//! a cloneable [`Capture`] handle that the middleware keeps for readback.

use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll, ready};

use bytes::{Bytes, BytesMut};
use encoding_rs::Encoding;
use http::HeaderMap;
use http::header::CONTENT_TYPE;
use hyper::body::{Body, Frame, SizeHint};

/// Returned by [`Capture::contents`] when the charset label is not recognised.
pub const UNSUPPORTED_ENCODING: &str = "Unsupported Encoding";

/// Charset assumed when a message does not declare one.
pub const DEFAULT_CHARSET: &str = "utf-8";

// ── Capture ───────────────────────────────────────────────────────────────────

/// Shared handle to a bounded, append-only byte buffer.
///
/// Cloning is cheap (one `Arc` increment); all clones see the same buffer.
#[derive(Clone, Debug)]
pub struct Capture {
    buf: Arc<Mutex<BytesMut>>,
    limit: usize,
}

impl Capture {
    /// Creates an empty capture that retains at most `limit` bytes.
    pub fn new(limit: usize) -> Self {
        Self { buf: Arc::new(Mutex::new(BytesMut::new())), limit }
    }

    pub fn limit(&self) -> usize { self.limit }

    /// Number of bytes retained so far. Never exceeds [`limit`](Capture::limit).
    pub fn len(&self) -> usize { self.lock().len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// A copy of the retained bytes.
    pub fn bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.lock())
    }

    /// The retained bytes decoded with `charset`.
    ///
    /// Truncation happens on a byte boundary, so the last character of a
    /// multi-byte encoding may be cut; it decodes to U+FFFD. An unknown
    /// charset yields [`UNSUPPORTED_ENCODING`] instead of an error.
    pub fn contents(&self, charset: &str) -> String {
        decode(&self.lock(), charset).unwrap_or_else(|| UNSUPPORTED_ENCODING.to_owned())
    }

    fn append(&self, chunk: &[u8]) {
        let mut buf = self.lock();
        let room = self.limit.saturating_sub(buf.len());
        if room > 0 {
            buf.extend_from_slice(&chunk[..room.min(chunk.len())]);
        }
    }

    // A panic while appending leaves a valid prefix behind, so a poisoned
    // lock is still safe to read.
    fn lock(&self) -> std::sync::MutexGuard<'_, BytesMut> {
        self.buf.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── CaptureBody ───────────────────────────────────────────────────────────────

/// A body that copies its data frames into a [`Capture`] as they are polled.
///
/// `B: Unpin` keeps the wrapper free of pin projection; hyper's `Incoming`,
/// `Full` and the boxed bodies from `http-body-util` all qualify. Box a
/// `!Unpin` body before wrapping it.
#[derive(Debug)]
pub struct CaptureBody<B> {
    inner: B,
    capture: Capture,
}

impl<B> CaptureBody<B> {
    pub fn new(inner: B, capture: Capture) -> Self {
        Self { inner, capture }
    }

    pub fn capture(&self) -> &Capture { &self.capture }

    pub fn into_inner(self) -> B { self.inner }
}

impl<B> Body for CaptureBody<B>
where
    B: Body<Data = Bytes> + Unpin,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let frame = ready!(Pin::new(&mut this.inner).poll_frame(cx));
        if let Some(Ok(frame)) = &frame {
            if let Some(data) = frame.data_ref() {
                this.capture.append(data);
            }
        }
        Poll::Ready(frame)
    }

    fn is_end_stream(&self) -> bool { self.inner.is_end_stream() }

    fn size_hint(&self) -> SizeHint { self.inner.size_hint() }
}

// ── Charset handling ──────────────────────────────────────────────────────────

/// The `charset` parameter of the `Content-Type` header, lower-cased, or
/// [`DEFAULT_CHARSET`] when there is none.
pub fn charset(headers: &HeaderMap) -> String {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            value.split(';').skip(1).find_map(|param| {
                let (key, value) = param.split_once('=')?;
                key.trim()
                    .eq_ignore_ascii_case("charset")
                    .then(|| value.trim().trim_matches('"').to_ascii_lowercase())
            })
        })
        .filter(|label| !label.is_empty())
        .unwrap_or_else(|| DEFAULT_CHARSET.to_owned())
}

/// Decodes `bytes` with the charset labelled `charset`, using the WHATWG
/// label table. Malformed sequences become U+FFFD; a leading BOM is kept as
/// content. `None` for labels the table does not know.
fn decode(bytes: &[u8], charset: &str) -> Option<String> {
    let encoding = Encoding::for_label(charset.trim().as_bytes())?;
    let (text, _) = encoding.decode_without_bom_handling(bytes);
    Some(text.into_owned())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use http::HeaderValue;
    use http_body_util::{BodyExt, Full};

    use super::*;

    /// A body that yields pre-split chunks, to exercise multi-frame streams.
    struct Chunks(VecDeque<Bytes>);

    impl Chunks {
        fn new(parts: &[&'static str]) -> Self {
            Self(parts.iter().map(|p| Bytes::from_static(p.as_bytes())).collect())
        }
    }

    impl Body for Chunks {
        type Data = Bytes;
        type Error = std::convert::Infallible;

        fn poll_frame(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, Self::Error>>> {
            Poll::Ready(self.0.pop_front().map(|chunk| Ok(Frame::data(chunk))))
        }
    }

    #[tokio::test]
    async fn passes_every_chunk_through_in_order() {
        let capture = Capture::new(1000);
        let body = CaptureBody::new(Chunks::new(&["hel", "lo ", "world"]), capture.clone());

        let mut frames = Vec::new();
        let mut body = body;
        while let Some(frame) = body.frame().await {
            frames.push(frame.unwrap().into_data().unwrap());
        }

        assert_eq!(frames, vec!["hel", "lo ", "world"]);
        assert_eq!(capture.contents("utf-8"), "hello world");
    }

    #[tokio::test]
    async fn delivers_full_body_but_retains_only_the_limit() {
        let capture = Capture::new(5);
        let body = CaptureBody::new(Full::new(Bytes::from("HelloWorld")), capture.clone());

        let delivered = body.collect().await.unwrap().to_bytes();

        assert_eq!(delivered, "HelloWorld");
        assert_eq!(capture.len(), 5);
        assert_eq!(capture.contents("utf-8"), "Hello");
    }

    #[tokio::test]
    async fn limit_applies_across_chunk_boundaries() {
        let capture = Capture::new(4);
        let body = CaptureBody::new(Chunks::new(&["ab", "cd", "ef"]), capture.clone());

        let delivered = body.collect().await.unwrap().to_bytes();

        assert_eq!(delivered, "abcdef");
        assert_eq!(capture.bytes(), "abcd");
    }

    #[tokio::test]
    async fn short_body_is_captured_exactly() {
        let capture = Capture::new(1000);
        let body = CaptureBody::new(Full::new(Bytes::from("a=1")), capture.clone());
        body.collect().await.unwrap();

        assert_eq!(capture.contents("utf-8"), "a=1");
    }

    #[tokio::test]
    async fn empty_body_captures_nothing() {
        let capture = Capture::new(1000);
        let body = CaptureBody::new(Full::new(Bytes::new()), capture.clone());
        body.collect().await.unwrap();

        assert!(capture.is_empty());
        assert_eq!(capture.contents("utf-8"), "");
    }

    #[test]
    fn size_hint_and_end_of_stream_are_forwarded() {
        let body = CaptureBody::new(Full::new(Bytes::from("1234")), Capture::new(2));
        assert_eq!(body.size_hint().exact(), Some(4));
        assert!(!body.is_end_stream());

        let empty = CaptureBody::new(Full::new(Bytes::new()), Capture::new(2));
        assert!(empty.is_end_stream());
    }

    #[tokio::test]
    async fn truncation_may_split_a_multibyte_character() {
        let capture = Capture::new(2);
        // "é" is two bytes; the cap lands in the middle of the second char.
        let body = CaptureBody::new(Full::new(Bytes::from("aé")), capture.clone());
        body.collect().await.unwrap();

        assert_eq!(capture.len(), 2);
        assert_eq!(capture.contents("utf-8"), "a\u{FFFD}");
    }

    #[test]
    fn unknown_charset_yields_sentinel() {
        let capture = Capture::new(10);
        capture.append(b"abc");
        assert_eq!(capture.contents("x-klingon"), UNSUPPORTED_ENCODING);
    }

    #[test]
    fn single_byte_charsets_decode() {
        let capture = Capture::new(10);
        capture.append(b"caf\xE9");

        assert_eq!(capture.contents("windows-1252"), "café");
        assert_eq!(capture.contents("ISO-8859-1"), "café");
        assert_eq!(capture.contents("latin1"), "café");
        assert_eq!(capture.contents("us-ascii"), "café");
    }

    #[test]
    fn multi_byte_charsets_decode() {
        let sjis = Capture::new(10);
        sjis.append(b"\x82\xa0");
        assert_eq!(sjis.contents("Shift_JIS"), "あ");

        let utf16 = Capture::new(10);
        utf16.append(b"h\x00i\x00");
        assert_eq!(utf16.contents("UTF-16"), "hi");
        assert_eq!(utf16.contents("utf-16le"), "hi");
    }

    #[test]
    fn invalid_utf8_is_replaced_not_rejected() {
        let capture = Capture::new(10);
        capture.append(b"a\xFFb");
        assert_eq!(capture.contents("utf-8"), "a\u{FFFD}b");
    }

    #[test]
    fn charset_is_read_from_content_type() {
        let mut headers = HeaderMap::new();
        assert_eq!(charset(&headers), "utf-8");

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert_eq!(charset(&headers), "utf-8");

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; Charset=\"ISO-8859-1\""));
        assert_eq!(charset(&headers), "iso-8859-1");
    }
}
