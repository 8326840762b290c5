//! Unified error type.

use std::convert::Infallible;
use std::fmt;

/// A boxed, thread-safe error, as carried by hyper bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by wiretap's fallible operations.
///
/// Observation itself never produces one of these: rendering and decoding
/// problems degrade to log lines. This type covers the carrier around the
/// middleware: binding a port, reading a request body, and failures a
/// handler chooses to raise.
#[derive(Debug)]
pub enum Error {
    /// Binding or accepting on the listening socket.
    Io(std::io::Error),
    /// The request or response body stream failed.
    Body(BoxError),
    /// Raised by a handler. Passes through the observer unchanged.
    Handler(BoxError),
}

impl Error {
    /// Wraps an application failure.
    pub fn handler(e: impl Into<BoxError>) -> Self {
        Self::Handler(e.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Body(e) => write!(f, "body: {e}"),
            Self::Handler(e) => write!(f, "handler: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Body(e) | Self::Handler(e) => Some(e.as_ref()),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<Infallible> for Error {
    fn from(e: Infallible) -> Self {
        match e {}
    }
}
