//! # wiretap
//!
//! Request/response observation for hyper services. Every exchange that
//! passes through an [`Observer`] is written to the `tracing` facade twice:
//!
//! - at **TRACE**, as a `curl` command that reproduces the request;
//! - at **INFO**, as an indented JSON record with method, URL, headers
//!   (sensitive ones redacted), request and response bodies (capped),
//!   status and latency.
//!
//! Neither the client nor the handler can tell the observer is there. Request
//! bytes reach the handler unchanged, response bytes reach the client
//! unchanged, and a logging failure is a WARN line, never a failed request.
//!
//! ## Using the observer on its own
//!
//! [`Observer::observe`] works on plain `http` types, so it slots in front of
//! any handler:
//!
//! ```rust
//! use bytes::Bytes;
//! use http_body_util::{BodyExt, Full};
//! use wiretap::{Observer, ObserverConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let observer = Observer::new(ObserverConfig::default().with_max_payload_length(64));
//!
//! let req = http::Request::post("/echo").body(Full::new(Bytes::from("a=1"))).unwrap();
//! let res = observer
//!     .observe(req, |req| async move {
//!         let body = req.into_body().collect().await?.to_bytes();
//!         Ok::<_, std::convert::Infallible>(http::Response::new(Full::new(body)))
//!     })
//!     .await
//!     .unwrap();
//!
//! assert_eq!(res.into_body().collect().await.unwrap().to_bytes(), "a=1");
//! # }
//! ```
//!
//! ## With the bundled server
//!
//! ```rust,no_run
//! use wiretap::{Error, Observer, Request, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new().post("/users", create_user);
//!
//!     Server::bind("0.0.0.0:3000")
//!         .observe(Observer::default())
//!         .serve(app)
//!         .await
//!         .unwrap();
//! }
//!
//! async fn create_user(mut req: Request) -> Result<Response, Error> {
//!     let body = req.body().await?;
//!     Ok(Response::json(body))
//! }
//! ```

mod config;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod capture;
pub mod middleware;
pub mod record;
pub mod redact;
pub mod render;

#[cfg(test)]
pub(crate) mod test_support;

pub use http::{Method, StatusCode};

pub use config::ObserverConfig;
pub use error::{BoxError, Error};
pub use handler::Handler;
pub use middleware::Observer;
pub use record::ExchangeRecord;
pub use request::{Body, Request};
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
