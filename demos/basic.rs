//! wiretap demo — a few endpoints behind the observer.
//!
//! Run with:
//!   RUST_LOG=trace cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/index
//!   curl -X POST http://localhost:3000/examples/post/by-param \
//!        -H 'authorization: Bearer secretToken' \
//!        -d 'parameter1=parameter1Value'
//!   curl -X POST http://localhost:3000/examples/post/by-json-body \
//!        -H 'content-type: application/json' \
//!        -d '{"message":"someEntityMessage"}'
//!
//! Each request prints an `=> METHOD URL` line, a JSON record with the
//! authorization header masked, and at TRACE a curl command to replay it.

use tracing_subscriber::EnvFilter;
use wiretap::{Error, Observer, ObserverConfig, Request, Response, Router, Server, StatusCode};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let app = Router::new()
        .get("/index", index)
        .post("/examples/post/by-param", by_param)
        .post("/examples/post/by-json-body", by_json_body);

    let observer = Observer::new(ObserverConfig::default().with_redacted_header("cookie"));

    Server::bind("0.0.0.0:3000")
        .observe(observer)
        .serve(app)
        .await
        .expect("server error");
}

// GET /index
async fn index(_req: Request) -> Result<&'static str, Error> {
    Ok("Hello World")
}

// POST /examples/post/by-param
//
// `parameter1` comes from the form body or, failing that, the query string.
async fn by_param(mut req: Request) -> Result<Response, Error> {
    let body = req.body().await?;
    let form = String::from_utf8_lossy(&body);

    let Some(value) = form_value(&form, "parameter1")
        .or_else(|| req.query().and_then(|q| form_value(q, "parameter1")))
    else {
        return Ok(Response::status(StatusCode::BAD_REQUEST));
    };

    let message = format!("body='parameter1={value}', headers='{}'", header_summary(&req));
    Ok(Response::json(serde_json::json!({ "message": message }).to_string()))
}

// POST /examples/post/by-json-body
async fn by_json_body(mut req: Request) -> Result<Response, Error> {
    let body = req.body().await?;
    let entity: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(_) => return Ok(Response::status(StatusCode::BAD_REQUEST)),
    };

    let message = format!("body='parameter1={entity}', headers='{}'", header_summary(&req));
    Ok(Response::json(serde_json::json!({ "message": message }).to_string()))
}

fn form_value<'a>(form: &'a str, key: &str) -> Option<&'a str> {
    form.split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

fn header_summary(req: &Request) -> String {
    let pairs: Vec<String> = req.headers().iter()
        .map(|(k, v)| format!("{k}={}", String::from_utf8_lossy(v.as_bytes())))
        .collect();
    format!("{{{}}}", pairs.join(", "))
}
