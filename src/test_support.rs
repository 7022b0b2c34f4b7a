//! In-process fake of an OpenAI-compatible provider for tests.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{header, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::Value;
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct StubReply {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl StubReply {
    pub fn ok(body: Value) -> Self {
        StubReply::raw(200, &body.to_string())
    }

    pub fn raw(status: u16, body: &str) -> Self {
        StubReply {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Value,
}

struct StubState {
    replies: Vec<StubReply>,
    next: AtomicUsize,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub struct StubProvider {
    addr: SocketAddr,
    state: Arc<StubState>,
}

impl StubProvider {
    /// Serves `replies` in order, repeating the last one once they run out.
    pub async fn start(replies: Vec<StubReply>) -> Self {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(StubState {
            replies,
            next: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        });

        let server_state = state.clone();
        tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => break,
                };
                let io = TokioIo::new(stream);
                let state = server_state.clone();
                tokio::spawn(async move {
                    let _ = http1::Builder::new()
                        .serve_connection(io, service_fn(move |req| handle(state.clone(), req)))
                        .await;
                });
            }
        });

        StubProvider { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

async fn handle(
    state: Arc<StubState>,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let path = req.uri().path().to_string();
    let header_value = |name: header::HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let authorization = header_value(header::AUTHORIZATION);
    let content_type = header_value(header::CONTENT_TYPE);

    let whole_body = req
        .into_body()
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .unwrap_or_default();
    let body = serde_json::from_slice(&whole_body).unwrap_or(Value::Null);

    state.requests.lock().unwrap().push(RecordedRequest {
        path,
        authorization,
        content_type,
        body,
    });

    let index = state.next.fetch_add(1, Ordering::SeqCst);
    let reply = state
        .replies
        .get(index)
        .or_else(|| state.replies.last())
        .cloned()
        .unwrap_or_else(|| StubReply::raw(200, "{}"));

    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }

    let mut response = Response::new(Full::new(Bytes::from(reply.body)));
    *response.status_mut() = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::OK);
    Ok(response)
}

/// A URL nothing is listening on.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
