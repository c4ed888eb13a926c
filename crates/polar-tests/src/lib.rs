//! Test support for the Polar node clients.
//!
//! [`MockNode`] is a scripted REST backend served by `warp` on a local port,
//! over plain HTTP or behind a TLS front end. It answers each method and
//! path with a canned response and records every request so tests can
//! assert on what went over the wire.

pub mod certs;

use std::collections::BTreeMap;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use polar_core::{LightningImpl, NodeConfig, PolarConfig, Scheme};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;
use warp::Filter;
use warp::http::{HeaderMap, Method, StatusCode};
use warp::path::FullPath;

use crate::certs::PemPair;

/// A request received by a [`MockNode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: String,
    /// Request target: path plus query, as sent.
    pub target: String,
    /// Headers, names lowercased.
    pub headers: BTreeMap<String, String>,
    /// Raw body.
    pub body: String,
}

impl RecordedRequest {
    /// Path part of the target.
    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or_default()
    }

    /// Query part of the target, if any.
    pub fn query(&self) -> Option<&str> {
        self.target.split_once('?').map(|(_, query)| query)
    }

    /// Header value by lowercase name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Body parsed as JSON, `Value::Null` when empty or malformed.
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone)]
struct Route {
    method: String,
    path: String,
    status: u16,
    body: String,
}

#[derive(Debug, Default)]
struct State {
    routes: Vec<Route>,
    requests: Vec<RecordedRequest>,
}

/// A scripted HTTP backend standing in for a node's REST API.
#[derive(Debug)]
pub struct MockNode {
    addr: SocketAddr,
    scheme: Scheme,
    state: Arc<Mutex<State>>,
    tasks: Vec<JoinHandle<()>>,
}

impl MockNode {
    /// Serve plain HTTP on an ephemeral port on 127.0.0.1.
    pub async fn start() -> io::Result<Self> {
        let (addr, state, server) = serve_http().await?;
        Ok(Self {
            addr,
            scheme: Scheme::Http,
            state,
            tasks: vec![server],
        })
    }

    /// Serve HTTPS presenting `identity`. With `client_ca`, connections
    /// without a client certificate signed by that CA are refused.
    pub async fn start_tls(identity: &PemPair, client_ca: Option<&str>) -> io::Result<Self> {
        let acceptor = TlsAcceptor::from(Arc::new(certs::server_config(identity, client_ca)?));
        let (backend, state, server) = serve_http().await?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let front = tokio::spawn(terminate_tls(listener, acceptor, backend));

        Ok(Self {
            addr,
            scheme: Scheme::Https,
            state,
            tasks: vec![server, front],
        })
    }

    /// Answer `method path` with `status` and a JSON body. Later routes win.
    pub fn on(&self, method: &str, path: &str, status: u16, body: &Value) -> &Self {
        self.on_raw(method, path, status, body.to_string())
    }

    /// Answer `method path` with `status` and a raw body.
    pub fn on_raw(&self, method: &str, path: &str, status: u16, body: impl Into<String>) -> &Self {
        lock(&self.state).routes.push(Route {
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            status,
            body: body.into(),
        });
        self
    }

    /// Port the backend listens on.
    pub const fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        lock(&self.state).requests.last().cloned()
    }

    /// A Core Lightning node served by this backend.
    pub fn cln_node(&self, name: &str) -> NodeConfig {
        NodeConfig::new(name, LightningImpl::CoreLightning)
            .with_rest("127.0.0.1", self.port())
            .with_scheme(self.scheme)
    }

    /// An LND node served by this backend.
    pub fn lnd_node(&self, name: &str) -> NodeConfig {
        NodeConfig::new(name, LightningImpl::Lnd)
            .with_rest("127.0.0.1", self.port())
            .with_scheme(self.scheme)
    }
}

impl Drop for MockNode {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// A configuration holding `nodes`.
pub fn config_with(nodes: impl IntoIterator<Item = NodeConfig>) -> PolarConfig {
    let mut config = PolarConfig::new();
    for node in nodes {
        config.add_node(node);
    }
    config
}

/// A local port with nothing listening on it.
pub async fn closed_port() -> io::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn serve_http() -> io::Result<(SocketAddr, Arc<Mutex<State>>, JoinHandle<()>)> {
    let addr = SocketAddr::from(([127, 0, 0, 1], closed_port().await?));
    let state = Arc::new(Mutex::new(State::default()));
    let server = tokio::spawn(warp::serve(routes(Arc::clone(&state))).run(addr));
    wait_until_listening(addr).await?;
    Ok((addr, state, server))
}

async fn wait_until_listening(addr: SocketAddr) -> io::Result<()> {
    let mut attempts = 0;
    loop {
        match TcpStream::connect(addr).await {
            Ok(_) => return Ok(()),
            Err(e) if attempts >= 200 => return Err(e),
            Err(_) => {
                attempts += 1;
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    }
}

/// One catch-all route: record the request, answer from the script.
fn routes(
    state: Arc<Mutex<State>>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let query = warp::query::raw()
        .or(warp::any().map(String::new))
        .unify();

    warp::method()
        .and(warp::path::full())
        .and(query)
        .and(warp::header::headers_cloned())
        .and(warp::body::bytes())
        .map(
            move |method: Method, path: FullPath, query: String, headers: HeaderMap, body: Bytes| {
                let target = if query.is_empty() {
                    path.as_str().to_string()
                } else {
                    format!("{}?{query}", path.as_str())
                };
                let request = RecordedRequest {
                    method: method.as_str().to_string(),
                    target,
                    headers: headers
                        .iter()
                        .map(|(name, value)| {
                            (
                                name.as_str().to_string(),
                                value.to_str().unwrap_or_default().to_string(),
                            )
                        })
                        .collect(),
                    body: String::from_utf8_lossy(&body).into_owned(),
                };
                let (status, payload) = answer(&state, request);
                warp::reply::with_status(
                    warp::reply::with_header(payload, "content-type", "application/json"),
                    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                )
            },
        )
}

fn answer(state: &Mutex<State>, request: RecordedRequest) -> (u16, String) {
    let mut state = lock(state);
    let route = state
        .routes
        .iter()
        .rev()
        .find(|route| route.method == request.method && route.path == request.path())
        .map(|route| (route.status, route.body.clone()));
    state.requests.push(request);
    route.unwrap_or_else(|| (404, r#"{"error":"no route"}"#.to_string()))
}

async fn terminate_tls(listener: TcpListener, acceptor: TlsAcceptor, backend: SocketAddr) {
    while let Ok((stream, _)) = listener.accept().await {
        let acceptor = acceptor.clone();
        tokio::spawn(async move {
            if let Err(e) = relay(stream, &acceptor, backend).await {
                eprintln!("mock node: {e}");
            }
        });
    }
}

async fn relay(stream: TcpStream, acceptor: &TlsAcceptor, backend: SocketAddr) -> io::Result<()> {
    let mut client = acceptor.accept(stream).await?;
    let mut upstream = TcpStream::connect(backend).await?;
    tokio::io::copy_bidirectional(&mut client, &mut upstream).await?;
    Ok(())
}
