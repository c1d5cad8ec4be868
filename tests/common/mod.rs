//! In-process fakes for the indexer, node and wallet seams
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy_primitives::Address;
use lunagens::error::{IndexerError, RpcError, WalletError};
use lunagens::infrastructure::ethereum::JsonRpc;
use lunagens::infrastructure::indexer::IndexerApi;
use lunagens::wallet::{Activation, ConnectorKind, WalletConnector};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;

pub const ACCOUNT_X: &str = "0x1111111111111111111111111111111111111111";
pub const ACCOUNT_Y: &str = "0x2222222222222222222222222222222222222222";

pub fn addr(s: &str) -> Address {
    s.parse().unwrap()
}

/// `n` distinct lowercase addresses derived from `seed`
pub fn addresses(seed: u8, n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("0x{:02x}{:038x}", seed, i))
        .collect()
}

pub fn page_body(total: u64, items: Value) -> Value {
    json!({ "result": { "totalItems": total, "items": items } })
}

// === Indexer ===

#[derive(Clone)]
pub enum Reply {
    Body(Value),
    Status(u16),
}

/// Indexing API answering by path; unknown paths get a 404
#[derive(Default)]
pub struct ScriptedIndexer {
    routes: Mutex<HashMap<String, Reply>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
    /// Signalled when a gated request has arrived
    pub entered: Notify,
}

impl ScriptedIndexer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn route(&self, path: &str, body: Value) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), Reply::Body(body));
    }

    pub fn fail(&self, path: &str, status: u16) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), Reply::Status(status));
    }

    /// Hold requests for `path` until the returned handle is notified
    pub fn gate(&self, path: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(path.to_string(), gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|(p, _)| p).collect()
    }

    pub fn call_count(&self, path: &str) -> usize {
        self.paths().iter().filter(|p| *p == path).count()
    }
}

#[async_trait::async_trait]
impl IndexerApi for ScriptedIndexer {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, IndexerError> {
        self.calls.lock().unwrap().push((
            path.to_string(),
            query.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        ));

        let gate = self.gates.lock().unwrap().get(path).cloned();
        if let Some(gate) = gate {
            self.entered.notify_one();
            gate.notified().await;
        }

        let reply = self.routes.lock().unwrap().get(path).cloned();
        match reply {
            Some(Reply::Body(body)) => Ok(body),
            Some(Reply::Status(status)) => Err(IndexerError::Status {
                status,
                body: "scripted failure".into(),
            }),
            None => Err(IndexerError::Status {
                status: 404,
                body: format!("no route for {}", path),
            }),
        }
    }
}

// === Node ===

/// JSON-RPC node answering `eth_call` by (contract, selector) and a few
/// account-level methods by their first parameter
#[derive(Default)]
pub struct ScriptedNode {
    calls: Mutex<HashMap<(String, String), String>>,
    balances: Mutex<HashMap<String, String>>,
    transactions: Mutex<HashMap<String, Value>>,
    methods: Mutex<HashMap<String, Result<Value, RpcError>>>,
    pub requests: AtomicUsize,
}

impl ScriptedNode {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Return data for `selector` (e.g. "0x313ce567") called on `to`
    pub fn on_call(&self, to: &str, selector: &str, data: impl AsRef<[u8]>) {
        self.calls.lock().unwrap().insert(
            (to.to_lowercase(), selector.to_lowercase()),
            format!("0x{}", hex::encode(data)),
        );
    }

    pub fn on_balance(&self, account: &str, wei_hex: &str) {
        self.balances
            .lock()
            .unwrap()
            .insert(account.to_lowercase(), wei_hex.to_string());
    }

    pub fn on_transaction(&self, hash: &str, tx: Value) {
        self.transactions
            .lock()
            .unwrap()
            .insert(hash.to_lowercase(), tx);
    }

    pub fn on_method(&self, method: &str, reply: Result<Value, RpcError>) {
        self.methods
            .lock()
            .unwrap()
            .insert(method.to_string(), reply);
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

fn first_param_str(params: &Value) -> String {
    params[0].as_str().unwrap_or_default().to_lowercase()
}

#[async_trait::async_trait]
impl JsonRpc for ScriptedNode {
    async fn request(&self, _url: &str, method: &str, params: Value) -> Result<Value, RpcError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(reply) = self.methods.lock().unwrap().get(method).cloned() {
            return reply;
        }
        match method {
            "eth_call" => {
                let to = params[0]["to"].as_str().unwrap_or_default().to_lowercase();
                let data = params[0]["data"].as_str().unwrap_or_default();
                let selector = data.get(..10).unwrap_or(data).to_lowercase();
                self.calls
                    .lock()
                    .unwrap()
                    .get(&(to, selector))
                    .cloned()
                    .map(Value::String)
                    .ok_or_else(|| RpcError::Rpc {
                        code: -32000,
                        message: "execution reverted".into(),
                    })
            }
            "eth_getBalance" => Ok(Value::String(
                self.balances
                    .lock()
                    .unwrap()
                    .get(&first_param_str(&params))
                    .cloned()
                    .unwrap_or_else(|| "0x0".to_string()),
            )),
            "eth_getTransactionByHash" => Ok(self
                .transactions
                .lock()
                .unwrap()
                .get(&first_param_str(&params))
                .cloned()
                .unwrap_or(Value::Null)),
            other => Err(RpcError::Rpc {
                code: -32601,
                message: format!("method {} not found", other),
            }),
        }
    }
}

/// One 32-byte word holding `value`
pub fn word(value: u128) -> Vec<u8> {
    let mut out = vec![0u8; 16];
    out.extend_from_slice(&value.to_be_bytes());
    out
}

/// One 32-byte word holding an address
pub fn address_word(address: &str) -> Vec<u8> {
    let mut out = vec![0u8; 12];
    out.extend_from_slice(addr(address).as_slice());
    out
}

// === Wallet ===

/// Wallet backend with scripted activation and request answers
pub struct FakeWallet {
    kind: ConnectorKind,
    supported: Vec<u64>,
    activation: Mutex<Result<Activation, WalletError>>,
    authorized: bool,
    answers: Mutex<HashMap<String, Result<Value, WalletError>>>,
    requests: Mutex<Vec<(String, Value)>>,
    gate: Option<Arc<Notify>>,
    pub entered: Notify,
}

impl FakeWallet {
    pub fn new(kind: ConnectorKind, account: &str, chain_id: u64) -> Self {
        Self {
            kind,
            supported: vec![56, 97, 137],
            activation: Mutex::new(Ok(Activation {
                account: addr(account),
                chain_id,
            })),
            authorized: false,
            answers: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            gate: None,
            entered: Notify::new(),
        }
    }

    pub fn failing(kind: ConnectorKind, err: WalletError) -> Self {
        let wallet = Self::new(kind, ACCOUNT_X, 97);
        *wallet.activation.lock().unwrap() = Err(err);
        wallet
    }

    pub fn authorized(mut self) -> Self {
        self.authorized = true;
        self
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn answer(&self, method: &str, reply: Result<Value, WalletError>) {
        self.answers
            .lock()
            .unwrap()
            .insert(method.to_string(), reply);
    }

    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl WalletConnector for FakeWallet {
    fn kind(&self) -> ConnectorKind {
        self.kind
    }

    fn supported_chain_ids(&self) -> &[u64] {
        &self.supported
    }

    async fn is_authorized(&self) -> bool {
        self.authorized
    }

    async fn activate(&self) -> Result<Activation, WalletError> {
        if let Some(gate) = &self.gate {
            self.entered.notify_one();
            gate.notified().await;
        }
        self.activation.lock().unwrap().clone()
    }

    async fn deactivate(&self) {}

    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        self.requests
            .lock()
            .unwrap()
            .push((method.to_string(), params));
        self.answers
            .lock()
            .unwrap()
            .get(method)
            .cloned()
            .unwrap_or(Ok(Value::Null))
    }
}

// === HTTP ===

/// Serve canned HTTP responses in order (the last one repeats); returns the
/// endpoint URL and the request bodies received so far
pub async fn serve_canned(responses: Vec<(u16, String)>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let bodies = Arc::new(Mutex::new(Vec::new()));
    let seen = bodies.clone();

    tokio::spawn(async move {
        let mut served = 0usize;
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let body = read_request_body(&mut stream).await;
            seen.lock().unwrap().push(body);

            let (status, payload) = responses[served.min(responses.len() - 1)].clone();
            served += 1;
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason(status),
                payload.len(),
                payload
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    (url, bodies)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Status",
    }
}

async fn read_request_body(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 2048];
    loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return String::new(),
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
        let length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        let body_start = header_end + 4;
        if buf.len() >= body_start + length {
            return String::from_utf8_lossy(&buf[body_start..body_start + length]).into_owned();
        }
    }
}
