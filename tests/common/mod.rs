#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;

use coinswitch_rs::CoinSwitchClient;

// RFC 8032 test vector 1
pub const SEED: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
pub const PUBLIC_KEY: &str = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Recorded {
    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}

#[derive(Default)]
struct ExchangeState {
    responses: Mutex<VecDeque<(u16, String)>>,
    requests: Mutex<Vec<Recorded>>,
}

/// 进程内假交易所：按顺序返回预设响应，记录收到的请求
pub struct FakeExchange {
    pub addr: SocketAddr,
    state: Arc<ExchangeState>,
}

async fn handle(
    State(state): State<Arc<ExchangeState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.requests.lock().push(Recorded {
        method,
        path_and_query: uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_default(),
        headers,
        body,
    });
    let (status, text) = state
        .responses
        .lock()
        .pop_front()
        .unwrap_or((200, "{}".to_string()));
    (StatusCode::from_u16(status).unwrap(), text).into_response()
}

impl FakeExchange {
    pub async fn start() -> Self {
        let state = Arc::new(ExchangeState::default());
        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        FakeExchange { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn respond(&self, status: u16, body: impl Into<String>) -> &Self {
        self.state.responses.lock().push_back((status, body.into()));
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().clone()
    }

    pub fn client(&self) -> CoinSwitchClient {
        CoinSwitchClient::new(PUBLIC_KEY, SEED, "trader", self.url()).unwrap()
    }
}
