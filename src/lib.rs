pub mod client;
pub mod config;
pub mod errors;
pub mod http;
pub mod orders;
pub mod restful;
pub mod service;
pub mod utils;

pub use client::CoinSwitchClient;
pub use config::{ExchangeConfig, MAINNET_API_URL};
pub use errors::{Error, GatewayError, StorageError, ValidationError};
pub use orders::{
    MemoryOrderStore, Order, OrderFilter, OrderReconciler, OrderStore, Origin, ReconcileReport,
    Side, SqliteOrderStore, Status,
};
pub use restful::account::AccountApi;
pub use restful::models::{PlaceOrderRequest, RemoteOrder, WithdrawRequest};
pub use restful::sign::{canonical_json, signing_payload, Gateway, Method};
pub use restful::trading::TradingApi;
pub use service::{Dashboard, Reply};
