use ed25519_dalek::SigningKey;

use crate::config::ExchangeConfig;
use crate::errors::{Error, Result};

pub struct CoinSwitchClient {
    pub api_key: String,
    pub username: String,
    pub domain: String,
    pub(crate) signing_key: SigningKey,
    pub(crate) http: reqwest::Client,
}

impl std::fmt::Debug for CoinSwitchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoinSwitchClient")
            .field("api_key", &self.api_key)
            .field("username", &self.username)
            .field("domain", &self.domain)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

impl CoinSwitchClient {
    pub fn new(
        api_key: impl Into<String>,
        secret_key: &str,
        username: impl Into<String>,
        domain: impl Into<String>,
    ) -> Result<Self> {
        Ok(CoinSwitchClient {
            api_key: api_key.into(),
            username: username.into(),
            domain: domain.into(),
            signing_key: parse_signing_key(secret_key)?,
            http: reqwest::Client::new(),
        })
    }

    pub fn from_config(config: &ExchangeConfig) -> Result<Self> {
        Self::new(
            config.public_key.clone(),
            &config.private_key,
            config.username.clone(),
            config.base_url.clone(),
        )
    }

    /// 复用外部构造的 reqwest::Client（自定义超时、代理等）
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }
}

/// 私钥为 32 字节 Ed25519 种子的 hex 编码
fn parse_signing_key(secret_key: &str) -> Result<SigningKey> {
    let bytes = hex::decode(secret_key.trim())
        .map_err(|e| Error::PrivateKeyParse(e.to_string()))?;
    let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        Error::PrivateKeyParse(format!("expected 32 bytes, got {}", bytes.len()))
    })?;
    Ok(SigningKey::from_bytes(&seed))
}
