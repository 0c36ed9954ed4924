use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::errors::{Error, Result};

pub const MAINNET_API_URL: &str = "https://exchange.coinswitch.co";

/// 交易所配置：域名、公私钥、下单账户名
#[derive(Deserialize, Clone)]
pub struct ExchangeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub public_key: String,
    pub private_key: String,
    pub username: String,
}

fn default_base_url() -> String {
    MAINNET_API_URL.to_string()
}

// 私钥不进日志
impl std::fmt::Debug for ExchangeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeConfig")
            .field("base_url", &self.base_url)
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .field("username", &self.username)
            .finish()
    }
}

impl ExchangeConfig {
    pub fn new(
        public_key: impl Into<String>,
        private_key: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        ExchangeConfig {
            base_url: default_base_url(),
            public_key: public_key.into(),
            private_key: private_key.into(),
            username: username.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// 从 TOML 文件加载
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|err| Error::Config(format!("failed to read {}: {}", path.display(), err)))?;
        Self::from_toml(&contents)
            .map_err(|err| Error::Config(format!("failed to parse {}: {}", path.display(), err)))
    }

    pub fn from_toml(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// 从环境变量加载：COINSWITCH_PUBLIC_KEY / COINSWITCH_PRIVATE_KEY / COINSWITCH_USERNAME，
    /// COINSWITCH_BASE_URL 可选
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::Config(format!("{key} is not set")))
        };
        Ok(ExchangeConfig {
            base_url: lookup("COINSWITCH_BASE_URL")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(default_base_url),
            public_key: require("COINSWITCH_PUBLIC_KEY")?,
            private_key: require("COINSWITCH_PRIVATE_KEY")?,
            username: require("COINSWITCH_USERNAME")?,
        })
    }
}
