use async_trait::async_trait;
use ed25519_dalek::Signer;
use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Map, Value};
use std::fmt;
use std::io;
use tracing::{debug, error, instrument};

use crate::client::CoinSwitchClient;
use crate::errors::GatewayError;

/// 签名时间戳相对本地时钟回拨的秒数
pub const CLOCK_SKEW_SECS: i64 = 10;

pub const API_PREFIX: &str = "/api/v";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// 交易所网关：一次调用对应一次签名请求
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn call(
        &self,
        path: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Value, GatewayError>;
}

/// 非 ASCII 字符输出为 \uXXXX，与交易所服务端的签名串保持一致
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::new();
            for (k, v) in entries {
                sorted.insert(k.clone(), sort_keys(v));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

/// 规范化 JSON：key 按字典序排列，分隔符为 `,` 与 `:`，无空白
pub fn canonical_json(body: &Value) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, AsciiFormatter);
    sort_keys(body).serialize(&mut ser)?;
    // 输出只含 ASCII
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// 待签名串：timestamp + METHOD + path + 规范化 body（无 body 时为 {}）
pub fn signing_payload(
    timestamp: i64,
    method: Method,
    path: &str,
    body: Option<&Value>,
) -> Result<String, serde_json::Error> {
    let message = match body {
        Some(body) => canonical_json(body)?,
        None => canonical_json(&Value::Object(Map::new()))?,
    };
    Ok(format!("{}{}{}{}", timestamp, method.as_str(), path, message))
}

impl CoinSwitchClient {
    /// Ed25519 签名，hex 输出
    pub fn generate_signature(
        &self,
        timestamp: i64,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<String, serde_json::Error> {
        let payload = signing_payload(timestamp, method, path, body)?;
        Ok(self.sign(&payload))
    }

    fn sign(&self, message: &str) -> String {
        hex::encode(self.signing_key.sign(message.as_bytes()).to_bytes())
    }

    pub fn get_timestamp(&self) -> i64 {
        chrono::Utc::now().timestamp() - CLOCK_SKEW_SECS
    }

    /// 构建带签名头的请求（不发送）
    pub fn build_request(
        &self,
        timestamp: i64,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Request, GatewayError> {
        if !path.starts_with(API_PREFIX) {
            return Err(GatewayError::InvalidRequest(format!(
                "path must start with {API_PREFIX}: {path}"
            )));
        }
        let encode_err = |e: serde_json::Error| GatewayError::InvalidRequest(e.to_string());
        let sign = self
            .generate_signature(timestamp, method, path, body)
            .map_err(encode_err)?;

        let url = format!("{}{}", self.domain, path);
        let mut builder = self
            .http
            .request(method.into(), &url)
            .header("Content-Type", "application/json")
            .header("CSX-ACCESS-KEY", &self.api_key)
            .header("CSX-SIGNATURE", sign)
            .header("CSX-ACCESS-TIMESTAMP", timestamp.to_string());

        if method == Method::Post {
            let compact_body = match body {
                Some(body) => canonical_json(body),
                None => canonical_json(&Value::Object(Map::new())),
            }
            .map_err(encode_err)?;
            builder = builder.body(compact_body);
        }

        builder
            .build()
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))
    }

    /// 发送签名请求，200 且为 JSON 时返回解析结果，其余情况统一转为 GatewayError
    #[instrument(skip(self, body))]
    pub async fn call(
        &self,
        path: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Value, GatewayError> {
        let timestamp = self.get_timestamp();
        let request = self.build_request(timestamp, method, path, body)?;
        debug!(url = %request.url(), timestamp, "发送签名请求");

        let resp = self.http.execute(request).await.map_err(|e| {
            error!(error = %e, "请求交易所失败");
            GatewayError::Transport(e.to_string())
        })?;

        let status = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        debug!(status, len = text.len(), "收到交易所响应");

        if status != 200 {
            error!(status, "交易所返回非 200 状态码");
            return Err(GatewayError::Status { status, body: text });
        }

        serde_json::from_str::<Value>(&text).map_err(|_| {
            error!("交易所响应不是合法 JSON");
            GatewayError::InvalidResponse
        })
    }
}

#[async_trait]
impl Gateway for CoinSwitchClient {
    async fn call(
        &self,
        path: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Value, GatewayError> {
        CoinSwitchClient::call(self, path, method, body).await
    }
}
