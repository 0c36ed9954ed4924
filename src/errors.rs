use thiserror::Error;

/// 交易所调用失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// 非 200 状态码
    #[error("Error {status}: {body}")]
    Status { status: u16, body: String },

    /// 200 但响应体不是 JSON
    #[error("invalid response")]
    InvalidResponse,

    /// 请求无法构建（路径非法、body 无法序列化）
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// 连接失败、超时等传输层错误
    #[error("{0}")]
    Transport(String),
}

/// 入参校验失败，不会触达交易所
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing withdrawal parameters")]
    MissingWithdrawalParams,

    #[error("Invalid amount format, must be a number")]
    InvalidAmount,

    #[error("Missing order parameters")]
    MissingOrderParams,

    #[error("Order ID is required")]
    MissingOrderId,

    #[error("Invalid status filter: {0}")]
    InvalidStatus(String),

    #[error("Invalid source filter: {0}")]
    InvalidSource(String),

    #[error("Invalid side: {0}")]
    InvalidSide(String),

    #[error("Invalid JSON body: {0}")]
    InvalidBody(String),
}

/// 本地订单表读写失败
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt row for order {order_id}: {reason}")]
    Corrupt { order_id: String, reason: String },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// 交易所返回了无法解析的订单数据
    #[error("invalid order payload: {0}")]
    Decode(String),

    #[error("Private key parse error: {0}")]
    PrivateKeyParse(String),

    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    pub fn decode(msg: impl Into<String>) -> Self {
        Error::Decode(msg.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
