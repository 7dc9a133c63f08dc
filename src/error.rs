use thiserror::Error;

#[derive(Error, Debug)]
pub enum RustemError {
    #[error("未知事件: {0}")]
    UnknownEvent(String),

    #[error("事件 {event} 格式错误: {reason}")]
    MalformedEvent { event: String, reason: String },

    #[error("配置错误: {0}")]
    Config(String),

    #[error("启动失败: {0}")]
    Launch(String),

    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON 解析错误: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML 解析错误: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

impl RustemError {
    pub(crate) fn malformed(event: &str, reason: impl Into<String>) -> Self {
        RustemError::MalformedEvent {
            event: event.to_string(),
            reason: reason.into(),
        }
    }
}

// Add conversion from anyhow::Error
impl From<anyhow::Error> for RustemError {
    fn from(err: anyhow::Error) -> Self {
        RustemError::Other(err.to_string())
    }
}

/// Result type for rustem crate
pub type Result<T> = std::result::Result<T, RustemError>;
