// ==========================================
// 车间停机工时核算 - 推理服务错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类: 瞬时错误(可重试) / 永久错误(直接切换备用服务)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorClass {
    /// 超时 / 连接中断 / 限流 / 服务繁忙
    Transient,
    /// 请求无效 / 鉴权失败 / 参数错误
    Permanent,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorClass::Transient => write!(f, "TRANSIENT"),
            ErrorClass::Permanent => write!(f, "PERMANENT"),
        }
    }
}

/// 推理服务调用错误
#[derive(Error, Debug)]
pub enum ReasoningError {
    // ===== 瞬时错误 =====
    #[error("推理服务调用超时: {0}")]
    Timeout(String),

    #[error("推理服务连接失败: {0}")]
    Connection(String),

    #[error("推理服务限流: status={status}, {message}")]
    RateLimited { status: u16, message: String },

    #[error("推理服务繁忙: status={status}, {message}")]
    ServerBusy { status: u16, message: String },

    // ===== 永久错误 =====
    #[error("请求无效: {0}")]
    BadRequest(String),

    #[error("鉴权失败: {0}")]
    Unauthorized(String),

    #[error("参数无效: {0}")]
    InvalidParameter(String),

    #[error("响应格式错误: {0}")]
    MalformedResponse(String),

    #[error("HTTP 错误: status={status}, {message}")]
    Http { status: u16, message: String },
}

impl ReasoningError {
    /// 错误分类
    pub fn class(&self) -> ErrorClass {
        match self {
            ReasoningError::Timeout(_)
            | ReasoningError::Connection(_)
            | ReasoningError::RateLimited { .. }
            | ReasoningError::ServerBusy { .. } => ErrorClass::Transient,
            ReasoningError::BadRequest(_)
            | ReasoningError::Unauthorized(_)
            | ReasoningError::InvalidParameter(_)
            | ReasoningError::MalformedResponse(_) => ErrorClass::Permanent,
            ReasoningError::Http { status, .. } => {
                if *status >= 500 {
                    ErrorClass::Transient
                } else {
                    ErrorClass::Permanent
                }
            }
        }
    }

    /// 根据 HTTP 状态码构造错误
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = truncate(body, 300);
        match status {
            400 if looks_like_invalid_parameter(body) => ReasoningError::InvalidParameter(message),
            400 => ReasoningError::BadRequest(message),
            401 | 403 => ReasoningError::Unauthorized(message),
            404 | 422 => ReasoningError::InvalidParameter(message),
            408 => ReasoningError::Timeout(message),
            429 => ReasoningError::RateLimited { status, message },
            500 | 502 | 503 | 504 | 529 => ReasoningError::ServerBusy { status, message },
            _ => ReasoningError::Http { status, message },
        }
    }
}

impl From<reqwest::Error> for ReasoningError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ReasoningError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            ReasoningError::from_status(status.as_u16(), &err.to_string())
        } else if err.is_decode() {
            ReasoningError::MalformedResponse(err.to_string())
        } else if err.is_builder() {
            ReasoningError::BadRequest(err.to_string())
        } else {
            // 连接建立失败 / 连接被重置 / 请求发送中断
            ReasoningError::Connection(err.to_string())
        }
    }
}

fn looks_like_invalid_parameter(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    lower.contains("invalid_parameter") || lower.contains("invalid parameter")
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_chars).collect();
        out.push('…');
        out
    }
}
