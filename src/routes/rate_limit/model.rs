use serde::{Deserialize, Serialize};

/// POST /rate-limit 请求体
/// 字段缺失属于契约内的 400 情形, 所以都是 Option, 由 handler 校验
#[derive(Debug, Deserialize)]
pub struct RateLimitRequest {
    pub action: Option<String>,
    pub identifier: Option<String>,
}

/// 检查动作响应
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub allowed: bool,
}

/// 剩余次数响应
#[derive(Debug, Serialize)]
pub struct RemainingResponse {
    pub hourly: u32,
    pub daily: u32,
}

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
