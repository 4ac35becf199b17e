use serde::{Deserialize, Serialize};

/// 配额计数缓存数据模型
/// 每个 (层级, 标识) 组合一条记录, 窗口过期后由 TTL 回收
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CachedQuota {
    pub key: String,
    pub count: u32,
    pub window_start: i64, // Unix timestamp
}

/// 单次消耗的判定结果
#[derive(Debug, Clone, Copy)]
pub struct QuotaDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: i64, // Unix timestamp
}
