use std::sync::Arc;

use redis::{AsyncCommands, Client as RedisClient};

use crate::cache::models::quota::{CachedQuota, QuotaDecision};

/// 服务端脚本: 读取-判定-递增在一次往返内原子完成
/// 窗口过期即重置计数; 达到上限时拒绝且不递增
const CONSUME_SCRIPT: &str = r#"
local now = tonumber(ARGV[1])
local max_count = tonumber(ARGV[2])
local window = tonumber(ARGV[3])

local count = 0
local window_start = now
local raw = redis.call('GET', KEYS[1])
if raw then
    local record = cjson.decode(raw)
    count = tonumber(record['count'])
    window_start = tonumber(record['window_start'])
    if now - window_start >= window then
        count = 0
        window_start = now
    end
end

local reset_at = window_start + window
if count >= max_count then
    return {0, 0, reset_at}
end

count = count + 1
local ttl = reset_at - now
if ttl < 1 then
    ttl = 1
end
redis.call('SET', KEYS[1],
    cjson.encode({key=KEYS[1], count=count, window_start=window_start}),
    'EX', ttl)
return {1, max_count - count, reset_at}
"#;

/// 配额缓存操作
pub struct QuotaCacheOperations;

impl QuotaCacheOperations {
    /// 消耗一次配额
    /// 同一键上的并发调用由脚本串行化, 计数不会超过上限
    pub async fn atomic_consume(
        redis: &Arc<RedisClient>,
        key: &str,
        max_count: u32,
        window_secs: u64,
        now: i64,
    ) -> Result<QuotaDecision, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let script = redis::Script::new(CONSUME_SCRIPT);
        let (allowed, remaining, reset_at): (i64, i64, i64) = script
            .key(key)
            .arg(now)
            .arg(max_count)
            .arg(window_secs)
            .invoke_async(&mut conn)
            .await?;

        Ok(QuotaDecision {
            allowed: allowed == 1,
            remaining: remaining.max(0) as u32,
            reset_at,
        })
    }

    /// 读取配额记录, 不修改任何状态
    pub async fn get_quota(
        redis: &Arc<RedisClient>,
        key: &str,
    ) -> Result<Option<CachedQuota>, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let result: Option<String> = conn.get(key).await?;

        match result {
            Some(json) => {
                let cached_quota = serde_json::from_str(&json).map_err(|e| {
                    redis::RedisError::from((redis::ErrorKind::IoError, "反序列化错误", e.to_string()))
                })?;
                Ok(Some(cached_quota))
            }
            None => Ok(None),
        }
    }
}
