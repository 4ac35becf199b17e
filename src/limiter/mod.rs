// 速率限制模块
// 小时级按调用方标识、天级按全局标识双层计数, 两层都放行才允许搜索

mod memory;

pub use memory::MemoryQuotaStore;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use redis::Client as RedisClient;

use crate::cache::keys::{daily_quota_key, hourly_quota_key};
use crate::cache::models::quota::QuotaDecision;
use crate::cache::operations::quota::QuotaCacheOperations;
use crate::config::Config;
use crate::error::SearchError;

/// 天级全局配额共用的固定标识
pub const GLOBAL_DAILY_IDENTITY: &str = "global";

/// 配额层级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitTier {
    /// 按调用方标识的小时级配额
    Hourly,
    /// 全局共享的天级配额, 保护对提供方的总用量
    Daily,
}

impl LimitTier {
    pub fn window_secs(&self) -> u64 {
        match self {
            LimitTier::Hourly => 3600,
            LimitTier::Daily => 86400,
        }
    }

    fn quota_key(&self, identity: &str) -> String {
        match self {
            LimitTier::Hourly => hourly_quota_key(identity),
            LimitTier::Daily => daily_quota_key(identity),
        }
    }
}

/// 配额存储后端
/// Redis 为正式后端, 多进程部署共享计数; 进程内后端只用于初始化失败后的降级
pub enum QuotaBackend {
    Redis(Arc<RedisClient>),
    Memory(MemoryQuotaStore),
}

/// 速率限制组件
/// 进程启动时构造一次, 以 Arc 注入各调用方
pub struct RateLimiter {
    backend: QuotaBackend,
    hourly_limit: u32,
    daily_limit: u32,
}

impl RateLimiter {
    pub fn new(backend: QuotaBackend, config: &Config) -> Self {
        Self {
            backend,
            hourly_limit: config.hourly_limit,
            daily_limit: config.daily_limit,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match &self.backend {
            QuotaBackend::Redis(_) => "redis",
            QuotaBackend::Memory(_) => "memory",
        }
    }

    fn max_count(&self, tier: LimitTier) -> u32 {
        match tier {
            LimitTier::Hourly => self.hourly_limit,
            LimitTier::Daily => self.daily_limit,
        }
    }

    /// 消耗一次配额
    pub async fn check_and_consume(
        &self,
        tier: LimitTier,
        identity: &str,
    ) -> Result<QuotaDecision, redis::RedisError> {
        self.consume_at(tier, identity, Utc::now().timestamp()).await
    }

    /// 以显式时间消耗配额, 测试用它推进时钟
    pub async fn consume_at(
        &self,
        tier: LimitTier,
        identity: &str,
        now: i64,
    ) -> Result<QuotaDecision, redis::RedisError> {
        let key = tier.quota_key(identity);
        let max_count = self.max_count(tier);
        match &self.backend {
            QuotaBackend::Redis(redis) => {
                QuotaCacheOperations::atomic_consume(redis, &key, max_count, tier.window_secs(), now)
                    .await
            }
            QuotaBackend::Memory(store) => {
                Ok(store.consume(&key, max_count, tier.window_secs(), now))
            }
        }
    }

    /// 只读查询剩余次数, 不消耗配额
    pub async fn remaining(
        &self,
        tier: LimitTier,
        identity: &str,
    ) -> Result<u32, redis::RedisError> {
        let now = Utc::now().timestamp();
        let key = tier.quota_key(identity);
        let max_count = self.max_count(tier);
        match &self.backend {
            QuotaBackend::Redis(redis) => {
                match QuotaCacheOperations::get_quota(redis, &key).await? {
                    Some(record) if now - record.window_start < tier.window_secs() as i64 => {
                        Ok(max_count.saturating_sub(record.count))
                    }
                    _ => Ok(max_count),
                }
            }
            QuotaBackend::Memory(store) => {
                Ok(store.remaining(&key, max_count, tier.window_secs(), now))
            }
        }
    }

    /// 搜索放行判定: 小时级与天级同时放行才允许
    /// 任一层拒绝则返回 QuotaExceeded, 等待时长取拒绝层的窗口边界
    pub async fn authorize_search(&self, identity: &str) -> Result<(), SearchError> {
        let now = Utc::now().timestamp();

        let hourly = self.consume_at(LimitTier::Hourly, identity, now).await?;
        if !hourly.allowed {
            return Err(SearchError::QuotaExceeded {
                retry_after: Duration::from_secs((hourly.reset_at - now).max(0) as u64),
            });
        }

        let daily = self
            .consume_at(LimitTier::Daily, GLOBAL_DAILY_IDENTITY, now)
            .await?;
        if !daily.allowed {
            return Err(SearchError::QuotaExceeded {
                retry_after: Duration::from_secs((daily.reset_at - now).max(0) as u64),
            });
        }

        Ok(())
    }
}
