use std::collections::HashMap;
use std::sync::Mutex;

use crate::cache::models::quota::{CachedQuota, QuotaDecision};

/// 进程内配额存储
/// Redis 不可用时的降级后端, 计数只对当前进程有效
#[derive(Default)]
pub struct MemoryQuotaStore {
    records: Mutex<HashMap<String, CachedQuota>>,
}

impl MemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 语义与存储端脚本一致: 窗口过期重置, 达到上限拒绝且不递增
    pub fn consume(&self, key: &str, max_count: u32, window_secs: u64, now: i64) -> QuotaDecision {
        let mut records = self.records.lock().unwrap();
        let record = records.entry(key.to_string()).or_insert_with(|| CachedQuota {
            key: key.to_string(),
            count: 0,
            window_start: now,
        });

        if now - record.window_start >= window_secs as i64 {
            record.count = 0;
            record.window_start = now;
        }

        let reset_at = record.window_start + window_secs as i64;
        if record.count >= max_count {
            return QuotaDecision {
                allowed: false,
                remaining: 0,
                reset_at,
            };
        }

        record.count += 1;
        QuotaDecision {
            allowed: true,
            remaining: max_count - record.count,
            reset_at,
        }
    }

    /// 只读查询剩余次数
    pub fn remaining(&self, key: &str, max_count: u32, window_secs: u64, now: i64) -> u32 {
        let records = self.records.lock().unwrap();
        match records.get(key) {
            Some(record) if now - record.window_start < window_secs as i64 => {
                max_count.saturating_sub(record.count)
            }
            _ => max_count,
        }
    }
}
