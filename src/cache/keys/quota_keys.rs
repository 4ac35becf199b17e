/// 小时级配额键前缀
const HOURLY_QUOTA_PREFIX: &str = "rate_limit:hourly:";

/// 天级配额键前缀
const DAILY_QUOTA_PREFIX: &str = "rate_limit:daily:";

/// 生成小时级配额键
pub fn hourly_quota_key(identity: &str) -> String {
    format!("{}{}", HOURLY_QUOTA_PREFIX, identity)
}

/// 生成天级配额键
pub fn daily_quota_key(identity: &str) -> String {
    format!("{}{}", DAILY_QUOTA_PREFIX, identity)
}
