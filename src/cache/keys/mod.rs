/// 缓存键模块
/// 提供各种缓存键生成函数

// 配额缓存键模块
pub mod quota_keys;

// 重新导出常用的键生成函数
pub use quota_keys::{daily_quota_key, hourly_quota_key};
