// 缓存数据模型模块

pub mod quota;

pub use quota::{CachedQuota, QuotaDecision};
