// 缓存操作模块

pub mod quota;

pub use quota::QuotaCacheOperations;
