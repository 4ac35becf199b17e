use std::fmt;
use std::time::Duration;

/// 地点搜索提供方错误
#[derive(Debug)]
pub enum PlacesError {
    /// 网络层失败, 中止本次搜索
    Http(reqwest::Error),
    /// 凭证无效或请求被拒绝, 中止本次搜索
    Denied(String),
    /// 临时性状态(OVER_QUERY_LIMIT 等), 只跳过单个子请求
    Transient(String),
}

impl PlacesError {
    pub fn is_transient(&self) -> bool {
        matches!(self, PlacesError::Transient(_))
    }
}

impl fmt::Display for PlacesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacesError::Http(e) => write!(f, "provider http error: {}", e),
            PlacesError::Denied(status) => write!(f, "provider denied request: {}", status),
            PlacesError::Transient(status) => write!(f, "provider transient status: {}", status),
        }
    }
}

impl From<reqwest::Error> for PlacesError {
    fn from(e: reqwest::Error) -> Self {
        PlacesError::Http(e)
    }
}

/// 搜索编排错误
#[derive(Debug)]
pub enum SearchError {
    /// 配额耗尽, 附带距窗口重置的等待时长
    QuotaExceeded { retry_after: Duration },
    /// 配额存储访问失败
    Store(redis::RedisError),
    /// 提供方硬失败
    Provider(PlacesError),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::QuotaExceeded { retry_after } => {
                write!(f, "quota exceeded, retry after {}s", retry_after.as_secs())
            }
            SearchError::Store(e) => write!(f, "quota store error: {}", e),
            SearchError::Provider(e) => write!(f, "provider failure: {}", e),
        }
    }
}

impl From<redis::RedisError> for SearchError {
    fn from(e: redis::RedisError) -> Self {
        SearchError::Store(e)
    }
}

impl From<PlacesError> for SearchError {
    fn from(e: PlacesError) -> Self {
        SearchError::Provider(e)
    }
}
