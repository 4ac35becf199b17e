// 地点搜索提供方模块
// 封装第三方 nearby-search / place-details HTTP API

pub mod client;
pub mod models;

pub use client::GooglePlacesClient;
pub use models::{NearbyQuery, PlaceCandidate, PlaceDetails};

use async_trait::async_trait;

use crate::error::PlacesError;

/// 地点搜索提供方接口
/// 生产实现是 HTTP 客户端, 测试以桩实现替换
#[async_trait]
pub trait PlaceSearchProvider: Send + Sync {
    /// 附近搜索; ZERO_RESULTS 返回空列表而不是错误
    async fn nearby_search(&self, query: &NearbyQuery) -> Result<Vec<PlaceCandidate>, PlacesError>;

    /// 按地点 id 拉取详情
    async fn get_details(&self, place_id: &str, fields: &[&str])
    -> Result<PlaceDetails, PlacesError>;
}
