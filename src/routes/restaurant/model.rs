use serde::{Deserialize, Serialize};

use crate::search::types::{ClassifiedRestaurant, Filters};

/// POST /restaurants/search 请求体
#[derive(Debug, Deserialize)]
pub struct SearchRestaurantsRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: Option<f64>,
    pub keyword: Option<String>,
    /// 配额键, 由外部认证层提供的不透明标识
    pub identifier: String,
    #[serde(default)]
    pub filters: Option<Filters>,
}

/// 搜索响应
#[derive(Debug, Serialize)]
pub struct SearchRestaurantsResponse {
    pub restaurants: Vec<ClassifiedRestaurant>,
}
