use serde::Deserialize;

use crate::common::MapLocation;

/// 附近搜索请求参数
#[derive(Debug, Clone)]
pub struct NearbyQuery {
    pub location: MapLocation,
    pub radius: f64,
    pub keyword: Option<String>,
    /// 按距离排序时提供方会忽略 radius
    pub rank_by_distance: bool,
}

/// 附近搜索返回的原始候选地点
#[derive(Debug, Clone)]
pub struct PlaceCandidate {
    pub place_id: String,
    pub name: String,
    pub location: MapLocation,
    pub types: Vec<String>,
    pub rating: Option<f64>,
    pub price_level: Option<u32>,
    pub open_now: Option<bool>,
}

/// 详情查询结果
#[derive(Debug, Clone, Default)]
pub struct PlaceDetails {
    pub name: Option<String>,
    pub location: Option<MapLocation>,
    pub formatted_address: Option<String>,
    pub rating: Option<f64>,
    pub price_level: Option<u32>,
    pub types: Vec<String>,
    /// None 表示提供方没有给出任何营业时间信息
    pub open_now: Option<bool>,
    pub business_status: Option<String>,
}

// ---- 线上格式 ----

#[derive(Debug, Deserialize)]
pub(crate) struct NearbySearchResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<WirePlaceSummary>,
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetailsResponse {
    pub status: String,
    pub result: Option<WirePlaceDetails>,
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WirePlaceSummary {
    pub place_id: Option<String>,
    pub name: Option<String>,
    pub geometry: Option<WireGeometry>,
    #[serde(default)]
    pub types: Vec<String>,
    pub rating: Option<f64>,
    pub price_level: Option<u32>,
    pub opening_hours: Option<WireOpeningHours>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WirePlaceDetails {
    pub name: Option<String>,
    pub geometry: Option<WireGeometry>,
    pub formatted_address: Option<String>,
    pub rating: Option<f64>,
    pub price_level: Option<u32>,
    #[serde(default)]
    pub types: Vec<String>,
    pub opening_hours: Option<WireOpeningHours>,
    pub current_opening_hours: Option<WireOpeningHours>,
    pub business_status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireGeometry {
    pub location: WireLatLng,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireLatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireOpeningHours {
    pub open_now: Option<bool>,
}

impl WirePlaceSummary {
    /// 缺少 place_id 或坐标的结果直接丢弃
    pub(crate) fn into_candidate(self) -> Option<PlaceCandidate> {
        let place_id = self.place_id?;
        let geometry = self.geometry?;
        Some(PlaceCandidate {
            place_id,
            name: self.name.unwrap_or_default(),
            location: MapLocation {
                latitude: geometry.location.lat,
                longitude: geometry.location.lng,
            },
            types: self.types,
            rating: self.rating,
            price_level: self.price_level,
            open_now: self.opening_hours.and_then(|hours| hours.open_now),
        })
    }
}

impl WirePlaceDetails {
    pub(crate) fn into_details(self) -> PlaceDetails {
        // current_opening_hours 优先于 opening_hours
        let open_now = self
            .current_opening_hours
            .as_ref()
            .and_then(|hours| hours.open_now)
            .or_else(|| self.opening_hours.as_ref().and_then(|hours| hours.open_now));

        PlaceDetails {
            name: self.name,
            location: self.geometry.map(|geometry| MapLocation {
                latitude: geometry.location.lat,
                longitude: geometry.location.lng,
            }),
            formatted_address: self.formatted_address,
            rating: self.rating,
            price_level: self.price_level,
            types: self.types,
            open_now,
            business_status: self.business_status,
        }
    }
}
