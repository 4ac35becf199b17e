use std::collections::HashMap;
use std::sync::Mutex;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::AppState;
use crate::common::MapLocation;
use crate::error::SearchError;
use crate::search::types::{SearchOutcome, SearchRequest};
use crate::utils::{error_codes, error_to_api_response, success_to_api_response};

use super::model::{SearchRestaurantsRequest, SearchRestaurantsResponse};

#[axum::debug_handler]
pub async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchRestaurantsRequest>,
) -> impl IntoResponse {
    let radius = req
        .radius
        .unwrap_or(state.config.search_radius)
        .min(state.config.max_search_radius);

    let request = SearchRequest {
        location: MapLocation {
            latitude: req.latitude,
            longitude: req.longitude,
        },
        radius,
        keyword: req.keyword.clone(),
    };

    // 流式回调按 id 覆盖, 与编排器合并重发的契约对应
    let collected = Mutex::new(HashMap::new());
    let outcome = state
        .search
        .search(&request, &req.identifier, |restaurant| {
            collected
                .lock()
                .unwrap()
                .insert(restaurant.id.clone(), restaurant);
        })
        .await;

    match outcome {
        Ok(SearchOutcome::AlreadyInProgress) => (
            StatusCode::OK,
            error_to_api_response(error_codes::SEARCH_BUSY, "已有搜索在进行中".to_string()),
        ),
        Ok(SearchOutcome::Completed) => {
            let filters = req.filters.unwrap_or_default();
            let restaurants = collected
                .into_inner()
                .unwrap()
                .into_values()
                .filter(|restaurant| filters.matches(restaurant))
                .collect::<Vec<_>>();
            (
                StatusCode::OK,
                success_to_api_response(SearchRestaurantsResponse { restaurants }),
            )
        }
        Err(SearchError::QuotaExceeded { retry_after }) => (
            StatusCode::OK,
            error_to_api_response(
                error_codes::RATE_LIMIT,
                format!("请求过于频繁，请在{}秒后重试", retry_after.as_secs()),
            ),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}
