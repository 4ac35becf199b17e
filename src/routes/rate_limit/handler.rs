use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::AppState;
use crate::limiter::{GLOBAL_DAILY_IDENTITY, LimitTier};

use super::model::{CheckResponse, ErrorResponse, RateLimitRequest, RemainingResponse};

/// 配额检查与查询接口
/// 响应格式是对外契约, 不走统一的 ApiResponse 包装
#[axum::debug_handler]
pub async fn check(State(state): State<AppState>, Json(req): Json<RateLimitRequest>) -> Response {
    let Some(action) = req.action else {
        return bad_request("Missing action");
    };
    let Some(identifier) = req.identifier else {
        return bad_request("Missing identifier");
    };

    match action.as_str() {
        "checkHourly" => {
            match state
                .limiter
                .check_and_consume(LimitTier::Hourly, &identifier)
                .await
            {
                Ok(decision) => check_response(decision.allowed),
                Err(e) => store_error(e),
            }
        }
        // 天级配额全局共享, identifier 只参与校验和日志
        "checkDaily" => {
            tracing::debug!(%identifier, "daily quota check");
            match state
                .limiter
                .check_and_consume(LimitTier::Daily, GLOBAL_DAILY_IDENTITY)
                .await
            {
                Ok(decision) => check_response(decision.allowed),
                Err(e) => store_error(e),
            }
        }
        "getRemainingRequests" => {
            let hourly = state.limiter.remaining(LimitTier::Hourly, &identifier).await;
            let daily = state
                .limiter
                .remaining(LimitTier::Daily, GLOBAL_DAILY_IDENTITY)
                .await;
            match (hourly, daily) {
                (Ok(hourly), Ok(daily)) => {
                    (StatusCode::OK, Json(RemainingResponse { hourly, daily })).into_response()
                }
                (Err(e), _) | (_, Err(e)) => store_error(e),
            }
        }
        _ => bad_request("Invalid action"),
    }
}

fn check_response(allowed: bool) -> Response {
    (StatusCode::OK, Json(CheckResponse { allowed })).into_response()
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
            details: None,
        }),
    )
        .into_response()
}

fn store_error(e: redis::RedisError) -> Response {
    tracing::error!("Quota store failure: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error".to_string(),
            details: Some(e.to_string()),
        }),
    )
        .into_response()
}
