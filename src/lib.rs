use std::sync::Arc;

use config::Config;

pub mod cache;
pub mod common;
pub mod config;
pub mod error;
pub mod limiter;
pub mod middleware;
pub mod places;
pub mod routes;
pub mod search;
pub mod utils;

use limiter::RateLimiter;
use places::GooglePlacesClient;
use search::SearchOrchestrator;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub limiter: Arc<RateLimiter>,
    pub search: Arc<SearchOrchestrator<GooglePlacesClient>>,
}
