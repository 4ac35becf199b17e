use std::env;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub redis_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub places_api_key: String,
    pub places_base_url: String,
    pub search_radius: f64,
    pub max_search_radius: f64,
    pub hourly_limit: u32,
    pub daily_limit: u32,
    pub search_strategy: String,
    pub max_results: usize,
    pub keyword_batch: usize,
    pub details_batch: usize,
    pub batch_delay_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        Ok(Config {
            redis_url: env::var("REDIS_URL")?,
            server_host: env::var("SERVER_HOST")?,
            server_port: env::var("SERVER_PORT")?.parse().unwrap_or(3000),
            api_base_uri: env::var("API_BASE_URI").unwrap_or_else(|_| "/api".to_string()),
            places_api_key: env::var("PLACES_API_KEY")?,
            places_base_url: env::var("PLACES_BASE_URL")
                .unwrap_or_else(|_| "https://maps.googleapis.com/maps/api/place".to_string()),
            search_radius: parse_or("SEARCH_RADIUS", 1500.0),
            max_search_radius: parse_or("MAX_SEARCH_RADIUS", 5000.0),
            hourly_limit: parse_or("RATE_LIMIT_HOURLY", 100),
            daily_limit: parse_or("RATE_LIMIT_DAILY", 1000),
            search_strategy: env::var("SEARCH_STRATEGY").unwrap_or_else(|_| "keywords".to_string()),
            max_results: parse_or("SEARCH_MAX_RESULTS", 20),
            keyword_batch: parse_or("SEARCH_KEYWORD_BATCH", 3),
            details_batch: parse_or("SEARCH_DETAILS_BATCH", 3),
            batch_delay_ms: parse_or("SEARCH_BATCH_DELAY_MS", 200),
        })
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
