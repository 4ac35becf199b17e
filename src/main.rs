use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use backend::{
    AppState,
    config::Config,
    limiter::{MemoryQuotaStore, QuotaBackend, RateLimiter},
    middleware::log_errors,
    places::GooglePlacesClient,
    routes,
    search::{SearchOptions, SearchOrchestrator},
};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    // 设置配额存储, Redis 不可用时降级为进程内计数继续服务
    let backend = match redis::Client::open(config.redis_url.clone()) {
        Ok(client) => match client.get_multiplexed_async_connection().await {
            Ok(_) => QuotaBackend::Redis(Arc::new(client)),
            Err(e) => {
                tracing::error!(
                    "Quota store unavailable, falling back to in-memory limits: {}",
                    e
                );
                QuotaBackend::Memory(MemoryQuotaStore::new())
            }
        },
        Err(e) => {
            tracing::error!(
                "Failed to create Redis client, falling back to in-memory limits: {}",
                e
            );
            QuotaBackend::Memory(MemoryQuotaStore::new())
        }
    };

    // 设置限流器和搜索编排器
    let limiter = Arc::new(RateLimiter::new(backend, &config));
    let places = GooglePlacesClient::new(&config);
    let search = Arc::new(SearchOrchestrator::new(
        places,
        limiter.clone(),
        SearchOptions::from_config(&config),
    ));

    // 设置应用状态
    let state = AppState {
        config: config.clone(),
        limiter,
        search,
    };

    // 创建基础路由
    let router = Router::new().nest(
        &config.api_base_uri.clone(),
        Router::new()
            .route("/ping", get(routes::health::ping))
            .route("/rate-limit", post(routes::rate_limit::check))
            .route("/restaurants/search", post(routes::restaurant::search)),
    );

    // 添加日志中间件
    let router = router.layer(axum::middleware::from_fn(log_errors));

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        // 设置开发环境的CORS，允许所有来源
        let cors = CorsLayer::permissive();
        router.layer(cors)
    };

    // 添加应用状态
    let app = router.with_state(state.clone());

    // 启动服务器
    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app,
    )
    .await
    .expect("Failed to start server");
}
