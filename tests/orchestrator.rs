//! 搜索编排器集成测试: 单飞保护、去重合并、部分失败、硬失败复位、取消

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use backend::common::MapLocation;
use backend::config::Config;
use backend::error::{PlacesError, SearchError};
use backend::limiter::{LimitTier, MemoryQuotaStore, QuotaBackend, RateLimiter};
use backend::places::{NearbyQuery, PlaceCandidate, PlaceDetails, PlaceSearchProvider};
use backend::search::types::{ClassifiedRestaurant, SearchOutcome, SearchRequest};
use backend::search::{SearchOptions, SearchOrchestrator};

fn test_config(hourly_limit: u32, daily_limit: u32) -> Config {
    Config {
        redis_url: "redis://localhost".into(),
        server_host: "127.0.0.1".into(),
        server_port: 3000,
        api_base_uri: "/api".into(),
        places_api_key: "test-key".into(),
        places_base_url: "http://localhost".into(),
        search_radius: 1500.0,
        max_search_radius: 5000.0,
        hourly_limit,
        daily_limit,
        search_strategy: "keywords".into(),
        max_results: 20,
        keyword_batch: 3,
        details_batch: 3,
        batch_delay_ms: 0,
    }
}

fn candidate(id: &str, name: &str, place_types: &[&str]) -> PlaceCandidate {
    PlaceCandidate {
        place_id: id.to_string(),
        name: name.to_string(),
        location: MapLocation {
            latitude: 40.7128,
            longitude: -74.0060,
        },
        types: place_types.iter().map(|value| value.to_string()).collect(),
        rating: Some(4.2),
        price_level: Some(2),
        open_now: Some(true),
    }
}

#[derive(Default)]
struct MockProvider {
    nearby_calls: Arc<AtomicUsize>,
    details_calls: Arc<AtomicUsize>,
    places: Vec<PlaceCandidate>,
    transient_keywords: Vec<String>,
    denied: bool,
    delay: Option<Duration>,
}

#[async_trait]
impl PlaceSearchProvider for MockProvider {
    async fn nearby_search(&self, query: &NearbyQuery) -> Result<Vec<PlaceCandidate>, PlacesError> {
        self.nearby_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.denied {
            return Err(PlacesError::Denied("REQUEST_DENIED".to_string()));
        }
        if let Some(keyword) = &query.keyword {
            if self.transient_keywords.contains(keyword) {
                return Err(PlacesError::Transient("UNKNOWN_ERROR".to_string()));
            }
        }
        Ok(self.places.clone())
    }

    async fn get_details(
        &self,
        place_id: &str,
        _fields: &[&str],
    ) -> Result<PlaceDetails, PlacesError> {
        self.details_calls.fetch_add(1, Ordering::SeqCst);
        let known = self.places.iter().find(|place| place.place_id == place_id);
        Ok(PlaceDetails {
            name: known.map(|place| place.name.clone()),
            location: known.map(|place| place.location),
            formatted_address: Some("1 Test St".to_string()),
            rating: known.and_then(|place| place.rating),
            price_level: known.and_then(|place| place.price_level),
            types: known.map(|place| place.types.clone()).unwrap_or_default(),
            open_now: Some(true),
            business_status: Some("OPERATIONAL".to_string()),
        })
    }
}

type Collected = Arc<Mutex<HashMap<String, ClassifiedRestaurant>>>;

fn fixture(
    provider: MockProvider,
    hourly_limit: u32,
    daily_limit: u32,
) -> (Arc<SearchOrchestrator<MockProvider>>, Arc<RateLimiter>) {
    let config = test_config(hourly_limit, daily_limit);
    let limiter = Arc::new(RateLimiter::new(
        QuotaBackend::Memory(MemoryQuotaStore::new()),
        &config,
    ));
    let orchestrator = Arc::new(SearchOrchestrator::new(
        provider,
        limiter.clone(),
        SearchOptions::from_config(&config),
    ));
    (orchestrator, limiter)
}

fn request() -> SearchRequest {
    SearchRequest {
        location: MapLocation {
            latitude: 40.7128,
            longitude: -74.0060,
        },
        radius: 1500.0,
        keyword: None,
    }
}

fn collector(collected: Collected) -> impl Fn(ClassifiedRestaurant) + Send + Sync {
    move |restaurant| {
        collected
            .lock()
            .unwrap()
            .insert(restaurant.id.clone(), restaurant);
    }
}

#[tokio::test]
async fn keyword_sweep_emits_classified_results() {
    let provider = MockProvider {
        places: vec![candidate("p1", "Luigi Pizza", &["restaurant"])],
        ..MockProvider::default()
    };
    let nearby_calls = provider.nearby_calls.clone();
    let details_calls = provider.details_calls.clone();
    let (orchestrator, _) = fixture(provider, 10, 100);

    let collected: Collected = Arc::default();
    let emits = Arc::new(AtomicUsize::new(0));
    let emits_in_callback = emits.clone();
    let sink = collector(collected.clone());
    let outcome = orchestrator
        .search(&request(), "u1", move |restaurant| {
            emits_in_callback.fetch_add(1, Ordering::SeqCst);
            sink(restaurant);
        })
        .await
        .unwrap();

    assert_eq!(outcome, SearchOutcome::Completed);
    // 8 个菜系关键词各查询一次
    assert_eq!(nearby_calls.load(Ordering::SeqCst), 8);
    assert_eq!(details_calls.load(Ordering::SeqCst), 8);
    // 同一地点被重复发现 8 次, 回调 8 次但结果集只有一条
    assert_eq!(emits.load(Ordering::SeqCst), 8);

    let collected = collected.lock().unwrap();
    assert_eq!(collected.len(), 1);
    let luigi = &collected["p1"];
    assert_eq!(luigi.cuisine, vec!["Italian"]);
    assert_eq!(luigi.address, "1 Test St");
    assert!(luigi.is_open);
}

#[tokio::test]
async fn concurrent_search_is_single_flight() {
    let provider = MockProvider {
        places: vec![candidate("p1", "Luigi Pizza", &["restaurant"])],
        delay: Some(Duration::from_millis(10)),
        ..MockProvider::default()
    };
    let nearby_calls = provider.nearby_calls.clone();
    let (orchestrator, limiter) = fixture(provider, 10, 100);

    let collected: Collected = Arc::default();
    let (first, second) = tokio::join!(
        orchestrator.search(&request(), "u1", collector(collected.clone())),
        orchestrator.search(&request(), "u1", collector(collected.clone())),
    );

    let outcomes = [first.unwrap(), second.unwrap()];
    assert!(outcomes.contains(&SearchOutcome::Completed));
    assert!(outcomes.contains(&SearchOutcome::AlreadyInProgress));

    // 被忽略的调用没有触发提供方查询, 也没有消耗配额
    assert_eq!(nearby_calls.load(Ordering::SeqCst), 8);
    assert_eq!(
        limiter.remaining(LimitTier::Hourly, "u1").await.unwrap(),
        9
    );
}

#[tokio::test]
async fn quota_rejection_prevents_provider_calls() {
    let provider = MockProvider {
        places: vec![candidate("p1", "Luigi Pizza", &["restaurant"])],
        ..MockProvider::default()
    };
    let nearby_calls = provider.nearby_calls.clone();
    let (orchestrator, _) = fixture(provider, 0, 100);

    let collected: Collected = Arc::default();
    match orchestrator
        .search(&request(), "u1", collector(collected.clone()))
        .await
    {
        Err(SearchError::QuotaExceeded { .. }) => {}
        other => panic!("expected QuotaExceeded, got {:?}", other),
    }
    assert_eq!(nearby_calls.load(Ordering::SeqCst), 0);
    assert!(collected.lock().unwrap().is_empty());
}

#[tokio::test]
async fn exhausted_daily_tier_rejects_even_with_hourly_headroom() {
    let provider = MockProvider {
        places: vec![candidate("p1", "Luigi Pizza", &["restaurant"])],
        ..MockProvider::default()
    };
    let nearby_calls = provider.nearby_calls.clone();
    let (orchestrator, _) = fixture(provider, 10, 1);

    let collected: Collected = Arc::default();
    orchestrator
        .search(&request(), "u1", collector(collected.clone()))
        .await
        .unwrap();

    // 天级配额为全局共享, 换一个调用方也会被拒绝
    match orchestrator
        .search(&request(), "u2", collector(collected.clone()))
        .await
    {
        Err(SearchError::QuotaExceeded { .. }) => {}
        other => panic!("expected QuotaExceeded, got {:?}", other),
    }
    assert_eq!(nearby_calls.load(Ordering::SeqCst), 8);
}

#[tokio::test]
async fn transient_keyword_failure_skips_only_that_keyword() {
    let provider = MockProvider {
        places: vec![candidate("p1", "Luigi Pizza", &["restaurant"])],
        transient_keywords: vec!["Italian".to_string()],
        ..MockProvider::default()
    };
    let nearby_calls = provider.nearby_calls.clone();
    let details_calls = provider.details_calls.clone();
    let (orchestrator, _) = fixture(provider, 10, 100);

    let collected: Collected = Arc::default();
    let outcome = orchestrator
        .search(&request(), "u1", collector(collected.clone()))
        .await
        .unwrap();

    assert_eq!(outcome, SearchOutcome::Completed);
    assert_eq!(nearby_calls.load(Ordering::SeqCst), 8);
    // 失败的关键词没有详情子查询, 其余 7 个照常
    assert_eq!(details_calls.load(Ordering::SeqCst), 7);
    assert_eq!(collected.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn hard_failure_resets_state_for_next_search() {
    let provider = MockProvider {
        denied: true,
        ..MockProvider::default()
    };
    let nearby_calls = provider.nearby_calls.clone();
    let (orchestrator, _) = fixture(provider, 10, 100);

    let collected: Collected = Arc::default();
    match orchestrator
        .search(&request(), "u1", collector(collected.clone()))
        .await
    {
        Err(SearchError::Provider(PlacesError::Denied(_))) => {}
        other => panic!("expected Provider failure, got {:?}", other),
    }

    // 硬失败后状态已复位: 下一次调用不会被单飞保护挡住
    match orchestrator
        .search(&request(), "u1", collector(collected.clone()))
        .await
    {
        Err(SearchError::Provider(PlacesError::Denied(_))) => {}
        other => panic!("expected Provider failure, got {:?}", other),
    }
    assert!(nearby_calls.load(Ordering::SeqCst) >= 2);
}

#[tokio::test]
async fn superseded_search_results_never_reach_new_result_set() {
    let provider = MockProvider {
        places: vec![candidate("p1", "Luigi Pizza", &["restaurant"])],
        delay: Some(Duration::from_millis(100)),
        ..MockProvider::default()
    };
    let (orchestrator, _) = fixture(provider, 10, 100);

    // 位置 A 的搜索在子请求返回前被取代
    let stale: Collected = Arc::default();
    let handle = {
        let orchestrator = orchestrator.clone();
        let sink = collector(stale.clone());
        tokio::spawn(async move {
            let _ = orchestrator.search(&request(), "u1", sink).await;
        })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    handle.abort();
    let _ = handle.await;

    // 位置 B 的搜索正常完成
    let fresh: Collected = Arc::default();
    let request_b = SearchRequest {
        location: MapLocation {
            latitude: 34.0522,
            longitude: -118.2437,
        },
        radius: 1500.0,
        keyword: None,
    };
    let outcome = orchestrator
        .search(&request_b, "u1", collector(fresh.clone()))
        .await
        .unwrap();
    assert_eq!(outcome, SearchOutcome::Completed);
    assert_eq!(fresh.lock().unwrap().len(), 1);

    // 被取代搜索迟到的回调全部被丢弃
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(stale.lock().unwrap().is_empty());
}

#[tokio::test]
async fn single_query_strategy_caps_by_rating() {
    let mut config = test_config(10, 100);
    config.search_strategy = "single".into();
    config.max_results = 2;

    let mut low = candidate("p-low", "Plain Diner", &["restaurant"]);
    low.rating = Some(3.1);
    let mut mid = candidate("p-mid", "Taco Town", &["restaurant"]);
    mid.rating = Some(4.0);
    let mut high = candidate("p-high", "Sushi Bar", &["restaurant"]);
    high.rating = Some(4.8);

    let provider = MockProvider {
        places: vec![low, mid, high],
        ..MockProvider::default()
    };
    let nearby_calls = provider.nearby_calls.clone();
    let details_calls = provider.details_calls.clone();

    let limiter = Arc::new(RateLimiter::new(
        QuotaBackend::Memory(MemoryQuotaStore::new()),
        &config,
    ));
    let orchestrator = SearchOrchestrator::new(
        provider,
        limiter,
        SearchOptions::from_config(&config),
    );

    let collected: Collected = Arc::default();
    let outcome = orchestrator
        .search(&request(), "u1", collector(collected.clone()))
        .await
        .unwrap();

    assert_eq!(outcome, SearchOutcome::Completed);
    assert_eq!(nearby_calls.load(Ordering::SeqCst), 1);
    // 只为评分前二的候选拉详情
    assert_eq!(details_calls.load(Ordering::SeqCst), 2);

    let collected = collected.lock().unwrap();
    assert_eq!(collected.len(), 2);
    assert!(!collected.contains_key("p-low"));
    assert_eq!(collected["p-high"].cuisine, vec!["Japanese"]);
    assert_eq!(collected["p-mid"].cuisine, vec!["Mexican"]);
}
