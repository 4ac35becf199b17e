use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::{StreamExt, TryStreamExt, stream};

use crate::error::SearchError;
use crate::limiter::RateLimiter;
use crate::places::{NearbyQuery, PlaceCandidate, PlaceDetails, PlaceSearchProvider};

use super::classifier;
use super::types::{
    ClassifiedRestaurant, SearchOptions, SearchOutcome, SearchRequest, SearchStrategy,
};

/// 关键词策略扫描的菜系清单, 与映射表的规范标签一致
static CUISINE_KEYWORDS: [&str; 8] = [
    "American",
    "Italian",
    "Chinese",
    "Japanese",
    "Mexican",
    "Indian",
    "Thai",
    "Mediterranean",
];

/// 详情子查询的字段列表
static DETAIL_FIELDS: [&str; 9] = [
    "name",
    "geometry",
    "formatted_address",
    "rating",
    "price_level",
    "types",
    "opening_hours",
    "current_opening_hours",
    "business_status",
];

/// 搜索编排器
/// 每个实例同一时刻至多一次搜索在途; 位置快速变化触发的重复调用不会穿透到提供方
pub struct SearchOrchestrator<P> {
    provider: P,
    limiter: Arc<RateLimiter>,
    options: SearchOptions,
    searching: AtomicBool,
    epoch: AtomicU64,
}

/// searching 标志的复位守卫
/// 提前返回、硬失败或任务被取消时都会回到 Idle
struct SearchingGuard<'a>(&'a AtomicBool);

impl Drop for SearchingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<P: PlaceSearchProvider> SearchOrchestrator<P> {
    pub fn new(provider: P, limiter: Arc<RateLimiter>, options: SearchOptions) -> Self {
        Self {
            provider,
            limiter,
            options,
            searching: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
        }
    }

    /// 执行一次附近搜索
    /// 结果就绪即通过回调送出, 子请求之间不保证顺序; 同一 id 的后续命中
    /// 会以合并后的记录再次回调, 调用方按 id 覆盖即可
    pub async fn search<F>(
        &self,
        request: &SearchRequest,
        identity: &str,
        on_found: F,
    ) -> Result<SearchOutcome, SearchError>
    where
        F: Fn(ClassifiedRestaurant) + Send + Sync,
    {
        // 已有搜索在途时直接返回: 不做配额检查, 也不触发提供方调用
        if self
            .searching
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("search already in progress, ignoring request");
            return Ok(SearchOutcome::AlreadyInProgress);
        }
        let _guard = SearchingGuard(&self.searching);

        self.limiter.authorize_search(identity).await?;

        // 每次放行的搜索推进一个纪元, 被取代的搜索迟到的回调据此丢弃
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let seen: Mutex<HashMap<String, ClassifiedRestaurant>> = Mutex::new(HashMap::new());

        let emit = |restaurant: ClassifiedRestaurant| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                tracing::debug!(id = %restaurant.id, "discarding result from superseded search");
                return;
            }
            on_found(merge_sighting(&seen, restaurant));
        };

        match self.options.strategy {
            SearchStrategy::Single => self.search_single(request, &emit).await?,
            SearchStrategy::Keywords => self.search_by_keywords(request, &emit).await?,
        }

        tracing::debug!("restaurant search completed");
        Ok(SearchOutcome::Completed)
    }

    /// 单查询策略: 距离排序取回一批, 按评分降序截取前 N
    /// sort_by 是稳定排序, 评分相同的结果维持提供方给出的先后
    async fn search_single<F>(&self, request: &SearchRequest, emit: &F) -> Result<(), SearchError>
    where
        F: Fn(ClassifiedRestaurant) + Send + Sync,
    {
        let query = NearbyQuery {
            location: request.location,
            radius: request.radius,
            keyword: request.keyword.clone(),
            rank_by_distance: true,
        };

        let mut candidates = match self.provider.nearby_search(&query).await {
            Ok(candidates) => candidates,
            Err(e) if e.is_transient() => {
                tracing::warn!("nearby search skipped: {}", e);
                return Ok(());
            }
            Err(e) => return Err(SearchError::Provider(e)),
        };

        candidates.sort_by(|a, b| {
            b.rating
                .unwrap_or(0.0)
                .partial_cmp(&a.rating.unwrap_or(0.0))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(self.options.max_results);

        self.fetch_and_emit(candidates, request.keyword.as_deref(), emit)
            .await
    }

    /// 关键词策略: 菜系关键词分批并发查询, 批间停顿以平滑对提供方的突发压力
    async fn search_by_keywords<F>(
        &self,
        request: &SearchRequest,
        emit: &F,
    ) -> Result<(), SearchError>
    where
        F: Fn(ClassifiedRestaurant) + Send + Sync,
    {
        let batches: Vec<&[&str]> = CUISINE_KEYWORDS.chunks(self.options.keyword_batch).collect();
        let total = batches.len();

        for (index, batch) in batches.into_iter().enumerate() {
            stream::iter(batch.iter().copied())
                .map(Ok::<&str, SearchError>)
                .try_for_each_concurrent(None, |keyword| async move {
                    self.search_keyword(request, keyword, emit).await
                })
                .await?;

            if index + 1 < total {
                tokio::time::sleep(self.options.batch_delay).await;
            }
        }

        Ok(())
    }

    /// 单个关键词子请求
    /// 临时性失败或空结果记日志后跳过, 不影响同批的其他关键词; 硬失败向上传播
    async fn search_keyword<F>(
        &self,
        request: &SearchRequest,
        keyword: &str,
        emit: &F,
    ) -> Result<(), SearchError>
    where
        F: Fn(ClassifiedRestaurant) + Send + Sync,
    {
        let query = NearbyQuery {
            location: request.location,
            radius: request.radius,
            keyword: Some(keyword.to_string()),
            rank_by_distance: false,
        };

        let candidates = match self.provider.nearby_search(&query).await {
            Ok(candidates) => candidates,
            Err(e) if e.is_transient() => {
                tracing::warn!(keyword, "nearby search skipped: {}", e);
                return Ok(());
            }
            Err(e) => return Err(SearchError::Provider(e)),
        };

        if candidates.is_empty() {
            tracing::debug!(keyword, "no results for keyword");
            return Ok(());
        }

        self.fetch_and_emit(candidates, Some(keyword), emit).await
    }

    /// 详情子查询按 details_batch 限并发, 每条结果就绪即分类并送出
    async fn fetch_and_emit<F>(
        &self,
        candidates: Vec<PlaceCandidate>,
        keyword: Option<&str>,
        emit: &F,
    ) -> Result<(), SearchError>
    where
        F: Fn(ClassifiedRestaurant) + Send + Sync,
    {
        stream::iter(candidates)
            .map(Ok::<PlaceCandidate, SearchError>)
            .try_for_each_concurrent(self.options.details_batch, |candidate| async move {
                let details = match self
                    .provider
                    .get_details(&candidate.place_id, &DETAIL_FIELDS)
                    .await
                {
                    Ok(details) => details,
                    Err(e) if e.is_transient() => {
                        tracing::warn!(place_id = %candidate.place_id, "details skipped: {}", e);
                        return Ok(());
                    }
                    Err(e) => return Err(SearchError::Provider(e)),
                };
                emit(build_restaurant(candidate, details, keyword));
                Ok(())
            })
            .await
    }
}

/// 去重合并: 先到的非空菜系保留, 其余字段以最新一次命中为准
/// 对到达顺序不敏感, 任意交错得到同样的最终菜系
fn merge_sighting(
    seen: &Mutex<HashMap<String, ClassifiedRestaurant>>,
    mut restaurant: ClassifiedRestaurant,
) -> ClassifiedRestaurant {
    let mut seen = seen.lock().unwrap();
    if let Some(previous) = seen.get(&restaurant.id) {
        if !previous.cuisine.is_empty() {
            restaurant.cuisine = previous.cuisine.clone();
        }
    }
    seen.insert(restaurant.id.clone(), restaurant.clone());
    restaurant
}

/// 以详情为准组装记录, 缺失字段回退到候选值和默认值
fn build_restaurant(
    candidate: PlaceCandidate,
    details: PlaceDetails,
    keyword: Option<&str>,
) -> ClassifiedRestaurant {
    let name = details.name.unwrap_or(candidate.name);
    let types = if details.types.is_empty() {
        candidate.types
    } else {
        details.types
    };
    let cuisine = classifier::classify(&name, &types, keyword);

    // 运营中且完全没有营业时间信息时视为营业
    let operational = details
        .business_status
        .as_deref()
        .map(|status| status == "OPERATIONAL")
        .unwrap_or(true);
    let is_open = operational && details.open_now.or(candidate.open_now).unwrap_or(true);

    ClassifiedRestaurant {
        id: candidate.place_id,
        name,
        location: details.location.unwrap_or(candidate.location),
        address: details.formatted_address.unwrap_or_default(),
        rating: details.rating.or(candidate.rating).unwrap_or(0.0),
        price_level: details.price_level.or(candidate.price_level).unwrap_or(1),
        cuisine: cuisine
            .map(|tag| vec![tag.to_string()])
            .unwrap_or_default(),
        is_open,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::MapLocation;

    fn restaurant(id: &str, cuisine: &[&str], rating: f64) -> ClassifiedRestaurant {
        ClassifiedRestaurant {
            id: id.to_string(),
            name: "Test".to_string(),
            location: MapLocation {
                latitude: 40.0,
                longitude: -74.0,
            },
            address: "1 Test St".to_string(),
            rating,
            price_level: 2,
            cuisine: cuisine.iter().map(|tag| tag.to_string()).collect(),
            is_open: true,
        }
    }

    #[test]
    fn first_non_empty_cuisine_is_sticky() {
        let seen = Mutex::new(HashMap::new());

        let first = merge_sighting(&seen, restaurant("p1", &[], 4.0));
        assert!(first.cuisine.is_empty());

        let second = merge_sighting(&seen, restaurant("p1", &["Italian"], 4.1));
        assert_eq!(second.cuisine, vec!["Italian"]);

        // 第三次命中带着别的菜系, 已有的非空菜系不被覆盖
        let third = merge_sighting(&seen, restaurant("p1", &["Mexican"], 4.2));
        assert_eq!(third.cuisine, vec!["Italian"]);
        assert_eq!(seen.lock().unwrap()["p1"].cuisine, vec!["Italian"]);
    }

    #[test]
    fn other_fields_take_latest_sighting() {
        let seen = Mutex::new(HashMap::new());

        merge_sighting(&seen, restaurant("p1", &["Thai"], 3.0));
        let merged = merge_sighting(&seen, restaurant("p1", &[], 4.5));

        assert_eq!(merged.rating, 4.5);
        assert_eq!(merged.cuisine, vec!["Thai"]);
    }

    #[test]
    fn merge_is_order_independent_for_cuisine() {
        let orders: Vec<Vec<Vec<&str>>> = vec![
            vec![vec![], vec!["Italian"], vec!["Mexican"]],
            vec![vec!["Italian"], vec![], vec!["Mexican"]],
            vec![vec!["Italian"], vec!["Mexican"], vec![]],
        ];
        for sightings in &orders {
            let seen = Mutex::new(HashMap::new());
            for cuisine in sightings {
                merge_sighting(&seen, restaurant("p1", cuisine, 4.0));
            }
            assert_eq!(seen.lock().unwrap()["p1"].cuisine, vec!["Italian"]);
        }
    }

    #[test]
    fn build_restaurant_applies_defaults() {
        let candidate = PlaceCandidate {
            place_id: "p1".to_string(),
            name: "Curry Corner".to_string(),
            location: MapLocation {
                latitude: 40.0,
                longitude: -74.0,
            },
            types: vec!["restaurant".to_string()],
            rating: None,
            price_level: None,
            open_now: None,
        };

        let built = build_restaurant(candidate, PlaceDetails::default(), None);
        assert_eq!(built.rating, 0.0);
        assert_eq!(built.price_level, 1);
        assert_eq!(built.cuisine, vec!["Indian"]);
        // 没有任何营业时间信息且未标记停业, 视为营业
        assert!(built.is_open);
    }

    #[test]
    fn build_restaurant_respects_closed_status() {
        let candidate = PlaceCandidate {
            place_id: "p1".to_string(),
            name: "Test".to_string(),
            location: MapLocation {
                latitude: 40.0,
                longitude: -74.0,
            },
            types: vec![],
            rating: Some(4.0),
            price_level: Some(2),
            open_now: Some(true),
        };
        let details = PlaceDetails {
            open_now: Some(false),
            business_status: Some("OPERATIONAL".to_string()),
            ..PlaceDetails::default()
        };

        assert!(!build_restaurant(candidate, details, None).is_open);
    }
}
