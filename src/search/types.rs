use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::common::MapLocation;
use crate::config::Config;

/// 分类后的餐厅记录
/// 一次搜索内同一 id 只保留一条, 后续命中按合并规则更新后重发
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedRestaurant {
    pub id: String,
    pub name: String,
    pub location: MapLocation,
    pub address: String,
    /// 0 表示未知
    pub rating: f64,
    /// 1-4
    pub price_level: u32,
    /// 基数至多为 1
    pub cuisine: Vec<String>,
    pub is_open: bool,
}

/// 一次搜索请求
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub location: MapLocation,
    pub radius: f64,
    pub keyword: Option<String>,
}

/// 调用方筛选条件, 只作用于已分类的结果
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct Filters {
    pub cuisine: Vec<String>,
    pub open_now: bool,
    pub min_rating: f64,
    pub max_price_level: Option<u32>,
}

impl Filters {
    pub fn matches(&self, restaurant: &ClassifiedRestaurant) -> bool {
        if self.open_now && !restaurant.is_open {
            return false;
        }
        if restaurant.rating < self.min_rating {
            return false;
        }
        if let Some(max_price) = self.max_price_level {
            if restaurant.price_level > max_price {
                return false;
            }
        }
        if !self.cuisine.is_empty()
            && !restaurant
                .cuisine
                .iter()
                .any(|cuisine| self.cuisine.contains(cuisine))
        {
            return false;
        }
        true
    }
}

/// 提供方查询策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    /// 单次距离排序查询, 按评分取前 N
    Single,
    /// 按菜系关键词分批并发查询
    Keywords,
}

/// 编排参数, 由配置推导
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub strategy: SearchStrategy,
    pub max_results: usize,
    pub keyword_batch: usize,
    pub details_batch: usize,
    pub batch_delay: Duration,
}

impl SearchOptions {
    pub fn from_config(config: &Config) -> Self {
        let strategy = match config.search_strategy.as_str() {
            "single" => SearchStrategy::Single,
            _ => SearchStrategy::Keywords,
        };
        Self {
            strategy,
            max_results: config.max_results,
            keyword_batch: config.keyword_batch.max(1),
            details_batch: config.details_batch.max(1),
            batch_delay: config.batch_delay(),
        }
    }
}

/// 一次搜索调用的结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// 所有子请求结束, 允许其中有被跳过的失败
    Completed,
    /// 已有搜索在途, 本次调用被忽略
    AlreadyInProgress,
}
