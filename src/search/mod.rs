// 搜索编排模块
// 配额判定 -> 提供方查询 -> 菜系分类 -> 去重合并 -> 流式回调

pub mod classifier;
pub mod orchestrator;
pub mod types;

pub use classifier::classify;
pub use orchestrator::SearchOrchestrator;
pub use types::{
    ClassifiedRestaurant, Filters, SearchOptions, SearchOutcome, SearchRequest, SearchStrategy,
};
