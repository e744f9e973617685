//! 聚合集合（aggregator-core）
//!
//! 在多个按类型划分的源集合之上提供一个虚拟的并集集合：
//! - 源集合注册表（`registry`）：解析 类型 → 源集合 映射，可由调用方覆盖；
//! - 事件代理（`proxy`）：订阅每个源集合，把成员变化同步进成员索引并重新触发；
//! - 成员索引（`membership`）：聚合集合自身的有序序列；
//! - 分派路由（`router`）：把针对聚合集合的 get/add/remove 转交给所属源集合；
//! - 聚合定义（`definition`）与配置（`config`）：每种聚合的默认映射与代理策略。
//!
//! 源集合是唯一的写入者：任何成员变化都只经由源集合事件进入成员索引一次。
//!
pub mod aggregator;
pub mod config;
pub mod definition;
pub mod error;
mod membership;
mod proxy;
pub mod registry;
pub mod router;

pub use aggregator::Aggregator;
pub use config::{AggregatorOptions, ModelFactory, ProxyPolicy, ResetMode};
pub use definition::AggregateDefinition;
pub use error::{AggregatorError, AggregatorResult};
pub use registry::{SourceMap, SourceResolver, resolver};
pub use router::Criteria;
