//! 聚合定义（AggregateDefinition）
//!
//! 描述某一具体聚合类型的“类级”行为：默认源集合映射、代理策略、
//! 排序以及按源集合抑制事件转发的钩子。
//!
use aggregator_collection::{Comparator, Event};

use crate::config::ProxyPolicy;
use crate::registry::SourceMap;

pub trait AggregateDefinition {
    /// 默认的 类型 → 源集合 映射；同一聚合生命周期内应返回相同的实例
    fn collections(&self) -> SourceMap;

    fn policy(&self) -> ProxyPolicy {
        ProxyPolicy::default()
    }

    fn comparator(&self) -> Option<Comparator> {
        None
    }

    /// 是否将来自 `source_kind` 的事件转发给聚合集合的监听器。
    /// 仅影响通知，成员索引始终同步。
    fn forward(&self, _source_kind: &str, _event: &Event) -> bool {
        true
    }
}

impl<F> AggregateDefinition for F
where
    F: Fn() -> SourceMap,
{
    fn collections(&self) -> SourceMap {
        self()
    }
}
