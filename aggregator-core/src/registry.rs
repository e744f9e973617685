//! 源集合注册表（Source Registry）
//!
//! 解析 类型 → 源集合 映射，并记录代理监听器在每个源集合上的绑定。
//!
use aggregator_collection::{Collection, ListenerId, ObservableCollection};
use std::collections::BTreeMap;
use std::rc::Rc;

/// 类型判别 → 源集合
pub type SourceMap = BTreeMap<String, Collection>;

/// 自定义源集合解析器
pub type SourceResolver = Rc<dyn Fn() -> SourceMap>;

/// 由闭包构造解析器
pub fn resolver<F>(f: F) -> SourceResolver
where
    F: Fn() -> SourceMap + 'static,
{
    Rc::new(f)
}

pub(crate) struct BoundSource {
    pub(crate) collection: Collection,
    pub(crate) listener: ListenerId,
}

#[derive(Default)]
pub(crate) struct SourceRegistry {
    sources: BTreeMap<String, BoundSource>,
}

impl SourceRegistry {
    pub(crate) fn insert(&mut self, kind: String, collection: Collection, listener: ListenerId) {
        self.sources.insert(
            kind,
            BoundSource {
                collection,
                listener,
            },
        );
    }

    pub(crate) fn source(&self, kind: &str) -> Option<Collection> {
        self.sources.get(kind).map(|s| s.collection.clone())
    }

    /// 源集合对应的类型判别（按实例比较）
    pub(crate) fn kind_of(&self, collection: &Collection) -> Option<String> {
        self.sources
            .iter()
            .find(|(_, s)| s.collection.ptr_eq(collection))
            .map(|(kind, _)| kind.clone())
    }

    pub(crate) fn kinds(&self) -> Vec<String> {
        self.sources.keys().cloned().collect()
    }

    pub(crate) fn collections(&self) -> Vec<(String, Collection)> {
        self.sources
            .iter()
            .map(|(kind, s)| (kind.clone(), s.collection.clone()))
            .collect()
    }

    /// 解除全部代理监听并清空
    pub(crate) fn unbind_all(&mut self) {
        for (_, bound) in std::mem::take(&mut self.sources) {
            bound.collection.unbind(bound.listener);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_kind_by_instance() {
        let tasks = Collection::with_kind("Task");
        let other = Collection::with_kind("Task");
        let mut registry = SourceRegistry::default();
        let listener = tasks.bind("all", |_| Ok(()));
        registry.insert("Task".into(), tasks.clone(), listener);

        assert_eq!(registry.kind_of(&tasks).as_deref(), Some("Task"));
        assert_eq!(registry.kind_of(&other), None);
        assert!(registry.source("Activity").is_none());

        registry.unbind_all();
        assert_eq!(tasks.emitter().listener_count(), 0);
        assert!(registry.kinds().is_empty());
    }
}
