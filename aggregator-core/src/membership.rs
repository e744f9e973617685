//! 成员索引（Membership Index）
//!
//! 聚合集合自身的有序序列，镜像所有源集合成员的并集；
//! 另外记录每个成员来自哪个源类型，供源集合 `reset` 时按类型整体替换。
//!
use aggregator_collection::{Cid, Comparator, Model, ModelStore};
use std::collections::HashMap;

#[derive(Default)]
pub(crate) struct MembershipIndex {
    store: ModelStore,
    origins: HashMap<Cid, String>,
}

impl MembershipIndex {
    pub(crate) fn store(&self) -> &ModelStore {
        &self.store
    }

    pub(crate) fn kind_of(&self, cid: Cid) -> Option<&str> {
        self.origins.get(&cid).map(String::as_str)
    }

    /// 插入并返回位置；已存在时返回 `None`
    pub(crate) fn insert(
        &mut self,
        kind: &str,
        model: Model,
        at: Option<usize>,
        comparator: Option<&Comparator>,
    ) -> Option<usize> {
        if self.store.contains(model.cid()) {
            return None;
        }
        self.origins.insert(model.cid(), kind.to_string());
        Some(self.store.insert_ordered(model, at, comparator))
    }

    pub(crate) fn remove(&mut self, cid: Cid) -> Option<(Model, usize)> {
        self.origins.remove(&cid);
        self.store.remove(cid)
    }

    /// 移除某个源类型的全部成员，返回移除数量
    pub(crate) fn drain_kind(&mut self, kind: &str) -> usize {
        let doomed: Vec<Cid> = self
            .origins
            .iter()
            .filter(|(_, k)| k.as_str() == kind)
            .map(|(cid, _)| *cid)
            .collect();
        for cid in &doomed {
            self.remove(*cid);
        }
        doomed.len()
    }

    pub(crate) fn clear(&mut self) -> usize {
        self.origins.clear();
        self.store.clear().len()
    }
}
