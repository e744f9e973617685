//! 可观察有序集合能力（ObservableCollection）
//!
//! 源集合 `Collection` 与聚合集合共享的只读遍历与事件订阅接口。
//! 聚合集合通过嵌入存储与分发器实现该接口，而非继承源集合。
//!
use serde_json::Value;

use crate::error::CollectionResult;
use crate::event::{Emitter, Event, ListenerId, Topic};
use crate::identity::{Cid, CollectionId};
use crate::model::Model;

pub trait ObservableCollection {
    /// 作为事件来源的集合标识
    fn collection_id(&self) -> CollectionId;

    fn emitter(&self) -> &Emitter;

    fn len(&self) -> usize;

    /// 当前成员快照（按顺序）
    fn models(&self) -> Vec<Model>;

    fn at(&self, index: usize) -> Option<Model>;

    fn get_by_cid(&self, cid: Cid) -> Option<Model>;

    fn index_of(&self, model: &Model) -> Option<usize>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, model: &Model) -> bool {
        self.get_by_cid(model.cid())
            .is_some_and(|member| member.ptr_eq(model))
    }

    /// 按顺序取出每个成员的某个属性，缺失记为 `null`
    fn pluck(&self, attr: &str) -> Vec<Value> {
        self.models()
            .iter()
            .map(|m| m.get(attr).unwrap_or(Value::Null))
            .collect()
    }

    fn cids(&self) -> Vec<Cid> {
        self.models().iter().map(Model::cid).collect()
    }

    fn bind<F>(&self, topic: impl Into<Topic>, handler: F) -> ListenerId
    where
        Self: Sized,
        F: Fn(&Event) -> anyhow::Result<()> + 'static,
    {
        self.emitter().bind(topic.into(), handler)
    }

    fn unbind(&self, id: ListenerId) -> bool {
        self.emitter().unbind(id)
    }

    fn unbind_topic(&self, topic: impl Into<Topic>) -> usize
    where
        Self: Sized,
    {
        self.emitter().unbind_topic(&topic.into())
    }

    fn trigger(&self, event: &Event) -> CollectionResult<()> {
        self.emitter().emit(event)
    }
}
