//! 聚合集合（Aggregator）
//!
//! 将多个按类型划分的源集合呈现为一个虚拟集合：
//! - 成员只由源集合持有与写入，聚合集合仅引用；
//! - 事件代理把源集合的成员变化同步进成员索引并重新触发；
//! - 分派路由把针对聚合集合的 add/remove 转交给真正的所属源集合。
//!
use aggregator_collection::{
    Cid, Collection, CollectionId, CollectionResult, Comparator, Emitter, Event, ListenerId, Model,
    ModelInput, MutationOptions, ObservableCollection, Topic,
};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::debug;

use crate::config::{AggregatorOptions, ModelFactory, ProxyPolicy, ResetMode};
use crate::definition::AggregateDefinition;
use crate::error::AggregatorResult;
use crate::membership::MembershipIndex;
use crate::registry::{SourceRegistry, SourceResolver};

/// 共享的聚合集合句柄
#[derive(Clone)]
pub struct Aggregator(pub(crate) Rc<AggregatorInner>);

pub(crate) struct AggregatorInner {
    pub(crate) id: CollectionId,
    pub(crate) definition: Box<dyn AggregateDefinition>,
    pub(crate) resolver: Option<SourceResolver>,
    pub(crate) comparator: Option<Comparator>,
    pub(crate) policy: ProxyPolicy,
    pub(crate) factory: Option<ModelFactory>,
    pub(crate) registry: RefCell<SourceRegistry>,
    pub(crate) index: RefCell<MembershipIndex>,
    /// 经由聚合集合 `add` 指定的聚合内位置，待代理消费
    pub(crate) placements: RefCell<HashMap<Cid, usize>>,
    pub(crate) emitter: Emitter,
}

impl Drop for AggregatorInner {
    fn drop(&mut self) {
        self.registry.get_mut().unbind_all();
    }
}

impl Aggregator {
    /// 创建聚合集合：订阅每个源集合并镜像其已有成员
    pub fn new<D>(definition: D, options: AggregatorOptions) -> Self
    where
        D: AggregateDefinition + 'static,
    {
        let comparator = options.comparator.or_else(|| definition.comparator());
        let policy = options.policy.unwrap_or_else(|| definition.policy());
        let aggregator = Self(Rc::new(AggregatorInner {
            id: CollectionId::next(),
            definition: Box::new(definition),
            resolver: options.collections,
            comparator,
            policy,
            factory: options.factory,
            registry: RefCell::new(SourceRegistry::default()),
            index: RefCell::new(MembershipIndex::default()),
            placements: RefCell::new(HashMap::new()),
            emitter: Emitter::new(),
        }));
        aggregator.attach_sources();
        aggregator.mirror_sources();
        aggregator
    }

    /// 创建并以给定元素静默重置
    pub fn with_models<D, I>(
        definition: D,
        models: I,
        options: AggregatorOptions,
    ) -> AggregatorResult<Self>
    where
        D: AggregateDefinition + 'static,
        I: IntoIterator,
        I::Item: Into<ModelInput>,
    {
        let aggregator = Self::new(definition, options);
        aggregator.reset(models, MutationOptions::silent())?;
        Ok(aggregator)
    }

    pub fn id(&self) -> CollectionId {
        self.0.id
    }

    pub fn policy(&self) -> ProxyPolicy {
        self.0.policy
    }

    pub fn comparator(&self) -> Option<&Comparator> {
        self.0.comparator.as_ref()
    }

    /// 某一类型对应的源集合
    pub fn source(&self, kind: &str) -> Option<Collection> {
        self.0.registry.borrow().source(kind)
    }

    pub fn source_kinds(&self) -> Vec<String> {
        self.0.registry.borrow().kinds()
    }

    pub fn ptr_eq(&self, other: &Aggregator) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// 替换全部成员
    ///
    /// `PushDown` 模式下按类型拆分并对每个源集合执行 `reset`；
    /// `Elementwise` 模式下静默清空源集合，再逐个加入，最后触发一次聚合 `reset`。
    /// 所有输入先完成解析与校验，任何失败都不会产生部分变更。
    pub fn reset<I>(&self, inputs: I, options: MutationOptions) -> AggregatorResult<Vec<Model>>
    where
        I: IntoIterator,
        I::Item: Into<ModelInput>,
    {
        let routed = self.route_batch(inputs)?;
        let models: Vec<Model> = routed.iter().map(|r| r.model.clone()).collect();
        debug!(
            aggregator = %self.id(),
            mode = ?self.0.policy.reset_mode,
            count = models.len(),
            "aggregate reset"
        );

        match self.0.policy.reset_mode {
            ResetMode::PushDown => {
                let mut shares: BTreeMap<String, (Collection, Vec<Model>)> = self
                    .0
                    .registry
                    .borrow()
                    .collections()
                    .into_iter()
                    .map(|(kind, source)| (kind, (source, Vec::new())))
                    .collect();
                for routed in routed {
                    if let Some((_, share)) = shares.get_mut(&routed.kind) {
                        share.push(routed.model);
                    }
                }

                // 源集合的 reset 会经由代理逐个转发；不转发时由聚合集合补发一次
                let forwarded = self.0.policy.forward_source_resets;
                for (_, (source, share)) in shares {
                    source.reset(share, options.without_at())?;
                }
                if options.is_silent() {
                    self.mirror_sources();
                } else if !forwarded {
                    self.emit(&Event::Reset { origin: self.id() })?;
                }
            }
            ResetMode::Elementwise => {
                let sources = self.0.registry.borrow().collections();
                self.0.index.borrow_mut().clear();
                for (_, source) in sources {
                    source.reset(Vec::<Model>::new(), MutationOptions::silent())?;
                }
                for routed in routed {
                    self.insert_via_source(routed, options.without_at())?;
                }
                if !options.is_silent() {
                    self.emit(&Event::Reset { origin: self.id() })?;
                }
            }
        }
        Ok(models)
    }

    /// 重新解析源集合映射，重新绑定代理并重建成员索引
    pub fn refresh_sources(&self, options: MutationOptions) -> AggregatorResult<()> {
        self.0.registry.borrow_mut().unbind_all();
        self.attach_sources();
        self.mirror_sources();
        if !options.is_silent() {
            self.emit(&Event::Reset { origin: self.id() })?;
        }
        Ok(())
    }

    fn resolve_sources(&self) -> BTreeMap<String, Collection> {
        match &self.0.resolver {
            Some(resolve) => resolve(),
            None => self.0.definition.collections(),
        }
    }

    fn attach_sources(&self) {
        let sources = self.resolve_sources();
        let mut registry = self.0.registry.borrow_mut();
        for (kind, source) in sources {
            let listener = self.subscribe(&kind, &source);
            debug!(aggregator = %self.id(), kind = %kind, source = %source.id(), "source attached");
            registry.insert(kind, source, listener);
        }
    }

    fn subscribe(&self, kind: &str, source: &Collection) -> ListenerId {
        let weak: Weak<AggregatorInner> = Rc::downgrade(&self.0);
        let kind = kind.to_string();
        source.bind(Topic::All, move |event| match weak.upgrade() {
            Some(inner) => Aggregator(inner).on_source_event(&kind, event),
            None => Ok(()),
        })
    }

    /// 以源集合当前成员重建整个成员索引（不触发事件）
    pub(crate) fn mirror_sources(&self) {
        let sources = self.0.registry.borrow().collections();
        let mut index = self.0.index.borrow_mut();
        index.clear();
        for (kind, source) in sources {
            for model in source.models() {
                index.insert(&kind, model, None, self.0.comparator.as_ref());
            }
        }
    }

    pub(crate) fn emit(&self, event: &Event) -> CollectionResult<()> {
        self.0.emitter.emit(event)
    }
}

impl ObservableCollection for Aggregator {
    fn collection_id(&self) -> CollectionId {
        self.0.id
    }

    fn emitter(&self) -> &Emitter {
        &self.0.emitter
    }

    fn len(&self) -> usize {
        self.0.index.borrow().store().len()
    }

    fn models(&self) -> Vec<Model> {
        self.0.index.borrow().store().models().to_vec()
    }

    fn at(&self, index: usize) -> Option<Model> {
        self.0.index.borrow().store().at(index).cloned()
    }

    fn get_by_cid(&self, cid: Cid) -> Option<Model> {
        self.0.index.borrow().store().get(cid).cloned()
    }

    fn index_of(&self, model: &Model) -> Option<usize> {
        self.0.index.borrow().store().index_of(model.cid())
    }
}

impl fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregator")
            .field("id", &self.0.id)
            .field("sources", &self.0.registry.try_borrow().map(|r| r.kinds()).ok())
            .field(
                "len",
                &self.0.index.try_borrow().map(|i| i.store().len()).ok(),
            )
            .field("policy", &self.0.policy)
            .finish()
    }
}
