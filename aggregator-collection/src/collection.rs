//! 源集合（Collection）
//!
//! 单一类型的有序可观察集合，按身份令牌与持久化标识唯一：
//! - `add`/`add_all`：准备（构造/校验）→ 唯一性检查 → 有序插入 → 触发 `add`；
//! - `remove`：按模型/令牌/标识定位并移除，触发 `remove`；
//! - `reset`：整体替换成员，仅触发一次 `reset`；
//! - 订阅每个成员模型的事件并原样转发，`id` 变化时重建标识索引。
//!
//! 所有操作在调用线程上同步完成；触发事件时不持有内部借用，监听器可安全重入。
//!
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{trace, warn};

use crate::error::{CollectionError, CollectionResult};
use crate::event::{Emitter, Event, ListenerId, Topic};
use crate::identity::{Cid, CollectionId, ModelId};
use crate::input::{ModelInput, Selector};
use crate::model::{ID_ATTRIBUTE, Model, TYPE_ATTRIBUTE};
use crate::observable::ObservableCollection;
use crate::options::{CollectionOptions, MutationOptions};
use crate::store::ModelStore;

/// 共享的源集合句柄
#[derive(Clone)]
pub struct Collection(Rc<CollectionInner>);

pub(crate) struct CollectionInner {
    id: CollectionId,
    options: CollectionOptions,
    state: RefCell<CollectionState>,
    emitter: Emitter,
}

#[derive(Default)]
struct CollectionState {
    store: ModelStore,
    by_id: HashMap<ModelId, Model>,
    subscriptions: HashMap<Cid, ListenerId>,
}

impl Drop for CollectionInner {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        for (cid, listener) in state.subscriptions.drain() {
            if let Some(model) = state.store.get(cid) {
                model.unbind(listener);
            }
        }
    }
}

impl Default for Collection {
    fn default() -> Self {
        Self::new(CollectionOptions::default())
    }
}

impl Collection {
    pub fn new(options: CollectionOptions) -> Self {
        Self(Rc::new(CollectionInner {
            id: CollectionId::next(),
            options,
            state: RefCell::new(CollectionState::default()),
            emitter: Emitter::new(),
        }))
    }

    /// 创建只容纳某一类型模型的集合
    pub fn with_kind(kind: impl Into<String>) -> Self {
        Self::new(CollectionOptions::builder().kind(kind).build())
    }

    pub(crate) fn from_inner(inner: Rc<CollectionInner>) -> Self {
        Self(inner)
    }

    pub fn id(&self) -> CollectionId {
        self.0.id
    }

    pub fn kind(&self) -> Option<&str> {
        self.0.options.kind()
    }

    pub fn ptr_eq(&self, other: &Collection) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// 将输入规范化为模型
    ///
    /// 原始属性会被构造为归属本集合的新模型（写入本集合的类型判别并执行校验）；
    /// 已有模型原样返回，归属在插入时确定。
    pub fn prepare_model(&self, input: impl Into<ModelInput>) -> CollectionResult<Model> {
        match input.into() {
            ModelInput::Model(model) => Ok(model),
            ModelInput::Attributes(mut attrs) => {
                if let Some(kind) = self.kind() {
                    attrs.insert(TYPE_ATTRIBUTE.to_string(), Value::String(kind.to_string()));
                }
                let validator = self.0.options.validator().cloned();
                if let Some(validate) = &validator {
                    validate(&attrs).map_err(CollectionError::validation)?;
                }
                Ok(Model::build(attrs, validator, Rc::downgrade(&self.0)))
            }
            ModelInput::Invalid(value) => Err(CollectionError::invalid_input(format!(
                "expected a model or an attributes object, got `{value}`"
            ))),
        }
    }

    pub fn add(
        &self,
        input: impl Into<ModelInput>,
        options: MutationOptions,
    ) -> CollectionResult<Model> {
        let model = self.prepare_model(input)?;
        self.ensure_unique(&model, &[], true)?;
        self.add_prepared(model.clone(), options.at(), options)?;
        Ok(model)
    }

    /// 批量加入：全部通过准备与唯一性检查后才开始插入
    pub fn add_all<I>(&self, inputs: I, options: MutationOptions) -> CollectionResult<Vec<Model>>
    where
        I: IntoIterator,
        I::Item: Into<ModelInput>,
    {
        let models = self.prepare_batch(inputs, true)?;
        let mut at = options.at();
        for model in &models {
            // 监听器可能在分发期间重入，逐个复查
            self.ensure_unique(model, &[], true)?;
            let index = self.add_prepared(model.clone(), at, options)?;
            at = at.map(|_| index + 1);
        }
        Ok(models)
    }

    fn add_prepared(
        &self,
        model: Model,
        at: Option<usize>,
        options: MutationOptions,
    ) -> CollectionResult<usize> {
        let index = self.insert(model.clone(), at);
        trace!(collection = %self.id(), cid = %model.cid(), index, "model added");
        if !options.is_silent() {
            self.emit(&Event::Add {
                model,
                origin: self.id(),
                index,
            })?;
        }
        Ok(index)
    }

    /// 移除成员；未找到时返回 `Ok(None)`
    pub fn remove(
        &self,
        selector: impl Into<Selector>,
        options: MutationOptions,
    ) -> CollectionResult<Option<Model>> {
        let Some(model) = self.lookup(&selector.into()) else {
            return Ok(None);
        };
        let Some((index, listener)) = self.detach(&model) else {
            return Ok(None);
        };
        trace!(collection = %self.id(), cid = %model.cid(), index, "model removed");

        let notified = if options.is_silent() {
            Ok(())
        } else {
            self.emit(&Event::Remove {
                model: model.clone(),
                origin: self.id(),
                index,
            })
        };
        self.release(&model, listener);
        notified?;
        Ok(Some(model))
    }

    /// 整体替换成员
    pub fn reset<I>(&self, inputs: I, options: MutationOptions) -> CollectionResult<Vec<Model>>
    where
        I: IntoIterator,
        I::Item: Into<ModelInput>,
    {
        let models = self.prepare_batch(inputs, false)?;

        let (previous, mut subscriptions) = {
            let mut state = self.0.state.borrow_mut();
            state.by_id.clear();
            (state.store.clear(), std::mem::take(&mut state.subscriptions))
        };
        for model in &previous {
            self.release(model, subscriptions.remove(&model.cid()));
        }
        for model in &models {
            self.insert(model.clone(), None);
        }
        trace!(
            collection = %self.id(),
            removed = previous.len(),
            added = models.len(),
            "collection reset"
        );

        if !options.is_silent() {
            self.emit(&Event::Reset { origin: self.id() })?;
        }
        Ok(models)
    }

    /// 按持久化标识查找
    pub fn get(&self, id: impl Into<ModelId>) -> Option<Model> {
        self.0.state.borrow().by_id.get(&id.into()).cloned()
    }

    /// 按选择器查找：模型先按令牌、再按标识
    pub fn lookup(&self, selector: &Selector) -> Option<Model> {
        match selector {
            Selector::Model(model) => self
                .get_by_cid(model.cid())
                .or_else(|| model.id().and_then(|id| self.get(id))),
            Selector::Cid(cid) => self.get_by_cid(*cid),
            Selector::Id(id) => self.get(id.clone()),
            Selector::Attributes(attrs) => attrs
                .get(ID_ATTRIBUTE)
                .and_then(ModelId::from_value)
                .and_then(|id| self.get(id)),
        }
    }

    fn prepare_batch<I>(&self, inputs: I, against_members: bool) -> CollectionResult<Vec<Model>>
    where
        I: IntoIterator,
        I::Item: Into<ModelInput>,
    {
        let mut models: Vec<Model> = Vec::new();
        for input in inputs {
            let model = self.prepare_model(input)?;
            self.ensure_unique(&model, &models, against_members)?;
            models.push(model);
        }
        Ok(models)
    }

    fn ensure_unique(
        &self,
        model: &Model,
        pending: &[Model],
        against_members: bool,
    ) -> CollectionResult<()> {
        let id = model.id();
        let clashes_member = against_members && {
            let state = self.0.state.borrow();
            state.store.contains(model.cid())
                || id.as_ref().is_some_and(|id| state.by_id.contains_key(id))
        };
        let clashes_pending = pending
            .iter()
            .any(|p| p.cid() == model.cid() || (id.is_some() && p.id() == id));

        if clashes_member || clashes_pending {
            return Err(CollectionError::Duplicate {
                cid: model.cid(),
                id: id.map(|id| id.to_string()),
            });
        }
        Ok(())
    }

    fn insert(&self, model: Model, at: Option<usize>) -> usize {
        if model.collection().is_none() {
            model.set_owner(Rc::downgrade(&self.0));
        }
        let listener = self.subscribe(&model);

        let mut state = self.0.state.borrow_mut();
        if let Some(id) = model.id() {
            state.by_id.insert(id, model.clone());
        }
        state.subscriptions.insert(model.cid(), listener);
        state
            .store
            .insert_ordered(model, at, self.0.options.comparator())
    }

    fn detach(&self, model: &Model) -> Option<(usize, Option<ListenerId>)> {
        let mut state = self.0.state.borrow_mut();
        let (_, index) = state.store.remove(model.cid())?;
        if let Some(id) = model.id() {
            if state.by_id.get(&id).is_some_and(|m| m.ptr_eq(model)) {
                state.by_id.remove(&id);
            }
        }
        Some((index, state.subscriptions.remove(&model.cid())))
    }

    fn release(&self, model: &Model, listener: Option<ListenerId>) {
        if let Some(listener) = listener {
            model.unbind(listener);
        }
        // 分发期间被重新加入的成员保留归属
        let rejoined = self.0.state.borrow().store.contains(model.cid());
        if !rejoined && model.owner_is(&self.0) {
            model.clear_owner();
        }
    }

    fn subscribe(&self, model: &Model) -> ListenerId {
        let weak = Rc::downgrade(&self.0);
        model.bind(Topic::All, move |event| match weak.upgrade() {
            Some(inner) => Collection(inner).on_model_event(event),
            None => Ok(()),
        })
    }

    fn on_model_event(&self, event: &Event) -> anyhow::Result<()> {
        // 其他集合的成员事件不属于本集合
        if event.is_membership() && event.origin() != Some(self.id()) {
            return Ok(());
        }
        if let Event::ChangeAttr {
            model,
            attr,
            value,
            previous,
        } = event
        {
            if attr == ID_ATTRIBUTE {
                self.reindex(model, previous.as_ref(), value);
            }
        }
        self.emit(event)?;
        Ok(())
    }

    fn reindex(&self, model: &Model, previous: Option<&Value>, current: &Value) {
        let mut state = self.0.state.borrow_mut();
        if !state.store.contains(model.cid()) {
            return;
        }
        if let Some(old) = previous.and_then(ModelId::from_value) {
            if state.by_id.get(&old).is_some_and(|m| m.ptr_eq(model)) {
                state.by_id.remove(&old);
            }
        }
        if let Some(new) = ModelId::from_value(current) {
            let holder = state
                .by_id
                .get(&new)
                .filter(|holder| !holder.ptr_eq(model))
                .map(Model::cid);
            match holder {
                Some(holder) => warn!(
                    collection = %self.id(),
                    cid = %model.cid(),
                    %holder,
                    id = %new,
                    "id already taken, keeping the earlier member"
                ),
                None => {
                    state.by_id.insert(new, model.clone());
                }
            }
        }
    }

    fn emit(&self, event: &Event) -> CollectionResult<()> {
        self.0.emitter.emit(event)
    }
}

impl ObservableCollection for Collection {
    fn collection_id(&self) -> CollectionId {
        self.0.id
    }

    fn emitter(&self) -> &Emitter {
        &self.0.emitter
    }

    fn len(&self) -> usize {
        self.0.state.borrow().store.len()
    }

    fn models(&self) -> Vec<Model> {
        self.0.state.borrow().store.models().to_vec()
    }

    fn at(&self, index: usize) -> Option<Model> {
        self.0.state.borrow().store.at(index).cloned()
    }

    fn get_by_cid(&self, cid: Cid) -> Option<Model> {
        self.0.state.borrow().store.get(cid).cloned()
    }

    fn index_of(&self, model: &Model) -> Option<usize> {
        self.0.state.borrow().store.index_of(model.cid())
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("id", &self.0.id)
            .field("kind", &self.kind())
            .field("len", &self.0.state.try_borrow().map(|s| s.store.len()).ok())
            .finish()
    }
}
