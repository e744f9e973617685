//! 模型（Model）
//!
//! 可观察的记录：持有身份令牌、属性表、指向所属集合的弱引用与自身的事件分发器。
//! 模型以 `Rc` 共享，源集合与聚合集合引用的是同一个对象，因此属性变化事件
//! 无需复制即可到达两侧的监听器。
//!
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::collection::{Collection, CollectionInner};
use crate::error::{CollectionError, CollectionResult};
use crate::event::{Emitter, Event, ListenerId, Topic};
use crate::identity::{Cid, ModelId};
use crate::options::MutationOptions;

/// 属性表
pub type Attributes = Map<String, Value>;

/// 类型判别属性名
pub const TYPE_ATTRIBUTE: &str = "type";
/// 持久化标识属性名
pub const ID_ATTRIBUTE: &str = "id";

/// 同步校验钩子：返回 `Err(reason)` 表示拒绝
pub type Validator = Rc<dyn Fn(&Attributes) -> Result<(), String>>;

/// 共享的模型句柄
#[derive(Clone)]
pub struct Model(Rc<ModelInner>);

struct ModelInner {
    cid: Cid,
    attributes: RefCell<Attributes>,
    collection: RefCell<Weak<CollectionInner>>,
    validator: Option<Validator>,
    emitter: Emitter,
}

impl Model {
    /// 使用给定属性创建模型，分配新的身份令牌
    pub fn new(attributes: Attributes) -> Self {
        Self::build(attributes, None, Weak::new())
    }

    /// 创建带校验钩子的模型；初始属性不合法时返回 `Validation` 错误
    pub fn with_validator(attributes: Attributes, validator: Validator) -> CollectionResult<Self> {
        validator(&attributes).map_err(CollectionError::validation)?;
        Ok(Self::build(attributes, Some(validator), Weak::new()))
    }

    pub(crate) fn build(
        attributes: Attributes,
        validator: Option<Validator>,
        owner: Weak<CollectionInner>,
    ) -> Self {
        Self(Rc::new(ModelInner {
            cid: Cid::next(),
            attributes: RefCell::new(attributes),
            collection: RefCell::new(owner),
            validator,
            emitter: Emitter::new(),
        }))
    }

    pub fn cid(&self) -> Cid {
        self.0.cid
    }

    /// 持久化标识（读取 `id` 属性）
    pub fn id(&self) -> Option<ModelId> {
        self.0
            .attributes
            .borrow()
            .get(ID_ATTRIBUTE)
            .and_then(ModelId::from_value)
    }

    /// 类型判别（读取 `type` 属性）
    pub fn kind(&self) -> Option<String> {
        self.0
            .attributes
            .borrow()
            .get(TYPE_ATTRIBUTE)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn get(&self, attr: &str) -> Option<Value> {
        self.0.attributes.borrow().get(attr).cloned()
    }

    pub fn has(&self, attr: &str) -> bool {
        self.0
            .attributes
            .borrow()
            .get(attr)
            .is_some_and(|v| !v.is_null())
    }

    /// 属性快照
    pub fn attributes(&self) -> Attributes {
        self.0.attributes.borrow().clone()
    }

    /// 合并属性
    ///
    /// 先对合并后的属性执行校验，失败则不做任何修改；成功后逐个触发
    /// `change:<attr>`，最后触发一次 `change`（`silent` 时均不触发）。
    /// 返回是否有属性实际发生变化。
    pub fn set(&self, attrs: Attributes, options: MutationOptions) -> CollectionResult<bool> {
        if let Some(validator) = &self.0.validator {
            let mut merged = self.attributes();
            merged.extend(attrs.clone());
            validator(&merged).map_err(CollectionError::validation)?;
        }

        let mut changes = Vec::new();
        {
            let mut current = self.0.attributes.borrow_mut();
            for (attr, value) in attrs {
                let previous = current.get(&attr).cloned();
                if previous.as_ref() == Some(&value) {
                    continue;
                }
                current.insert(attr.clone(), value.clone());
                changes.push((attr, value, previous));
            }
        }

        self.notify_changes(changes, options)
    }

    /// 设置单个属性
    pub fn set_attr(
        &self,
        attr: impl Into<String>,
        value: impl Into<Value>,
    ) -> CollectionResult<bool> {
        let mut attrs = Attributes::new();
        attrs.insert(attr.into(), value.into());
        self.set(attrs, MutationOptions::default())
    }

    /// 删除属性，触发的事件中 `value` 为 `null`
    pub fn unset(&self, attr: &str, options: MutationOptions) -> CollectionResult<bool> {
        if let Some(validator) = &self.0.validator {
            let mut remaining = self.attributes();
            remaining.remove(attr);
            validator(&remaining).map_err(CollectionError::validation)?;
        }

        let previous = self.0.attributes.borrow_mut().remove(attr);
        match previous {
            Some(previous) => self.notify_changes(
                vec![(attr.to_string(), Value::Null, Some(previous))],
                options,
            ),
            None => Ok(false),
        }
    }

    fn notify_changes(
        &self,
        changes: Vec<(String, Value, Option<Value>)>,
        options: MutationOptions,
    ) -> CollectionResult<bool> {
        let changed = !changes.is_empty();
        if !changed || options.is_silent() {
            return Ok(changed);
        }

        for (attr, value, previous) in changes {
            self.trigger(&Event::ChangeAttr {
                model: self.clone(),
                attr,
                value,
                previous,
            })?;
        }
        self.trigger(&Event::Change {
            model: self.clone(),
        })?;
        Ok(true)
    }

    /// 所属的源集合
    pub fn collection(&self) -> Option<Collection> {
        self.0.collection.borrow().upgrade().map(Collection::from_inner)
    }

    pub(crate) fn owner_is(&self, inner: &Rc<CollectionInner>) -> bool {
        self.0
            .collection
            .borrow()
            .upgrade()
            .is_some_and(|owner| Rc::ptr_eq(&owner, inner))
    }

    pub(crate) fn set_owner(&self, owner: Weak<CollectionInner>) {
        *self.0.collection.borrow_mut() = owner;
    }

    pub(crate) fn clear_owner(&self) {
        *self.0.collection.borrow_mut() = Weak::new();
    }

    pub fn bind<F>(&self, topic: impl Into<Topic>, handler: F) -> ListenerId
    where
        F: Fn(&Event) -> anyhow::Result<()> + 'static,
    {
        self.0.emitter.bind(topic.into(), handler)
    }

    pub fn unbind(&self, id: ListenerId) -> bool {
        self.0.emitter.unbind(id)
    }

    pub fn trigger(&self, event: &Event) -> CollectionResult<()> {
        self.0.emitter.emit(event)
    }

    /// 是否为同一个模型对象
    pub fn ptr_eq(&self, other: &Model) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Model {}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Model");
        s.field("cid", &self.0.cid);
        match self.0.attributes.try_borrow() {
            Ok(attrs) => s.field("attributes", &*attrs),
            Err(_) => s.field("attributes", &"<borrowed>"),
        };
        s.finish()
    }
}
