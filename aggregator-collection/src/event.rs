//! 集合事件（Event）与同步事件分发器（Emitter）
//!
//! 事件以带标签的枚举表示，订阅者按 `Topic` 过滤；分发同步、深度优先，
//! 按注册顺序调用，分发期间不持有任何借用，因此监听器可以重入任意集合。
//!
use serde_json::Value;
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{CollectionError, CollectionResult};
use crate::identity::CollectionId;
use crate::model::Model;

/// 集合/模型事件
#[derive(Debug, Clone)]
pub enum Event {
    /// 模型加入集合；`index` 为其在触发事件的集合中的位置
    Add {
        model: Model,
        origin: CollectionId,
        index: usize,
    },
    /// 模型移出集合；`index` 为移除前的位置
    Remove {
        model: Model,
        origin: CollectionId,
        index: usize,
    },
    /// 集合整体替换
    Reset { origin: CollectionId },
    /// 模型属性发生变化（每次 `set` 一次）
    Change { model: Model },
    /// 单个属性发生变化
    ChangeAttr {
        model: Model,
        attr: String,
        value: Value,
        previous: Option<Value>,
    },
    /// 自定义事件
    Custom {
        name: String,
        model: Option<Model>,
        payload: Value,
    },
}

impl Event {
    /// 事件名（`add`、`change:title` 等）
    pub fn name(&self) -> Cow<'_, str> {
        match self {
            Event::Add { .. } => Cow::Borrowed("add"),
            Event::Remove { .. } => Cow::Borrowed("remove"),
            Event::Reset { .. } => Cow::Borrowed("reset"),
            Event::Change { .. } => Cow::Borrowed("change"),
            Event::ChangeAttr { attr, .. } => Cow::Owned(format!("change:{attr}")),
            Event::Custom { name, .. } => Cow::Borrowed(name),
        }
    }

    /// 触发事件的集合；模型事件没有来源集合
    pub fn origin(&self) -> Option<CollectionId> {
        match self {
            Event::Add { origin, .. } | Event::Remove { origin, .. } | Event::Reset { origin } => {
                Some(*origin)
            }
            _ => None,
        }
    }

    pub fn model(&self) -> Option<&Model> {
        match self {
            Event::Add { model, .. }
            | Event::Remove { model, .. }
            | Event::Change { model }
            | Event::ChangeAttr { model, .. } => Some(model),
            Event::Custom { model, .. } => model.as_ref(),
            Event::Reset { .. } => None,
        }
    }

    /// 是否改变集合成员（add/remove/reset）
    pub fn is_membership(&self) -> bool {
        matches!(
            self,
            Event::Add { .. } | Event::Remove { .. } | Event::Reset { .. }
        )
    }

    pub fn matches(&self, topic: &Topic) -> bool {
        match (topic, self) {
            (Topic::All, _) => true,
            (Topic::Add, Event::Add { .. }) => true,
            (Topic::Remove, Event::Remove { .. }) => true,
            (Topic::Reset, Event::Reset { .. }) => true,
            (Topic::Change, Event::Change { .. }) => true,
            (Topic::ChangeAttr(want), Event::ChangeAttr { attr, .. }) => want == attr,
            (Topic::Custom(want), Event::Custom { name, .. }) => want == name,
            _ => false,
        }
    }
}

/// 订阅主题
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    All,
    Add,
    Remove,
    Reset,
    Change,
    ChangeAttr(String),
    Custom(String),
}

impl From<&str> for Topic {
    fn from(name: &str) -> Self {
        match name {
            "all" => Topic::All,
            "add" => Topic::Add,
            "remove" => Topic::Remove,
            "reset" => Topic::Reset,
            "change" => Topic::Change,
            other => match other.strip_prefix("change:") {
                Some(attr) => Topic::ChangeAttr(attr.to_string()),
                None => Topic::Custom(other.to_string()),
            },
        }
    }
}

/// 监听器：返回错误将中止本次分发并传回触发方
pub type Handler = Rc<dyn Fn(&Event) -> anyhow::Result<()>>;

/// 监听器句柄，用于解绑
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    topic: Topic,
    handler: Handler,
}

/// 同步事件分发器
#[derive(Default)]
pub struct Emitter {
    listeners: RefCell<Vec<Listener>>,
    next_id: Cell<u64>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind<F>(&self, topic: Topic, handler: F) -> ListenerId
    where
        F: Fn(&Event) -> anyhow::Result<()> + 'static,
    {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push(Listener {
            id,
            topic,
            handler: Rc::new(handler),
        });
        id
    }

    pub fn unbind(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|l| l.id != id);
        listeners.len() != before
    }

    /// 解绑某主题下的全部监听器，返回解绑数量
    pub fn unbind_topic(&self, topic: &Topic) -> usize {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|l| &l.topic != topic);
        before - listeners.len()
    }

    pub fn unbind_all(&self) {
        self.listeners.borrow_mut().clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_bound(&self, id: ListenerId) -> bool {
        self.listeners.borrow().iter().any(|l| l.id == id)
    }

    /// 同步分发事件
    ///
    /// 先对匹配的监听器做快照再逐个调用，调用期间不持有借用；
    /// 尚未执行而已被解绑的监听器会被跳过。
    pub fn emit(&self, event: &Event) -> CollectionResult<()> {
        let snapshot: Vec<(ListenerId, Handler)> = self
            .listeners
            .borrow()
            .iter()
            .filter(|l| event.matches(&l.topic))
            .map(|l| (l.id, l.handler.clone()))
            .collect();

        for (id, handler) in snapshot {
            if !self.is_bound(id) {
                continue;
            }
            handler(event).map_err(CollectionError::from_listener)?;
        }
        Ok(())
    }
}
