//! 集合操作的输入：待加入的模型（或原始属性）与查找选择器
//!
use serde_json::Value;

use crate::identity::{Cid, ModelId};
use crate::model::{Attributes, Model};

/// `add`/`reset` 的输入：已有模型或原始属性
#[derive(Debug, Clone)]
pub enum ModelInput {
    Model(Model),
    Attributes(Attributes),
    /// 既不是模型也不是属性对象的值，准备阶段会被拒绝
    Invalid(Value),
}

impl From<Model> for ModelInput {
    fn from(model: Model) -> Self {
        ModelInput::Model(model)
    }
}

impl From<&Model> for ModelInput {
    fn from(model: &Model) -> Self {
        ModelInput::Model(model.clone())
    }
}

impl From<Attributes> for ModelInput {
    fn from(attrs: Attributes) -> Self {
        ModelInput::Attributes(attrs)
    }
}

impl From<Value> for ModelInput {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(attrs) => ModelInput::Attributes(attrs),
            other => ModelInput::Invalid(other),
        }
    }
}

/// `remove`/`lookup` 的选择器
#[derive(Debug, Clone)]
pub enum Selector {
    Model(Model),
    Cid(Cid),
    Id(ModelId),
    /// 携带 `id` 属性的对象
    Attributes(Attributes),
}

impl From<Model> for Selector {
    fn from(model: Model) -> Self {
        Selector::Model(model)
    }
}

impl From<&Model> for Selector {
    fn from(model: &Model) -> Self {
        Selector::Model(model.clone())
    }
}

impl From<Cid> for Selector {
    fn from(cid: Cid) -> Self {
        Selector::Cid(cid)
    }
}

impl From<ModelId> for Selector {
    fn from(id: ModelId) -> Self {
        Selector::Id(id)
    }
}

impl From<i64> for Selector {
    fn from(id: i64) -> Self {
        Selector::Id(id.into())
    }
}

impl From<i32> for Selector {
    fn from(id: i32) -> Self {
        Selector::Id(id.into())
    }
}

impl From<&str> for Selector {
    fn from(id: &str) -> Self {
        Selector::Id(id.into())
    }
}

impl From<Attributes> for Selector {
    fn from(attrs: Attributes) -> Self {
        Selector::Attributes(attrs)
    }
}

impl From<Value> for Selector {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(attrs) => Selector::Attributes(attrs),
            other => match ModelId::from_value(&other) {
                Some(id) => Selector::Id(id),
                None => Selector::Attributes(Attributes::new()),
            },
        }
    }
}
