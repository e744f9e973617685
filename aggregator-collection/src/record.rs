//! 类型化记录（ModelKind）
//!
//! 将普通结构体与类型判别绑定，便于以强类型方式构造与读取模型属性。
//! 通常由 `#[model(kind = "...")]` 宏实现。
//!
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{CollectionError, CollectionResult};
use crate::model::{Attributes, Model, TYPE_ATTRIBUTE};

pub trait ModelKind: Serialize + DeserializeOwned {
    /// 类型判别，对应模型的 `type` 属性与聚合中的源集合键
    const KIND: &'static str;

    /// 序列化为属性表并写入类型判别
    fn to_attributes(&self) -> CollectionResult<Attributes> {
        match serde_json::to_value(self)? {
            Value::Object(mut attrs) => {
                attrs.insert(
                    TYPE_ATTRIBUTE.to_string(),
                    Value::String(Self::KIND.to_string()),
                );
                Ok(attrs)
            }
            other => Err(CollectionError::invalid_input(format!(
                "record `{}` must serialize to an object, got `{other}`",
                Self::KIND
            ))),
        }
    }

    /// 从模型当前属性反序列化
    fn from_model(model: &Model) -> CollectionResult<Self> {
        Ok(serde_json::from_value(Value::Object(model.attributes()))?)
    }
}
