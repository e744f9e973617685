//! 集合层统一错误定义
//!
//! 覆盖模型构造/校验、集合唯一性约束、监听器失败与序列化等最小必要集合，
//! 便于上层（聚合集合）统一转换。
//!
use thiserror::Error;

use crate::identity::Cid;

/// 统一错误类型（集合基础库最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CollectionError {
    // --- 模型构造/校验 ---
    #[error("validation failed: {reason}")]
    Validation { reason: String },
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    // --- 集合约束 ---
    #[error("duplicate model: cid={cid}, id={id:?}")]
    Duplicate { cid: Cid, id: Option<String> },

    // --- 事件分发 ---
    #[error("listener failed: {0}")]
    Listener(#[from] anyhow::Error),

    // --- 序列化 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
}

impl CollectionError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// 将监听器返回的错误还原为集合错误；嵌套的 `CollectionError` 直接解包
    pub(crate) fn from_listener(err: anyhow::Error) -> Self {
        match err.downcast::<CollectionError>() {
            Ok(inner) => inner,
            Err(other) => Self::Listener(other),
        }
    }
}

/// 统一 Result 类型别名
pub type CollectionResult<T> = Result<T, CollectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_collection_errors_are_not_double_wrapped() {
        let inner = CollectionError::validation("title required");
        let err = CollectionError::from_listener(anyhow::Error::new(inner));
        assert!(matches!(err, CollectionError::Validation { .. }));

        let err = CollectionError::from_listener(anyhow::anyhow!("boom"));
        match err {
            CollectionError::Listener(e) => assert_eq!(e.to_string(), "boom"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
