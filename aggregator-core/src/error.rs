use aggregator_collection::{Cid, CollectionError};

/// 聚合层错误
///
/// 查找不到（未知类型、未持久化标识、不存在的成员）不是错误，以 `None` 表示。
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum AggregatorError {
    /// 输入无法解析为带有已知源类型、且通过校验的元素
    #[error("invalid element: {reason}")]
    InvalidElement { reason: String },

    /// 已构造的元素没有所属源集合
    #[error("element {cid} has no owning collection")]
    MissingOwnership { cid: Cid },

    #[error("collection: {0}")]
    Collection(#[source] CollectionError),
}

impl From<CollectionError> for AggregatorError {
    fn from(err: CollectionError) -> Self {
        Self::from_collection(err)
    }
}

impl AggregatorError {
    pub fn invalid_element(reason: impl Into<String>) -> Self {
        Self::InvalidElement {
            reason: reason.into(),
        }
    }

    /// 监听器错误中嵌套的聚合错误直接解包
    fn from_collection(err: CollectionError) -> Self {
        match err {
            CollectionError::Listener(inner) => match inner.downcast::<AggregatorError>() {
                Ok(err) => err,
                Err(other) => Self::Collection(CollectionError::Listener(other)),
            },
            other => Self::Collection(other),
        }
    }
}

pub type AggregatorResult<T> = Result<T, AggregatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_aggregator_error_raised_by_listener() {
        let raised = anyhow::Error::new(AggregatorError::invalid_element("boom"));
        let err = AggregatorError::from(CollectionError::Listener(raised));
        assert!(matches!(err, AggregatorError::InvalidElement { reason } if reason == "boom"));
    }

    #[test]
    fn keeps_other_collection_errors() {
        let err = AggregatorError::from(CollectionError::validation("empty title"));
        assert!(matches!(
            err,
            AggregatorError::Collection(CollectionError::Validation { .. })
        ));
        assert_eq!(
            err.to_string(),
            "collection: validation failed: empty title"
        );
    }
}
