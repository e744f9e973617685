//! 变更选项与集合配置
//!
use bon::Builder;
use std::cmp::Ordering;
use std::rc::Rc;

use crate::model::{Model, Validator};

/// 排序比较器：集合按其结果做有序插入
pub type Comparator = Rc<dyn Fn(&Model, &Model) -> Ordering>;

/// add/remove/reset/set 的通用选项
#[derive(Builder, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationOptions {
    /// 显式插入位置（超出长度时按末尾处理）
    at: Option<usize>,
    /// 静默：执行变更但不触发事件
    #[builder(default)]
    silent: bool,
}

impl MutationOptions {
    pub fn silent() -> Self {
        Self {
            at: None,
            silent: true,
        }
    }

    pub fn at(&self) -> Option<usize> {
        self.at
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    /// 去掉插入位置，保留其余选项
    pub fn without_at(self) -> Self {
        Self { at: None, ..self }
    }
}

/// 源集合配置
#[derive(Builder, Default, Clone)]
pub struct CollectionOptions {
    /// 该集合构造的模型的类型判别（写入 `type` 属性）
    #[builder(into)]
    kind: Option<String>,
    comparator: Option<Comparator>,
    validator: Option<Validator>,
}

impl CollectionOptions {
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn comparator(&self) -> Option<&Comparator> {
        self.comparator.as_ref()
    }

    pub fn validator(&self) -> Option<&Validator> {
        self.validator.as_ref()
    }
}
