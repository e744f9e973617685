//! 聚合集合配置
//!
use aggregator_collection::{Attributes, Comparator, Model};
use bon::Builder;
use std::fmt;
use std::rc::Rc;

use crate::error::AggregatorResult;
use crate::registry::SourceResolver;

/// 类型分派的模型工厂：由原始属性构造归属某个源集合的模型；
/// 返回 `Ok(None)` 表示静默拒绝（不插入、不报错）。
pub type ModelFactory = Rc<dyn Fn(Attributes) -> AggregatorResult<Option<Model>>>;

/// 聚合集合自身的 `reset` 如何作用到源集合
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    /// 按类型拆分后对每个源集合执行 `reset`，源集合监听器观察到 `reset`
    #[default]
    PushDown,
    /// 静默清空源集合后逐个 `add`，源集合监听器只观察到 `add`；
    /// 聚合集合最后触发一次 `reset`
    Elementwise,
}

/// 事件代理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
pub struct ProxyPolicy {
    /// 源集合的 `reset` 是否作为聚合集合的 `reset` 通知监听器；
    /// 成员索引的重建不受此开关影响
    #[builder(default = true)]
    pub forward_source_resets: bool,
    #[builder(default)]
    pub reset_mode: ResetMode,
}

impl Default for ProxyPolicy {
    fn default() -> Self {
        Self {
            forward_source_resets: true,
            reset_mode: ResetMode::PushDown,
        }
    }
}

/// 构造参数；未给出的项取自聚合定义
#[derive(Default, Clone, Builder)]
pub struct AggregatorOptions {
    pub comparator: Option<Comparator>,
    /// 覆盖定义中的默认源集合映射
    pub collections: Option<SourceResolver>,
    pub policy: Option<ProxyPolicy>,
    pub factory: Option<ModelFactory>,
}

impl fmt::Debug for AggregatorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregatorOptions")
            .field("comparator", &self.comparator.is_some())
            .field("collections", &self.collections.is_some())
            .field("policy", &self.policy)
            .field("factory", &self.factory.is_some())
            .finish()
    }
}
