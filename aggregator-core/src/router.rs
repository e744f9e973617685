//! 分派路由（Dispatch Router）
//!
//! 聚合集合的 get/add/remove 不直接修改成员索引：
//! 先确定元素所属的源集合，再把操作转交给它，由代理对源集合事件的响应完成索引变更。
//!
use aggregator_collection::{
    Attributes, Cid, Collection, CollectionError, Model, ModelId, ModelInput, MutationOptions,
    ObservableCollection, Selector,
    model::{ID_ATTRIBUTE, TYPE_ATTRIBUTE},
};
use serde_json::Value;
use tracing::debug;

use crate::aggregator::Aggregator;
use crate::error::{AggregatorError, AggregatorResult};

/// 查找条件
#[derive(Debug, Clone)]
pub enum Criteria {
    /// (类型, 持久化标识)
    Typed { kind: String, id: Option<ModelId> },
    /// 元素本身：按其 `type` 与 `id` 查找
    Model(Model),
    /// 身份令牌
    Cid(Cid),
    /// 含 `type` 与 `id` 的属性表
    Attributes(Attributes),
}

impl<I: Into<ModelId>> From<(&str, I)> for Criteria {
    fn from((kind, id): (&str, I)) -> Self {
        Self::Typed {
            kind: kind.to_string(),
            id: Some(id.into()),
        }
    }
}

impl From<Model> for Criteria {
    fn from(model: Model) -> Self {
        Self::Model(model)
    }
}

impl From<&Model> for Criteria {
    fn from(model: &Model) -> Self {
        Self::Model(model.clone())
    }
}

impl From<Cid> for Criteria {
    fn from(cid: Cid) -> Self {
        Self::Cid(cid)
    }
}

impl From<Attributes> for Criteria {
    fn from(attrs: Attributes) -> Self {
        Self::Attributes(attrs)
    }
}

impl From<Value> for Criteria {
    // 非对象视为空条件，查找结果为空
    fn from(value: Value) -> Self {
        match value {
            Value::Object(attrs) => Self::Attributes(attrs),
            _ => Self::Attributes(Attributes::new()),
        }
    }
}

/// 已确定所属源集合的元素
pub(crate) struct Routed {
    pub(crate) kind: String,
    pub(crate) source: Collection,
    pub(crate) model: Model,
}

impl Aggregator {
    /// 经由源集合查找元素；类型未知、标识为空或不存在时返回 `None`
    pub fn get(&self, criteria: impl Into<Criteria>) -> Option<Model> {
        match criteria.into() {
            Criteria::Typed { kind, id } => self.lookup_typed(&kind, id),
            Criteria::Model(model) => match model.kind() {
                Some(kind) => self.lookup_typed(&kind, model.id()),
                None => None,
            },
            Criteria::Cid(cid) => self.get_by_cid(cid),
            Criteria::Attributes(attrs) => {
                let kind = attrs.get(TYPE_ATTRIBUTE).and_then(Value::as_str)?;
                let id = attrs.get(ID_ATTRIBUTE).and_then(ModelId::from_value);
                self.lookup_typed(kind, id)
            }
        }
    }

    fn lookup_typed(&self, kind: &str, id: Option<ModelId>) -> Option<Model> {
        let id = id?;
        let Some(source) = self.source(kind) else {
            debug!(aggregator = %self.id(), kind, "lookup for unknown type");
            return None;
        };
        source.get(id)
    }

    /// 加入元素：构造/校验后转交所属源集合
    ///
    /// 返回 `Ok(None)` 表示工厂静默拒绝。`at` 指聚合集合内的位置，源集合使用其默认顺序。
    pub fn add(
        &self,
        input: impl Into<ModelInput>,
        options: MutationOptions,
    ) -> AggregatorResult<Option<Model>> {
        let Some(routed) = self.route(input.into())? else {
            return Ok(None);
        };
        let model = routed.model.clone();
        self.insert_via_source(routed, options)?;
        Ok(Some(model))
    }

    /// 批量加入：全部解析、校验并检查唯一性之后才开始转交
    pub fn add_all<I>(&self, inputs: I, options: MutationOptions) -> AggregatorResult<Vec<Model>>
    where
        I: IntoIterator,
        I::Item: Into<ModelInput>,
    {
        let batch = self.route_batch(inputs)?;
        for routed in &batch {
            if routed
                .source
                .lookup(&Selector::Model(routed.model.clone()))
                .is_some()
            {
                return Err(duplicate(&routed.model).into());
            }
        }

        let mut models = Vec::with_capacity(batch.len());
        let mut at = options.at();
        for routed in batch {
            models.push(routed.model.clone());
            let step = MutationOptions::builder()
                .maybe_at(at)
                .silent(options.is_silent())
                .build();
            self.insert_via_source(routed, step)?;
            at = at.map(|position| position + 1);
        }
        Ok(models)
    }

    /// 移除元素：先按令牌、再按 `get` 定位，转交所属源集合
    pub fn remove(
        &self,
        criteria: impl Into<Criteria>,
        options: MutationOptions,
    ) -> AggregatorResult<Option<Model>> {
        let criteria = criteria.into();
        let member = match &criteria {
            Criteria::Model(model) => self.get_by_cid(model.cid()),
            Criteria::Cid(cid) => self.get_by_cid(*cid),
            _ => None,
        };
        let Some(model) = member.or_else(|| self.get(criteria)) else {
            return Ok(None);
        };

        let kind = self
            .0
            .index
            .borrow()
            .kind_of(model.cid())
            .map(str::to_string);
        let source = kind
            .and_then(|kind| self.source(&kind))
            .or_else(|| model.collection())
            .ok_or(AggregatorError::MissingOwnership { cid: model.cid() })?;

        debug!(aggregator = %self.id(), cid = %model.cid(), source = %source.id(), "routing remove");
        let removed = source.remove(model.clone(), options)?;
        if options.is_silent() {
            self.0.index.borrow_mut().remove(model.cid());
        }
        Ok(removed)
    }

    /// 解析单个输入的所属源集合；工厂静默拒绝时返回 `None`
    pub(crate) fn route(&self, input: ModelInput) -> AggregatorResult<Option<Routed>> {
        match input {
            ModelInput::Model(model) => self.route_owned(model).map(Some),
            ModelInput::Attributes(attrs) => {
                if let Some(factory) = &self.0.factory {
                    return match factory(attrs)? {
                        Some(model) => self.route_owned(model).map(Some),
                        None => {
                            debug!(aggregator = %self.id(), "factory declined element");
                            Ok(None)
                        }
                    };
                }

                let kind = attrs
                    .get(TYPE_ATTRIBUTE)
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        AggregatorError::invalid_element("attributes carry no `type`")
                    })?;
                let source = self.source(&kind).ok_or_else(|| {
                    AggregatorError::invalid_element(format!(
                        "no source collection for type `{kind}`"
                    ))
                })?;
                let model = source.prepare_model(attrs).map_err(|err| match err {
                    CollectionError::Validation { reason } => {
                        AggregatorError::InvalidElement { reason }
                    }
                    other => other.into(),
                })?;
                Ok(Some(Routed {
                    kind,
                    source,
                    model,
                }))
            }
            ModelInput::Invalid(value) => Err(AggregatorError::invalid_element(format!(
                "expected a model or an attributes object, got `{value}`"
            ))),
        }
    }

    fn route_owned(&self, model: Model) -> AggregatorResult<Routed> {
        let source = model
            .collection()
            .ok_or(AggregatorError::MissingOwnership { cid: model.cid() })?;
        let kind = self.0.registry.borrow().kind_of(&source).ok_or_else(|| {
            AggregatorError::invalid_element(format!(
                "element {} belongs to collection {} which is not aggregated",
                model.cid(),
                source.id()
            ))
        })?;
        Ok(Routed {
            kind,
            source,
            model,
        })
    }

    /// 批量解析，并拒绝批内重复（按令牌，或同类型下的持久化标识）
    pub(crate) fn route_batch<I>(&self, inputs: I) -> AggregatorResult<Vec<Routed>>
    where
        I: IntoIterator,
        I::Item: Into<ModelInput>,
    {
        let mut batch: Vec<Routed> = Vec::new();
        for input in inputs {
            let Some(routed) = self.route(input.into())? else {
                continue;
            };
            let id = routed.model.id();
            let clash = batch.iter().any(|r| {
                r.model.cid() == routed.model.cid()
                    || (id.is_some() && r.kind == routed.kind && r.model.id() == id)
            });
            if clash {
                return Err(duplicate(&routed.model).into());
            }
            batch.push(routed);
        }
        Ok(batch)
    }

    /// 交给所属源集合插入；静默时直接写入成员索引
    pub(crate) fn insert_via_source(
        &self,
        routed: Routed,
        options: MutationOptions,
    ) -> AggregatorResult<()> {
        let Routed {
            kind,
            source,
            model,
        } = routed;
        let cid = model.cid();
        debug!(aggregator = %self.id(), kind = %kind, cid = %cid, at = ?options.at(), "routing add");

        if options.is_silent() {
            source.add(model.clone(), options.without_at())?;
            self.0.index.borrow_mut().insert(
                &kind,
                model,
                options.at(),
                self.0.comparator.as_ref(),
            );
            return Ok(());
        }

        if let Some(at) = options.at() {
            self.0.placements.borrow_mut().insert(cid, at);
        }
        let added = source.add(model, options.without_at());
        self.0.placements.borrow_mut().remove(&cid);
        added?;
        Ok(())
    }
}

fn duplicate(model: &Model) -> CollectionError {
    CollectionError::Duplicate {
        cid: model.cid(),
        id: model.id().map(|id| id.to_string()),
    }
}
