//! 事件代理（Event Proxy）
//!
//! 处理源集合触发的每个事件：
//!
//! | 事件 | 成员索引 | 是否重新触发 |
//! |---|---|---|
//! | `add` | 源集合仍持有时，按显式位置/比较器/末尾插入 | 是，位置换算为聚合内位置 |
//! | `remove` | 源集合不再持有时，按令牌移除 | 是，位置为聚合内原位置 |
//! | `reset` | 移除该类型全部成员后按源集合当前成员重建 | 由策略与定义钩子决定 |
//! | 其他 | 无 | 是，原样转发 |
//!
//! 来源为聚合集合自身的成员事件不会修改索引，保证每次成员变化只进入索引一次。
//!
use aggregator_collection::{Event, Model, ObservableCollection};
use tracing::{debug, warn};

use crate::aggregator::Aggregator;

impl Aggregator {
    pub(crate) fn on_source_event(&self, kind: &str, event: &Event) -> anyhow::Result<()> {
        let forward = self.0.definition.forward(kind, event);

        if event.is_membership() && event.origin() == Some(self.id()) {
            if forward {
                self.emit(event)?;
            }
            return Ok(());
        }

        match event {
            Event::Add { model, origin, .. } => {
                let at = self.0.placements.borrow_mut().remove(&model.cid());
                // 先于代理运行的监听器可能已将其移出
                if !self.source_holds(kind, model) {
                    debug!(aggregator = %self.id(), kind, cid = %model.cid(), "stale add skipped");
                    return Ok(());
                }
                let inserted = self.0.index.borrow_mut().insert(
                    kind,
                    model.clone(),
                    at,
                    self.0.comparator.as_ref(),
                );
                let Some(index) = inserted else {
                    warn!(aggregator = %self.id(), cid = %model.cid(), "duplicate add ignored");
                    return Ok(());
                };
                debug!(aggregator = %self.id(), kind, cid = %model.cid(), index, "proxied add");
                if forward {
                    self.emit(&Event::Add {
                        model: model.clone(),
                        origin: *origin,
                        index,
                    })?;
                }
            }
            Event::Remove { model, origin, .. } => {
                if self.source_holds(kind, model) {
                    debug!(aggregator = %self.id(), kind, cid = %model.cid(), "stale remove skipped");
                    return Ok(());
                }
                let removed = self.0.index.borrow_mut().remove(model.cid());
                let Some((_, index)) = removed else {
                    return Ok(());
                };
                debug!(aggregator = %self.id(), kind, cid = %model.cid(), index, "proxied remove");
                if forward {
                    self.emit(&Event::Remove {
                        model: model.clone(),
                        origin: *origin,
                        index,
                    })?;
                }
            }
            Event::Reset { .. } => {
                self.reconcile(kind);
                if forward && self.0.policy.forward_source_resets {
                    self.emit(event)?;
                }
            }
            _ => {
                if forward {
                    self.emit(event)?;
                }
            }
        }
        Ok(())
    }

    /// 源集合当前是否持有该模型；成员事件以此为准，而非事件载荷
    fn source_holds(&self, kind: &str, model: &Model) -> bool {
        self.source(kind).is_some_and(|source| source.contains(model))
    }

    /// 以某个源集合的当前成员替换该类型在索引中的份额
    fn reconcile(&self, kind: &str) {
        let Some(source) = self.source(kind) else {
            return;
        };
        let models = source.models();
        let mut index = self.0.index.borrow_mut();
        let dropped = index.drain_kind(kind);
        for model in &models {
            index.insert(kind, model.clone(), None, self.0.comparator.as_ref());
        }
        debug!(
            aggregator = %self.id(),
            kind,
            dropped,
            added = models.len(),
            "source reset reconciled"
        );
    }
}
