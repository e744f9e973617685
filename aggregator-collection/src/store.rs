//! 有序模型存储（ModelStore）
//!
//! 源集合与聚合集合共用的底层结构：有序序列 + `Cid` 索引。
//! 每次插入/删除后两者保持一致，位置计算规则：显式位置 > 比较器 > 末尾。
//!
use std::cmp::Ordering;
use std::collections::HashMap;
use std::slice::Iter;

use crate::identity::Cid;
use crate::model::Model;
use crate::options::Comparator;

#[derive(Default)]
pub struct ModelStore {
    models: Vec<Model>,
    by_cid: HashMap<Cid, Model>,
}

impl ModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn contains(&self, cid: Cid) -> bool {
        self.by_cid.contains_key(&cid)
    }

    pub fn get(&self, cid: Cid) -> Option<&Model> {
        self.by_cid.get(&cid)
    }

    pub fn at(&self, index: usize) -> Option<&Model> {
        self.models.get(index)
    }

    pub fn index_of(&self, cid: Cid) -> Option<usize> {
        if !self.contains(cid) {
            return None;
        }
        self.models.iter().position(|m| m.cid() == cid)
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn iter(&self) -> Iter<'_, Model> {
        self.models.iter()
    }

    /// 计算插入位置
    pub fn insertion_index(
        &self,
        model: &Model,
        at: Option<usize>,
        comparator: Option<&Comparator>,
    ) -> usize {
        match (at, comparator) {
            (Some(at), _) => at.min(self.models.len()),
            (None, Some(cmp)) => self
                .models
                .partition_point(|existing| cmp(existing, model) == Ordering::Less),
            (None, None) => self.models.len(),
        }
    }

    /// 在 `index` 处插入（调用方保证未重复）
    pub fn insert(&mut self, model: Model, index: usize) -> usize {
        let index = index.min(self.models.len());
        self.by_cid.insert(model.cid(), model.clone());
        self.models.insert(index, model);
        index
    }

    /// 按计算出的位置插入，返回实际位置
    pub fn insert_ordered(
        &mut self,
        model: Model,
        at: Option<usize>,
        comparator: Option<&Comparator>,
    ) -> usize {
        let index = self.insertion_index(&model, at, comparator);
        self.insert(model, index)
    }

    /// 移除并返回模型与其原位置
    pub fn remove(&mut self, cid: Cid) -> Option<(Model, usize)> {
        self.by_cid.remove(&cid)?;
        let index = self.models.iter().position(|m| m.cid() == cid)?;
        Some((self.models.remove(index), index))
    }

    /// 清空并返回原有模型（按原顺序）
    pub fn clear(&mut self) -> Vec<Model> {
        self.by_cid.clear();
        std::mem::take(&mut self.models)
    }
}
