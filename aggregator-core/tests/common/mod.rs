#![allow(dead_code)]

use aggregator_collection::{Collection, ObservableCollection};
use aggregator_core::{Aggregator, AggregatorOptions, SourceMap};
use serde_json::{Value, json};
use std::cell::Cell;
use std::rc::Rc;

pub struct Threads {
    pub tasks: Collection,
    pub activities: Collection,
    pub threads: Aggregator,
}

pub fn sources(tasks: &Collection, activities: &Collection) -> impl Fn() -> SourceMap + 'static {
    let tasks = tasks.clone();
    let activities = activities.clone();
    move || {
        SourceMap::from([
            ("Task".to_string(), tasks.clone()),
            ("Activity".to_string(), activities.clone()),
        ])
    }
}

/// Task 与 Activity 各两个（id 0、1），经由聚合集合交替加入
pub fn threads(options: AggregatorOptions) -> anyhow::Result<Threads> {
    let tasks = Collection::with_kind("Task");
    let activities = Collection::with_kind("Activity");
    let threads = Aggregator::new(sources(&tasks, &activities), options);
    for i in 0..2 {
        threads.add(json!({ "id": i, "type": "Task" }), Default::default())?;
        threads.add(json!({ "id": i, "type": "Activity" }), Default::default())?;
    }
    Ok(Threads {
        tasks,
        activities,
        threads,
    })
}

pub fn counter<C: ObservableCollection>(target: &C, topic: &str) -> Rc<Cell<usize>> {
    let count = Rc::new(Cell::new(0));
    let hits = count.clone();
    target.bind(topic, move |_| {
        hits.set(hits.get() + 1);
        Ok(())
    });
    count
}

pub fn ids<C: ObservableCollection>(target: &C) -> Vec<Value> {
    target.pluck("id")
}

pub fn json_ids(ids: &[i64]) -> Vec<Value> {
    ids.iter().map(|id| json!(id)).collect()
}
