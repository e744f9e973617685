mod common;

use aggregator_collection::{
    Collection, Comparator, Event, Model, MutationOptions, ObservableCollection,
};
use aggregator_core::{
    AggregateDefinition, Aggregator, AggregatorOptions, ProxyPolicy, ResetMode, SourceMap,
    resolver,
};
use anyhow::Result as AnyResult;
use common::{counter, ids, json_ids, sources, threads};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

fn quiet_threads(mode: ResetMode) -> AggregatorOptions {
    AggregatorOptions::builder()
        .policy(
            ProxyPolicy::builder()
                .forward_source_resets(false)
                .reset_mode(mode)
                .build(),
        )
        .build()
}

#[test]
fn source_reset_is_reconciled_but_not_announced() -> AnyResult<()> {
    let t = threads(quiet_threads(ResetMode::Elementwise))?;
    let on_threads = counter(&t.threads, "reset");
    let on_tasks = counter(&t.tasks, "reset");

    assert_eq!(ids(&t.threads), json_ids(&[0, 0, 1, 1]));
    t.tasks
        .reset([json!({ "id": 2 }), json!({ "id": 3 })], MutationOptions::default())?;

    assert_eq!(on_threads.get(), 0);
    assert_eq!(on_tasks.get(), 1);
    assert_eq!(t.threads.len(), 4);
    assert_eq!(ids(&t.threads), json_ids(&[0, 1, 2, 3]));
    assert_eq!(ids(&t.tasks), json_ids(&[2, 3]));
    Ok(())
}

#[test]
fn elementwise_reset_feeds_sources_with_adds() -> AnyResult<()> {
    let t = threads(quiet_threads(ResetMode::Elementwise))?;
    let threads_reset = counter(&t.threads, "reset");
    let threads_add = counter(&t.threads, "add");
    let threads_all = counter(&t.threads, "all");
    let tasks_reset = counter(&t.tasks, "reset");
    let tasks_add = counter(&t.tasks, "add");
    let tasks_all = counter(&t.tasks, "all");

    t.threads.reset(
        [
            json!({ "id": 4, "type": "Task" }),
            json!({ "id": 5, "type": "Task" }),
        ],
        MutationOptions::default(),
    )?;

    assert_eq!(threads_reset.get(), 1);
    assert_eq!(tasks_reset.get(), 0);
    assert_eq!(threads_add.get(), 2);
    assert_eq!(threads_all.get(), 3);
    assert_eq!(tasks_add.get(), 2);
    assert_eq!(tasks_all.get(), 2);

    // 源集合的旧成员被静默清空，并集保持一致
    assert_eq!(ids(&t.threads), json_ids(&[4, 5]));
    assert_eq!(ids(&t.tasks), json_ids(&[4, 5]));
    assert_eq!(t.activities.len(), 0);
    Ok(())
}

#[test]
fn push_down_without_forwarding_announces_once() -> AnyResult<()> {
    let t = threads(quiet_threads(ResetMode::PushDown))?;
    let threads_reset = counter(&t.threads, "reset");
    let tasks_reset = counter(&t.tasks, "reset");
    let activities_reset = counter(&t.activities, "reset");

    t.threads.reset(
        [
            json!({ "id": 7, "type": "Activity" }),
            json!({ "id": 8, "type": "Task" }),
        ],
        MutationOptions::default(),
    )?;

    assert_eq!(threads_reset.get(), 1);
    assert_eq!(tasks_reset.get(), 1);
    assert_eq!(activities_reset.get(), 1);
    assert_eq!(t.threads.len(), 2);
    assert_eq!(ids(&t.activities), json_ids(&[7]));
    assert_eq!(ids(&t.tasks), json_ids(&[8]));
    Ok(())
}

#[test]
fn silent_reset_keeps_the_union_without_events() -> AnyResult<()> {
    let tasks = Collection::with_kind("Task");
    let activities = Collection::with_kind("Activity");
    let threads = Aggregator::with_models(
        sources(&tasks, &activities),
        [
            json!({ "id": 1, "type": "Task" }),
            json!({ "id": 1, "type": "Activity" }),
            json!({ "id": 2, "type": "Task" }),
        ],
        AggregatorOptions::default(),
    )?;
    let tasks_all = counter(&tasks, "all");
    let threads_all = counter(&threads, "all");

    assert_eq!(threads.len(), 3);
    assert_eq!(tasks.len(), 2);
    assert_eq!(activities.len(), 1);

    threads.reset(Vec::<Model>::new(), MutationOptions::silent())?;
    assert_eq!(threads.len(), 0);
    assert_eq!(tasks.len() + activities.len(), 0);
    assert_eq!(tasks_all.get(), 0);
    assert_eq!(threads_all.get(), 0);
    Ok(())
}

#[test]
fn reset_with_a_bad_element_changes_nothing() -> AnyResult<()> {
    let t = threads(AggregatorOptions::default())?;
    let result = t.threads.reset(
        [
            json!({ "id": 4, "type": "Task" }),
            json!({ "id": 5, "type": "Comment" }),
        ],
        MutationOptions::default(),
    );
    assert!(result.is_err());

    let duplicate = t.threads.reset(
        [
            json!({ "id": 4, "type": "Task" }),
            json!({ "id": 4, "type": "Task" }),
        ],
        MutationOptions::default(),
    );
    assert!(duplicate.is_err());

    assert_eq!(ids(&t.threads), json_ids(&[0, 0, 1, 1]));
    assert_eq!(t.tasks.len(), 2);
    Ok(())
}

/// 只屏蔽 Task 的 reset 通知，并按 id 倒序排列
struct QuietTasks {
    tasks: Collection,
    activities: Collection,
}

impl AggregateDefinition for QuietTasks {
    fn collections(&self) -> SourceMap {
        SourceMap::from([
            ("Task".to_string(), self.tasks.clone()),
            ("Activity".to_string(), self.activities.clone()),
        ])
    }

    fn comparator(&self) -> Option<Comparator> {
        let key = |m: &Model| m.get("id").and_then(|v| v.as_i64()).unwrap_or_default();
        Some(Rc::new(move |a: &Model, b: &Model| key(b).cmp(&key(a))))
    }

    fn forward(&self, source_kind: &str, event: &Event) -> bool {
        !(source_kind == "Task" && matches!(event, Event::Reset { .. }))
    }
}

#[test]
fn definition_hooks_shape_the_aggregate() -> AnyResult<()> {
    let tasks = Collection::with_kind("Task");
    let activities = Collection::with_kind("Activity");
    let threads = Aggregator::new(
        QuietTasks {
            tasks: tasks.clone(),
            activities: activities.clone(),
        },
        AggregatorOptions::default(),
    );
    let on_threads = counter(&threads, "reset");

    tasks.add_all([json!({ "id": 1 }), json!({ "id": 5 })], MutationOptions::default())?;
    activities.add(json!({ "id": 3 }), MutationOptions::default())?;
    assert_eq!(ids(&threads), json_ids(&[5, 3, 1]));

    tasks.reset([json!({ "id": 4 })], MutationOptions::default())?;
    assert_eq!(on_threads.get(), 0);
    assert_eq!(ids(&threads), json_ids(&[4, 3]));

    activities.reset([json!({ "id": 9 })], MutationOptions::default())?;
    assert_eq!(on_threads.get(), 1);
    assert_eq!(ids(&threads), json_ids(&[9, 4]));
    Ok(())
}

#[test]
fn refresh_rebinds_to_newly_resolved_sources() -> AnyResult<()> {
    let first = Collection::with_kind("Task");
    first.add(json!({ "id": 1 }), MutationOptions::default())?;
    let current = Rc::new(RefCell::new(SourceMap::from([(
        "Task".to_string(),
        first.clone(),
    )])));

    let resolve = {
        let current = current.clone();
        resolver(move || current.borrow().clone())
    };
    let threads = Aggregator::new(
        || SourceMap::new(),
        AggregatorOptions::builder().collections(resolve).build(),
    );
    assert_eq!(ids(&threads), json_ids(&[1]));

    let second = Collection::with_kind("Task");
    second.add_all([json!({ "id": 2 }), json!({ "id": 3 })], MutationOptions::default())?;
    current
        .borrow_mut()
        .insert("Task".to_string(), second.clone());

    let on_reset = counter(&threads, "reset");
    threads.refresh_sources(MutationOptions::default())?;
    assert_eq!(on_reset.get(), 1);
    assert_eq!(ids(&threads), json_ids(&[2, 3]));
    assert!(threads.source("Task").is_some_and(|s| s.ptr_eq(&second)));

    // 旧源集合不再被代理
    first.add(json!({ "id": 4 }), MutationOptions::default())?;
    assert_eq!(threads.len(), 2);
    assert_eq!(first.emitter().listener_count(), 0);
    Ok(())
}

#[test]
fn dropping_the_aggregate_unbinds_from_sources() -> AnyResult<()> {
    let t = threads(AggregatorOptions::default())?;
    assert_eq!(t.tasks.emitter().listener_count(), 1);
    assert_eq!(t.activities.emitter().listener_count(), 1);

    let common::Threads {
        tasks,
        activities,
        threads,
    } = t;
    drop(threads);

    assert_eq!(tasks.emitter().listener_count(), 0);
    assert_eq!(activities.emitter().listener_count(), 0);
    tasks.add(json!({ "id": 9 }), MutationOptions::default())?;
    assert_eq!(tasks.len(), 3);
    Ok(())
}
