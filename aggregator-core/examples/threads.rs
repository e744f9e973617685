//! 讨论串示例：Task 与 Activity 两个源集合聚合为一个按时间排序的 Threads
//!
//! 运行：`RUST_LOG=debug cargo run -p aggregator-core --example threads`
//!
use aggregator_collection::{
    Collection, Comparator, Event, Model, ModelKind, MutationOptions, ObservableCollection,
};
use aggregator_core::{AggregateDefinition, Aggregator, AggregatorOptions, SourceMap};
use aggregator_macros::model;
use std::rc::Rc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[model(kind = "Task")]
struct Task {
    title: String,
    at: u32,
}

#[model(kind = "Activity")]
struct Activity {
    body: String,
    at: u32,
}

struct Threads {
    tasks: Collection,
    activities: Collection,
}

impl AggregateDefinition for Threads {
    fn collections(&self) -> SourceMap {
        SourceMap::from([
            (Task::KIND.to_string(), self.tasks.clone()),
            (Activity::KIND.to_string(), self.activities.clone()),
        ])
    }

    fn comparator(&self) -> Option<Comparator> {
        let at = |m: &Model| m.get("at").and_then(|v| v.as_u64()).unwrap_or_default();
        Some(Rc::new(move |a: &Model, b: &Model| at(a).cmp(&at(b))))
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let tasks = Collection::with_kind(Task::KIND);
    let activities = Collection::with_kind(Activity::KIND);
    let threads = Aggregator::new(
        Threads {
            tasks: tasks.clone(),
            activities: activities.clone(),
        },
        AggregatorOptions::default(),
    );

    threads.bind("all", |event| {
        match event {
            Event::Add { model, index, .. } => {
                info!(cid = %model.cid(), kind = ?model.kind(), index, "thread added")
            }
            Event::Remove { model, index, .. } => {
                info!(cid = %model.cid(), index, "thread removed")
            }
            other => info!(event = %other.name(), "thread event"),
        }
        Ok(())
    });

    let task = Task {
        id: Some(1.into()),
        title: "Ship the release".into(),
        at: 30,
    };
    threads.add(task.to_attributes()?, MutationOptions::default())?;
    activities.add(
        Activity {
            id: Some(1.into()),
            body: "Opened the milestone".into(),
            at: 10,
        }
        .to_attributes()?,
        MutationOptions::default(),
    )?;
    tasks.add(
        Task {
            id: Some(2.into()),
            title: "Write changelog".into(),
            at: 20,
        }
        .to_attributes()?,
        MutationOptions::default(),
    )?;

    if let Some(model) = threads.get((Task::KIND, 1)) {
        model.set_attr("title", "Ship the release candidate")?;
        let stored = Task::from_model(&model)?;
        info!(title = %stored.title, "task renamed");
    }

    for (position, model) in threads.models().iter().enumerate() {
        info!(position, kind = ?model.kind(), at = ?model.get("at"), "thread");
    }

    threads.remove((Activity::KIND, 1), MutationOptions::default())?;
    tasks.reset(Vec::<Model>::new(), MutationOptions::default())?;
    info!(
        threads = threads.len(),
        tasks = tasks.len(),
        activities = activities.len(),
        "done"
    );
    Ok(())
}
