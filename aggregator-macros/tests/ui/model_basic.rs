use aggregator_collection::record::ModelKind;
use aggregator_macros::model;

#[model(kind = "Task")]
struct Task {
    title: String,
    done: bool,
}

#[model(kind = "Activity", debug = false)]
#[derive(PartialEq)]
struct Activity {
    body: String,
}

fn main() {
    let task = Task {
        id: None,
        title: "write".into(),
        done: false,
    };
    let _ = format!("{:?}", task.clone());
    assert_eq!(Task::KIND, "Task");

    let attrs = task.to_attributes().unwrap();
    assert_eq!(attrs["type"], "Task");
    assert!(!attrs.contains_key("id"));

    let a = Activity {
        id: Some(1.into()),
        body: "hi".into(),
    };
    assert!(a == a.clone());
    assert_eq!(Activity::KIND, "Activity");
}
