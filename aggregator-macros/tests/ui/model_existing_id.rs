use aggregator_collection::record::ModelKind;
use aggregator_macros::model;

// 用户自定义的 id 字段保留原定义
#[model(kind = "Tag")]
struct Tag {
    label: String,
    id: Option<aggregator_collection::ModelId>,
}

fn main() {
    let tag = Tag {
        id: Some("t-1".into()),
        label: "urgent".into(),
    };
    let attrs = tag.to_attributes().unwrap();
    assert_eq!(attrs["id"], "t-1");
    assert_eq!(attrs["label"], "urgent");
}
