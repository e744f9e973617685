//! 过程宏（aggregator-macros）
//!
//! - `#[model(kind = "Task")]`：将具名字段结构体声明为类型化记录。
//!
use proc_macro::TokenStream;

mod derive_utils;
mod field_utils;
mod model;

/// 类型化记录宏
/// - 若缺失则追加字段 `id: Option<ModelId>`（置于最前，`None` 时不序列化）
/// - 合并派生：`Debug, Clone, serde::Serialize, serde::Deserialize`
/// - 实现 `::aggregator_collection::record::ModelKind`，`KIND` 取自 `kind` 参数
/// - 支持参数：`#[model(kind = "Task", debug = false)]`，`kind` 必填
#[proc_macro_attribute]
pub fn model(attr: TokenStream, item: TokenStream) -> TokenStream {
    model::expand(attr, item)
}
