//! 可观察有序集合基础库（aggregator-collection）
//!
//! 为聚合集合提供所依赖的底层构件：
//! - 身份（`identity`）：进程内身份令牌、集合标识与持久化标识；
//! - 模型（`model`）：共享的可观察记录，带属性变化通知与校验钩子；
//! - 事件（`event`）：带标签的事件枚举与同步分发器；
//! - 存储（`store`）：有序序列 + 令牌索引，支持显式位置与比较器插入；
//! - 源集合（`collection`）：按令牌与持久化标识唯一的有序可观察集合；
//! - 类型化记录（`record`）：结构体与类型判别之间的转换。
//!
//! 整个库是单线程、同步的：所有事件在调用栈上深度优先分发，不需要任何锁。
//!
pub mod collection;
pub mod error;
pub mod event;
pub mod identity;
pub mod input;
pub mod model;
pub mod observable;
pub mod options;
pub mod record;
pub mod store;

pub use collection::Collection;
pub use error::{CollectionError, CollectionResult};
pub use event::{Emitter, Event, Handler, ListenerId, Topic};
pub use identity::{Cid, CollectionId, ModelId};
pub use input::{ModelInput, Selector};
pub use model::{Attributes, Model, Validator};
pub use observable::ObservableCollection;
pub use options::{CollectionOptions, Comparator, MutationOptions};
pub use record::ModelKind;
pub use store::ModelStore;

// 允许在本 crate 内部通过 ::aggregator_collection 进行自引用，
// 以便过程宏生成的路径在本 crate 的单元测试中也能解析。
extern crate self as aggregator_collection;
