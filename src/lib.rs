pub mod error;
pub mod model;
pub mod storage;

pub use error::{HomebaseError, Result};
pub use model::{AnyModel, BaseModel, Model, ModelKind, State, User};
pub use storage::{MemoryStore, Store};
