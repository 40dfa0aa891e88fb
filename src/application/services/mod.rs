//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on the persistence gateway traits (CategoryStore,
//! CommentStore, UserDirectory) but are themselves concrete structs.

mod category;
mod comment;

pub use category::{CategoryService, CategoryUpdate, ReorderItem, Reparent};
pub use comment::CommentService;
