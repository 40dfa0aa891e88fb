//! Domain layer: entities and hierarchy logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod guard;
pub mod node;
pub mod projection;

pub use arena::{Forest, ForestNode};
pub use builder::{audit, sort_siblings, IntegrityIssue, OrphanPolicy, TreeBuilder, TreeResult};
pub use entities::*;
pub use error::DomainError;
pub use guard::{check_reparent, ParentIndex, ParentLookup};
pub use node::HierarchyNode;
pub use projection::{
    category_trees, comment_threads, CategoryTree, CommentAuthor, CommentThread, ThreadContext,
};
