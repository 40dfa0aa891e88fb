//! Application layer: services and use cases
//!
//! This layer orchestrates domain logic and depends on the persistence gateway traits.

pub mod access;
pub mod error;
pub mod error_ext;
pub mod services;

pub use access::{require_admin, require_approved, Viewer};
pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
