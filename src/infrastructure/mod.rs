//! Infrastructure layer: persistence gateway and DI container
//!
//! This layer implements the gateway traits and wires up services.

pub mod di;
pub mod error;
pub mod snapshot;
pub mod traits;

pub use error::{InfraError, InfraResult};
pub use snapshot::{IssuedIds, Snapshot, SnapshotStore};
