//! Hierarchy core for a study-notes backend.
//!
//! Flat category and comment records go in, ordered forests come out
//! ([`domain::TreeBuilder`]); every re-parenting is vetted by the cycle
//! guard ([`domain::check_reparent`]) before a write reaches the store.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
