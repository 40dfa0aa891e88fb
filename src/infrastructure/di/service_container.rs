//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use tracing::debug;

use crate::application::services::{CategoryService, CommentService};
use crate::config::Settings;
use crate::infrastructure::error::InfraResult;
use crate::infrastructure::snapshot::SnapshotStore;
use crate::infrastructure::traits::{CategoryStore, CommentStore, UserDirectory};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Account lookup, used to resolve the acting user
    pub users: Arc<dyn UserDirectory>,

    pub categories: CategoryService,
    pub comments: CommentService,
}

impl ServiceContainer {
    /// Open the snapshot named by `settings.data_file` and wire services onto it.
    pub fn open(settings: Settings) -> InfraResult<Self> {
        debug!("opening snapshot {}", settings.data_file.display());
        let store = Arc::new(SnapshotStore::open(&settings.data_file)?);
        Ok(Self::with_store(settings, store))
    }

    /// Create a container over an existing store (for testing).
    pub fn with_store(settings: Settings, store: Arc<SnapshotStore>) -> Self {
        Self::with_deps(settings, store.clone(), store.clone(), store)
    }

    /// Create a container with custom dependencies.
    pub fn with_deps(
        settings: Settings,
        category_store: Arc<dyn CategoryStore>,
        comment_store: Arc<dyn CommentStore>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        let settings = Arc::new(settings);

        let categories = CategoryService::new(category_store, settings.clone());
        let comments = CommentService::new(comment_store, users.clone(), settings.clone());

        Self {
            settings,
            users,
            categories,
            comments,
        }
    }
}
