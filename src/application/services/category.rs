//! Category hierarchy service
//!
//! Builds the admin-maintained category tree and performs every structural
//! change through the cycle guard before anything is written.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::application::access::{require_admin, Viewer};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{
    audit, category_trees, check_reparent, sort_siblings, Category, CategoryId, CategoryTree,
    IntegrityIssue, NewCategory, ParentIndex, ParentLookup, TreeBuilder,
};
use crate::infrastructure::traits::CategoryStore;

/// Parent change requested by an update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Reparent {
    #[default]
    Keep,
    Root,
    Under(CategoryId),
}

/// Partial category update; `None` fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub order_index: Option<i32>,
    pub parent: Reparent,
}

/// One entry of a drag-and-drop reorder batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderItem {
    pub id: CategoryId,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    pub order_index: i32,
}

/// Category use cases.
pub struct CategoryService {
    store: Arc<dyn CategoryStore>,
    settings: Arc<Settings>,
}

impl CategoryService {
    /// Create a new category service.
    pub fn new(store: Arc<dyn CategoryStore>, settings: Arc<Settings>) -> Self {
        Self { store, settings }
    }

    fn load(&self) -> ApplicationResult<Vec<Category>> {
        self.store
            .load_categories()
            .with_context("load categories", "store")
    }

    /// Nested category tree, siblings ordered by `(order_index, id)`.
    #[instrument(level = "debug", skip(self))]
    pub fn tree(&self) -> ApplicationResult<Vec<CategoryTree>> {
        let categories = self.load()?;
        let forest = TreeBuilder::with_policy(self.settings.orphans).build(categories)?;
        debug!("tree: {} categories in forest", forest.len());
        Ok(category_trees(&forest))
    }

    /// Flat list ordered by `(order_index, id)`.
    pub fn list(&self) -> ApplicationResult<Vec<Category>> {
        let mut categories = self.load()?;
        sort_siblings(&mut categories);
        Ok(categories)
    }

    pub fn get(&self, id: CategoryId) -> ApplicationResult<Category> {
        self.load()?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| ApplicationError::not_found("category", id))
    }

    /// Create a category. An `order_index` of 0 appends after the current siblings.
    #[instrument(level = "debug", skip(self, viewer, new), fields(name = %new.name))]
    pub fn create(&self, viewer: &Viewer, mut new: NewCategory) -> ApplicationResult<Category> {
        require_admin(viewer)?;
        let categories = self.load()?;

        if let Some(parent) = new.parent_id {
            if !categories.iter().any(|c| c.id == parent) {
                return Err(ApplicationError::not_found("parent category", parent));
            }
        }
        ensure_unique_name(&categories, &new.name, new.parent_id, None)?;

        if new.order_index == 0 {
            let siblings = categories
                .iter()
                .filter(|c| c.parent_id == new.parent_id)
                .count();
            new.order_index = i32::try_from(siblings).unwrap_or(i32::MAX);
        }

        let created = self
            .store
            .insert_category(new)
            .with_context("insert category", "store")?;
        debug!("create: id={} order_index={}", created.id, created.order_index);
        Ok(created)
    }

    /// Apply a partial update. A parent change is validated by the cycle
    /// guard first; on rejection nothing is written.
    #[instrument(level = "debug", skip(self, viewer, update))]
    pub fn update(
        &self,
        viewer: &Viewer,
        id: CategoryId,
        update: CategoryUpdate,
    ) -> ApplicationResult<Category> {
        require_admin(viewer)?;
        let categories = self.load()?;
        let mut category = categories
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| ApplicationError::not_found("category", id))?;

        let new_parent = match update.parent {
            Reparent::Keep => category.parent_id,
            Reparent::Root => None,
            Reparent::Under(parent) => Some(parent),
        };
        if new_parent != category.parent_id {
            if let Some(parent) = new_parent {
                if parent != id && !categories.iter().any(|c| c.id == parent) {
                    return Err(ApplicationError::not_found("parent category", parent));
                }
            }
            let index = ParentIndex::from_nodes(&categories);
            check_reparent(id, new_parent, &index)?;
        }

        if let Some(name) = update.name {
            category.name = name;
        }
        if update.description.is_some() {
            category.description = update.description;
        }
        if let Some(order_index) = update.order_index {
            category.order_index = order_index;
        }
        category.parent_id = new_parent;
        ensure_unique_name(&categories, &category.name, category.parent_id, Some(id))?;

        self.store
            .update_category(&category)
            .with_context("update category", id)?;
        Ok(category)
    }

    /// Delete a leaf category.
    pub fn delete(&self, viewer: &Viewer, id: CategoryId) -> ApplicationResult<()> {
        require_admin(viewer)?;
        let categories = self.load()?;
        if !categories.iter().any(|c| c.id == id) {
            return Err(ApplicationError::not_found("category", id));
        }
        let children = categories
            .iter()
            .filter(|c| c.parent_id == Some(id))
            .count();
        if children > 0 {
            debug!("delete: {} has {} children", id, children);
            return Err(ApplicationError::HasChildren(id));
        }
        self.store
            .delete_category(id)
            .with_context("delete category", id)
    }

    /// Apply a reorder batch atomically.
    ///
    /// All moves are first applied to a parent index; each moved node is then
    /// checked by the cycle guard and for a sibling name clash against that
    /// final state. Nothing is written unless every move passes. Unknown ids are skipped, and a later entry
    /// for the same id wins. Returns the updated categories.
    #[instrument(level = "debug", skip(self, viewer, items), fields(items = items.len()))]
    pub fn reorder(
        &self,
        viewer: &Viewer,
        items: Vec<ReorderItem>,
    ) -> ApplicationResult<Vec<Category>> {
        require_admin(viewer)?;
        let categories = self.load()?;
        let mut index = ParentIndex::from_nodes(&categories);

        let mut moves: BTreeMap<CategoryId, ReorderItem> = BTreeMap::new();
        for item in items {
            if !index.contains(item.id) {
                warn!(id = item.id, "reorder: skipping unknown category");
                continue;
            }
            if let Some(parent) = item.parent_id {
                if !index.contains(parent) {
                    return Err(ApplicationError::not_found("parent category", parent));
                }
            }
            index.set_parent(item.id, item.parent_id);
            moves.insert(item.id, item);
        }
        for &id in moves.keys() {
            check_reparent(id, index.parent_of(id), &index)?;
        }

        let after: Vec<Category> = categories
            .iter()
            .map(|c| match moves.get(&c.id) {
                Some(item) => Category {
                    parent_id: item.parent_id,
                    order_index: item.order_index,
                    ..c.clone()
                },
                None => c.clone(),
            })
            .collect();
        let updated: Vec<Category> = after
            .iter()
            .filter(|c| moves.contains_key(&c.id))
            .cloned()
            .collect();
        for moved in &updated {
            ensure_unique_name(&after, &moved.name, moved.parent_id, Some(moved.id))?;
        }
        if updated.is_empty() {
            return Ok(updated);
        }

        self.store
            .update_categories(&updated)
            .with_context("reorder categories", format!("{} items", updated.len()))?;
        debug!("reorder: wrote {} categories", updated.len());
        Ok(updated)
    }

    /// Integrity findings for the stored categories.
    pub fn audit(&self) -> ApplicationResult<Vec<IntegrityIssue>> {
        Ok(audit(&self.load()?))
    }
}

fn ensure_unique_name(
    categories: &[Category],
    name: &str,
    parent_id: Option<CategoryId>,
    except: Option<CategoryId>,
) -> ApplicationResult<()> {
    let taken = categories
        .iter()
        .any(|c| c.parent_id == parent_id && c.name == name && Some(c.id) != except);
    if taken {
        return Err(ApplicationError::DuplicateName {
            name: name.to_string(),
        });
    }
    Ok(())
}
