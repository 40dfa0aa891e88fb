//! Snapshot-backed persistence gateway
//!
//! The whole data set lives in one JSON document. `SnapshotStore` keeps it
//! in memory behind a lock and, when opened from a file, rewrites the file
//! atomically after every successful mutation.

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use crate::domain::{
    Category, CategoryId, Comment, CommentDraft, CommentId, CommentLike, NewCategory, TopicId,
    User, UserId,
};
use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::traits::{CategoryStore, CommentStore, UserDirectory};

/// Serialized form of the data set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub users: Vec<User>,
    pub categories: Vec<Category>,
    pub comments: Vec<Comment>,
    pub likes: Vec<CommentLike>,
    pub issued: IssuedIds,
}

/// Highest id ever handed out per table. Deleted ids are never reused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuedIds {
    pub category: i64,
    pub comment: i64,
}

/// Next id after both the counter and every stored id.
fn next_id(issued: i64, stored: impl Iterator<Item = i64>) -> io::Result<i64> {
    stored
        .max()
        .unwrap_or(0)
        .max(issued)
        .checked_add(1)
        .ok_or_else(|| io::Error::other("id space exhausted"))
}

fn not_found(what: &str, id: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{what} {id} not found"))
}

impl Snapshot {
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        let mut snapshot: Self = serde_json::from_str(content)?;
        snapshot.seed_issued();
        Ok(snapshot)
    }

    /// Raise the issued counters to at least the highest stored ids.
    fn seed_issued(&mut self) {
        let max_category = self.categories.iter().map(|c| c.id).max().unwrap_or(0);
        let max_comment = self.comments.iter().map(|c| c.id).max().unwrap_or(0);
        self.issued.category = self.issued.category.max(max_category);
        self.issued.comment = self.issued.comment.max(max_comment);
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    fn insert_category(&mut self, new: NewCategory) -> io::Result<Category> {
        let id = next_id(self.issued.category, self.categories.iter().map(|c| c.id))?;
        self.issued.category = id;
        let category = Category {
            id,
            name: new.name,
            description: new.description,
            parent_id: new.parent_id,
            order_index: new.order_index,
            created_at: Utc::now(),
        };
        self.categories.push(category.clone());
        Ok(category)
    }

    fn update_categories(&mut self, updates: &[Category]) -> io::Result<()> {
        let mut slots = Vec::with_capacity(updates.len());
        for update in updates {
            let pos = self
                .categories
                .iter()
                .position(|c| c.id == update.id)
                .ok_or_else(|| not_found("category", update.id))?;
            slots.push(pos);
        }
        for (pos, update) in slots.into_iter().zip(updates) {
            self.categories[pos] = update.clone();
        }
        Ok(())
    }

    fn delete_category(&mut self, id: CategoryId) -> io::Result<()> {
        let before = self.categories.len();
        self.categories.retain(|c| c.id != id);
        if self.categories.len() == before {
            return Err(not_found("category", id));
        }
        Ok(())
    }

    fn topic_of(&self, comment_id: CommentId) -> Option<TopicId> {
        self.comments
            .iter()
            .find(|c| c.id == comment_id)
            .map(|c| c.topic_id)
    }

    fn insert_comment(&mut self, draft: CommentDraft) -> io::Result<Comment> {
        let id = next_id(self.issued.comment, self.comments.iter().map(|c| c.id))?;
        self.issued.comment = id;
        let now = Utc::now();
        let comment = Comment {
            id,
            topic_id: draft.topic_id,
            user_id: draft.user_id,
            parent_comment_id: draft.parent_comment_id,
            content: draft.content,
            created_at: now,
            updated_at: now,
        };
        self.comments.push(comment.clone());
        Ok(comment)
    }

    fn update_comment(&mut self, comment: &Comment) -> io::Result<()> {
        let slot = self
            .comments
            .iter_mut()
            .find(|c| c.id == comment.id)
            .ok_or_else(|| not_found("comment", comment.id))?;
        *slot = comment.clone();
        Ok(())
    }

    fn delete_comments(&mut self, ids: &[CommentId]) {
        let doomed: BTreeSet<CommentId> = ids.iter().copied().collect();
        self.comments.retain(|c| !doomed.contains(&c.id));
        self.likes.retain(|l| !doomed.contains(&l.comment_id));
    }

    fn insert_like(&mut self, user_id: UserId, comment_id: CommentId) -> io::Result<()> {
        if self.topic_of(comment_id).is_none() {
            return Err(not_found("comment", comment_id));
        }
        let exists = self
            .likes
            .iter()
            .any(|l| l.user_id == user_id && l.comment_id == comment_id);
        if !exists {
            self.likes.push(CommentLike {
                user_id,
                comment_id,
                created_at: Utc::now(),
            });
        }
        Ok(())
    }

    fn delete_like(&mut self, user_id: UserId, comment_id: CommentId) -> bool {
        let before = self.likes.len();
        self.likes
            .retain(|l| !(l.user_id == user_id && l.comment_id == comment_id));
        self.likes.len() != before
    }
}

/// Persistence gateway over a [`Snapshot`].
#[derive(Debug, Default)]
pub struct SnapshotStore {
    state: RwLock<Snapshot>,
    /// Backing file; `None` keeps everything in memory
    path: Option<PathBuf>,
}

impl SnapshotStore {
    pub fn in_memory(mut snapshot: Snapshot) -> Self {
        snapshot.seed_issued();
        Self {
            state: RwLock::new(snapshot),
            path: None,
        }
    }

    /// Open a snapshot file. A missing file yields an empty data set; the
    /// file is created on the first write.
    #[instrument(level = "debug")]
    pub fn open(path: &Path) -> InfraResult<Self> {
        let snapshot = if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| InfraError::io(format!("read {}", path.display()), e))?;
            Snapshot::from_json(&content).map_err(|source| InfraError::Snapshot {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            debug!("snapshot {} does not exist yet", path.display());
            Snapshot::default()
        };
        Ok(Self {
            state: RwLock::new(snapshot),
            path: Some(path.to_path_buf()),
        })
    }

    /// Copy of the current data set.
    pub fn snapshot(&self) -> io::Result<Snapshot> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> io::Result<RwLockReadGuard<'_, Snapshot>> {
        self.state
            .read()
            .map_err(|_| io::Error::other("snapshot lock poisoned"))
    }

    fn write(&self) -> io::Result<RwLockWriteGuard<'_, Snapshot>> {
        self.state
            .write()
            .map_err(|_| io::Error::other("snapshot lock poisoned"))
    }

    /// Apply `f` to a scratch copy; commit and persist only if it succeeds.
    fn mutate<R>(&self, f: impl FnOnce(&mut Snapshot) -> io::Result<R>) -> io::Result<R> {
        let mut guard = self.write()?;
        let mut next = guard.clone();
        let result = f(&mut next)?;
        if let Some(path) = &self.path {
            persist(path, &next)?;
        }
        *guard = next;
        Ok(result)
    }
}

/// Write via temp file + rename so readers never see a partial document.
fn persist(path: &Path, snapshot: &Snapshot) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(snapshot.to_json()?.as_bytes())?;
    tmp.write_all(b"\n")?;
    tmp.persist(path).map_err(|e| e.error)?;
    debug!("persisted snapshot to {}", path.display());
    Ok(())
}

impl CategoryStore for SnapshotStore {
    fn load_categories(&self) -> io::Result<Vec<Category>> {
        Ok(self.read()?.categories.clone())
    }

    fn insert_category(&self, new: NewCategory) -> io::Result<Category> {
        self.mutate(|s| s.insert_category(new))
    }

    fn update_category(&self, category: &Category) -> io::Result<()> {
        self.mutate(|s| s.update_categories(std::slice::from_ref(category)))
    }

    fn update_categories(&self, categories: &[Category]) -> io::Result<()> {
        self.mutate(|s| s.update_categories(categories))
    }

    fn delete_category(&self, id: CategoryId) -> io::Result<()> {
        self.mutate(|s| s.delete_category(id))
    }
}

impl CommentStore for SnapshotStore {
    fn topics(&self) -> io::Result<Vec<TopicId>> {
        let topics: BTreeSet<TopicId> = self.read()?.comments.iter().map(|c| c.topic_id).collect();
        Ok(topics.into_iter().collect())
    }

    fn load_comments(&self, topic_id: TopicId) -> io::Result<Vec<Comment>> {
        Ok(self
            .read()?
            .comments
            .iter()
            .filter(|c| c.topic_id == topic_id)
            .cloned()
            .collect())
    }

    fn load_likes(&self, topic_id: TopicId) -> io::Result<Vec<CommentLike>> {
        let state = self.read()?;
        Ok(state
            .likes
            .iter()
            .filter(|l| state.topic_of(l.comment_id) == Some(topic_id))
            .cloned()
            .collect())
    }

    fn insert_comment(&self, draft: CommentDraft) -> io::Result<Comment> {
        self.mutate(|s| s.insert_comment(draft))
    }

    fn update_comment(&self, comment: &Comment) -> io::Result<()> {
        self.mutate(|s| s.update_comment(comment))
    }

    fn delete_comments(&self, ids: &[CommentId]) -> io::Result<()> {
        self.mutate(|s| {
            s.delete_comments(ids);
            Ok(())
        })
    }

    fn insert_like(&self, user_id: UserId, comment_id: CommentId) -> io::Result<()> {
        self.mutate(|s| s.insert_like(user_id, comment_id))
    }

    fn delete_like(&self, user_id: UserId, comment_id: CommentId) -> io::Result<bool> {
        self.mutate(|s| Ok(s.delete_like(user_id, comment_id)))
    }
}

impl UserDirectory for SnapshotStore {
    fn find_user(&self, id: UserId) -> io::Result<Option<User>> {
        Ok(self.read()?.users.iter().find(|u| u.id == id).cloned())
    }

    fn list_users(&self) -> io::Result<Vec<User>> {
        Ok(self.read()?.users.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn comment(id: CommentId, topic_id: TopicId) -> Comment {
        let now = Utc::now();
        Comment {
            id,
            topic_id,
            user_id: Uuid::nil(),
            parent_comment_id: None,
            content: format!("c{id}"),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn given_empty_snapshot_when_inserting_then_ids_start_at_one() {
        let store = SnapshotStore::in_memory(Snapshot::default());
        let cat = store
            .insert_category(NewCategory {
                name: "Networks".into(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(cat.id, 1);
    }

    #[test]
    fn given_highest_id_deleted_when_inserting_then_id_not_reused() {
        let store = SnapshotStore::in_memory(Snapshot::default());
        let new = |name: &str| NewCategory {
            name: name.into(),
            ..Default::default()
        };
        store.insert_category(new("A")).unwrap();
        let b = store.insert_category(new("B")).unwrap();

        store.delete_category(b.id).unwrap();
        let c = store.insert_category(new("C")).unwrap();

        assert_eq!(c.id, 3);
        assert_eq!(store.snapshot().unwrap().issued.category, 3);
    }

    #[test]
    fn given_issued_counter_when_round_tripping_json_then_counter_kept() {
        let mut snapshot = Snapshot::default();
        snapshot
            .insert_comment(CommentDraft {
                topic_id: 7,
                user_id: Uuid::nil(),
                parent_comment_id: None,
                content: "hi".into(),
            })
            .unwrap();
        snapshot.delete_comments(&[1]);

        let reloaded = Snapshot::from_json(&snapshot.to_json().unwrap()).unwrap();

        assert_eq!(reloaded.issued.comment, 1);
        assert_eq!(next_id(reloaded.issued.comment, std::iter::empty()).unwrap(), 2);
    }

    #[test]
    fn given_max_id_stored_when_inserting_then_error_and_store_still_usable() {
        let now = Utc::now();
        let store = SnapshotStore::in_memory(Snapshot {
            categories: vec![Category {
                id: i64::MAX,
                name: "last".into(),
                description: None,
                parent_id: None,
                order_index: 0,
                created_at: now,
            }],
            ..Default::default()
        });

        let err = store
            .insert_category(NewCategory {
                name: "B".into(),
                ..Default::default()
            })
            .unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::Other);
        assert_eq!(store.load_categories().unwrap().len(), 1);
    }

    #[test]
    fn given_unknown_id_in_batch_when_updating_then_nothing_changes() {
        let store = SnapshotStore::in_memory(Snapshot::default());
        let mut cat = store
            .insert_category(NewCategory {
                name: "A".into(),
                ..Default::default()
            })
            .unwrap();
        cat.name = "renamed".into();
        let mut ghost = cat.clone();
        ghost.id = 99;

        let err = store.update_categories(&[cat, ghost]).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(store.load_categories().unwrap()[0].name, "A");
    }

    #[test]
    fn given_likes_when_deleting_comments_then_likes_go_too() {
        let mut snapshot = Snapshot {
            comments: vec![comment(1, 7), comment(2, 7)],
            ..Default::default()
        };
        let user = Uuid::new_v4();
        snapshot.insert_like(user, 1).unwrap();
        snapshot.insert_like(user, 2).unwrap();

        snapshot.delete_comments(&[1]);

        assert_eq!(snapshot.comments.len(), 1);
        assert_eq!(snapshot.likes.len(), 1);
        assert_eq!(snapshot.likes[0].comment_id, 2);
    }

    #[test]
    fn given_like_twice_when_inserting_then_stored_once() {
        let mut snapshot = Snapshot {
            comments: vec![comment(1, 7)],
            ..Default::default()
        };
        let user = Uuid::new_v4();
        snapshot.insert_like(user, 1).unwrap();
        snapshot.insert_like(user, 1).unwrap();
        assert_eq!(snapshot.likes.len(), 1);
        assert!(snapshot.delete_like(user, 1));
        assert!(!snapshot.delete_like(user, 1));
    }
}
