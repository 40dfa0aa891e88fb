//! Threaded comment service
//!
//! Comments of one topic form a forest via `parent_comment_id`. Threads are
//! rebuilt from the flat list on every read; deletes cascade over the
//! forest's descendants.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::access::{require_approved, Viewer};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{
    audit, comment_threads, Comment, CommentDraft, CommentId, CommentThread, IntegrityIssue,
    NewComment, ThreadContext, TopicId, TreeBuilder, User, UserId,
};
use crate::infrastructure::traits::{CommentStore, UserDirectory};

/// Comment use cases.
pub struct CommentService {
    store: Arc<dyn CommentStore>,
    users: Arc<dyn UserDirectory>,
    settings: Arc<Settings>,
}

impl CommentService {
    /// Create a new comment service.
    pub fn new(
        store: Arc<dyn CommentStore>,
        users: Arc<dyn UserDirectory>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            store,
            users,
            settings,
        }
    }

    fn load(&self, topic_id: TopicId) -> ApplicationResult<Vec<Comment>> {
        self.store
            .load_comments(topic_id)
            .with_context("load comments of topic", topic_id)
    }

    fn find(&self, topic_id: TopicId, id: CommentId) -> ApplicationResult<Comment> {
        self.load(topic_id)?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| ApplicationError::not_found("comment", id))
    }

    /// The topic's comment threads, newest first at every level.
    ///
    /// `viewer` only affects `is_liked`.
    #[instrument(level = "debug", skip(self, viewer))]
    pub fn thread(
        &self,
        topic_id: TopicId,
        viewer: Option<&Viewer>,
    ) -> ApplicationResult<Vec<CommentThread>> {
        let comments = self.load(topic_id)?;
        let likes = self
            .store
            .load_likes(topic_id)
            .with_context("load likes of topic", topic_id)?;
        let authors: HashMap<UserId, User> = self
            .users
            .list_users()
            .with_context("list users", "directory")?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let forest = TreeBuilder::with_policy(self.settings.orphans).build(comments)?;
        debug!(
            "thread: topic={} comments={} likes={}",
            topic_id,
            forest.len(),
            likes.len()
        );
        let ctx = ThreadContext {
            viewer: viewer.map(|v| v.user_id),
            likes: &likes,
            authors: &authors,
        };
        Ok(comment_threads(&forest, &ctx))
    }

    /// Post a comment or, with `parent_comment_id`, a reply within the same topic.
    #[instrument(level = "debug", skip(self, viewer, new))]
    pub fn create(
        &self,
        viewer: &Viewer,
        topic_id: TopicId,
        new: NewComment,
    ) -> ApplicationResult<Comment> {
        require_approved(viewer)?;
        if let Some(parent) = new.parent_comment_id {
            let exists = self.load(topic_id)?.iter().any(|c| c.id == parent);
            if !exists {
                return Err(ApplicationError::not_found("parent comment", parent));
            }
        }

        let created = self
            .store
            .insert_comment(CommentDraft {
                topic_id,
                user_id: viewer.user_id,
                parent_comment_id: new.parent_comment_id,
                content: new.content,
            })
            .with_context("insert comment on topic", topic_id)?;
        debug!("create: id={} parent={:?}", created.id, created.parent_comment_id);
        Ok(created)
    }

    /// Replace the content of the viewer's own comment.
    pub fn update(
        &self,
        viewer: &Viewer,
        topic_id: TopicId,
        id: CommentId,
        content: String,
    ) -> ApplicationResult<Comment> {
        let mut comment = self.find(topic_id, id)?;
        if comment.user_id != viewer.user_id {
            return Err(ApplicationError::Forbidden(format!(
                "comment {id} belongs to another user"
            )));
        }
        comment.content = content;
        comment.updated_at = Utc::now();
        self.store
            .update_comment(&comment)
            .with_context("update comment", id)?;
        Ok(comment)
    }

    /// Delete a comment with all of its replies and their likes.
    ///
    /// Allowed for the author and for admins. Returns the deleted ids.
    #[instrument(level = "debug", skip(self, viewer))]
    pub fn delete(
        &self,
        viewer: &Viewer,
        topic_id: TopicId,
        id: CommentId,
    ) -> ApplicationResult<Vec<CommentId>> {
        let comments = self.load(topic_id)?;
        let comment = comments
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| ApplicationError::not_found("comment", id))?;
        if comment.user_id != viewer.user_id && !viewer.is_admin() {
            return Err(ApplicationError::Forbidden(format!(
                "comment {id} belongs to another user"
            )));
        }

        // Root the forest at the target so its replies are reached even when
        // the target itself hangs below a missing parent
        let rooted: Vec<Comment> = comments
            .into_iter()
            .map(|mut c| {
                if c.id == id {
                    c.parent_comment_id = None;
                }
                c
            })
            .collect();
        let forest = TreeBuilder::new().build(rooted)?;
        let doomed = forest.subtree_ids(id);
        debug!("delete: {} comments", doomed.len());

        self.store
            .delete_comments(&doomed)
            .with_context("delete comments", id)?;
        Ok(doomed)
    }

    /// Like or unlike a comment. Returns the new liked state.
    pub fn toggle_like(
        &self,
        viewer: &Viewer,
        topic_id: TopicId,
        id: CommentId,
    ) -> ApplicationResult<bool> {
        require_approved(viewer)?;
        self.find(topic_id, id)?;

        let removed = self
            .store
            .delete_like(viewer.user_id, id)
            .with_context("unlike comment", id)?;
        if removed {
            return Ok(false);
        }
        self.store
            .insert_like(viewer.user_id, id)
            .with_context("like comment", id)?;
        Ok(true)
    }

    /// Integrity findings per topic, topics ascending.
    pub fn audit(&self) -> ApplicationResult<Vec<(TopicId, IntegrityIssue)>> {
        let topics = self.store.topics().with_context("list topics", "store")?;
        let mut findings = Vec::new();
        for topic_id in topics.into_iter().sorted() {
            let comments = self.load(topic_id)?;
            findings.extend(audit(&comments).into_iter().map(|i| (topic_id, i)));
        }
        Ok(findings)
    }
}
