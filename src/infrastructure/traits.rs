//! Persistence gateway traits
//!
//! Services load flat record lists and issue writes through these traits,
//! so they can run against the file-backed store or a purely in-memory one.

use std::io;

use crate::domain::{
    Category, CategoryId, Comment, CommentDraft, CommentId, CommentLike, NewCategory, TopicId,
    User, UserId,
};

/// Storage for the category hierarchy.
pub trait CategoryStore: Send + Sync {
    /// All categories, unordered.
    fn load_categories(&self) -> io::Result<Vec<Category>>;

    /// Insert and return the stored record (id and timestamp assigned).
    fn insert_category(&self, new: NewCategory) -> io::Result<Category>;

    /// Replace a stored category. `NotFound` if the id is unknown.
    fn update_category(&self, category: &Category) -> io::Result<()>;

    /// Replace several categories in one write; nothing is written if any id is unknown.
    fn update_categories(&self, categories: &[Category]) -> io::Result<()>;

    fn delete_category(&self, id: CategoryId) -> io::Result<()>;
}

/// Storage for threaded comments and their likes.
pub trait CommentStore: Send + Sync {
    /// Topics that have at least one comment.
    fn topics(&self) -> io::Result<Vec<TopicId>>;

    /// All comments of a topic, unordered.
    fn load_comments(&self, topic_id: TopicId) -> io::Result<Vec<Comment>>;

    /// Likes on comments of a topic.
    fn load_likes(&self, topic_id: TopicId) -> io::Result<Vec<CommentLike>>;

    fn insert_comment(&self, draft: CommentDraft) -> io::Result<Comment>;

    fn update_comment(&self, comment: &Comment) -> io::Result<()>;

    /// Delete the given comments and every like attached to them.
    fn delete_comments(&self, ids: &[CommentId]) -> io::Result<()>;

    /// Insert a like; idempotent.
    fn insert_like(&self, user_id: UserId, comment_id: CommentId) -> io::Result<()>;

    /// Remove a like. Returns whether one existed.
    fn delete_like(&self, user_id: UserId, comment_id: CommentId) -> io::Result<bool>;
}

/// Read access to user accounts.
pub trait UserDirectory: Send + Sync {
    fn find_user(&self, id: UserId) -> io::Result<Option<User>>;

    fn list_users(&self) -> io::Result<Vec<User>>;
}
