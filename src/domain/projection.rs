//! Nested, serializable views over a built forest.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::arena::Forest;
use crate::domain::entities::{
    Category, CategoryId, Comment, CommentId, CommentLike, Role, TopicId, User, UserId,
};

/// Category with its ordered sub-categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTree {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<CategoryId>,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
    pub children: Vec<CategoryTree>,
}

impl CategoryTree {
    fn from_parts(category: &Category, children: Vec<CategoryTree>) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            description: category.description.clone(),
            parent_id: category.parent_id,
            order_index: category.order_index,
            created_at: category.created_at,
            children,
        }
    }
}

pub fn category_trees(forest: &Forest<Category>) -> Vec<CategoryTree> {
    forest.fold(&mut CategoryTree::from_parts)
}

/// Author badge shown next to a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAuthor {
    pub id: UserId,
    pub name: String,
    pub cohort: i32,
    pub role: Role,
}

impl From<&User> for CommentAuthor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            cohort: user.cohort,
            role: user.role,
        }
    }
}

/// Comment with its replies, as seen by one viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentThread {
    pub id: CommentId,
    pub topic_id: TopicId,
    pub user_id: UserId,
    pub parent_comment_id: Option<CommentId>,
    pub content: String,
    pub likes_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// `None` when the author is no longer in the directory
    pub user: Option<CommentAuthor>,
    pub replies: Vec<CommentThread>,
    /// Whether the viewer liked this comment
    pub is_liked: bool,
}

/// Per-request data the comment projection needs beyond the forest.
#[derive(Debug, Clone, Copy)]
pub struct ThreadContext<'a> {
    pub viewer: Option<UserId>,
    pub likes: &'a [CommentLike],
    pub authors: &'a HashMap<UserId, User>,
}

pub fn comment_threads(forest: &Forest<Comment>, ctx: &ThreadContext<'_>) -> Vec<CommentThread> {
    let mut likes_count: HashMap<CommentId, usize> = HashMap::new();
    for like in ctx.likes {
        *likes_count.entry(like.comment_id).or_default() += 1;
    }
    let liked_by_viewer: HashSet<CommentId> = ctx
        .viewer
        .map(|viewer| {
            ctx.likes
                .iter()
                .filter(|like| like.user_id == viewer)
                .map(|like| like.comment_id)
                .collect()
        })
        .unwrap_or_default();

    forest.fold(&mut |comment: &Comment, replies: Vec<CommentThread>| CommentThread {
        id: comment.id,
        topic_id: comment.topic_id,
        user_id: comment.user_id,
        parent_comment_id: comment.parent_comment_id,
        content: comment.content.clone(),
        likes_count: likes_count.get(&comment.id).copied().unwrap_or(0),
        created_at: comment.created_at,
        updated_at: comment.updated_at,
        user: ctx.authors.get(&comment.user_id).map(CommentAuthor::from),
        replies,
        is_liked: liked_by_viewer.contains(&comment.id),
    })
}
