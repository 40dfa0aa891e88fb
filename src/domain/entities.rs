//! Domain entities: core data structures

use std::cmp::Reverse;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::node::HierarchyNode;

pub type CategoryId = i64;
pub type CommentId = i64;
pub type TopicId = i64;
pub type UserId = Uuid;

/// Topic category, arranged in an admin-maintained tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    /// Rank among siblings, ascending
    #[serde(default)]
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

impl HierarchyNode for Category {
    type Id = CategoryId;
    type Key = i32;

    fn id(&self) -> CategoryId {
        self.id
    }

    fn parent_id(&self) -> Option<CategoryId> {
        self.parent_id
    }

    fn ordering_key(&self) -> i32 {
        self.order_index
    }
}

/// Category fields supplied on creation; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    /// `0` appends after the existing siblings
    #[serde(default)]
    pub order_index: i32,
}

/// Comment on a topic; replies point at their parent comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub topic_id: TopicId,
    pub user_id: UserId,
    #[serde(default)]
    pub parent_comment_id: Option<CommentId>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HierarchyNode for Comment {
    type Id = CommentId;
    type Key = Reverse<DateTime<Utc>>;

    fn id(&self) -> CommentId {
        self.id
    }

    fn parent_id(&self) -> Option<CommentId> {
        self.parent_comment_id
    }

    /// Newest first.
    fn ordering_key(&self) -> Reverse<DateTime<Utc>> {
        Reverse(self.created_at)
    }
}

/// Comment fields handed to the store on creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDraft {
    pub topic_id: TopicId,
    pub user_id: UserId,
    pub parent_comment_id: Option<CommentId>,
    pub content: String,
}

/// Request to post a comment or a reply.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewComment {
    #[serde(default)]
    pub parent_comment_id: Option<CommentId>,
    pub content: String,
}

/// A user's like on a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentLike {
    pub user_id: UserId,
    pub comment_id: CommentId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Student => write!(f, "student"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Sign-up approval workflow state. New accounts start as `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalStatus::Pending => write!(f, "pending"),
            ApprovalStatus::Approved => write!(f, "approved"),
            ApprovalStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Account as known to the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Course intake the student belongs to
    pub cohort: i32,
    pub role: Role,
    #[serde(default)]
    pub approval_status: ApprovalStatus,
}
