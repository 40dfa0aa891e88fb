//! Terminal rendering of nested projections via `termtree`.

use colored::Colorize;
use termtree::Tree;
use tracing::instrument;

use crate::domain::{CategoryTree, CommentThread};

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeNodeConvert for CategoryTree {
    #[instrument(level = "trace", skip(self), fields(id = self.id))]
    fn to_tree_string(&self) -> Tree<String> {
        let label = format!("{} {}", self.name.bold(), format!("#{}", self.id).dimmed());
        let leaves: Vec<_> = self.children.iter().map(|c| c.to_tree_string()).collect();
        Tree::new(label).with_leaves(leaves)
    }
}

impl TreeNodeConvert for CommentThread {
    #[instrument(level = "trace", skip(self), fields(id = self.id))]
    fn to_tree_string(&self) -> Tree<String> {
        let author = self
            .user
            .as_ref()
            .map(|u| u.name.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let heart = if self.is_liked { "♥" } else { "♡" };
        let label = format!(
            "{} {}: {} {}",
            format!("#{}", self.id).dimmed(),
            author.cyan(),
            self.content,
            format!("{heart}{}", self.likes_count).red()
        );
        let leaves: Vec<_> = self.replies.iter().map(|r| r.to_tree_string()).collect();
        Tree::new(label).with_leaves(leaves)
    }
}

/// Render a forest under a single label.
pub fn render_forest<T: TreeNodeConvert>(label: &str, roots: &[T]) -> Tree<String> {
    Tree::new(label.to_string()).with_leaves(roots.iter().map(|r| r.to_tree_string()))
}
