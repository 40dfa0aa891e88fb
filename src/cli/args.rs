//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};
use uuid::Uuid;

/// Category trees and threaded comments for a study-notes backend
#[derive(Parser, Debug)]
#[command(name = "notetree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Snapshot file (overrides config)
    #[arg(short = 'f', long = "data", global = true, value_hint = ValueHint::FilePath)]
    pub data_file: Option<PathBuf>,

    /// Act as this user
    #[arg(long = "as", global = true, env = "NOTETREE_AS")]
    pub acting_user: Option<Uuid>,

    /// Directory holding a local .notetree.toml (default: cwd)
    #[arg(long = "config", global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the category hierarchy
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },

    /// Manage threaded comments of a topic
    Comment {
        #[command(subcommand)]
        command: CommentCommands,
    },

    /// Audit stored hierarchies for orphans, cycles and duplicate ids
    Check,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// Show the category tree
    Tree {
        /// Print JSON instead of a rendered tree
        #[arg(long)]
        json: bool,
    },

    /// List categories flat, by order
    List,

    /// Create a category (admin)
    Add {
        name: String,
        /// Parent category id
        #[arg(short, long)]
        parent: Option<i64>,
        #[arg(long)]
        description: Option<String>,
        /// Position among siblings (0 appends)
        #[arg(short, long, default_value_t = 0)]
        order: i32,
    },

    /// Change name, description or order (admin)
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(short, long)]
        order: Option<i32>,
    },

    /// Move a category under another one, or to the top level (admin)
    Move {
        id: i64,
        /// New parent id
        #[arg(conflicts_with = "root", required_unless_present = "root")]
        parent: Option<i64>,
        /// Move to the top level
        #[arg(long)]
        root: bool,
    },

    /// Delete a category without children (admin)
    Remove { id: i64 },

    /// Apply a reorder batch from a JSON file (admin)
    Reorder {
        /// JSON array of {"id", "parent_id", "order_index"}
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum CommentCommands {
    /// Show the comment threads of a topic
    Thread {
        topic: i64,
        /// Print JSON instead of a rendered tree
        #[arg(long)]
        json: bool,
    },

    /// Post a comment, or a reply with --reply-to
    Add {
        topic: i64,
        content: String,
        /// Parent comment id
        #[arg(short, long)]
        reply_to: Option<i64>,
    },

    /// Edit your own comment
    Edit {
        topic: i64,
        id: i64,
        content: String,
    },

    /// Delete a comment and its replies
    Remove { topic: i64, id: i64 },

    /// Toggle your like on a comment
    Like { topic: i64, id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}
