use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "rusty-forum", version, about = "Post discussion items and reply to them")]
pub struct Cli {
    /// Acting username
    #[arg(short, long, global = true, env = "RUSTY_FORUM_USER")]
    pub user: Option<String>,

    /// Config file to read instead of ./rusty-forum.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a new post
    Post {
        title: String,
        content: String,
        #[arg(long)]
        thread: Option<String>,
    },
    /// List all active posts
    List,
    /// List your own active posts
    Mine,
    /// Search active posts by keyword (title or content)
    Search { keyword: String },
    /// List active posts of one thread
    Thread { name: String },
    /// Show a single post
    Show { id: String },
    /// Edit one of your posts
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        thread: Option<String>,
    },
    /// Soft-delete one of your posts
    Delete { id: String },
    /// Restore one of your deleted posts
    Restore { id: String },
    /// Reply to a post
    Reply { post_id: String, content: String },
    /// Show the stored replies of a post
    Replies { post_id: String },
}
