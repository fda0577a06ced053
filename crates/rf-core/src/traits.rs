//! # Core Traits (Ports)
//!
//! Any persistence plugin must implement these traits to be used by the binary.
//! Every call is fallible I/O; callers surface the error, they never swallow it.

use async_trait::async_trait;

use crate::models::{Post, PostId, ReplyId};

/// Durable storage for posts and replies across process restarts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ForumStore: Send + Sync {
    // Post Operations
    async fn load_all_posts(&self) -> anyhow::Result<Vec<Post>>;
    /// Inserts or replaces the post with the same id.
    async fn save_post(&self, post: &Post) -> anyhow::Result<()>;
    async fn mark_post_deleted(&self, id: &PostId) -> anyhow::Result<()>;
    async fn update_reply_count(&self, post_id: &PostId, count: u32) -> anyhow::Result<()>;

    // Reply Operations
    async fn save_reply(&self, id: &ReplyId, post_id: &PostId, author: &str, content: &str) -> anyhow::Result<()>;
    /// `"author: content"` lines, oldest first.
    async fn get_replies_for_post(&self, post_id: &PostId) -> anyhow::Result<Vec<String>>;
}

/// Renders a stored reply the way `get_replies_for_post` returns it.
pub fn reply_line(author: &str, content: &str) -> String {
    format!("{author}: {content}")
}
