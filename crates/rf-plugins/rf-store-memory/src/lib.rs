//! # rf-store-memory
//!
//! In-process implementation of `ForumStore` backed by `DashMap`.
//! Nothing survives a restart; used for tests and throwaway sessions.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use dashmap::DashMap;
use rf_core::models::{Post, PostId, PostRecord, ReplyId};
use rf_core::traits::{reply_line, ForumStore};
use tracing::debug;

struct StoredPost {
    seq: u64,
    record: PostRecord,
}

struct StoredReply {
    seq: u64,
    post_id: PostId,
    line: String,
}

#[derive(Default)]
pub struct MemoryForumStore {
    posts: DashMap<PostId, StoredPost>,
    replies: DashMap<ReplyId, StoredReply>,
    /// Insertion sequence shared by posts and replies, used to keep load order stable.
    seq: AtomicU64,
}

impl MemoryForumStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    fn with_post<T>(&self, id: &PostId, f: impl FnOnce(&mut PostRecord) -> T) -> anyhow::Result<T> {
        let mut entry = self
            .posts
            .get_mut(id)
            .ok_or_else(|| anyhow!("no stored post with id {id}"))?;
        Ok(f(&mut entry.record))
    }
}

#[async_trait]
impl ForumStore for MemoryForumStore {
    async fn load_all_posts(&self) -> anyhow::Result<Vec<Post>> {
        let mut rows: Vec<(u64, PostRecord)> = self
            .posts
            .iter()
            .map(|entry| (entry.seq, entry.record.clone()))
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);

        rows.into_iter()
            .map(|(_, record)| {
                let id = record.id.clone();
                Post::restore_from(record).with_context(|| format!("stored post {id} is invalid"))
            })
            .collect()
    }

    async fn save_post(&self, post: &Post) -> anyhow::Result<()> {
        let record = post.to_record();
        self.posts
            .entry(post.id().clone())
            .and_modify(|stored| stored.record = record.clone())
            .or_insert_with(|| StoredPost { seq: self.next_seq(), record });
        debug!(post_id = %post.id(), "post saved");
        Ok(())
    }

    async fn mark_post_deleted(&self, id: &PostId) -> anyhow::Result<()> {
        self.with_post(id, |record| record.deleted = true)
    }

    async fn update_reply_count(&self, post_id: &PostId, count: u32) -> anyhow::Result<()> {
        self.with_post(post_id, |record| record.reply_count = count)
    }

    async fn save_reply(&self, id: &ReplyId, post_id: &PostId, author: &str, content: &str) -> anyhow::Result<()> {
        let line = reply_line(author, content);
        self.replies
            .entry(id.clone())
            .and_modify(|stored| {
                stored.post_id = post_id.clone();
                stored.line = line.clone();
            })
            .or_insert_with(|| StoredReply { seq: self.next_seq(), post_id: post_id.clone(), line });
        debug!(reply_id = %id, %post_id, "reply saved");
        Ok(())
    }

    async fn get_replies_for_post(&self, post_id: &PostId) -> anyhow::Result<Vec<String>> {
        let mut rows: Vec<(u64, String)> = self
            .replies
            .iter()
            .filter(|entry| &entry.post_id == post_id)
            .map(|entry| (entry.seq, entry.line.clone()))
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);
        Ok(rows.into_iter().map(|(_, line)| line).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(title: &str) -> Post {
        Post::new("alice", title, "Body text long enough.", None).unwrap()
    }

    #[tokio::test]
    async fn load_returns_posts_in_save_order() {
        let store = MemoryForumStore::new();
        let first = post("First");
        let second = post("Second");
        store.save_post(&first).await.unwrap();
        store.save_post(&second).await.unwrap();
        // re-saving keeps the original position
        store.save_post(&first).await.unwrap();

        let loaded = store.load_all_posts().await.unwrap();
        assert_eq!(loaded, vec![first, second]);
    }

    #[tokio::test]
    async fn mark_deleted_and_reply_count_update_stored_record() {
        let store = MemoryForumStore::new();
        let p = post("Counted");
        store.save_post(&p).await.unwrap();
        store.update_reply_count(p.id(), 4).await.unwrap();
        store.mark_post_deleted(p.id()).await.unwrap();

        let loaded = store.load_all_posts().await.unwrap();
        assert!(loaded[0].is_deleted());
        assert_eq!(loaded[0].reply_count(), 4);
    }

    #[tokio::test]
    async fn unknown_post_is_an_error() {
        let store = MemoryForumStore::new();
        let missing = PostId::parse("POST-missing").unwrap();
        assert!(store.mark_post_deleted(&missing).await.is_err());
        assert!(store.update_reply_count(&missing, 1).await.is_err());
    }

    #[tokio::test]
    async fn replies_are_listed_per_post_oldest_first() {
        let store = MemoryForumStore::new();
        let x = PostId::parse("POST-x").unwrap();
        let y = PostId::parse("POST-y").unwrap();
        store.save_reply(&ReplyId::generate(), &x, "bob", "first!").await.unwrap();
        store.save_reply(&ReplyId::generate(), &y, "carol", "elsewhere").await.unwrap();
        store.save_reply(&ReplyId::generate(), &x, "dave", "second").await.unwrap();

        let lines = store.get_replies_for_post(&x).await.unwrap();
        assert_eq!(lines, vec!["bob: first!".to_string(), "dave: second".to_string()]);
    }
}
