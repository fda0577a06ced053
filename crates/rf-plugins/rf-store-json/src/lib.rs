//! # rf-store-json
//!
//! File-backed implementation of `ForumStore`: the whole forum lives in one
//! JSON document. Each mutation is read-modify-write under a single async
//! lock, and the new document replaces the old one via rename.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rf_core::models::{Post, PostId, PostRecord, ReplyId};
use rf_core::traits::{reply_line, ForumStore};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    posts: Vec<PostRecord>,
    #[serde(default)]
    replies: Vec<ReplyRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ReplyRow {
    id: String,
    post_id: String,
    author: String,
    content: String,
    /// First save. Reply lines are ordered by it.
    saved_at: DateTime<Utc>,
}

impl Document {
    fn post_mut(&mut self, id: &PostId) -> anyhow::Result<&mut PostRecord> {
        self.posts
            .iter_mut()
            .find(|p| p.id == id.as_str())
            .ok_or_else(|| anyhow!("no stored post with id {id}"))
    }
}

pub struct JsonForumStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonForumStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty forum, not an error.
    async fn read(&self) -> anyhow::Result<Document> {
        match fs::read_to_string(&self.path).await {
            Ok(data) => serde_json::from_str(&data)
                .with_context(|| format!("failed to parse forum data at {:?}", self.path)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Document::default()),
            Err(e) => Err(e).with_context(|| format!("failed to read forum data at {:?}", self.path)),
        }
    }

    async fn write(&self, document: &Document) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create data directory {parent:?}"))?;
        }

        let json = serde_json::to_string_pretty(document).context("failed to serialize forum data")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .await
            .with_context(|| format!("failed to write {tmp:?}"))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("failed to replace {:?}", self.path))?;
        Ok(())
    }

    async fn modify<T>(&self, f: impl FnOnce(&mut Document) -> anyhow::Result<T> + Send) -> anyhow::Result<T> {
        let _guard = self.lock.lock().await;
        let mut document = self.read().await?;
        let out = f(&mut document)?;
        self.write(&document).await?;
        Ok(out)
    }
}

#[async_trait]
impl ForumStore for JsonForumStore {
    async fn load_all_posts(&self) -> anyhow::Result<Vec<Post>> {
        let document = {
            let _guard = self.lock.lock().await;
            self.read().await?
        };
        info!(path = ?self.path, posts = document.posts.len(), "forum data loaded");

        document
            .posts
            .into_iter()
            .map(|record| {
                let id = record.id.clone();
                Post::restore_from(record).with_context(|| format!("stored post {id} is invalid"))
            })
            .collect()
    }

    async fn save_post(&self, post: &Post) -> anyhow::Result<()> {
        let record = post.to_record();
        self.modify(move |document| {
            match document.posts.iter_mut().find(|p| p.id == record.id) {
                Some(existing) => *existing = record,
                None => document.posts.push(record),
            }
            Ok(())
        })
        .await?;
        debug!(post_id = %post.id(), "post saved");
        Ok(())
    }

    async fn mark_post_deleted(&self, id: &PostId) -> anyhow::Result<()> {
        self.modify(|document| {
            document.post_mut(id)?.deleted = true;
            Ok(())
        })
        .await
    }

    async fn update_reply_count(&self, post_id: &PostId, count: u32) -> anyhow::Result<()> {
        self.modify(|document| {
            document.post_mut(post_id)?.reply_count = count;
            Ok(())
        })
        .await
    }

    async fn save_reply(&self, id: &ReplyId, post_id: &PostId, author: &str, content: &str) -> anyhow::Result<()> {
        let mut row = ReplyRow {
            id: id.to_string(),
            post_id: post_id.to_string(),
            author: author.to_string(),
            content: content.to_string(),
            saved_at: Utc::now(),
        };
        self.modify(move |document| {
            match document.replies.iter_mut().find(|r| r.id == row.id) {
                Some(existing) => {
                    row.saved_at = existing.saved_at;
                    *existing = row;
                }
                None => document.replies.push(row),
            }
            Ok(())
        })
        .await?;
        debug!(reply_id = %id, %post_id, "reply saved");
        Ok(())
    }

    async fn get_replies_for_post(&self, post_id: &PostId) -> anyhow::Result<Vec<String>> {
        let document = {
            let _guard = self.lock.lock().await;
            self.read().await?
        };
        let mut rows: Vec<&ReplyRow> = document
            .replies
            .iter()
            .filter(|r| r.post_id == post_id.as_str())
            .collect();
        rows.sort_by_key(|r| r.saved_at);
        Ok(rows.into_iter().map(|r| reply_line(&r.author, &r.content)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(title: &str) -> Post {
        Post::new("alice", title, "Body text long enough.", Some("Rust")).unwrap()
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty_forum() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonForumStore::new(dir.path().join("forum.json"));
        assert!(store.load_all_posts().await.unwrap().is_empty());
        assert!(store.get_replies_for_post(&PostId::parse("POST-1").unwrap()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn posts_survive_a_new_store_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("forum.json");

        let first = post("First");
        let mut second = post("Second");
        {
            let store = JsonForumStore::new(&path);
            store.save_post(&first).await.unwrap();
            store.save_post(&second).await.unwrap();
            second.set_title("Second, edited").unwrap();
            store.save_post(&second).await.unwrap();
            store.update_reply_count(first.id(), 2).await.unwrap();
            store.mark_post_deleted(second.id()).await.unwrap();
        }

        let reopened = JsonForumStore::new(&path);
        let loaded = reopened.load_all_posts().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id(), first.id());
        assert_eq!(loaded[0].reply_count(), 2);
        assert_eq!(loaded[1].title(), "Second, edited");
        assert!(loaded[1].is_deleted());
    }

    #[tokio::test]
    async fn reply_lines_are_filtered_by_post() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonForumStore::new(dir.path().join("forum.json"));
        let x = PostId::parse("POST-x").unwrap();
        let y = PostId::parse("POST-y").unwrap();
        store.save_reply(&ReplyId::generate(), &x, "bob", "first!").await.unwrap();
        store.save_reply(&ReplyId::generate(), &y, "carol", "elsewhere").await.unwrap();

        assert_eq!(store.get_replies_for_post(&x).await.unwrap(), vec!["bob: first!".to_string()]);
    }

    #[tokio::test]
    async fn reply_lines_are_oldest_first_and_resaving_keeps_the_slot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forum.json");
        std::fs::write(
            &path,
            r#"{"replies": [
                {"id": "REPLY-2", "post_id": "POST-x", "author": "carol", "content": "later", "saved_at": "2024-05-02T10:00:00Z"},
                {"id": "REPLY-1", "post_id": "POST-x", "author": "bob", "content": "earlier", "saved_at": "2024-05-01T10:00:00Z"}
            ]}"#,
        )
        .unwrap();
        let store = JsonForumStore::new(&path);
        let x = PostId::parse("POST-x").unwrap();

        store
            .save_reply(&ReplyId::parse("REPLY-1").unwrap(), &x, "bob", "earlier, edited")
            .await
            .unwrap();
        assert_eq!(
            store.get_replies_for_post(&x).await.unwrap(),
            vec!["bob: earlier, edited".to_string(), "carol: later".to_string()]
        );
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forum.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = JsonForumStore::new(&path);
        let err = store.load_all_posts().await.unwrap_err();
        assert!(err.to_string().contains("failed to parse forum data"));
    }

    #[tokio::test]
    async fn unknown_post_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonForumStore::new(dir.path().join("forum.json"));
        let missing = PostId::parse("POST-missing").unwrap();
        assert!(store.mark_post_deleted(&missing).await.is_err());
    }
}
