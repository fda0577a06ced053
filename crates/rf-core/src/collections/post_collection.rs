//! # PostCollection
//!
//! The authoritative in-memory set of posts for one session. Insertion order
//! is preserved; every query hands back copies so later mutations never
//! reach into a caller's earlier result.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use super::{keyword, matches_ignore_case};
use crate::error::{ForumError, Result};
use crate::models::{Post, PostChanges};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostCollection {
    posts: Vec<Post>,
    // id -> position in `posts`
    index: HashMap<String, usize>,
}

impl PostCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection from posts loaded elsewhere. Fails on a repeated id.
    pub fn from_posts(posts: Vec<Post>) -> Result<Self> {
        let mut collection = Self::new();
        for post in posts {
            collection.add(post)?;
        }
        Ok(collection)
    }

    /// Snapshot views skip the duplicate check: their source already enforced it.
    fn from_matches<'a>(posts: impl Iterator<Item = &'a Post>) -> Self {
        let mut collection = Self { posts: posts.cloned().collect(), index: HashMap::new() };
        collection.reindex_from(0);
        collection
    }

    // ── Create ───────────────────────────────────────────────────────────────

    pub fn add(&mut self, post: Post) -> Result<()> {
        if self.contains(post.id().as_str()) {
            return Err(ForumError::DuplicateId(post.id().to_string()));
        }
        debug!(post_id = %post.id(), "post added");
        self.index.insert(post.id().to_string(), self.posts.len());
        self.posts.push(post);
        Ok(())
    }

    pub fn create(&mut self, author: &str, title: &str, content: &str, thread: Option<&str>) -> Result<Post> {
        let post = Post::new(author, title, content, thread)?;
        self.add(post.clone())?;
        Ok(post)
    }

    // ── Read ─────────────────────────────────────────────────────────────────

    /// The only lookup that misses silently.
    pub fn find_by_id(&self, id: &str) -> Option<&Post> {
        self.index.get(id.trim()).map(|&i| &self.posts[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find_by_id(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Post> {
        self.posts.iter()
    }

    pub fn all_posts(&self) -> Vec<Post> {
        self.posts.clone()
    }

    pub fn active_posts(&self) -> Vec<Post> {
        self.posts.iter().filter(|p| !p.is_deleted()).cloned().collect()
    }

    pub fn by_thread(&self, name: &str) -> PostCollection {
        Self::from_matches(self.posts.iter().filter(|p| matches_ignore_case(p.thread(), name)))
    }

    pub fn by_author(&self, username: &str) -> PostCollection {
        Self::from_matches(self.posts.iter().filter(|p| matches_ignore_case(p.author_username(), username)))
    }

    /// Active posts whose title or content contains `keyword`, ignoring case.
    pub fn search(&self, keyword: &str) -> Result<PostCollection> {
        let needle = keyword::normalize(keyword)?;
        Ok(Self::from_matches(self.posts.iter().filter(|p| {
            !p.is_deleted()
                && (p.title().to_lowercase().contains(&needle) || p.content().to_lowercase().contains(&needle))
        })))
    }

    // ── Update ───────────────────────────────────────────────────────────────

    pub fn update_title(&mut self, id: &str, title: &str) -> Result<()> {
        self.get_active_mut(id)?.set_title(title)
    }

    pub fn update_content(&mut self, id: &str, content: &str) -> Result<()> {
        self.get_active_mut(id)?.set_content(content)
    }

    pub fn update_thread(&mut self, id: &str, thread: &str) -> Result<()> {
        self.get_active_mut(id)?.set_thread(thread);
        Ok(())
    }

    /// Applies several edits at once; nothing changes unless all of them validate.
    pub fn update(&mut self, id: &str, changes: PostChanges) -> Result<Post> {
        let post = self.get_active_mut(id)?;
        post.apply(changes)?;
        debug!(post_id = %post.id(), "post updated");
        Ok(post.clone())
    }

    /// Returns the new count. Replying to a deleted post is not allowed.
    pub fn increment_reply_count(&mut self, id: &str) -> Result<u32> {
        let post = self.get_active_mut(id)?;
        post.increment_reply_count();
        Ok(post.reply_count())
    }

    pub fn decrement_reply_count(&mut self, id: &str) -> Result<u32> {
        let post = self.get_mut(id)?;
        post.decrement_reply_count();
        Ok(post.reply_count())
    }

    /// Puts back a copy taken earlier, timestamps included. The id must already be present.
    pub fn replace(&mut self, post: Post) -> Result<Post> {
        let slot = self.get_mut(post.id().as_str())?;
        let previous = std::mem::replace(slot, post);
        debug!(post_id = %previous.id(), "post replaced");
        Ok(previous)
    }

    // ── Delete ───────────────────────────────────────────────────────────────

    pub fn soft_delete(&mut self, id: &str) -> Result<()> {
        let post = self.get_mut(id)?;
        if post.is_deleted() {
            return Err(ForumError::AlreadyDeleted(format!("post {} is already deleted", post.id())));
        }
        post.mark_as_deleted();
        debug!(post_id = %post.id(), "post soft-deleted");
        Ok(())
    }

    pub fn restore(&mut self, id: &str) -> Result<()> {
        let post = self.get_mut(id)?;
        if !post.is_deleted() {
            return Err(ForumError::NotDeleted(format!("post {} is not deleted", post.id())));
        }
        post.restore();
        debug!(post_id = %post.id(), "post restored");
        Ok(())
    }

    /// Irreversible. Works on active and deleted posts alike.
    pub fn permanently_remove(&mut self, id: &str) -> Result<Post> {
        let trimmed = id.trim();
        let position = self
            .index
            .remove(trimmed)
            .ok_or_else(|| ForumError::NotFound("Post", trimmed.to_string()))?;
        let removed = self.posts.remove(position);
        self.reindex_from(position);
        debug!(post_id = %removed.id(), "post permanently removed");
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.posts.clear();
        self.index.clear();
    }

    // ── Counters (always derived) ────────────────────────────────────────────

    pub fn size(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.posts.iter().filter(|p| !p.is_deleted()).count()
    }

    /// Counts every post in the thread, deleted ones included.
    pub fn count_in_thread(&self, name: &str) -> usize {
        self.posts.iter().filter(|p| matches_ignore_case(p.thread(), name)).count()
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Post> {
        let id = id.trim();
        match self.index.get(id) {
            Some(&i) => Ok(&mut self.posts[i]),
            None => Err(ForumError::NotFound("Post", id.to_string())),
        }
    }

    fn reindex_from(&mut self, start: usize) {
        for (i, post) in self.posts.iter().enumerate().skip(start) {
            self.index.insert(post.id().to_string(), i);
        }
    }

    fn get_active_mut(&mut self, id: &str) -> Result<&mut Post> {
        let post = self.get_mut(id)?;
        if post.is_deleted() {
            return Err(ForumError::InvalidState(format!("post {} is deleted", post.id())));
        }
        Ok(post)
    }
}

impl fmt::Display for PostCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active = self.active_count();
        write!(
            f,
            "PostCollection[Total={}, Active={}, Deleted={}]",
            self.size(),
            active,
            self.size() - active
        )
    }
}

impl IntoIterator for PostCollection {
    type Item = Post;
    type IntoIter = std::vec::IntoIter<Post>;

    fn into_iter(self) -> Self::IntoIter {
        self.posts.into_iter()
    }
}
