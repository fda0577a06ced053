//! The `Reply` entity: one response to a post.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{advance, bounded_text, preview, required_text, Lifecycle, PostId, ReplyId, TIMESTAMP_FORMAT};
use crate::error::{ForumError, Result};

pub const MIN_CONTENT_LENGTH: usize = 5;
pub const MAX_CONTENT_LENGTH: usize = 3000;

/// A validated response to a post.
///
/// `post_id` is a weak reference used for lookups only; a reply never owns or
/// manages its post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    id: ReplyId,
    post_id: PostId,
    author_username: String,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    lifecycle: Lifecycle,
}

/// Plain, unvalidated shape of a reply as the persistence collaborator stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRecord {
    pub id: String,
    pub post_id: String,
    pub author_username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted: bool,
}

fn validate_post_id(post_id: &str) -> Result<PostId> {
    PostId::parse(post_id).map_err(|_| {
        ForumError::Validation("post id cannot be empty: a reply must be associated with a post".into())
    })
}

fn validate_content(content: &str) -> Result<String> {
    bounded_text("reply content", content, MIN_CONTENT_LENGTH, MAX_CONTENT_LENGTH)
}

impl Reply {
    pub fn new(post_id: &str, author_username: &str, content: &str) -> Result<Self> {
        let post_id = validate_post_id(post_id)?;
        let author_username = required_text("author username", author_username)?;
        let content = validate_content(content)?;
        let now = Utc::now();

        Ok(Self {
            id: ReplyId::generate(),
            post_id,
            author_username,
            content,
            created_at: now,
            updated_at: now,
            lifecycle: Lifecycle::Active,
        })
    }

    pub fn restore_from(record: ReplyRecord) -> Result<Self> {
        Ok(Self {
            id: ReplyId::parse(&record.id)?,
            post_id: validate_post_id(&record.post_id)?,
            author_username: required_text("author username", &record.author_username)?,
            content: validate_content(&record.content)?,
            created_at: record.created_at,
            updated_at: record.updated_at.max(record.created_at),
            lifecycle: if record.deleted { Lifecycle::Deleted } else { Lifecycle::Active },
        })
    }

    pub fn to_record(&self) -> ReplyRecord {
        ReplyRecord {
            id: self.id.to_string(),
            post_id: self.post_id.to_string(),
            author_username: self.author_username.clone(),
            content: self.content.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted: self.is_deleted(),
        }
    }

    pub fn id(&self) -> &ReplyId {
        &self.id
    }

    pub fn post_id(&self) -> &PostId {
        &self.post_id
    }

    pub fn author_username(&self) -> &str {
        &self.author_username
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_deleted(&self) -> bool {
        self.lifecycle.is_deleted()
    }

    /// Exact, case-sensitive match after trimming.
    pub fn is_authored_by(&self, username: &str) -> bool {
        self.author_username == username.trim()
    }

    pub fn set_content(&mut self, content: &str) -> Result<()> {
        self.content = validate_content(content)?;
        self.touch();
        Ok(())
    }

    pub fn mark_as_deleted(&mut self) {
        self.lifecycle = Lifecycle::Deleted;
        self.touch();
    }

    pub fn restore(&mut self) {
        self.lifecycle = Lifecycle::Active;
        self.touch();
    }

    pub fn formatted_created_at(&self) -> String {
        self.created_at.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn formatted_updated_at(&self) -> String {
        self.updated_at.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn summary(&self) -> String {
        let status = if self.is_deleted() { "[DELETED] " } else { "" };
        format!(
            "{status}{}\nBy: {} | {}",
            preview(&self.content, 150),
            self.author_username,
            self.formatted_created_at()
        )
    }

    fn touch(&mut self) {
        self.updated_at = advance(self.updated_at);
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reply[ID={}, PostID={}, Author={}, Deleted={}]",
            self.id,
            self.post_id,
            self.author_username,
            self.is_deleted()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_boundaries() {
        assert!(Reply::new("POST-1", "bob", &"r".repeat(5)).is_ok());
        assert!(Reply::new("POST-1", "bob", &"r".repeat(3000)).is_ok());
        assert!(Reply::new("POST-1", "bob", &"r".repeat(4)).is_err());
        assert!(Reply::new("POST-1", "bob", &"r".repeat(3001)).is_err());
    }

    #[test]
    fn reply_requires_a_post() {
        let err = Reply::new("  ", "bob", "Thanks a lot!").unwrap_err();
        assert!(matches!(err, ForumError::Validation(ref m) if m.contains("associated with a post")));
    }

    #[test]
    fn new_trims_fields() {
        let reply = Reply::new(" POST-1 ", " bob ", "  Thanks a lot!  ").unwrap();
        assert_eq!(reply.post_id().as_str(), "POST-1");
        assert_eq!(reply.author_username(), "bob");
        assert_eq!(reply.content(), "Thanks a lot!");
        assert!(reply.id().as_str().starts_with("REPLY-"));
    }

    #[test]
    fn failed_set_content_keeps_old_value() {
        let mut reply = Reply::new("POST-1", "bob", "Thanks a lot!").unwrap();
        let before = reply.clone();
        assert!(reply.set_content("hey").is_err());
        assert_eq!(reply, before);
    }

    #[test]
    fn delete_and_restore_flip_lifecycle() {
        let mut reply = Reply::new("POST-1", "bob", "Thanks a lot!").unwrap();
        let created = reply.updated_at();
        reply.mark_as_deleted();
        assert!(reply.is_deleted());
        reply.restore();
        assert_eq!(reply.lifecycle(), Lifecycle::Active);
        assert!(reply.updated_at() >= created);
    }

    #[test]
    fn summary_previews_long_content() {
        let reply = Reply::new("POST-1", "bob", &"z".repeat(400)).unwrap();
        let summary = reply.summary();
        let first_line = summary.lines().next().unwrap();
        assert_eq!(first_line.chars().count(), 150);
        assert!(first_line.ends_with("..."));
        assert!(reply.to_string().contains("PostID=POST-1, Author=bob, Deleted=false"));
    }

    #[test]
    fn record_round_trip() {
        let mut reply = Reply::new("POST-1", "bob", "Thanks a lot!").unwrap();
        reply.mark_as_deleted();
        assert_eq!(Reply::restore_from(reply.to_record()).unwrap(), reply);
    }
}
