//! The `Post` entity: one discussion item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{advance, bounded_text, preview, required_text, Lifecycle, PostId, TIMESTAMP_FORMAT};
use crate::error::Result;

pub const MIN_TITLE_LENGTH: usize = 3;
pub const MAX_TITLE_LENGTH: usize = 200;
pub const MIN_CONTENT_LENGTH: usize = 10;
pub const MAX_CONTENT_LENGTH: usize = 5000;
pub const DEFAULT_THREAD: &str = "General";

/// A validated discussion item.
///
/// Construction either yields a fully valid post or an error; there is no
/// partially initialised state. Every setter validates before assigning and
/// leaves the post untouched on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    id: PostId,
    author_username: String,
    title: String,
    content: String,
    thread: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    lifecycle: Lifecycle,
    reply_count: u32,
}

/// A set of field edits applied to a [`Post`] all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub thread: Option<String>,
}

impl PostChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.thread.is_none()
    }
}

/// Plain, unvalidated shape of a post as the persistence collaborator stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub author_username: String,
    pub title: String,
    pub content: String,
    pub thread: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub reply_count: u32,
}

fn validate_title(title: &str) -> Result<String> {
    bounded_text("post title", title, MIN_TITLE_LENGTH, MAX_TITLE_LENGTH)
}

fn validate_content(content: &str) -> Result<String> {
    bounded_text("post content", content, MIN_CONTENT_LENGTH, MAX_CONTENT_LENGTH)
}

fn resolve_thread(thread: Option<&str>) -> String {
    match thread.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => DEFAULT_THREAD.to_string(),
    }
}

impl Post {
    /// Creates a new active post with a freshly generated id.
    ///
    /// An empty or missing `thread` resolves to [`DEFAULT_THREAD`].
    pub fn new(author_username: &str, title: &str, content: &str, thread: Option<&str>) -> Result<Self> {
        let author_username = required_text("author username", author_username)?;
        let title = validate_title(title)?;
        let content = validate_content(content)?;
        let now = Utc::now();

        Ok(Self {
            id: PostId::generate(),
            author_username,
            title,
            content,
            thread: resolve_thread(thread),
            created_at: now,
            updated_at: now,
            lifecycle: Lifecycle::Active,
            reply_count: 0,
        })
    }

    /// Rebuilds a post loaded from persistence, re-validating every field.
    pub fn restore_from(record: PostRecord) -> Result<Self> {
        let id = PostId::parse(&record.id)?;
        let author_username = required_text("author username", &record.author_username)?;
        let title = validate_title(&record.title)?;
        let content = validate_content(&record.content)?;

        Ok(Self {
            id,
            author_username,
            title,
            content,
            thread: resolve_thread(Some(&record.thread)),
            created_at: record.created_at,
            updated_at: record.updated_at.max(record.created_at),
            lifecycle: if record.deleted { Lifecycle::Deleted } else { Lifecycle::Active },
            reply_count: record.reply_count,
        })
    }

    pub fn to_record(&self) -> PostRecord {
        PostRecord {
            id: self.id.to_string(),
            author_username: self.author_username.clone(),
            title: self.title.clone(),
            content: self.content.clone(),
            thread: self.thread.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted: self.is_deleted(),
            reply_count: self.reply_count,
        }
    }

    pub fn id(&self) -> &PostId {
        &self.id
    }

    pub fn author_username(&self) -> &str {
        &self.author_username
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn thread(&self) -> &str {
        &self.thread
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

    pub fn reply_count(&self) -> u32 {
        self.reply_count
    }

    /// Exact, case-sensitive match after trimming. Author listings ignore case; ownership does not.
    pub fn is_authored_by(&self, username: &str) -> bool {
        self.author_username == username.trim()
    }

    pub fn set_title(&mut self, title: &str) -> Result<()> {
        self.title = validate_title(title)?;
        self.touch();
        Ok(())
    }

    pub fn set_content(&mut self, content: &str) -> Result<()> {
        self.content = validate_content(content)?;
        self.touch();
        Ok(())
    }

    /// Never fails: blank input falls back to [`DEFAULT_THREAD`].
    pub fn set_thread(&mut self, thread: &str) {
        self.thread = resolve_thread(Some(thread));
        self.touch();
    }

    /// Validates every present field, then commits them together.
    pub fn apply(&mut self, changes: PostChanges) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let title = changes.title.as_deref().map(validate_title).transpose()?;
        let content = changes.content.as_deref().map(validate_content).transpose()?;
        let thread = changes.thread.as_deref().map(|t| resolve_thread(Some(t)));

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(content) = content {
            self.content = content;
        }
        if let Some(thread) = thread {
            self.thread = thread;
        }
        self.touch();
        Ok(())
    }

    /// Flips the flag only; guarding against double deletes is the collection's job.
    pub fn mark_as_deleted(&mut self) {
        self.lifecycle = Lifecycle::Deleted;
        self.touch();
    }

    pub fn restore(&mut self) {
        self.lifecycle = Lifecycle::Active;
        self.touch();
    }

    pub fn increment_reply_count(&mut self) {
        self.reply_count = self.reply_count.saturating_add(1);
    }

    /// Floor-clamped at zero.
    pub fn decrement_reply_count(&mut self) {
        self.reply_count = self.reply_count.saturating_sub(1);
    }

    pub fn formatted_created_at(&self) -> String {
        self.created_at.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn formatted_updated_at(&self) -> String {
        self.updated_at.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Two-line listing entry: title, then author/thread/replies/date.
    pub fn summary(&self) -> String {
        let status = if self.is_deleted() { "[DELETED] " } else { "" };
        format!(
            "{status}{}\nBy: {} | Thread: {} | Replies: {} | {}",
            preview(&self.title, 100),
            self.author_username,
            self.thread,
            self.reply_count,
            self.formatted_created_at()
        )
    }

    fn touch(&mut self) {
        self.updated_at = advance(self.updated_at);
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Post[ID={}, Author={}, Title={}, Thread={}, Replies={}, Deleted={}]",
            self.id,
            self.author_username,
            self.title,
            self.thread,
            self.reply_count,
            self.is_deleted()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForumError;

    fn sample() -> Post {
        Post::new("alice", "Hello World", "This is a long enough body.", Some("Rust")).unwrap()
    }

    #[test]
    fn ownership_is_case_sensitive() {
        let post = sample();
        assert!(post.is_authored_by(" alice "));
        assert!(!post.is_authored_by("ALICE"));
    }

    #[test]
    fn new_trims_fields_and_starts_active() {
        let post = Post::new("  alice ", "  Borrowing  ", "  Why does this not compile?  ", Some(" Help ")).unwrap();
        assert_eq!(post.author_username(), "alice");
        assert_eq!(post.title(), "Borrowing");
        assert_eq!(post.content(), "Why does this not compile?");
        assert_eq!(post.thread(), "Help");
        assert_eq!(post.lifecycle(), Lifecycle::Active);
        assert_eq!(post.reply_count(), 0);
        assert_eq!(post.created_at(), post.updated_at());
    }

    #[test]
    fn missing_or_blank_thread_falls_back_to_general() {
        let none = Post::new("alice", "Title", "Content here!", None).unwrap();
        let blank = Post::new("alice", "Title", "Content here!", Some("   ")).unwrap();
        assert_eq!(none.thread(), DEFAULT_THREAD);
        assert_eq!(blank.thread(), DEFAULT_THREAD);
    }

    #[test]
    fn title_boundaries() {
        let ok_min = "a".repeat(MIN_TITLE_LENGTH);
        let ok_max = "a".repeat(MAX_TITLE_LENGTH);
        assert!(Post::new("alice", &ok_min, "Content here!", None).is_ok());
        assert!(Post::new("alice", &ok_max, "Content here!", None).is_ok());

        let short = Post::new("alice", "ab", "Content here!", None).unwrap_err();
        let long = Post::new("alice", &"a".repeat(MAX_TITLE_LENGTH + 1), "Content here!", None).unwrap_err();
        assert!(matches!(short, ForumError::Validation(ref m) if m.contains("at least 3")));
        assert!(matches!(long, ForumError::Validation(ref m) if m.contains("cannot exceed 200")));
    }

    #[test]
    fn content_boundaries() {
        assert!(Post::new("alice", "Title", &"c".repeat(10), None).is_ok());
        assert!(Post::new("alice", "Title", &"c".repeat(5000), None).is_ok());
        assert!(Post::new("alice", "Title", &"c".repeat(9), None).is_err());
        assert!(Post::new("alice", "Title", &"c".repeat(5001), None).is_err());
    }

    #[test]
    fn blank_author_is_rejected() {
        let err = Post::new("   ", "Title", "Content here!", None).unwrap_err();
        assert_eq!(err, ForumError::Validation("author username cannot be empty".into()));
    }

    #[test]
    fn failed_setter_leaves_post_unchanged() {
        let mut post = sample();
        let before = post.clone();
        assert!(post.set_title("x").is_err());
        assert!(post.set_content("short").is_err());
        assert_eq!(post, before);
    }

    #[test]
    fn successful_setter_advances_updated_at() {
        let mut post = sample();
        let before = post.updated_at();
        post.set_title("A better title").unwrap();
        assert_eq!(post.title(), "A better title");
        assert!(post.updated_at() >= before);
        assert!(post.updated_at() >= post.created_at());
    }

    #[test]
    fn apply_is_all_or_nothing() {
        let mut post = sample();
        let before = post.clone();
        let bad = PostChanges {
            title: Some("A fine new title".into()),
            content: Some("tiny".into()),
            thread: Some("Other".into()),
        };
        assert!(post.apply(bad).is_err());
        assert_eq!(post, before);

        let good = PostChanges {
            title: Some("A fine new title".into()),
            content: None,
            thread: Some("".into()),
        };
        post.apply(good).unwrap();
        assert_eq!(post.title(), "A fine new title");
        assert_eq!(post.content(), before.content());
        assert_eq!(post.thread(), DEFAULT_THREAD);
    }

    #[test]
    fn reply_count_never_goes_negative() {
        let mut post = sample();
        post.decrement_reply_count();
        assert_eq!(post.reply_count(), 0);
        post.increment_reply_count();
        post.increment_reply_count();
        post.decrement_reply_count();
        assert_eq!(post.reply_count(), 1);
    }

    #[test]
    fn record_round_trip_preserves_identity() {
        let mut post = sample();
        post.increment_reply_count();
        post.mark_as_deleted();
        let restored = Post::restore_from(post.to_record()).unwrap();
        assert_eq!(restored, post);
    }

    #[test]
    fn restore_from_clamps_updated_at_and_revalidates() {
        let mut record = sample().to_record();
        record.updated_at = record.created_at - chrono::Duration::seconds(30);
        let post = Post::restore_from(record.clone()).unwrap();
        assert_eq!(post.updated_at(), post.created_at());

        record.title = "no".into();
        assert!(matches!(Post::restore_from(record), Err(ForumError::Validation(_))));
    }

    #[test]
    fn summary_and_display() {
        let mut post = sample();
        assert!(post.summary().starts_with("Hello World\nBy: alice | Thread: Rust | Replies: 0 | "));
        post.mark_as_deleted();
        assert!(post.summary().starts_with("[DELETED] Hello World"));
        let shown = post.to_string();
        assert!(shown.starts_with("Post[ID=POST-"));
        assert!(shown.ends_with("Author=alice, Title=Hello World, Thread=Rust, Replies=0, Deleted=true]"));
    }
}
