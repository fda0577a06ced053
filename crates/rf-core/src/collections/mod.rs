//! In-memory stores for posts and replies.
//!
//! Collections are not internally synchronized. A multi-threaded host must
//! hold one exclusive lock per collection around every mutation, and copy
//! query results before releasing it.

pub mod post_collection;
pub mod reply_collection;

pub use post_collection::PostCollection;
pub use reply_collection::ReplyCollection;

/// Exact match ignoring case. An empty filter matches nothing.
pub(crate) fn matches_ignore_case(field: &str, filter: &str) -> bool {
    let filter = filter.trim();
    !filter.is_empty() && field.to_lowercase() == filter.to_lowercase()
}

pub(crate) mod keyword {
    use crate::error::{ForumError, Result};

    pub const MIN_KEYWORD_LENGTH: usize = 2;

    /// Trims and lowercases a search keyword, rejecting empty or too-short input.
    pub fn normalize(keyword: &str) -> Result<String> {
        let trimmed = keyword.trim();
        if trimmed.is_empty() {
            return Err(ForumError::Validation("search keyword cannot be empty".into()));
        }
        let len = trimmed.chars().count();
        if len < MIN_KEYWORD_LENGTH {
            return Err(ForumError::Validation(format!(
                "search keyword must be at least {MIN_KEYWORD_LENGTH} characters (got {len})"
            )));
        }
        Ok(trimmed.to_lowercase())
    }
}
