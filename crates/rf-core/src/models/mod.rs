//! # Domain Models
//!
//! The two entities of rusty-forum plus the identifier and lifecycle types
//! they share. Entities are only ever built through validated constructors;
//! fields are private so the entity stays the sole mutator of its own state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{ForumError, Result};

pub mod post;
pub mod reply;

pub use post::{Post, PostChanges, PostRecord};
pub use reply::{Reply, ReplyRecord};

/// Display format shared by every timestamp rendered for humans.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Namespace prefix + UUID v7. `now_v7` is monotonic within the process.
            pub fn generate() -> Self {
                Self(format!(concat!($prefix, "-{}"), Uuid::now_v7().simple()))
            }

            /// Wraps an identifier received from outside (persistence, user input).
            pub fn parse(value: &str) -> Result<Self> {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(ForumError::Validation(
                        concat!(stringify!($name), " cannot be empty").to_string(),
                    ));
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

entity_id!(
    /// Opaque, globally unique identifier of a [`Post`].
    PostId,
    "POST"
);
entity_id!(
    /// Opaque, globally unique identifier of a [`Reply`].
    ReplyId,
    "REPLY"
);

/// Soft-delete state of an entity.
///
/// `Active --soft delete--> Deleted --restore--> Active`. Permanent removal is
/// not a state: the entity simply leaves its collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    #[default]
    Active,
    Deleted,
}

impl Lifecycle {
    pub fn is_deleted(self) -> bool {
        matches!(self, Lifecycle::Deleted)
    }

    pub fn is_active(self) -> bool {
        !self.is_deleted()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Lifecycle::Active => "active",
            Lifecycle::Deleted => "deleted",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trims `value` and checks it against `[min, max]` characters.
pub(crate) fn bounded_text(field: &str, value: &str, min: usize, max: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ForumError::Validation(format!("{field} cannot be empty")));
    }

    let len = trimmed.chars().count();
    if len < min {
        return Err(ForumError::Validation(format!(
            "{field} must be at least {min} characters (got {len})"
        )));
    }
    if len > max {
        return Err(ForumError::Validation(format!(
            "{field} cannot exceed {max} characters (got {len})"
        )));
    }

    Ok(trimmed.to_string())
}

pub(crate) fn required_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ForumError::Validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

/// Next `updated_at` value. Never moves backwards, even if the wall clock does.
pub(crate) fn advance(previous: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(previous)
}

/// Cuts `text` to `max` characters, marking the cut with `...`.
pub(crate) fn preview(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        text.to_string()
    }
}
