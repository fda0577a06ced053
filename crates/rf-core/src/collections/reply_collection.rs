//! # ReplyCollection
//!
//! Same contract as `PostCollection`, keyed on the parent post id instead of
//! author/thread. `delete_replies_for_post` is the one cascading operation in
//! the engine and only ever runs when a caller asks for it.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use super::{keyword, matches_ignore_case};
use crate::error::{ForumError, Result};
use crate::models::Reply;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyCollection {
    replies: Vec<Reply>,
    index: HashMap<String, usize>,
}

impl ReplyCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_replies(replies: Vec<Reply>) -> Result<Self> {
        let mut collection = Self::new();
        for reply in replies {
            collection.add(reply)?;
        }
        Ok(collection)
    }

    fn from_matches<'a>(replies: impl Iterator<Item = &'a Reply>) -> Self {
        let mut collection = Self { replies: replies.cloned().collect(), index: HashMap::new() };
        collection.reindex_from(0);
        collection
    }

    pub fn add(&mut self, reply: Reply) -> Result<()> {
        if self.contains(reply.id().as_str()) {
            return Err(ForumError::DuplicateId(reply.id().to_string()));
        }
        debug!(reply_id = %reply.id(), post_id = %reply.post_id(), "reply added");
        self.index.insert(reply.id().to_string(), self.replies.len());
        self.replies.push(reply);
        Ok(())
    }

    pub fn create(&mut self, post_id: &str, author: &str, content: &str) -> Result<Reply> {
        let reply = Reply::new(post_id, author, content)?;
        self.add(reply.clone())?;
        Ok(reply)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Reply> {
        self.index.get(id.trim()).map(|&i| &self.replies[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find_by_id(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reply> {
        self.replies.iter()
    }

    pub fn all_replies(&self) -> Vec<Reply> {
        self.replies.clone()
    }

    pub fn active_replies(&self) -> Vec<Reply> {
        self.replies.iter().filter(|r| !r.is_deleted()).cloned().collect()
    }

    pub fn by_post_id(&self, post_id: &str) -> ReplyCollection {
        Self::from_matches(self.replies_for(post_id))
    }

    pub fn active_by_post_id(&self, post_id: &str) -> ReplyCollection {
        Self::from_matches(self.replies_for(post_id).filter(|r| !r.is_deleted()))
    }

    pub fn by_author(&self, username: &str) -> ReplyCollection {
        Self::from_matches(self.replies.iter().filter(|r| matches_ignore_case(r.author_username(), username)))
    }

    /// Active replies whose content contains `keyword`, ignoring case.
    pub fn search(&self, keyword: &str) -> Result<ReplyCollection> {
        let needle = keyword::normalize(keyword)?;
        Ok(Self::from_matches(
            self.replies
                .iter()
                .filter(|r| !r.is_deleted() && r.content().to_lowercase().contains(&needle)),
        ))
    }

    pub fn count_for_post(&self, post_id: &str) -> usize {
        self.replies_for(post_id).count()
    }

    pub fn active_count_for_post(&self, post_id: &str) -> usize {
        self.replies_for(post_id).filter(|r| !r.is_deleted()).count()
    }

    pub fn update_content(&mut self, id: &str, content: &str) -> Result<()> {
        let reply = self.get_mut(id)?;
        if reply.is_deleted() {
            return Err(ForumError::InvalidState(format!("reply {} is deleted", reply.id())));
        }
        reply.set_content(content)
    }

    pub fn soft_delete(&mut self, id: &str) -> Result<()> {
        let reply = self.get_mut(id)?;
        if reply.is_deleted() {
            return Err(ForumError::AlreadyDeleted(format!("reply {} is already deleted", reply.id())));
        }
        reply.mark_as_deleted();
        debug!(reply_id = %reply.id(), "reply soft-deleted");
        Ok(())
    }

    pub fn restore(&mut self, id: &str) -> Result<()> {
        let reply = self.get_mut(id)?;
        if !reply.is_deleted() {
            return Err(ForumError::NotDeleted(format!("reply {} is not deleted", reply.id())));
        }
        reply.restore();
        debug!(reply_id = %reply.id(), "reply restored");
        Ok(())
    }

    /// Puts back a copy taken earlier, timestamps included.
    pub fn replace(&mut self, reply: Reply) -> Result<Reply> {
        let slot = self.get_mut(reply.id().as_str())?;
        let previous = std::mem::replace(slot, reply);
        debug!(reply_id = %previous.id(), "reply replaced");
        Ok(previous)
    }

    pub fn permanently_remove(&mut self, id: &str) -> Result<Reply> {
        let trimmed = id.trim();
        let position = self
            .index
            .remove(trimmed)
            .ok_or_else(|| ForumError::NotFound("Reply", trimmed.to_string()))?;
        let removed = self.replies.remove(position);
        self.reindex_from(position);
        debug!(reply_id = %removed.id(), "reply permanently removed");
        Ok(removed)
    }

    /// Soft-deletes every active reply of `post_id`; returns how many changed.
    pub fn delete_replies_for_post(&mut self, post_id: &str) -> usize {
        let post_id = post_id.trim();
        if post_id.is_empty() {
            return 0;
        }

        let mut affected = 0;
        for reply in self
            .replies
            .iter_mut()
            .filter(|r| r.post_id().as_str() == post_id && !r.is_deleted())
        {
            reply.mark_as_deleted();
            affected += 1;
        }
        debug!(post_id, affected, "replies cascaded to deleted");
        affected
    }

    pub fn clear(&mut self) {
        self.replies.clear();
        self.index.clear();
    }

    pub fn size(&self) -> usize {
        self.replies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.replies.iter().filter(|r| !r.is_deleted()).count()
    }

    fn replies_for<'a>(&'a self, post_id: &str) -> impl Iterator<Item = &'a Reply> + 'a {
        let post_id = post_id.trim().to_string();
        self.replies
            .iter()
            .filter(move |r| !post_id.is_empty() && r.post_id().as_str() == post_id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Reply> {
        let id = id.trim();
        match self.index.get(id) {
            Some(&i) => Ok(&mut self.replies[i]),
            None => Err(ForumError::NotFound("Reply", id.to_string())),
        }
    }

    fn reindex_from(&mut self, start: usize) {
        for (i, reply) in self.replies.iter().enumerate().skip(start) {
            self.index.insert(reply.id().to_string(), i);
        }
    }
}

impl fmt::Display for ReplyCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active = self.active_count();
        write!(
            f,
            "ReplyCollection[Total={}, Active={}, Deleted={}]",
            self.size(),
            active,
            self.size() - active
        )
    }
}

impl IntoIterator for ReplyCollection {
    type Item = Reply;
    type IntoIter = std::vec::IntoIter<Reply>;

    fn into_iter(self) -> Self::IntoIter {
        self.replies.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POST_X: &str = "POST-x";
    const POST_Y: &str = "POST-y";

    fn seeded() -> ReplyCollection {
        let mut replies = ReplyCollection::new();
        replies.create(POST_X, "bob", "Have you tried cloning it?").unwrap();
        replies.create(POST_X, "carol", "Use a reference instead.").unwrap();
        replies.create(POST_X, "Bob", "Or wrap it in an Rc.").unwrap();
        replies.create(POST_Y, "dave", "Unrelated answer here.").unwrap();
        replies
    }

    #[test]
    fn cascade_soft_deletes_active_replies_once() {
        let mut replies = seeded();
        assert_eq!(replies.delete_replies_for_post(POST_X), 3);
        assert!(replies.by_post_id(POST_X).iter().all(Reply::is_deleted));
        assert_eq!(replies.delete_replies_for_post(POST_X), 0);
        assert_eq!(replies.active_count_for_post(POST_Y), 1);
    }

    #[test]
    fn cascade_skips_already_deleted_replies() {
        let mut replies = seeded();
        let first = replies.by_post_id(POST_X).iter().next().unwrap().id().to_string();
        replies.soft_delete(&first).unwrap();
        assert_eq!(replies.delete_replies_for_post(POST_X), 2);
        assert_eq!(replies.delete_replies_for_post(""), 0);
    }

    #[test]
    fn post_filters_and_counters() {
        let mut replies = seeded();
        let first = replies.by_post_id(POST_X).iter().next().unwrap().id().to_string();
        replies.soft_delete(&first).unwrap();

        assert_eq!(replies.count_for_post(POST_X), 3);
        assert_eq!(replies.active_count_for_post(POST_X), 2);
        assert_eq!(replies.active_by_post_id(POST_X).size(), 2);
        assert!(replies.by_post_id("POST-none").is_empty());
        assert!(replies.by_post_id("  ").is_empty());
        assert_eq!(replies.by_author("BOB").size(), 2);
        assert_eq!(replies.size() - replies.active_count(), 1);
        assert_eq!(replies.to_string(), "ReplyCollection[Total=4, Active=3, Deleted=1]");
    }

    #[test]
    fn search_covers_content_of_active_replies() {
        let mut replies = seeded();
        assert_eq!(replies.search("REFERENCE").unwrap().size(), 1);
        let id = replies.search("reference").unwrap().iter().next().unwrap().id().to_string();
        replies.soft_delete(&id).unwrap();
        assert!(replies.search("reference").unwrap().is_empty());
        assert!(matches!(replies.search("x"), Err(ForumError::Validation(_))));
    }

    #[test]
    fn state_machine_guards() {
        let mut replies = seeded();
        let id = replies.iter().next().unwrap().id().to_string();

        assert!(matches!(replies.restore(&id), Err(ForumError::NotDeleted(_))));
        replies.soft_delete(&id).unwrap();
        assert!(matches!(replies.soft_delete(&id), Err(ForumError::AlreadyDeleted(_))));
        assert!(matches!(replies.update_content(&id, "A valid edit"), Err(ForumError::InvalidState(_))));
        replies.restore(&id).unwrap();
        replies.update_content(&id, "A valid edit").unwrap();
        assert_eq!(replies.find_by_id(&id).unwrap().content(), "A valid edit");

        assert!(matches!(replies.soft_delete("REPLY-none"), Err(ForumError::NotFound("Reply", _))));
    }

    #[test]
    fn replace_undoes_a_cascade_exactly() {
        let mut replies = seeded();
        let before = replies.by_post_id(POST_X).all_replies();
        replies.delete_replies_for_post(POST_X);
        for reply in before.clone() {
            replies.replace(reply).unwrap();
        }
        assert_eq!(replies.by_post_id(POST_X).all_replies(), before);
    }

    #[test]
    fn duplicate_and_removal() {
        let mut replies = seeded();
        let existing = replies.iter().next().unwrap().clone();
        assert!(matches!(replies.add(existing.clone()), Err(ForumError::DuplicateId(_))));
        assert_eq!(replies.size(), 4);

        replies.permanently_remove(existing.id().as_str()).unwrap();
        assert!(replies.find_by_id(existing.id().as_str()).is_none());
        let last = replies.by_post_id(POST_Y).iter().next().unwrap().id().to_string();
        assert_eq!(replies.find_by_id(&last).unwrap().author_username(), "dave");
        assert!(replies.permanently_remove(existing.id().as_str()).is_err());
        replies.clear();
        assert!(replies.is_empty());
    }
}
