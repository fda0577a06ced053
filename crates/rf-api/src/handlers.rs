//! # rf-api Handlers
//!
//! Each handler coordinates one user action between the session's
//! collections and the persistence port.
//!
//! The in-memory change is made first and persisted second. If the port
//! fails, the handler puts back copies of the entities it touched and
//! returns `ForumError::Persistence`, so the session never shows state the
//! store rejected. The one exception is `create_reply`: once `save_reply`
//! succeeded, a failing `update_reply_count` is reported but not undone.
//!
//! "An author may only modify their own posts and replies" is enforced here,
//! not in rf-core.

use rf_core::collections::{PostCollection, ReplyCollection};
use rf_core::error::{ForumError, Result};
use rf_core::models::{Post, PostChanges, PostId, Reply};
use rf_core::traits::ForumStore;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// State for one application session.
///
/// Mutating handlers hold the collection locks (posts before replies) for
/// their whole duration, persistence call included.
pub struct AppState {
    pub store: Box<dyn ForumStore>,
    posts: Mutex<PostCollection>,
    replies: Mutex<ReplyCollection>,
}

impl AppState {
    pub fn new(store: Box<dyn ForumStore>) -> Self {
        Self {
            store,
            posts: Mutex::new(PostCollection::new()),
            replies: Mutex::new(ReplyCollection::new()),
        }
    }
}

fn persistence_failure(operation: &'static str, err: anyhow::Error) -> ForumError {
    warn!(operation, error = %err, "persistence call failed");
    ForumError::persistence(err)
}

fn post_not_found(id: &str) -> ForumError {
    ForumError::NotFound("Post", id.trim().to_string())
}

fn ensure_post_owner(post: &Post, actor: &str) -> Result<()> {
    if post.is_authored_by(actor) {
        Ok(())
    } else {
        Err(ForumError::Forbidden("you can only modify your own posts".into()))
    }
}

// ── Posts ───────────────────────────────────────────────────────────────────

/// Replaces the session's posts with what the store holds. Returns how many were loaded.
pub async fn load_posts(state: &AppState) -> Result<usize> {
    let loaded = state
        .store
        .load_all_posts()
        .await
        .map_err(|e| persistence_failure("load_all_posts", e))?;
    let collection = PostCollection::from_posts(loaded)?;
    let count = collection.size();

    *state.posts.lock().await = collection;
    info!(count, "posts loaded into session");
    Ok(count)
}

pub async fn create_post(
    state: &AppState,
    author: &str,
    title: &str,
    content: &str,
    thread: Option<&str>,
) -> Result<Post> {
    let mut posts = state.posts.lock().await;
    let post = posts.create(author, title, content, thread)?;

    if let Err(err) = state.store.save_post(&post).await {
        posts.permanently_remove(post.id().as_str())?;
        return Err(persistence_failure("save_post", err));
    }

    info!(post_id = %post.id(), author = post.author_username(), "post created");
    Ok(post)
}

pub async fn find_post(state: &AppState, id: &str) -> Result<Post> {
    state
        .posts
        .lock()
        .await
        .find_by_id(id)
        .cloned()
        .ok_or_else(|| post_not_found(id))
}

pub async fn list_active_posts(state: &AppState) -> Vec<Post> {
    state.posts.lock().await.active_posts()
}

/// Matches the author ignoring case, so it can list posts the caller may not edit.
pub async fn list_posts_by_author(state: &AppState, username: &str) -> Vec<Post> {
    state.posts.lock().await.by_author(username).active_posts()
}

pub async fn list_posts_by_thread(state: &AppState, thread: &str) -> Vec<Post> {
    state.posts.lock().await.by_thread(thread).active_posts()
}

pub async fn search_posts(state: &AppState, keyword: &str) -> Result<Vec<Post>> {
    Ok(state.posts.lock().await.search(keyword)?.all_posts())
}

pub async fn edit_post(state: &AppState, actor: &str, id: &str, changes: PostChanges) -> Result<Post> {
    let mut posts = state.posts.lock().await;
    let current = posts.find_by_id(id).ok_or_else(|| post_not_found(id))?;
    ensure_post_owner(current, actor)?;

    let before = current.clone();
    let updated = posts.update(id, changes)?;

    if let Err(err) = state.store.save_post(&updated).await {
        posts.replace(before)?;
        return Err(persistence_failure("save_post", err));
    }
    Ok(updated)
}

/// Soft-deletes the post and cascades to its active replies. Returns the number of replies hidden.
pub async fn delete_post(state: &AppState, actor: &str, id: &str) -> Result<usize> {
    let mut posts = state.posts.lock().await;
    let mut replies = state.replies.lock().await;

    let post = posts.find_by_id(id).ok_or_else(|| post_not_found(id))?;
    ensure_post_owner(post, actor)?;
    let before = post.clone();
    let post_id = before.id().clone();

    posts.soft_delete(post_id.as_str())?;
    let hidden = replies.active_by_post_id(post_id.as_str()).all_replies();
    let cascaded = replies.delete_replies_for_post(post_id.as_str());

    if let Err(err) = state.store.mark_post_deleted(&post_id).await {
        for reply in hidden {
            replies.replace(reply)?;
        }
        posts.replace(before)?;
        return Err(persistence_failure("mark_post_deleted", err));
    }

    info!(%post_id, cascaded, "post deleted");
    Ok(cascaded)
}

/// Brings a soft-deleted post back. Its replies stay hidden.
pub async fn restore_post(state: &AppState, actor: &str, id: &str) -> Result<Post> {
    let mut posts = state.posts.lock().await;
    let post = posts.find_by_id(id).ok_or_else(|| post_not_found(id))?;
    ensure_post_owner(post, actor)?;
    let before = post.clone();
    let post_id = before.id().clone();

    posts.restore(post_id.as_str())?;
    let restored = posts
        .find_by_id(post_id.as_str())
        .cloned()
        .ok_or_else(|| post_not_found(post_id.as_str()))?;

    if let Err(err) = state.store.save_post(&restored).await {
        posts.replace(before)?;
        return Err(persistence_failure("save_post", err));
    }
    Ok(restored)
}

// ── Replies ─────────────────────────────────────────────────────────────────

/// Adds a reply to an active post and bumps the post's reply count.
///
/// `save_reply` and `update_reply_count` are independent calls; only a
/// failing `save_reply` rolls the session back.
pub async fn create_reply(state: &AppState, author: &str, post_id: &str, content: &str) -> Result<Reply> {
    let mut posts = state.posts.lock().await;
    let mut replies = state.replies.lock().await;

    let post = posts.find_by_id(post_id).ok_or_else(|| post_not_found(post_id))?;
    if post.is_deleted() {
        return Err(ForumError::InvalidState(format!("cannot reply to deleted post {}", post.id())));
    }
    let before = post.clone();
    let post_id = before.id().clone();

    let reply = replies.create(post_id.as_str(), author, content)?;
    let count = posts.increment_reply_count(post_id.as_str())?;

    if let Err(err) = state
        .store
        .save_reply(reply.id(), &post_id, reply.author_username(), reply.content())
        .await
    {
        replies.permanently_remove(reply.id().as_str())?;
        posts.replace(before)?;
        return Err(persistence_failure("save_reply", err));
    }

    state
        .store
        .update_reply_count(&post_id, count)
        .await
        .map_err(|e| persistence_failure("update_reply_count", e))?;

    info!(reply_id = %reply.id(), %post_id, count, "reply created");
    Ok(reply)
}

/// Soft-deletes the actor's own reply and decrements the parent's count.
pub async fn delete_reply(state: &AppState, actor: &str, reply_id: &str) -> Result<()> {
    let mut posts = state.posts.lock().await;
    let mut replies = state.replies.lock().await;

    let reply = replies
        .find_by_id(reply_id)
        .ok_or_else(|| ForumError::NotFound("Reply", reply_id.trim().to_string()))?;
    if !reply.is_authored_by(actor) {
        return Err(ForumError::Forbidden("you can only modify your own replies".into()));
    }
    let reply_before = reply.clone();
    let reply_id = reply.id().clone();
    let post_id = reply.post_id().clone();

    let post_before = match posts.find_by_id(post_id.as_str()) {
        Some(post) if post.is_deleted() => {
            return Err(ForumError::InvalidState(format!("post {post_id} is deleted")));
        }
        Some(post) => post.clone(),
        None => return Err(post_not_found(post_id.as_str())),
    };

    replies.soft_delete(reply_id.as_str())?;
    let count = posts.decrement_reply_count(post_id.as_str())?;

    if let Err(err) = state.store.update_reply_count(&post_id, count).await {
        replies.replace(reply_before)?;
        posts.replace(post_before)?;
        return Err(persistence_failure("update_reply_count", err));
    }
    Ok(())
}

/// Active replies created during this session.
pub async fn session_replies_for_post(state: &AppState, post_id: &str) -> Vec<Reply> {
    state.replies.lock().await.active_by_post_id(post_id).all_replies()
}

/// Every stored reply of a post as `"author: content"` lines.
///
/// Replies of a deleted post stay in the store but are hidden: the list is empty.
pub async fn replies_for_post(state: &AppState, post_id: &str) -> Result<Vec<String>> {
    let post_id: PostId = {
        let posts = state.posts.lock().await;
        let post = posts.find_by_id(post_id).ok_or_else(|| post_not_found(post_id))?;
        if post.is_deleted() {
            return Ok(Vec::new());
        }
        post.id().clone()
    };
    state
        .store
        .get_replies_for_post(&post_id)
        .await
        .map_err(|e| persistence_failure("get_replies_for_post", e))
}
