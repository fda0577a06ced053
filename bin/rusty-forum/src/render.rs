//! Plain-text listings for the terminal.

use rf_core::models::{Post, Reply};

const RULE_WIDTH: usize = 60;

pub fn post_listing(heading: &str, posts: &[Post]) -> String {
    let mut out = format!("{heading} ({} active):\n\n", posts.len());
    for post in posts {
        out.push_str(&post_block(post));
        out.push('\n');
    }
    out
}

pub fn post_block(post: &Post) -> String {
    format!(
        "{}\nID: {}\n{}\n",
        "=".repeat(RULE_WIDTH),
        post.id(),
        post.summary()
    )
}

pub fn post_detail(post: &Post) -> String {
    format!(
        "{}\n\n{}\n\nUpdated: {}",
        post_block(post),
        post.content(),
        post.formatted_updated_at()
    )
}

pub fn reply_created(reply: &Reply) -> String {
    format!("Reply {} added to post {}.", reply.id(), reply.post_id())
}

pub fn reply_lines(post_id: &str, lines: &[String]) -> String {
    if lines.is_empty() {
        return format!("No replies for post {post_id} yet.");
    }
    let mut out = format!("Replies for post {post_id}:\n");
    for line in lines {
        out.push_str("  - ");
        out.push_str(line);
        out.push('\n');
    }
    out
}
