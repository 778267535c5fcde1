//! Which posts a visitor may see.
//!
//! The list rule lives twice: [`is_publicly_visible`] for single rows and
//! [`PUBLISHED_FILTER`] for list queries. Both must change together.

use chrono::{DateTime, Utc};

use crate::models::Post;

/// SQL counterpart of [`is_publicly_visible`]. Expects `posts` and a
/// `LEFT JOIN`ed `categories`, with `now` bound to `$2`.
pub const PUBLISHED_FILTER: &str = r#"
    posts.is_published = TRUE
    AND categories.is_published = TRUE
    AND posts.pub_date <= $2
"#;

/// Visible on the index, category and foreign profile pages.
///
/// A post without a category is never public.
pub fn is_publicly_visible(post: &Post, now: DateTime<Utc>) -> bool {
    post.is_published && post.category_is_published.unwrap_or(false) && post.pub_date <= now
}

/// Visible on the detail page: authors always see their own posts.
pub fn is_visible_to(post: &Post, viewer_id: Option<i64>, now: DateTime<Utc>) -> bool {
    viewer_id == Some(post.author_id) || is_publicly_visible(post, now)
}
