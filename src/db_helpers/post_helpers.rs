use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool};

use crate::data_formats::PostData;
use crate::errors::RequestError;
use crate::models::Post;
use crate::pagination::PageInfo;
use crate::visibility::PUBLISHED_FILTER;

const POST_QUERY: &str = r#"
            SELECT posts.id                     AS "id",
                   posts.title                  AS "title",
                   posts.text                   AS "text",
                   posts.pub_date               AS "pub_date",
                   posts.image                  AS "image",
                   posts.is_published           AS "is_published",
                   posts.created_at             AS "created_at",
                   posts.author_id              AS "author_id",
                   users.username               AS "author_username",
                   posts.category_id            AS "category_id",
                   categories.title             AS "category_title",
                   categories.slug              AS "category_slug",
                   categories.is_published      AS "category_is_published",
                   posts.location_id            AS "location_id",
                   locations.name               AS "location_name",
                   locations.is_published       AS "location_is_published",
                   (SELECT Count(comments.id)
                    FROM   comments
                    WHERE  comments.post_id = posts.id) AS "comment_count"
            FROM   posts
                   JOIN users
                     ON users.id = posts.author_id
                   LEFT JOIN categories
                          ON categories.id = posts.category_id
                   LEFT JOIN locations
                          ON locations.id = posts.location_id
"#;

/// Which posts a list page draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope<'a> {
    /// The index: every public post.
    Published,
    /// Public posts of one category, by slug.
    Category(&'a str),
    /// Posts of one author. `include_hidden` is for the author's own profile.
    Author { author_id: i64, include_hidden: bool },
}

impl PostScope<'_> {
    fn public_only(&self) -> bool {
        !matches!(
            self,
            PostScope::Author {
                include_hidden: true,
                ..
            }
        )
    }

    fn category_slug(&self) -> Option<&str> {
        match self {
            PostScope::Category(slug) => Some(*slug),
            _ => None,
        }
    }

    fn author_id(&self) -> Option<i64> {
        match self {
            PostScope::Author { author_id, .. } => Some(*author_id),
            _ => None,
        }
    }

    /// `$1` public only, `$2` now, `$3` category slug, `$4` author id.
    fn where_clause(&self) -> String {
        format!(
            r#"
            WHERE  ( $1 = FALSE OR ( {PUBLISHED_FILTER} ) )
               AND ( categories.slug = $3 OR $3 IS NULL )
               AND ( posts.author_id = $4 OR $4 IS NULL )
            "#
        )
    }
}

pub async fn count_posts_in_db(
    pool: &SqlitePool,
    scope: PostScope<'_>,
    now: DateTime<Utc>,
) -> Result<i64, RequestError> {
    let query = format!(
        r#"
        SELECT Count(posts.id)
        FROM   posts
               LEFT JOIN categories
                      ON categories.id = posts.category_id
        {}
        "#,
        scope.where_clause()
    );
    let (count,): (i64,) = sqlx::query_as(&query)
        .bind(scope.public_only())
        .bind(now)
        .bind(scope.category_slug())
        .bind(scope.author_id())
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// One page of posts, newest publication date first.
pub async fn list_posts_in_db(
    pool: &SqlitePool,
    scope: PostScope<'_>,
    now: DateTime<Utc>,
    page: &PageInfo,
) -> Result<Vec<Post>, RequestError> {
    let query = format!(
        "{POST_QUERY} {} ORDER BY posts.pub_date DESC, posts.id DESC LIMIT $5 OFFSET $6",
        scope.where_clause()
    );
    let posts = sqlx::query_as::<Sqlite, Post>(&query)
        .bind(scope.public_only())
        .bind(now)
        .bind(scope.category_slug())
        .bind(scope.author_id())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await?;
    Ok(posts)
}

/// Loads a post regardless of visibility; callers decide who may see it.
pub async fn get_post_by_id_in_db(pool: &SqlitePool, id: i64) -> Result<Post, RequestError> {
    let query = format!("{POST_QUERY} WHERE posts.id = $1");
    let post = sqlx::query_as::<Sqlite, Post>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    post.ok_or(RequestError::NotFound("Post not found"))
}

pub async fn create_post_in_db(
    pool: &SqlitePool,
    author_id: i64,
    post: &PostData,
) -> Result<i64, RequestError> {
    let mut tx = pool.begin().await?;
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO posts (title, text, pub_date, author_id, location_id, category_id, image, is_published, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id
        "#,
    )
    .bind(&post.title)
    .bind(&post.text)
    .bind(post.pub_date)
    .bind(author_id)
    .bind(post.location_id)
    .bind(post.category_id)
    .bind(&post.image)
    .bind(post.is_published)
    .bind(Utc::now())
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(id)
}

/// Replaces the editable fields. The author never changes.
pub async fn update_post_in_db(
    pool: &SqlitePool,
    id: i64,
    post: &PostData,
) -> Result<(), RequestError> {
    let result = sqlx::query(
        r#"
        UPDATE posts
        SET    title = $1,
               text = $2,
               pub_date = $3,
               location_id = $4,
               category_id = $5,
               image = $6,
               is_published = $7
        WHERE  id = $8
        "#,
    )
    .bind(&post.title)
    .bind(&post.text)
    .bind(post.pub_date)
    .bind(post.location_id)
    .bind(post.category_id)
    .bind(&post.image)
    .bind(post.is_published)
    .bind(id)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("Post not found"));
    }
    Ok(())
}

/// Deletes the post; its comments cascade.
pub async fn delete_post_in_db(pool: &SqlitePool, id: i64) -> Result<(), RequestError> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("Post not found"));
    }
    Ok(())
}
