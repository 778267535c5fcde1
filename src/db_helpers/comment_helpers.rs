use chrono::Utc;
use sqlx::{Sqlite, SqlitePool};

use crate::{errors::RequestError, models::Comment};

const COMMENT_QUERY: &str = r#"
            SELECT comments.id         AS "id",
                   comments.text       AS "text",
                   comments.created_at AS "created_at",
                   comments.post_id    AS "post_id",
                   comments.author_id  AS "author_id",
                   users.username      AS "author_username"
            FROM   comments
                   JOIN users
                     ON users.id = comments.author_id
"#;

pub async fn add_comment_to_post_in_db(
    pool: &SqlitePool,
    author_id: i64,
    post_id: i64,
    text: &str,
) -> Result<i64, RequestError> {
    let mut tx = pool.begin().await?;
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO comments (text, post_id, author_id, created_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(text)
    .bind(post_id)
    .bind(author_id)
    .bind(Utc::now())
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(id)
}

/// A comment is only found under the post it belongs to.
pub async fn get_comment_for_post_in_db(
    pool: &SqlitePool,
    post_id: i64,
    comment_id: i64,
) -> Result<Comment, RequestError> {
    let query = format!("{COMMENT_QUERY} WHERE comments.post_id = $1 AND comments.id = $2");
    let result = sqlx::query_as::<Sqlite, Comment>(&query)
        .bind(post_id)
        .bind(comment_id)
        .fetch_optional(pool)
        .await?;
    result.ok_or(RequestError::NotFound("Comment not found"))
}

/// Oldest first.
pub async fn get_comments_for_post_in_db(
    pool: &SqlitePool,
    post_id: i64,
) -> Result<Vec<Comment>, RequestError> {
    let query = format!(
        "{COMMENT_QUERY} WHERE comments.post_id = $1 ORDER BY comments.created_at ASC, comments.id ASC"
    );
    let result = sqlx::query_as::<Sqlite, Comment>(&query)
        .bind(post_id)
        .fetch_all(pool)
        .await?;
    Ok(result)
}

pub async fn update_comment_in_db(
    pool: &SqlitePool,
    comment_id: i64,
    text: &str,
) -> Result<(), RequestError> {
    let result = sqlx::query("UPDATE comments SET text = $1 WHERE id = $2")
        .bind(text)
        .bind(comment_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("Comment not found"));
    }
    Ok(())
}

pub async fn delete_comment_in_db(pool: &SqlitePool, comment_id: i64) -> Result<(), RequestError> {
    let result = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(comment_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("Comment not found"));
    }
    Ok(())
}
