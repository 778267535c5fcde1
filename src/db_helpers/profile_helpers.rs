use sqlx::{Sqlite, SqlitePool};

use crate::{data_formats::ProfileForm, errors::RequestError, models::Profile};

const PROFILE_QUERY: &str = r#"
    SELECT users.id          AS user_id,
           users.username    AS username,
           users.email       AS email,
           profiles.first_name AS first_name,
           profiles.last_name  AS last_name,
           users.created_at  AS created_at
    FROM   users
           JOIN profiles ON profiles.user_id = users.id
"#;

pub async fn get_profile_by_username_in_db(
    pool: &SqlitePool,
    username: &str,
) -> Result<Profile, RequestError> {
    let query = format!("{PROFILE_QUERY} WHERE users.username = $1");
    let result = sqlx::query_as::<Sqlite, Profile>(&query)
        .bind(username)
        .fetch_optional(pool)
        .await?;
    result.ok_or(RequestError::NotFound("Profile not found"))
}

pub async fn get_profile_by_id_in_db(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Profile, RequestError> {
    let query = format!("{PROFILE_QUERY} WHERE users.id = $1");
    let result = sqlx::query_as::<Sqlite, Profile>(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    result.ok_or(RequestError::NotFound("Profile not found"))
}

/// Account fields and profile names live in two tables, so both updates share
/// a transaction.
pub async fn update_profile_in_db(
    pool: &SqlitePool,
    user_id: i64,
    ProfileForm {
        first_name,
        last_name,
        username,
        email,
    }: ProfileForm,
) -> Result<Profile, RequestError> {
    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE users SET username = $1, email = $2 WHERE id = $3")
        .bind(&username)
        .bind(&email)
        .bind(user_id)
        .execute(&mut tx)
        .await?;
    sqlx::query("UPDATE profiles SET first_name = $1, last_name = $2 WHERE user_id = $3")
        .bind(&first_name)
        .bind(&last_name)
        .bind(user_id)
        .execute(&mut tx)
        .await?;
    tx.commit().await?;

    get_profile_by_id_in_db(pool, user_id).await
}
