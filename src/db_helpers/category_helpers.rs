use chrono::Utc;
use sqlx::{Sqlite, SqlitePool};

use crate::{
    errors::RequestError,
    models::{Category, Location},
};

/// Categories and locations are managed outside the public routes; these
/// inserts serve seeding and tests.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
}

#[derive(Debug, Clone)]
pub struct NewLocation {
    pub name: String,
    pub is_published: bool,
}

// ----------------- Categories -----------------

pub async fn create_category_in_db(
    pool: &SqlitePool,
    NewCategory {
        title,
        description,
        slug,
        is_published,
    }: NewCategory,
) -> Result<Category, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query_as::<Sqlite, Category>(
        r#"
        INSERT INTO categories (title, description, slug, is_published, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, title, description, slug, is_published, created_at
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(slug)
    .bind(is_published)
    .bind(Utc::now())
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(result)
}

pub async fn get_published_category_by_slug_in_db(
    pool: &SqlitePool,
    slug: &str,
) -> Result<Category, RequestError> {
    sqlx::query_as::<Sqlite, Category>(
        r#"
        SELECT id, title, description, slug, is_published, created_at
        FROM categories
        WHERE slug = $1 AND is_published = TRUE
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?
    .ok_or(RequestError::NotFound("Category not found"))
}

pub async fn list_categories_in_db(pool: &SqlitePool) -> Result<Vec<Category>, RequestError> {
    let result = sqlx::query_as::<Sqlite, Category>(
        "SELECT id, title, description, slug, is_published, created_at FROM categories ORDER BY title",
    )
    .fetch_all(pool)
    .await?;
    Ok(result)
}

pub async fn category_exists_in_db(pool: &SqlitePool, id: i64) -> Result<bool, RequestError> {
    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// Posts in the category keep existing with no category.
pub async fn delete_category_in_db(pool: &SqlitePool, id: i64) -> Result<(), RequestError> {
    sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

// ----------------- Locations -----------------

pub async fn create_location_in_db(
    pool: &SqlitePool,
    NewLocation { name, is_published }: NewLocation,
) -> Result<Location, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query_as::<Sqlite, Location>(
        r#"
        INSERT INTO locations (name, is_published, created_at)
        VALUES ($1, $2, $3)
        RETURNING id, name, is_published, created_at
        "#,
    )
    .bind(name)
    .bind(is_published)
    .bind(Utc::now())
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(result)
}

pub async fn list_locations_in_db(pool: &SqlitePool) -> Result<Vec<Location>, RequestError> {
    let result = sqlx::query_as::<Sqlite, Location>(
        "SELECT id, name, is_published, created_at FROM locations ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(result)
}

pub async fn location_exists_in_db(pool: &SqlitePool, id: i64) -> Result<bool, RequestError> {
    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM locations WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// Posts at the location keep existing with no location.
pub async fn delete_location_in_db(pool: &SqlitePool, id: i64) -> Result<(), RequestError> {
    sqlx::query("DELETE FROM locations WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
