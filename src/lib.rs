mod authentication;
mod data_formats;
mod errors;
mod handlers;

pub mod config;
pub mod db_helpers;
pub mod models;
pub mod pagination;
pub mod visibility;

use anyhow::Context;
pub use anyhow::Result;
use axum::http::StatusCode;
use axum::{routing::*, Extension, Json, Router};
pub use config::Config;
pub use data_formats::*;
pub use errors::RequestError;
use handlers::*;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::{net::TcpListener, sync::Arc};
use tower_http::trace::TraceLayer;

pub type JsonResponse<T> = (StatusCode, Json<T>);

pub async fn run_app(config: Config) -> Result<()> {
    let pool = init_db(&config.database_url).await?;
    let listener = TcpListener::bind(config.bind_address)
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    tracing::info!("Server started on {}", config.bind_address);
    serve(make_router(pool, config), listener).await
}

pub async fn serve(app: Router, listener: TcpListener) -> Result<()> {
    axum::Server::from_tcp(listener)
        .context("Failed to use listener")?
        .serve(app.into_make_service())
        .await
        .context("Server error")?;
    Ok(())
}

pub async fn init_db(db_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        tracing::info!("Creating database {}", db_url);
        Sqlite::create_database(db_url)
            .await
            .context("Failed to create database")?;
    } else {
        tracing::debug!("Database already exists");
    }
    let pool = SqlitePool::connect(db_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Running migrations");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations completed");
    Ok(pool)
}

/// Installs the fmt subscriber, honouring `RUST_LOG`.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,blogicum=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

pub fn get_random_free_listener() -> Result<TcpListener> {
    TcpListener::bind("127.0.0.1:0").context("Could not get a free port")
}

pub fn make_router(pool: SqlitePool, config: Config) -> Router {
    Router::new()
        .route("/check_health", get(alive))
        .route("/", get(index))
        .route("/posts/create/", get(create_post_form).post(create_post))
        .route("/posts/:id/", get(post_detail))
        .route("/posts/:id/edit/", get(edit_post_form).post(edit_post))
        .route("/posts/:id/delete/", post(delete_post))
        .route("/posts/:id/comment/", post(add_comment))
        .route(
            "/posts/:id/edit_comment/:comment_id/",
            get(edit_comment_form).post(edit_comment),
        )
        .route(
            "/posts/:id/delete_comment/:comment_id/",
            post(delete_comment),
        )
        .route("/category/:slug/", get(category_posts))
        .route("/profile/:username/", get(profile_posts))
        .route("/edit_profile/", get(edit_profile_form).post(edit_profile))
        .route("/accounts/profile/", get(own_profile))
        .route("/auth/registration/", post(register_user))
        .route("/auth/login/", get(login_form).post(login_user))
        .route(
            "/auth/password_change/",
            get(password_change_form).post(change_password),
        )
        .fallback(not_found)
        .layer(Extension(Arc::new(config)))
        .layer(Extension(pool))
        .layer(TraceLayer::new_for_http())
}
