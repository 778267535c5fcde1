use std::sync::Arc;

use anyhow::{Context, Result};
use argon2::PasswordVerifier;
use argon2::{password_hash::SaltString, Argon2, PasswordHash};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use time::OffsetDateTime;

use crate::config::Config;
use crate::db_helpers::get_user_by_id;
use crate::errors::RequestError;

const JWT_EXPIRY_DURATION: time::Duration = time::Duration::days(90);

#[derive(Debug, Serialize, Deserialize)]
struct AuthClaim {
    id: i64,
    exp: i64,
}

/// A signed-in visitor whose account still exists.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

/// The visitor, signed in or not. A bad or stale token reads as anonymous.
pub struct MaybeUser(pub Option<AuthUser>);

impl MaybeUser {
    pub fn get_id(&self) -> Option<i64> {
        self.0.as_ref().map(|a| a.id)
    }
}

fn request_config(parts: &Parts) -> Result<Arc<Config>, RequestError> {
    parts
        .extensions
        .get::<Arc<Config>>()
        .cloned()
        .ok_or(RequestError::ServerError)
}

fn request_pool(parts: &Parts) -> Result<SqlitePool, RequestError> {
    parts
        .extensions
        .get::<SqlitePool>()
        .cloned()
        .ok_or(RequestError::ServerError)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync + 'static,
{
    type Rejection = RequestError;
    async fn from_request_parts(
        parts: &mut Parts,
        _: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let header = match parts.headers.get("Authorization") {
            Some(header) => header,
            None => return Ok(MaybeUser(None)),
        };
        let token = match header.to_str().ok().and_then(|h| h.strip_prefix("Token ")) {
            Some(token) => token,
            None => {
                tracing::warn!("malformed authorization header");
                return Ok(MaybeUser(None));
            }
        };

        let config = request_config(parts)?;
        let id = match verify_jwt_token(token, &config.jwt_secret) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "rejected token");
                return Ok(MaybeUser(None));
            }
        };

        let pool = request_pool(parts)?;
        let user = get_user_by_id(&pool, id).await?.map(|user| AuthUser {
            id: user.id,
            username: user.username,
        });
        if user.is_none() {
            tracing::warn!(user_id = id, "token for a deleted account");
        }
        Ok(MaybeUser(user))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync + 'static,
{
    type Rejection = RequestError;
    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state).await?;
        match user {
            Some(user) => Ok(user),
            None => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                let config = request_config(parts)?;
                Err(RequestError::LoginRequired(config.login_redirect(next)))
            }
        }
    }
}

/// Lets only the author through; everyone else is sent to `redirect_to`
/// without a mutation or an error page.
pub fn ensure_author(
    user: &AuthUser,
    author_id: i64,
    redirect_to: String,
) -> std::result::Result<(), RequestError> {
    if user.id == author_id {
        return Ok(());
    }
    tracing::debug!(
        user_id = user.id,
        author_id,
        "denied mutation by non-author"
    );
    Err(RequestError::Forbidden { redirect_to })
}

pub fn get_jwt_token(id: i64, jwt_secret: &str) -> Result<String> {
    let expiry_date = OffsetDateTime::now_utc() + JWT_EXPIRY_DURATION;
    let claim = AuthClaim {
        id,
        exp: expiry_date.unix_timestamp(),
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claim,
        &jsonwebtoken::EncodingKey::from_secret(jwt_secret.as_ref()),
    )
    .context("Failed to generate jwt token")
}

pub fn verify_jwt_token(token: &str, jwt_secret: &str) -> Result<i64> {
    let token_data = jsonwebtoken::decode::<AuthClaim>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(jwt_secret.as_ref()),
        &jsonwebtoken::Validation::default(),
    )
    .context("Invalid token")?;
    let claim = token_data.claims;
    if claim.exp < OffsetDateTime::now_utc().unix_timestamp() {
        anyhow::bail!("Token expired");
    }
    Ok(claim.id)
}

pub async fn verify_password_argon2(password: String, hash: &str) -> Result<bool> {
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || {
        let hash = PasswordHash::new(hash.as_str())
            .map_err(|_| anyhow::anyhow!("Failed to verify password"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok())
    })
    .await
    .context("Failed to verify password")?
}

pub async fn hash_password_argon2(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(rand::thread_rng());
        let hash = PasswordHash::generate(Argon2::default(), password.as_bytes(), salt.as_salt())
            .map_err(|_| anyhow::anyhow!("Failed to hash password"))?;
        Ok(hash.to_string())
    })
    .await
    .context("Failed to hash password")?
}
