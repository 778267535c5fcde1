use std::net::SocketAddr;

use anyhow::{Context, Result};

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3001";
const DEFAULT_LOGIN_URL: &str = "/auth/login/";

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_address: SocketAddr,
    /// Where anonymous visitors of login-only pages are sent.
    pub login_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let bind_address = std::env::var("BIND_ADDRESS")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_owned())
            .parse()
            .context("BIND_ADDRESS must be a socket address like 127.0.0.1:3001")?;
        let login_url =
            std::env::var("LOGIN_URL").unwrap_or_else(|_| DEFAULT_LOGIN_URL.to_owned());

        Ok(Config {
            database_url,
            jwt_secret,
            bind_address,
            login_url,
        })
    }

    pub fn new(database_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Config {
            database_url: database_url.into(),
            jwt_secret: jwt_secret.into(),
            bind_address: ([127, 0, 0, 1], 3001).into(),
            login_url: DEFAULT_LOGIN_URL.to_owned(),
        }
    }

    /// Login page address carrying the page the visitor should come back to.
    pub fn login_redirect(&self, next: &str) -> String {
        format!("{}?next={}", self.login_url, urlencoding::encode(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_redirect_keeps_next_path() {
        let config = Config::new("sqlite::memory:", "secret");
        assert_eq!(
            config.login_redirect("/posts/create/"),
            "/auth/login/?next=%2Fposts%2Fcreate%2F"
        );
    }
}
