#![allow(dead_code)]

use blogicum::db_helpers::{
    create_category_in_db, create_location_in_db, create_post_in_db, get_user_by_username,
    NewCategory, NewLocation,
};
use blogicum::models::{Category, Location};
use blogicum::{
    get_random_free_listener, init_db, make_router, serve, Config, PostData, UserResponse,
    UserWrapper,
};
use chrono::{DateTime, Duration, Utc};
use reqwest::{redirect::Policy, Response, StatusCode};
use sqlx::SqlitePool;

pub const PASSWORD: &str = "correct-horse-battery";

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub client: reqwest::Client,
}

/// A registered account and its bearer token.
pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub token: String,
}

impl TestApp {
    /// Serves the app on a free port against a fresh database file.
    pub async fn spawn() -> TestApp {
        let path = std::env::temp_dir().join(format!(
            "blogicum-test-{}.db",
            rand::random::<u64>()
        ));
        let database_url = format!("sqlite://{}?mode=rwc", path.display());
        let pool = init_db(&database_url).await.expect("database should migrate");

        let listener = get_random_free_listener().expect("free port");
        let address = format!("http://{}", listener.local_addr().unwrap());
        let router = make_router(pool.clone(), Config::new(database_url, "test-secret"));
        tokio::spawn(serve(router, listener));

        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()
            .unwrap();
        TestApp {
            address,
            pool,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str, user: Option<&TestUser>) -> Response {
        let mut request = self.client.get(self.url(path));
        if let Some(user) = user {
            request = request.header("Authorization", format!("Token {}", user.token));
        }
        request.send().await.unwrap()
    }

    pub async fn post_form(
        &self,
        path: &str,
        user: Option<&TestUser>,
        form: &[(&str, &str)],
    ) -> Response {
        let mut request = self.client.post(self.url(path)).form(form);
        if let Some(user) = user {
            request = request.header("Authorization", format!("Token {}", user.token));
        }
        request.send().await.unwrap()
    }

    pub async fn register(&self, username: &str) -> TestUser {
        let response = self
            .post_form(
                "/auth/registration/",
                None,
                &[
                    ("username", username),
                    ("password1", PASSWORD),
                    ("password2", PASSWORD),
                ],
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = self
            .post_form(
                "/auth/login/",
                None,
                &[("username", username), ("password", PASSWORD)],
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let UserWrapper { user }: UserWrapper<UserResponse> = response.json().await.unwrap();

        let id = get_user_by_username(&self.pool, username)
            .await
            .unwrap()
            .expect("registered user")
            .id;
        TestUser {
            id,
            username: user.username,
            token: user.token,
        }
    }

    pub async fn category(&self, slug: &str, is_published: bool) -> Category {
        create_category_in_db(
            &self.pool,
            NewCategory {
                title: slug.to_uppercase(),
                description: format!("All about {slug}"),
                slug: slug.to_owned(),
                is_published,
            },
        )
        .await
        .unwrap()
    }

    pub async fn location(&self, name: &str, is_published: bool) -> Location {
        create_location_in_db(
            &self.pool,
            NewLocation {
                name: name.to_owned(),
                is_published,
            },
        )
        .await
        .unwrap()
    }

    /// Inserts a post straight into the store.
    pub async fn seed_post(&self, author: &TestUser, seed: PostSeed) -> i64 {
        create_post_in_db(
            &self.pool,
            author.id,
            &PostData {
                title: seed.title,
                text: "Some text".to_owned(),
                pub_date: seed.pub_date,
                category_id: seed.category_id,
                location_id: None,
                image: None,
                is_published: seed.is_published,
            },
        )
        .await
        .unwrap()
    }

    pub async fn count(&self, table: &str) -> i64 {
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT Count(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .unwrap();
        count
    }
}

pub struct PostSeed {
    pub title: String,
    pub category_id: i64,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
}

impl PostSeed {
    /// Published an hour ago.
    pub fn public(title: &str, category_id: i64) -> PostSeed {
        PostSeed {
            title: title.to_owned(),
            category_id,
            pub_date: Utc::now() - Duration::hours(1),
            is_published: true,
        }
    }
}

pub fn location_header(response: &Response) -> String {
    response
        .headers()
        .get("location")
        .expect("redirect should carry a location")
        .to_str()
        .unwrap()
        .to_owned()
}
