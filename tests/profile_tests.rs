mod common;

use blogicum::{FormWrapper, PostListResponse, ProfileFormResponse};
use common::{location_header, TestApp, PASSWORD};
use reqwest::StatusCode;

#[tokio::test]
async fn anonymous_profile_edit_redirects_to_login() {
    let app = TestApp::spawn().await;

    let response = app.get("/edit_profile/", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location_header(&response),
        "/auth/login/?next=%2Fedit_profile%2F"
    );

    let response = app.get("/accounts/profile/", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location_header(&response).starts_with("/auth/login/"));
}

#[tokio::test]
async fn profile_page_is_public() {
    let app = TestApp::spawn().await;
    app.register("alice").await;

    let response = app.get("/profile/alice/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let list: PostListResponse = response.json().await.unwrap();
    assert!(list.posts.is_empty());
    assert_eq!(list.page.number, 1);
}

#[tokio::test]
async fn accounts_profile_points_at_own_page() {
    let app = TestApp::spawn().await;
    let alice = app.register("alice").await;

    let response = app.get("/accounts/profile/", Some(&alice)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_header(&response), "/profile/alice/");
}

#[tokio::test]
async fn edit_profile_updates_names_and_username() {
    let app = TestApp::spawn().await;
    let alice = app.register("alice").await;

    let form: ProfileFormResponse = app
        .get("/edit_profile/", Some(&alice))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(form.form.username, "alice");
    assert_eq!(form.form.first_name, "");

    let response = app
        .post_form(
            "/edit_profile/",
            Some(&alice),
            &[
                ("first_name", "Alice"),
                ("last_name", "Liddell"),
                ("username", "wonderland"),
                ("email", "alice@example.com"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_header(&response), "/profile/wonderland/");

    let list: PostListResponse = app
        .get("/profile/wonderland/", None)
        .await
        .json()
        .await
        .unwrap();
    let profile = list.profile.unwrap();
    assert_eq!(profile.first_name, "Alice");
    assert_eq!(profile.last_name, "Liddell");
    assert_eq!(
        app.get("/profile/alice/", None).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn taken_username_is_a_field_error() {
    let app = TestApp::spawn().await;
    let alice = app.register("alice").await;
    app.register("bob").await;

    let response = app
        .post_form(
            "/edit_profile/",
            Some(&alice),
            &[("username", "bob"), ("first_name", "Alice")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let rejected: FormWrapper<serde_json::Value> = response.json().await.unwrap();
    assert!(rejected.errors.get("username").is_some());
    assert_eq!(rejected.form["first_name"], "Alice");
}

#[tokio::test]
async fn duplicate_registration_and_bad_login_are_rejected() {
    let app = TestApp::spawn().await;
    app.register("alice").await;

    let response = app
        .post_form(
            "/auth/registration/",
            None,
            &[
                ("username", "alice"),
                ("password1", PASSWORD),
                ("password2", PASSWORD),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.count("users").await, 1);

    let response = app
        .post_form(
            "/auth/login/",
            None,
            &[("username", "alice"), ("password", "wrong password")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let rejected: FormWrapper<serde_json::Value> = response.json().await.unwrap();
    assert!(rejected.errors.get("__all__").is_some());
    assert!(rejected.form.get("password").is_none());
}

#[tokio::test]
async fn password_change_replaces_the_login_password() {
    let app = TestApp::spawn().await;
    let alice = app.register("alice").await;
    let new_password = "a-brand-new-secret";

    let response = app.get("/auth/password_change/", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location_header(&response).starts_with("/auth/login/?next="));

    let response = app
        .post_form(
            "/auth/password_change/",
            Some(&alice),
            &[
                ("old_password", "not my password"),
                ("new_password1", new_password),
                ("new_password2", new_password),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let rejected: FormWrapper<serde_json::Value> = response.json().await.unwrap();
    assert!(rejected.errors.get("old_password").is_some());

    let response = app
        .post_form(
            "/auth/password_change/",
            Some(&alice),
            &[
                ("old_password", PASSWORD),
                ("new_password1", new_password),
                ("new_password2", new_password),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_header(&response), "/profile/alice/");

    for (password, status) in [
        (new_password, StatusCode::OK),
        (PASSWORD, StatusCode::UNPROCESSABLE_ENTITY),
    ] {
        let response = app
            .post_form(
                "/auth/login/",
                None,
                &[("username", "alice"), ("password", password)],
            )
            .await;
        assert_eq!(response.status(), status);
    }
}
