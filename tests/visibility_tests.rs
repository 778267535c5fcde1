mod common;

use blogicum::{PostDetailResponse, PostListResponse};
use chrono::{Duration, Utc};
use common::{PostSeed, TestApp};
use reqwest::StatusCode;

fn titles(list: &PostListResponse) -> Vec<&str> {
    list.posts.iter().map(|post| post.title.as_str()).collect()
}

#[tokio::test]
async fn index_lists_only_public_posts() {
    let app = TestApp::spawn().await;
    let alice = app.register("alice").await;
    let travel = app.category("travel", true).await;
    let drafts = app.category("drafts", false).await;

    app.seed_post(&alice, PostSeed::public("public", travel.id)).await;
    app.seed_post(
        &alice,
        PostSeed {
            is_published: false,
            ..PostSeed::public("unpublished", travel.id)
        },
    )
    .await;
    app.seed_post(&alice, PostSeed::public("hidden category", drafts.id))
        .await;
    app.seed_post(
        &alice,
        PostSeed {
            pub_date: Utc::now() + Duration::hours(1),
            ..PostSeed::public("scheduled", travel.id)
        },
    )
    .await;

    for viewer in [None, Some(&alice)] {
        let response = app.get("/", viewer).await;
        assert_eq!(response.status(), StatusCode::OK);
        let list: PostListResponse = response.json().await.unwrap();
        assert_eq!(titles(&list), vec!["public"]);
        assert_eq!(list.page.count, 1);
    }
}

#[tokio::test]
async fn scheduled_post_is_previewed_only_by_its_author() {
    let app = TestApp::spawn().await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let travel = app.category("travel", true).await;
    let post_id = app
        .seed_post(
            &alice,
            PostSeed {
                pub_date: Utc::now() + Duration::hours(1),
                ..PostSeed::public("scheduled", travel.id)
            },
        )
        .await;

    let list: PostListResponse = app.get("/", None).await.json().await.unwrap();
    assert!(list.posts.is_empty());

    let path = format!("/posts/{post_id}/");
    assert_eq!(app.get(&path, None).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get(&path, Some(&bob)).await.status(), StatusCode::NOT_FOUND);

    let response = app.get(&path, Some(&alice)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let detail: PostDetailResponse = response.json().await.unwrap();
    assert_eq!(detail.post.title, "scheduled");
    assert_eq!(detail.post.author, "alice");
}

#[tokio::test]
async fn author_previews_post_in_hidden_category() {
    let app = TestApp::spawn().await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let drafts = app.category("drafts", false).await;
    let post_id = app
        .seed_post(&alice, PostSeed::public("hidden", drafts.id))
        .await;

    let path = format!("/posts/{post_id}/");
    assert_eq!(app.get(&path, Some(&alice)).await.status(), StatusCode::OK);
    assert_eq!(app.get(&path, Some(&bob)).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn category_page_filters_by_slug() {
    let app = TestApp::spawn().await;
    let alice = app.register("alice").await;
    let travel = app.category("travel", true).await;
    let food = app.category("food", true).await;
    app.seed_post(&alice, PostSeed::public("trip", travel.id)).await;
    app.seed_post(&alice, PostSeed::public("soup", food.id)).await;
    app.seed_post(
        &alice,
        PostSeed {
            is_published: false,
            ..PostSeed::public("draft trip", travel.id)
        },
    )
    .await;

    let response = app.get("/category/travel/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let list: PostListResponse = response.json().await.unwrap();
    assert_eq!(titles(&list), vec!["trip"]);
    assert_eq!(list.category.unwrap().slug, "travel");
}

#[tokio::test]
async fn hidden_or_unknown_category_is_not_found() {
    let app = TestApp::spawn().await;
    app.category("drafts", false).await;

    assert_eq!(
        app.get("/category/drafts/", None).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.get("/category/nowhere/", None).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn own_profile_includes_hidden_posts() {
    let app = TestApp::spawn().await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let travel = app.category("travel", true).await;
    app.seed_post(&alice, PostSeed::public("public", travel.id)).await;
    app.seed_post(
        &alice,
        PostSeed {
            is_published: false,
            pub_date: Utc::now() - Duration::hours(2),
            ..PostSeed::public("draft", travel.id)
        },
    )
    .await;
    app.seed_post(&bob, PostSeed::public("bob's", travel.id)).await;

    let own: PostListResponse = app
        .get("/profile/alice/", Some(&alice))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(titles(&own), vec!["public", "draft"]);
    assert_eq!(own.profile.unwrap().username, "alice");

    for viewer in [None, Some(&bob)] {
        let other: PostListResponse = app
            .get("/profile/alice/", viewer)
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(titles(&other), vec!["public"]);
    }

    assert_eq!(
        app.get("/profile/nobody/", None).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn lists_carry_comment_counts_and_hide_unpublished_locations() {
    let app = TestApp::spawn().await;
    let alice = app.register("alice").await;
    let travel = app.category("travel", true).await;
    let hidden_place = app.location("secret cave", false).await;
    let post_id = app.seed_post(&alice, PostSeed::public("trip", travel.id)).await;
    sqlx::query("UPDATE posts SET location_id = $1 WHERE id = $2")
        .bind(hidden_place.id)
        .bind(post_id)
        .execute(&app.pool)
        .await
        .unwrap();

    for text in ["first", "second"] {
        let response = app
            .post_form(
                &format!("/posts/{post_id}/comment/"),
                Some(&alice),
                &[("text", text)],
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    let list: PostListResponse = app.get("/", None).await.json().await.unwrap();
    assert_eq!(list.posts[0].comment_count, 2);
    assert!(list.posts[0].location.is_none());
}
