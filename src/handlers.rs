use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, Query},
    http::{request::Parts, StatusCode, Uri},
    response::Redirect,
    Extension, Form, Json,
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;

use crate::{
    authentication::{
        ensure_author, get_jwt_token, hash_password_argon2, verify_password_argon2, AuthUser,
        MaybeUser,
    },
    config::Config,
    data_formats::{
        Choice, CommentForm, CommentFormResponse, FormErrors, FormWrapper, LoginForm,
        PasswordChangeForm, PostData, PostDetailResponse, PostForm, PostFormResponse, PostListResponse,
        PostResponse, ProfileForm, ProfileFormResponse, RegistrationForm, UserResponse,
        UserWrapper, INVALID_CHOICE,
    },
    db_helpers::{
        add_comment_to_post_in_db, category_exists_in_db, count_posts_in_db,
        create_post_in_db, delete_comment_in_db, delete_post_in_db, get_comment_for_post_in_db,
        get_comments_for_post_in_db, get_post_by_id_in_db, get_profile_by_id_in_db,
        get_profile_by_username_in_db, get_published_category_by_slug_in_db, get_user_by_id,
        get_user_by_username, insert_user, list_categories_in_db, list_locations_in_db,
        list_posts_in_db, location_exists_in_db, update_comment_in_db, update_post_in_db,
        update_password_in_db, update_profile_in_db, PostScope,
    },
    errors::RequestError,
    pagination::{PageInfo, PageQuery},
    visibility::is_visible_to,
};

type JsonResult<T> = Result<Json<T>, RequestError>;
type RedirectResult = Result<Redirect, RequestError>;

fn post_detail_url(post_id: i64) -> String {
    format!("/posts/{post_id}/")
}

fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

fn rejected<T: serde::Serialize>(form: &T, errors: FormErrors) -> RequestError {
    RequestError::Validation(Box::new(FormWrapper::<T>::rejected(form, errors)))
}

/// Path parameters whose malformed values are a missing page, not a bad request.
pub struct RoutePath<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for RoutePath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = RequestError;
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|_| RequestError::NotFound("Page not found"))?;
        Ok(RoutePath(value))
    }
}

// ----------------- Helper Handlers -----------------
pub async fn alive() -> &'static str {
    "alive"
}

pub async fn not_found(uri: Uri) -> Result<(), (StatusCode, String)> {
    Err((
        StatusCode::NOT_FOUND,
        format!("URL {} provided was not found", uri),
    ))
}

// ----------------- Account Handlers -----------------
pub async fn login_form() -> Json<FormWrapper<LoginForm>> {
    Json(FormWrapper::unbound(LoginForm::default()))
}

pub async fn login_user(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    Form(form): Form<LoginForm>,
) -> JsonResult<UserWrapper<UserResponse>> {
    let invalid = || {
        let mut errors = FormErrors::default();
        errors.add(
            "__all__",
            "Please enter a correct username and password. Note that both fields may be case-sensitive.",
        );
        rejected(&form, errors)
    };
    let user = match get_user_by_username(&pool, form.username.trim()).await? {
        Some(user) => user,
        None => return Err(invalid()),
    };
    let is_password_correct = verify_password_argon2(form.password.clone(), &user.password)
        .await
        .map_err(|_| RequestError::ServerError)?;
    if !is_password_correct {
        return Err(invalid());
    }

    let token = get_jwt_token(user.id, &config.jwt_secret).map_err(|e| {
        tracing::error!(error = %e, "could not issue token");
        RequestError::ServerError
    })?;
    tracing::info!(user_id = user.id, "user logged in");
    Ok(Json(UserWrapper::wrap_with_user_data(UserResponse {
        username: user.username,
        email: user.email,
        token,
    })))
}

pub async fn register_user(
    Extension(pool): Extension<SqlitePool>,
    Form(form): Form<RegistrationForm>,
) -> RedirectResult {
    let (username, password) = form.clean().map_err(|errors| rejected(&form, errors))?;
    let password_hash = hash_password_argon2(password)
        .await
        .map_err(|_| RequestError::ServerError)?;

    let user = insert_user(&pool, &username, "", &password_hash)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                let mut errors = FormErrors::default();
                errors.add("username", "A user with that username already exists.");
                return rejected(&form, errors);
            }
            e
        })?;
    tracing::info!(user_id = user.id, "user registered");
    Ok(Redirect::to("/auth/login/"))
}

pub async fn password_change_form(_user: AuthUser) -> Json<FormWrapper<PasswordChangeForm>> {
    Json(FormWrapper::unbound(PasswordChangeForm::default()))
}

/// Issued tokens stay valid; only the stored hash changes.
pub async fn change_password(
    Extension(pool): Extension<SqlitePool>,
    user: AuthUser,
    Form(form): Form<PasswordChangeForm>,
) -> RedirectResult {
    let account = get_user_by_id(&pool, user.id)
        .await?
        .ok_or(RequestError::NotFound("User not found"))?;
    let is_password_correct = verify_password_argon2(form.old_password.clone(), &account.password)
        .await
        .map_err(|_| RequestError::ServerError)?;

    let (new_password, mut errors) = match form.clean() {
        Ok(password) => (password, FormErrors::default()),
        Err(errors) => (String::new(), errors),
    };
    if !is_password_correct {
        errors.add(
            "old_password",
            "Your old password was entered incorrectly. Please enter it again.",
        );
    }
    errors.into_result().map_err(|errors| rejected(&form, errors))?;

    let password_hash = hash_password_argon2(new_password)
        .await
        .map_err(|_| RequestError::ServerError)?;
    update_password_in_db(&pool, user.id, &password_hash).await?;
    tracing::info!(user_id = user.id, "password changed");
    Ok(Redirect::to(&profile_url(&user.username)))
}

pub async fn own_profile(user: AuthUser) -> Redirect {
    Redirect::to(&profile_url(&user.username))
}

// ----------------- Profile Handlers -----------------
pub async fn profile_posts(
    Extension(pool): Extension<SqlitePool>,
    maybe_user: MaybeUser,
    RoutePath(username): RoutePath<String>,
    Query(page): Query<PageQuery>,
) -> JsonResult<PostListResponse> {
    let profile = get_profile_by_username_in_db(&pool, &username).await?;
    let scope = PostScope::Author {
        author_id: profile.user_id,
        include_hidden: maybe_user.get_id() == Some(profile.user_id),
    };
    let now = Utc::now();
    let page = PageInfo::resolve(page.parse()?, count_posts_in_db(&pool, scope, now).await?)?;
    let posts = list_posts_in_db(&pool, scope, now, &page).await?;

    Ok(Json(PostListResponse {
        posts: posts.into_iter().map(PostResponse::from).collect(),
        page,
        category: None,
        profile: Some(profile.into()),
    }))
}

pub async fn edit_profile_form(
    Extension(pool): Extension<SqlitePool>,
    user: AuthUser,
) -> JsonResult<ProfileFormResponse> {
    let profile = get_profile_by_id_in_db(&pool, user.id).await?;
    Ok(Json(ProfileFormResponse {
        form: ProfileForm {
            first_name: profile.first_name,
            last_name: profile.last_name,
            username: profile.username,
            email: profile.email,
        },
    }))
}

pub async fn edit_profile(
    Extension(pool): Extension<SqlitePool>,
    user: AuthUser,
    Form(form): Form<ProfileForm>,
) -> RedirectResult {
    let cleaned = form.clean().map_err(|errors| rejected(&form, errors))?;
    let profile = update_profile_in_db(&pool, user.id, cleaned)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                let mut errors = FormErrors::default();
                errors.add("username", "A user with that username already exists.");
                return rejected(&form, errors);
            }
            e
        })?;
    Ok(Redirect::to(&profile_url(&profile.username)))
}

// ----------------- Post List Handlers -----------------
pub async fn index(
    Extension(pool): Extension<SqlitePool>,
    Query(page): Query<PageQuery>,
) -> JsonResult<PostListResponse> {
    let scope = PostScope::Published;
    let now = Utc::now();
    let page = PageInfo::resolve(page.parse()?, count_posts_in_db(&pool, scope, now).await?)?;
    let posts = list_posts_in_db(&pool, scope, now, &page).await?;

    Ok(Json(PostListResponse {
        posts: posts.into_iter().map(PostResponse::from).collect(),
        page,
        category: None,
        profile: None,
    }))
}

pub async fn category_posts(
    Extension(pool): Extension<SqlitePool>,
    RoutePath(slug): RoutePath<String>,
    Query(page): Query<PageQuery>,
) -> JsonResult<PostListResponse> {
    let category = get_published_category_by_slug_in_db(&pool, &slug).await?;
    let scope = PostScope::Category(&category.slug);
    let now = Utc::now();
    let page = PageInfo::resolve(page.parse()?, count_posts_in_db(&pool, scope, now).await?)?;
    let posts = list_posts_in_db(&pool, scope, now, &page).await?;

    Ok(Json(PostListResponse {
        posts: posts.into_iter().map(PostResponse::from).collect(),
        page,
        category: Some(category.into()),
        profile: None,
    }))
}

// ----------------- Post Handlers -----------------
pub async fn post_detail(
    Extension(pool): Extension<SqlitePool>,
    maybe_user: MaybeUser,
    RoutePath(post_id): RoutePath<i64>,
) -> JsonResult<PostDetailResponse> {
    let post = get_post_by_id_in_db(&pool, post_id).await?;
    if !is_visible_to(&post, maybe_user.get_id(), Utc::now()) {
        return Err(RequestError::NotFound("Post not found"));
    }
    let comments = get_comments_for_post_in_db(&pool, post.id).await?;

    Ok(Json(PostDetailResponse {
        post: post.into(),
        comments: comments.into_iter().map(Into::into).collect(),
        comment_form: CommentForm::default(),
    }))
}

async fn post_form_response(pool: &SqlitePool, form: PostForm) -> JsonResult<PostFormResponse> {
    let categories = list_categories_in_db(pool).await?;
    let locations = list_locations_in_db(pool).await?;
    Ok(Json(PostFormResponse {
        form,
        categories: categories.into_iter().map(Choice::from).collect(),
        locations: locations.into_iter().map(Choice::from).collect(),
    }))
}

/// Cleans the submission and checks the chosen category and location exist.
async fn validate_post_form(pool: &SqlitePool, form: &PostForm) -> Result<PostData, RequestError> {
    let data = form.clean().map_err(|errors| rejected(form, errors))?;

    let mut errors = FormErrors::default();
    if !category_exists_in_db(pool, data.category_id).await? {
        errors.add("category", INVALID_CHOICE);
    }
    if let Some(location_id) = data.location_id {
        if !location_exists_in_db(pool, location_id).await? {
            errors.add("location", INVALID_CHOICE);
        }
    }
    errors.into_result().map_err(|errors| rejected(form, errors))?;
    Ok(data)
}

pub async fn create_post_form(
    Extension(pool): Extension<SqlitePool>,
    _user: AuthUser,
) -> JsonResult<PostFormResponse> {
    post_form_response(&pool, PostForm::initial(Utc::now())).await
}

pub async fn create_post(
    Extension(pool): Extension<SqlitePool>,
    user: AuthUser,
    Form(form): Form<PostForm>,
) -> RedirectResult {
    let data = validate_post_form(&pool, &form).await?;
    let post_id = create_post_in_db(&pool, user.id, &data).await?;
    tracing::info!(post_id, author_id = user.id, "post created");
    Ok(Redirect::to(&profile_url(&user.username)))
}

pub async fn edit_post_form(
    Extension(pool): Extension<SqlitePool>,
    user: AuthUser,
    RoutePath(post_id): RoutePath<i64>,
) -> JsonResult<PostFormResponse> {
    let post = get_post_by_id_in_db(&pool, post_id).await?;
    ensure_author(&user, post.author_id, post_detail_url(post.id))?;
    post_form_response(&pool, PostForm::from_post(&post)).await
}

pub async fn edit_post(
    Extension(pool): Extension<SqlitePool>,
    user: AuthUser,
    RoutePath(post_id): RoutePath<i64>,
    Form(form): Form<PostForm>,
) -> RedirectResult {
    let post = get_post_by_id_in_db(&pool, post_id).await?;
    ensure_author(&user, post.author_id, post_detail_url(post.id))?;

    let data = validate_post_form(&pool, &form).await?;
    update_post_in_db(&pool, post.id, &data).await?;
    Ok(Redirect::to(&post_detail_url(post.id)))
}

pub async fn delete_post(
    Extension(pool): Extension<SqlitePool>,
    user: AuthUser,
    RoutePath(post_id): RoutePath<i64>,
) -> RedirectResult {
    let post = get_post_by_id_in_db(&pool, post_id).await?;
    ensure_author(&user, post.author_id, post_detail_url(post.id))?;

    delete_post_in_db(&pool, post.id).await?;
    tracing::info!(post_id = post.id, "post deleted");
    Ok(Redirect::to("/"))
}

// ----------------- Comment Handlers -----------------
pub async fn add_comment(
    Extension(pool): Extension<SqlitePool>,
    user: AuthUser,
    RoutePath(post_id): RoutePath<i64>,
    Form(form): Form<CommentForm>,
) -> RedirectResult {
    let post = get_post_by_id_in_db(&pool, post_id).await?;
    if !is_visible_to(&post, Some(user.id), Utc::now()) {
        return Err(RequestError::NotFound("Post not found"));
    }
    let text = form.clean().map_err(|errors| rejected(&form, errors))?;

    add_comment_to_post_in_db(&pool, user.id, post.id, &text).await?;
    Ok(Redirect::to(&post_detail_url(post.id)))
}

pub async fn edit_comment_form(
    Extension(pool): Extension<SqlitePool>,
    user: AuthUser,
    RoutePath((post_id, comment_id)): RoutePath<(i64, i64)>,
) -> JsonResult<CommentFormResponse> {
    let comment = get_comment_for_post_in_db(&pool, post_id, comment_id).await?;
    ensure_author(&user, comment.author_id, post_detail_url(post_id))?;

    Ok(Json(CommentFormResponse {
        post_id,
        comment_id: comment.id,
        form: CommentForm { text: comment.text },
    }))
}

pub async fn edit_comment(
    Extension(pool): Extension<SqlitePool>,
    user: AuthUser,
    RoutePath((post_id, comment_id)): RoutePath<(i64, i64)>,
    Form(form): Form<CommentForm>,
) -> RedirectResult {
    let comment = get_comment_for_post_in_db(&pool, post_id, comment_id).await?;
    ensure_author(&user, comment.author_id, post_detail_url(post_id))?;

    let text = form.clean().map_err(|errors| rejected(&form, errors))?;
    update_comment_in_db(&pool, comment.id, &text).await?;
    Ok(Redirect::to(&post_detail_url(post_id)))
}

pub async fn delete_comment(
    Extension(pool): Extension<SqlitePool>,
    user: AuthUser,
    RoutePath((post_id, comment_id)): RoutePath<(i64, i64)>,
) -> RedirectResult {
    let comment = get_comment_for_post_in_db(&pool, post_id, comment_id).await?;
    ensure_author(&user, comment.author_id, post_detail_url(post_id))?;

    delete_comment_in_db(&pool, comment.id).await?;
    Ok(Redirect::to(&post_detail_url(post_id)))
}
