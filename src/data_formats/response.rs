use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Category, Comment, Location, Post, Profile};
use crate::pagination::PageInfo;

use super::{CommentForm, PostForm, ProfileForm};

#[derive(Deserialize, Serialize, Debug)]
pub struct UserResponse {
    pub username: String,
    pub email: String,
    pub token: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ProfileResponse {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: DateTime<Utc>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CategoryResponse {
    pub title: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LocationResponse {
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author: String,
    pub category: Option<CategoryResponse>,
    pub location: Option<LocationResponse>,
    pub image: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub comment_count: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CommentResponse {
    pub id: i64,
    pub text: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
    pub page: PageInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileResponse>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct PostDetailResponse {
    pub post: PostResponse,
    pub comments: Vec<CommentResponse>,
    pub comment_form: CommentForm,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct Choice {
    pub id: i64,
    pub label: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct PostFormResponse {
    pub form: PostForm,
    pub categories: Vec<Choice>,
    pub locations: Vec<Choice>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct CommentFormResponse {
    pub post_id: i64,
    pub comment_id: i64,
    pub form: CommentForm,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ProfileFormResponse {
    pub form: ProfileForm,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        let category = match (post.category_title, post.category_slug) {
            (Some(title), Some(slug)) => Some(CategoryResponse {
                title,
                slug,
                description: None,
            }),
            _ => None,
        };
        // Hidden locations are not shown on the post.
        let location = match (post.location_name, post.location_is_published) {
            (Some(name), Some(true)) => Some(LocationResponse { name }),
            _ => None,
        };
        PostResponse {
            id: post.id,
            title: post.title,
            text: post.text,
            pub_date: post.pub_date,
            author: post.author_username,
            category,
            location,
            image: post.image,
            is_published: post.is_published,
            created_at: post.created_at,
            comment_count: post.comment_count,
        }
    }
}

impl From<Comment> for CommentResponse {
    fn from(
        Comment {
            id,
            text,
            author_username,
            created_at,
            ..
        }: Comment,
    ) -> Self {
        CommentResponse {
            id,
            text,
            author: author_username,
            created_at,
        }
    }
}

impl From<Category> for CategoryResponse {
    fn from(
        Category {
            title,
            slug,
            description,
            ..
        }: Category,
    ) -> Self {
        CategoryResponse {
            title,
            slug,
            description: Some(description),
        }
    }
}

impl From<Profile> for ProfileResponse {
    fn from(
        Profile {
            username,
            first_name,
            last_name,
            created_at,
            ..
        }: Profile,
    ) -> Self {
        ProfileResponse {
            username,
            first_name,
            last_name,
            date_joined: created_at,
        }
    }
}

impl From<Category> for Choice {
    fn from(category: Category) -> Self {
        Choice {
            id: category.id,
            label: category.title,
        }
    }
}

impl From<Location> for Choice {
    fn from(location: Location) -> Self {
        Choice {
            id: location.id,
            label: location.name,
        }
    }
}
