use std::borrow::Cow;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::Post;

use super::{FormErrors, INVALID_CHOICE, REQUIRED};

const PUB_DATE_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";
const PUB_DATE_FORMATS: [&str; 4] = [
    PUB_DATE_INPUT_FORMAT,
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

fn error_with_message(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error_with_message("required", REQUIRED));
    }
    Ok(())
}

fn valid_username(value: &str) -> Result<(), ValidationError> {
    required(value)?;
    let allowed = |c: char| c.is_alphanumeric() || "@.+-_".contains(c);
    if !value.chars().all(allowed) {
        return Err(error_with_message(
            "invalid_username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }
    Ok(())
}

fn optional_email(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || validator::validate_email(value) {
        return Ok(());
    }
    Err(error_with_message("email", "Enter a valid email address."))
}

/// `datetime-local` input, optionally with seconds, or RFC 3339. Naive values are UTC.
pub fn parse_pub_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }
    PUB_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn checkbox(value: &Option<String>) -> bool {
    matches!(
        value.as_deref().map(str::trim),
        Some("on") | Some("true") | Some("1")
    )
}

fn optional_text(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

// ----------------- Post Forms -----------------

/// Post form as submitted. Any `author` field in the body is ignored.
#[derive(Deserialize, Serialize, Debug, Default, Clone, Validate)]
#[serde(default)]
pub struct PostForm {
    #[validate(
        custom = "required",
        length(max = 256, message = "Ensure this value has at most 256 characters.")
    )]
    pub title: String,
    #[validate(custom = "required")]
    pub text: String,
    pub pub_date: String,
    pub category: String,
    pub location: String,
    pub image: String,
    pub is_published: Option<String>,
}

/// A cleaned post submission. Category and location ids are still unchecked
/// against the store.
#[derive(Debug, Clone, PartialEq)]
pub struct PostData {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub category_id: i64,
    pub location_id: Option<i64>,
    pub image: Option<String>,
    pub is_published: bool,
}

impl PostForm {
    pub fn initial(now: DateTime<Utc>) -> Self {
        PostForm {
            pub_date: now.format(PUB_DATE_INPUT_FORMAT).to_string(),
            is_published: Some("on".to_owned()),
            ..Default::default()
        }
    }

    pub fn from_post(post: &Post) -> Self {
        PostForm {
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: post.pub_date.format(PUB_DATE_INPUT_FORMAT).to_string(),
            category: post.category_id.map(|id| id.to_string()).unwrap_or_default(),
            location: post.location_id.map(|id| id.to_string()).unwrap_or_default(),
            image: post.image.clone().unwrap_or_default(),
            is_published: post.is_published.then(|| "on".to_owned()),
        }
    }

    pub fn clean(&self) -> Result<PostData, FormErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FormErrors::default(),
            Err(e) => FormErrors::from(e),
        };

        let pub_date = if self.pub_date.trim().is_empty() {
            errors.add("pub_date", REQUIRED);
            None
        } else {
            let parsed = parse_pub_date(&self.pub_date);
            if parsed.is_none() {
                errors.add("pub_date", "Enter a valid date/time.");
            }
            parsed
        };

        let category_id = match self.category.trim() {
            "" => {
                errors.add("category", REQUIRED);
                None
            }
            raw => {
                let parsed = raw.parse::<i64>().ok();
                if parsed.is_none() {
                    errors.add("category", INVALID_CHOICE);
                }
                parsed
            }
        };

        let location_id = match self.location.trim() {
            "" => None,
            raw => {
                let parsed = raw.parse::<i64>().ok();
                if parsed.is_none() {
                    errors.add("location", INVALID_CHOICE);
                }
                parsed
            }
        };

        errors.into_result()?;
        match (pub_date, category_id) {
            (Some(pub_date), Some(category_id)) => Ok(PostData {
                title: self.title.trim().to_owned(),
                text: self.text.trim().to_owned(),
                pub_date,
                category_id,
                location_id,
                image: optional_text(&self.image),
                is_published: checkbox(&self.is_published),
            }),
            _ => Err(FormErrors::default()),
        }
    }
}

// ----------------- Comment Forms -----------------

#[derive(Deserialize, Serialize, Debug, Default, Clone, Validate)]
#[serde(default)]
pub struct CommentForm {
    #[validate(custom = "required")]
    pub text: String,
}

impl CommentForm {
    pub fn clean(&self) -> Result<String, FormErrors> {
        self.validate().map_err(FormErrors::from)?;
        Ok(self.text.trim().to_owned())
    }
}

// ----------------- Profile Forms -----------------

#[derive(Deserialize, Serialize, Debug, Default, Clone, Validate)]
#[serde(default)]
pub struct ProfileForm {
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub first_name: String,
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub last_name: String,
    #[validate(
        custom = "valid_username",
        length(max = 150, message = "Ensure this value has at most 150 characters.")
    )]
    pub username: String,
    #[validate(custom = "optional_email")]
    pub email: String,
}

impl ProfileForm {
    pub fn clean(&self) -> Result<ProfileForm, FormErrors> {
        let cleaned = ProfileForm {
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            username: self.username.trim().to_owned(),
            email: self.email.trim().to_owned(),
        };
        cleaned.validate().map_err(FormErrors::from)?;
        Ok(cleaned)
    }
}

// ----------------- Account Forms -----------------

#[derive(Deserialize, Serialize, Debug, Default, Clone, Validate)]
#[serde(default)]
pub struct RegistrationForm {
    #[validate(
        custom = "valid_username",
        length(max = 150, message = "Ensure this value has at most 150 characters.")
    )]
    pub username: String,
    #[validate(length(
        min = 8,
        message = "This password is too short. It must contain at least 8 characters."
    ))]
    #[serde(skip_serializing)]
    pub password1: String,
    #[serde(skip_serializing)]
    pub password2: String,
}

impl RegistrationForm {
    pub fn clean(&self) -> Result<(String, String), FormErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FormErrors::default(),
            Err(e) => FormErrors::from(e),
        };
        if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn’t match.");
        }
        errors.into_result()?;
        Ok((self.username.trim().to_owned(), self.password1.clone()))
    }
}

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

/// Every field is a secret, so a redisplayed form carries only its errors.
#[derive(Deserialize, Serialize, Debug, Default, Clone, Validate)]
#[serde(default)]
pub struct PasswordChangeForm {
    #[serde(skip_serializing)]
    pub old_password: String,
    #[validate(length(
        min = 8,
        message = "This password is too short. It must contain at least 8 characters."
    ))]
    #[serde(skip_serializing)]
    pub new_password1: String,
    #[serde(skip_serializing)]
    pub new_password2: String,
}

impl PasswordChangeForm {
    /// Checks the new password pair; the old one is verified against the store.
    pub fn clean(&self) -> Result<String, FormErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FormErrors::default(),
            Err(e) => FormErrors::from(e),
        };
        if self.new_password1 != self.new_password2 {
            errors.add("new_password2", "The two password fields didn’t match.");
        }
        errors.into_result()?;
        Ok(self.new_password1.clone())
    }
}
