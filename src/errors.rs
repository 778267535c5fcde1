use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};

use crate::data_formats::FormWrapper;
use crate::JsonResponse;

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("{0}")]
    NotFound(&'static str),
    /// Anonymous visitor on a login-only page; holds the full login redirect.
    #[error("login required")]
    LoginRequired(String),
    /// Signed in but not the owner; the visitor is sent back to `redirect_to`.
    #[error("not the author")]
    Forbidden { redirect_to: String },
    #[error("invalid form submission")]
    Validation(Box<FormWrapper<serde_json::Value>>),
    #[error("internal server error")]
    ServerError,
    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

#[derive(serde::Serialize)]
pub struct RequestErrorJsonWrapper {
    errors: RequestErrorJson,
}

#[derive(serde::Serialize)]
pub struct RequestErrorJson {
    body: Vec<String>,
}

impl RequestErrorJsonWrapper {
    pub fn new(error: &str) -> RequestErrorJsonWrapper {
        RequestErrorJsonWrapper {
            errors: RequestErrorJson {
                body: vec![error.to_string()],
            },
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        match self {
            RequestError::LoginRequired(location) => Redirect::to(&location).into_response(),
            RequestError::Forbidden { redirect_to } => Redirect::to(&redirect_to).into_response(),
            RequestError::Validation(form) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(*form)).into_response()
            }
            other => other.to_json_response().into_response(),
        }
    }
}

impl RequestError {
    pub fn to_json_response(&self) -> JsonResponse<RequestErrorJsonWrapper> {
        let (status_code, json) = match self {
            RequestError::NotFound(message) => {
                (StatusCode::NOT_FOUND, RequestErrorJsonWrapper::new(message))
            }
            RequestError::DatabaseError(e) => {
                tracing::error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    RequestErrorJsonWrapper::new("Internal Server Error"),
                )
            }
            // Redirects and form errors are rendered by `into_response`.
            RequestError::LoginRequired(_)
            | RequestError::Forbidden { .. }
            | RequestError::Validation(_)
            | RequestError::ServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                RequestErrorJsonWrapper::new("Internal Server Error"),
            ),
        };
        (status_code, Json(json))
    }

    pub fn is_unique_violation(&self) -> bool {
        match self {
            RequestError::DatabaseError(sqlx::Error::Database(e)) => {
                e.message().contains("UNIQUE constraint failed")
            }
            _ => false,
        }
    }
}
