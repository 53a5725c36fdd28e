//! Unified application error model and mapping helpers.
//! `AppError` is what HTTP handlers return; `AuthError` is the outcome type of a
//! login/signup submission and converts into `AppError` at the handler edge.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    UserInput { code: String, message: String },
    NotFound { code: String, message: String },
    Auth { code: String, message: String },
    Csrf { code: String, message: String },
    Forbidden { code: String, message: String },
    Conflict { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::UserInput { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Auth { code, .. }
            | AppError::Csrf { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::Conflict { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::UserInput { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Auth { message, .. }
            | AppError::Csrf { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::Conflict { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn user<S: Into<String>>(code: S, msg: S) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn not_found<S: Into<String>>(code: S, msg: S) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn auth<S: Into<String>>(code: S, msg: S) -> Self { AppError::Auth { code: code.into(), message: msg.into() } }
    pub fn csrf<S: Into<String>>(code: S, msg: S) -> Self { AppError::Csrf { code: code.into(), message: msg.into() } }
    pub fn forbidden<S: Into<String>>(code: S, msg: S) -> Self { AppError::Forbidden { code: code.into(), message: msg.into() } }
    pub fn conflict<S: Into<String>>(code: S, msg: S) -> Self { AppError::Conflict { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::UserInput { .. } => 400,
            AppError::NotFound { .. } => 404,
            AppError::Auth { .. } => 401,
            AppError::Csrf { .. } => 403,
            AppError::Forbidden { .. } => 403,
            AppError::Conflict { .. } => 409,
            AppError::Internal { .. } => 500,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal { code: "internal".into(), message: err.to_string() }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::json!({
            "status": "error",
            "code": self.code_str(),
            "message": self.message(),
        });
        (status, Json(body)).into_response()
    }
}

/// Why a login or signup submission did not produce an identity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("an account with this email already exists")]
    AccountExists,

    #[error("a submission is already in progress")]
    Pending,

    #[error("submission cancelled")]
    Cancelled,

    #[error("authentication service unavailable: {0}")]
    Unavailable(String),
}

impl AuthError {
    /// Text shown in the form's error banner.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::MissingField(field) => format!("Please enter your {field}."),
            AuthError::InvalidCredentials => "The email or password is incorrect.".to_string(),
            AuthError::AccountExists => "An account with this email already exists. Try signing in.".to_string(),
            AuthError::Pending => "Please wait for the current request to finish.".to_string(),
            AuthError::Cancelled => "Sign in was cancelled.".to_string(),
            AuthError::Unavailable(_) => "We could not reach the sign in service. Please try again.".to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingField(_) => "missing_field",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::AccountExists => "account_exists",
            AuthError::Pending => "login_pending",
            AuthError::Cancelled => "login_cancelled",
            AuthError::Unavailable(_) => "auth_unavailable",
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let code = err.code();
        let message = err.user_message();
        match err {
            AuthError::MissingField(_) => AppError::user(code.to_string(), message),
            AuthError::AccountExists | AuthError::Pending => AppError::conflict(code.to_string(), message),
            AuthError::Unavailable(_) => AppError::internal(code.to_string(), message),
            AuthError::InvalidCredentials | AuthError::Cancelled => AppError::auth(code.to_string(), message),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
