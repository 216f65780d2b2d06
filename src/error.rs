use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use redis::RedisError;
use std::fmt;
use tracing::error;

use crate::api::MessageResponse;

#[derive(Debug)]
pub enum AppError {
    RedisError(RedisError),
    JsonError(serde_json::Error),
    RestaurantNotFound(String),
    InvalidId(String),
    InvalidInput(String),
    InvalidQuery(String),
    InvalidConfig(String),
    Server(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::RestaurantNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::RedisError(_)
            | AppError::JsonError(_)
            | AppError::InvalidId(_)
            | AppError::InvalidQuery(_)
            | AppError::InvalidConfig(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl AppError {
    /// An update reports every failure as a client error, except an unknown id.
    pub fn into_update_failure(self) -> AppError {
        match self {
            AppError::RestaurantNotFound(_) | AppError::InvalidInput(_) => self,
            other => AppError::InvalidInput(other.to_string()),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::RedisError(e) => write!(f, "{}", e),
            AppError::JsonError(e) => write!(f, "{}", e),
            AppError::RestaurantNotFound(_) => write!(f, "Restaurant not found"),
            AppError::InvalidId(id) => write!(
                f,
                "Cast to Uuid failed for value \"{}\" at path \"id\" for model \"Restaurant\"",
                id
            ),
            AppError::InvalidInput(msg) => write!(f, "{}", msg),
            AppError::InvalidQuery(msg) => write!(f, "{}", msg),
            AppError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            AppError::Server(msg) => write!(f, "Server error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<RedisError> for AppError {
    fn from(err: RedisError) -> Self {
        AppError::RedisError(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::JsonError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            error!(status = %status, "{}", message);
        }

        (status, Json(MessageResponse { message })).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
