//! Response envelope, error mapping and caller identity.
//!
//! Every response body is either `{"success": true, "data": ...}` or
//! `{"success": false, "error": {"message": ..., "code": ...}}`.

use crate::errors::Error;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{error, warn};

/// Header carrying the authenticated user's ID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Handler result type.
pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

#[derive(Serialize)]
struct SuccessBody<T> {
    success: bool,
    data: T,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    message: &'a str,
    code: &'a str,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: ErrorDetail<'a>,
}

/// A successful response.
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    data: T,
}

impl<T> ApiResponse<T> {
    /// `200 OK` with `data`.
    pub const fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            data,
        }
    }

    /// `201 Created` with `data`.
    pub const fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(SuccessBody {
                success: true,
                data: self.data,
            }),
        )
            .into_response()
    }
}

/// A failed response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// The request carried no usable identity.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "UNAUTHORIZED",
            message: format!("Missing or invalid {USER_ID_HEADER} header"),
        }
    }

    fn bad_request(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "VALIDATION_ERROR",
            message,
        }
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

const fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::Validation { .. } | Error::WorklogInvalidTime { .. } => StatusCode::BAD_REQUEST,
        Error::UserNotFound { .. } | Error::WorklogNotFound { .. } => StatusCode::NOT_FOUND,
        Error::InsufficientBalance { .. }
        | Error::WorklogInProgressExists
        | Error::WorklogOverlap { .. }
        | Error::WorklogAlreadyCompleted { .. } => StatusCode::CONFLICT,
        Error::Config { .. } | Error::Database(_) | Error::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let status = status_for(&error);
        let message = if error.is_internal() {
            error!(error = %error, "Request failed");
            "Internal server error".to_string()
        } else {
            warn!(code = error.code(), error = %error, "Request rejected");
            error.to_string()
        };

        Self {
            status,
            code: error.code(),
            message,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                success: false,
                error: ErrorDetail {
                    message: &self.message,
                    code: self.code,
                },
            }),
        )
            .into_response()
    }
}

/// Reads the caller's user ID from the [`USER_ID_HEADER`] header.
///
/// # Errors
/// Returns a `401` error when the header is missing or not a positive integer.
pub fn current_user(headers: &HeaderMap) -> Result<i64, ApiError> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            warn!("Request without valid user identity");
            ApiError::unauthorized()
        })
}
