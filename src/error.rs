// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error taxonomy and the single HTTP error boundary.
//!
//! Business logic returns [`ServiceError`]. Handlers convert it into
//! [`ApiError`], whose response body is always
//! `{status, error, message, timestamp}`. Internal failures are logged with
//! their detail and answered with a generic message.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::StoreError;

const INTERNAL_MESSAGE: &str = "An unexpected error occurred. Please contact support.";

/// Failures surfaced by credential checks, authorization and catalogue
/// operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Unknown email or wrong password. The two are deliberately
    /// indistinguishable.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The request carries no verified identity.
    #[error("Authentication is required")]
    Unauthenticated,

    /// Registration with an email that already exists.
    #[error("Email already in use")]
    DuplicateEmail,

    /// Uniqueness conflict other than email (already enrolled, already
    /// wishlisted).
    #[error("{0}")]
    Conflict(String),

    /// Authorization failure.
    #[error("{0}")]
    AccessDenied(String),

    /// Target resource missing or deleted mid-operation.
    #[error("{0}")]
    ResourceNotFound(String),

    /// Malformed input.
    #[error("{0}")]
    Validation(String),

    /// Anything unclassified. The detail is never sent to the caller.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(resource: &str, id: u64) -> Self {
        ServiceError::ResourceNotFound(format!("{resource} not found with id: {id}"))
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        ServiceError::AccessDenied(message.into())
    }

    /// HTTP status for this error kind.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::InvalidCredentials | ServiceError::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            }
            ServiceError::DuplicateEmail | ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::AccessDenied(_) => StatusCode::FORBIDDEN,
            ServiceError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ServiceError::InvalidCredentials => "invalid_credentials",
            ServiceError::Unauthenticated => "unauthenticated",
            ServiceError::DuplicateEmail => "duplicate_email",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::AccessDenied(_) => "access_denied",
            ServiceError::ResourceNotFound(_) => "not_found",
            ServiceError::Validation(_) => "validation_error",
            ServiceError::Internal(_) => "internal_error",
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation(what) => ServiceError::Conflict(what),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

/// Structured error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// HTTP status code.
    pub status: u16,
    /// Short error label, e.g. `access_denied`.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub label: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, label: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            label,
            message: message.into(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        let message = match &e {
            ServiceError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error while handling request");
                INTERNAL_MESSAGE.to_string()
            }
            ServiceError::AccessDenied(reason) => {
                tracing::warn!(reason = %reason, "Access denied");
                e.to_string()
            }
            _ => e.to_string(),
        };
        Self::new(e.status_code(), e.label(), message)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ServiceError::from(e).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::Validation(rejection.body_text()).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            status: self.status.as_u16(),
            error: self.label.to_string(),
            message: self.message,
            timestamp: Utc::now(),
        });
        (self.status, body).into_response()
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn kinds_map_to_status_and_label() {
        let cases = [
            (ServiceError::InvalidCredentials, StatusCode::UNAUTHORIZED, "invalid_credentials"),
            (ServiceError::Unauthenticated, StatusCode::UNAUTHORIZED, "unauthenticated"),
            (ServiceError::DuplicateEmail, StatusCode::CONFLICT, "duplicate_email"),
            (ServiceError::access_denied("no"), StatusCode::FORBIDDEN, "access_denied"),
            (ServiceError::not_found("Course", 1), StatusCode::NOT_FOUND, "not_found"),
            (ServiceError::Validation("bad".into()), StatusCode::BAD_REQUEST, "validation_error"),
            (ServiceError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        ];
        for (error, status, label) in cases {
            assert_eq!(error.status_code(), status);
            assert_eq!(error.label(), label);
        }
    }

    #[test]
    fn unique_violation_becomes_conflict() {
        let e: ServiceError = StoreError::UniqueViolation("already enrolled".into()).into();
        assert!(matches!(e, ServiceError::Conflict(ref m) if m == "already enrolled"));
    }

    #[tokio::test]
    async fn into_response_returns_structured_body() {
        let response = ApiError::from(ServiceError::not_found("Course", 9)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["status"], 404);
        assert_eq!(body["error"], "not_found");
        assert_eq!(body["message"], "Course not found with id: 9");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_detail() {
        let response =
            ApiError::from(ServiceError::Internal("redb exploded at /data".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert!(!body.contains("redb"));
        assert!(body.contains(INTERNAL_MESSAGE));
    }
}
