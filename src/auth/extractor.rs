// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the authenticated principal.
//!
//! They read the [`SecurityContext`] that the authentication middleware put
//! into the request extensions; none of them looks at the token itself.
//!
//! ```rust,ignore
//! async fn update_course(Auth(principal): Auth, ...) -> Result<..., ApiError> {
//!     // principal is the verified caller
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{Role, SecurityContext};
use crate::error::{ApiError, ServiceError};
use crate::models::Principal;

fn context_principal(parts: &Parts) -> Option<Principal> {
    match parts.extensions.get::<SecurityContext>() {
        Some(context) => context.principal().cloned(),
        None => {
            tracing::warn!("No security context on request; is the auth layer installed?");
            None
        }
    }
}

/// Extractor for authenticated principals.
///
/// Rejects with 401 when the request is anonymous.
pub struct Auth(pub Principal);

impl<S: Send + Sync> FromRequestParts<S> for Auth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        context_principal(parts)
            .map(Auth)
            .ok_or_else(|| ServiceError::Unauthenticated.into())
    }
}

/// Extractor that requires the tutor role.
///
/// 401 when anonymous, 403 for any other role.
pub struct TutorOnly(pub Principal);

impl<S: Send + Sync> FromRequestParts<S> for TutorOnly {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Auth(principal) = Auth::from_request_parts(parts, state).await?;

        match principal.role {
            Role::Tutor => Ok(TutorOnly(principal)),
            Role::Student | Role::Admin => {
                Err(ServiceError::access_denied("Only tutors can perform this action").into())
            }
        }
    }
}

/// Optional authentication extractor. Never rejects.
pub struct OptionalAuth(pub Option<Principal>);

impl<S: Send + Sync> FromRequestParts<S> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(context_principal(parts)))
    }
}
