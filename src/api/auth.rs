// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registration and token issuance. Both routes are public.

use axum::{extract::State, http::StatusCode, Json};

use super::{run_blocking, ApiJson};
use crate::{
    error::{ApiError, ErrorBody},
    models::{AuthResponse, AuthenticateRequest, RegisterRequest},
    state::AppState,
};

/// Register a new account and return a token for it.
#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    tag = "Auth",
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid registration", body = ErrorBody),
        (status = 409, description = "Email already in use", body = ErrorBody)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let credentials = state.credentials.clone();
    let (principal, token) = run_blocking(move || credentials.register(request)).await?;
    Ok((StatusCode::CREATED, Json(AuthResponse::new(token, &principal))))
}

/// Exchange an email and password for a token.
#[utoipa::path(
    post,
    path = "/v1/auth/authenticate",
    request_body = AuthenticateRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Authenticated", body = AuthResponse),
        (status = 401, description = "Invalid email or password", body = ErrorBody)
    )
)]
pub async fn authenticate(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AuthenticateRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let credentials = state.credentials.clone();
    let (principal, token) = run_blocking(move || credentials.authenticate(request)).await?;
    Ok(Json(AuthResponse::new(token, &principal)))
}
