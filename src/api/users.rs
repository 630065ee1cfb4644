// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::{extract::State, Json};

use tracing::info;

use super::{run_blocking, ApiJson, ServiceResult};
use crate::{
    auth::Auth,
    error::{ApiError, ErrorBody},
    models::{ActivityDay, Principal, ProfileUpdateRequest, UserResponse},
    state::AppState,
    storage::OrNotFound,
};

/// Get the current authenticated principal.
#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User information", body = UserResponse),
        (status = 401, description = "Unauthorized - invalid or missing token", body = ErrorBody),
    )
)]
pub async fn me(Auth(principal): Auth) -> Json<UserResponse> {
    Json(UserResponse::from(&principal))
}

/// Update the caller's profile. Only the fields present in the body change.
#[utoipa::path(
    put,
    path = "/v1/users/me/profile",
    request_body = ProfileUpdateRequest,
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated user information", body = UserResponse),
        (status = 400, description = "Field length out of range", body = ErrorBody),
        (status = 401, description = "Unauthorized - invalid or missing token", body = ErrorBody),
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Auth(principal): Auth,
    ApiJson(request): ApiJson<ProfileUpdateRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    request.validate()?;
    let store = state.store.clone();
    let id = principal.id;
    let updated = run_blocking(move || {
        store.write(|scope| -> ServiceResult<Principal> {
            scope.update_profile(id, request).or_not_found("User", id)
        })
    })
    .await?;

    info!(principal_id = id, "Profile updated");
    Ok(Json(UserResponse::from(&updated)))
}

/// Logins per day for the current principal, oldest first.
#[utoipa::path(
    get,
    path = "/v1/users/me/activity",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Daily login counts", body = [ActivityDay]),
        (status = 401, description = "Unauthorized - invalid or missing token", body = ErrorBody),
    )
)]
pub async fn my_activity(
    State(state): State<AppState>,
    Auth(principal): Auth,
) -> Result<Json<Vec<ActivityDay>>, ApiError> {
    let store = state.store.clone();
    let days = run_blocking(move || Ok(store.activity_of(principal.id)?)).await?;
    Ok(Json(days))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{principal, test_state};
    use crate::auth::Role;
    use crate::storage::{ActivityRecorder, PrincipalStore};

    #[tokio::test]
    async fn me_hides_password_hash() {
        let (state, _dir) = test_state();
        let caller = principal(&state, "me@x.com", Role::Tutor);

        let Json(response) = me(Auth(caller.clone())).await;
        assert_eq!(response.id, caller.id);
        assert_eq!(response.role, Role::Tutor);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn profile_update_changes_only_given_fields() {
        let (state, _dir) = test_state();
        let caller = principal(&state, "me@x.com", Role::Student);

        let Json(response) = update_profile(
            State(state.clone()),
            Auth(caller.clone()),
            ApiJson(ProfileUpdateRequest {
                first_name: Some("Grace".to_string()),
                profession: Some("Engineer".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.first_name.as_deref(), Some("Grace"));
        assert_eq!(response.profession.as_deref(), Some("Engineer"));
        assert_eq!(response.email, caller.email);

        let stored = state.store.find_by_id(caller.id).unwrap().unwrap();
        assert_eq!(stored.first_name.as_deref(), Some("Grace"));
        assert_eq!(stored.role, Role::Student);
        assert_eq!(stored.password_hash, caller.password_hash);
    }

    #[tokio::test]
    async fn profile_update_rejects_short_name() {
        let (state, _dir) = test_state();
        let caller = principal(&state, "me@x.com", Role::Student);

        let err = update_profile(
            State(state.clone()),
            Auth(caller.clone()),
            ApiJson(ProfileUpdateRequest {
                first_name: Some("G".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);

        let stored = state.store.find_by_id(caller.id).unwrap().unwrap();
        assert_eq!(stored, caller);
    }

    #[tokio::test]
    async fn activity_lists_recorded_logins() {
        let (state, _dir) = test_state();
        let caller = principal(&state, "me@x.com", Role::Student);
        state.store.record_login(caller.id).unwrap();
        state.store.record_login(caller.id).unwrap();

        let Json(days) = my_activity(State(state), Auth(caller)).await.unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].count, 2);
    }
}
