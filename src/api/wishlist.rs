// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wishlist endpoints. Entries are keyed by `(caller, course)` and only the
//! caller can see or remove their own.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{run_blocking, ServiceResult};
use crate::{
    auth::Auth,
    error::{ApiError, ErrorBody, ServiceError},
    models::{CourseId, WishlistItem},
    state::AppState,
    storage::{ownership::require_owner, CatalogueRead, OrNotFound},
};

/// The caller's wishlist, most recently added first.
#[utoipa::path(
    get,
    path = "/v1/wishlist",
    tag = "Wishlist",
    security(("bearer" = [])),
    responses((status = 200, body = [WishlistItem]), (status = 401, body = ErrorBody))
)]
pub async fn my_wishlist(
    State(state): State<AppState>,
    Auth(principal): Auth,
) -> Result<Json<Vec<WishlistItem>>, ApiError> {
    let store = state.store.clone();
    let items = run_blocking(move || Ok(store.read(|scope| scope.wishlist_of(principal.id))?)).await?;
    Ok(Json(items))
}

#[utoipa::path(
    post,
    path = "/v1/wishlist/{course_id}",
    params(("course_id" = u64, Path, description = "Course id")),
    tag = "Wishlist",
    security(("bearer" = [])),
    responses(
        (status = 201, body = WishlistItem),
        (status = 404, body = ErrorBody),
        (status = 409, description = "Already in the wishlist", body = ErrorBody)
    )
)]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(course_id): Path<CourseId>,
) -> Result<(StatusCode, Json<WishlistItem>), ApiError> {
    let store = state.store.clone();
    let item = run_blocking(move || {
        store.write(|scope| -> ServiceResult<WishlistItem> {
            scope.course(course_id).or_not_found("Course", course_id)?;
            Ok(scope.add_to_wishlist(principal.id, course_id)?)
        })
    })
    .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(
    delete,
    path = "/v1/wishlist/{course_id}",
    params(("course_id" = u64, Path, description = "Course id")),
    tag = "Wishlist",
    security(("bearer" = [])),
    responses(
        (status = 204),
        (status = 404, description = "Course is not in the wishlist", body = ErrorBody)
    )
)]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(course_id): Path<CourseId>,
) -> Result<StatusCode, ApiError> {
    let store = state.store.clone();
    run_blocking(move || {
        store.write(|scope| -> ServiceResult<()> {
            let item = scope
                .wishlist_item_for(principal.id, course_id)?
                .ok_or_else(|| {
                    ServiceError::ResourceNotFound(format!(
                        "Wishlist item not found for course: {course_id}"
                    ))
                })?;
            require_owner(&principal, &item)?;
            scope.remove_wishlist_item(&item)?;
            Ok(())
        })
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{course_request, principal, test_state};
    use crate::auth::Role;

    #[tokio::test]
    async fn add_list_and_remove() {
        let (state, _dir) = test_state();
        let tutor = principal(&state, "t@x.com", Role::Tutor);
        let student = principal(&state, "s@x.com", Role::Student);
        let (first, second) = state
            .store
            .write(|scope| {
                Ok::<_, crate::storage::StoreError>((
                    scope.create_course(tutor.id, course_request("Rust"))?,
                    scope.create_course(tutor.id, course_request("Go"))?,
                ))
            })
            .unwrap();

        for course_id in [first.id, second.id] {
            let (status, _) =
                add_to_wishlist(State(state.clone()), Auth(student.clone()), Path(course_id))
                    .await
                    .unwrap();
            assert_eq!(status, StatusCode::CREATED);
        }

        let Json(items) = my_wishlist(State(state.clone()), Auth(student.clone()))
            .await
            .unwrap();
        assert_eq!(
            items.iter().map(|i| i.course_id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );

        let status = remove_from_wishlist(State(state.clone()), Auth(student.clone()), Path(first.id))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = remove_from_wishlist(State(state), Auth(student), Path(first.id))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn duplicate_and_missing_course() {
        let (state, _dir) = test_state();
        let tutor = principal(&state, "t@x.com", Role::Tutor);
        let student = principal(&state, "s@x.com", Role::Student);
        let course = state
            .store
            .write(|scope| scope.create_course(tutor.id, course_request("Rust")))
            .unwrap();

        add_to_wishlist(State(state.clone()), Auth(student.clone()), Path(course.id))
            .await
            .unwrap();
        let err = add_to_wishlist(State(state.clone()), Auth(student.clone()), Path(course.id))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let err = add_to_wishlist(State(state), Auth(student), Path(999))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn another_users_item_is_untouched() {
        let (state, _dir) = test_state();
        let tutor = principal(&state, "t@x.com", Role::Tutor);
        let owner = principal(&state, "s@x.com", Role::Student);
        let other = principal(&state, "o@x.com", Role::Student);
        let course = state
            .store
            .write(|scope| scope.create_course(tutor.id, course_request("Rust")))
            .unwrap();
        add_to_wishlist(State(state.clone()), Auth(owner.clone()), Path(course.id))
            .await
            .unwrap();

        let err = remove_from_wishlist(State(state.clone()), Auth(other), Path(course.id))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let Json(items) = my_wishlist(State(state), Auth(owner)).await.unwrap();
        assert_eq!(items.len(), 1);
    }
}
