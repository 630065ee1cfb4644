// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Enrollment endpoints. All of them act on the caller's own enrollments.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::info;

use super::{run_blocking, ApiJson, ServiceResult};
use crate::{
    auth::Auth,
    error::{ApiError, ErrorBody, ServiceError},
    models::{CourseId, Enrollment, EnrollmentStatus, ProgressRequest},
    state::AppState,
    storage::{ownership::require_owner, CatalogueRead, EnrollmentLookup, OrNotFound},
};

/// Enroll the caller in a course.
#[utoipa::path(
    post,
    path = "/v1/enrollments/{course_id}",
    params(("course_id" = u64, Path, description = "Course id")),
    tag = "Enrollments",
    security(("bearer" = [])),
    responses(
        (status = 201, body = Enrollment),
        (status = 404, body = ErrorBody),
        (status = 409, description = "Already enrolled", body = ErrorBody)
    )
)]
pub async fn enroll(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(course_id): Path<CourseId>,
) -> Result<(StatusCode, Json<Enrollment>), ApiError> {
    let store = state.store.clone();
    let user_id = principal.id;
    let enrollment = run_blocking(move || {
        store.write(|scope| -> ServiceResult<Enrollment> {
            scope.course(course_id).or_not_found("Course", course_id)?;
            Ok(scope.enroll(user_id, course_id)?)
        })
    })
    .await?;

    info!(user_id, course_id, "Enrolled");
    Ok((StatusCode::CREATED, Json(enrollment)))
}

#[utoipa::path(
    get,
    path = "/v1/enrollments",
    tag = "Enrollments",
    security(("bearer" = [])),
    responses((status = 200, body = [Enrollment]), (status = 401, body = ErrorBody))
)]
pub async fn my_enrollments(
    State(state): State<AppState>,
    Auth(principal): Auth,
) -> Result<Json<Vec<Enrollment>>, ApiError> {
    let store = state.store.clone();
    let enrollments =
        run_blocking(move || Ok(store.read(|scope| scope.enrollments_of(principal.id))?)).await?;
    Ok(Json(enrollments))
}

#[utoipa::path(
    get,
    path = "/v1/enrollments/{course_id}/status",
    params(("course_id" = u64, Path, description = "Course id")),
    tag = "Enrollments",
    security(("bearer" = [])),
    responses((status = 200, body = EnrollmentStatus), (status = 401, body = ErrorBody))
)]
pub async fn enrollment_status(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(course_id): Path<CourseId>,
) -> Result<Json<EnrollmentStatus>, ApiError> {
    let store = state.store.clone();
    let enrolled = run_blocking(move || {
        Ok(store.read(|scope| scope.is_enrolled(principal.id, course_id))?)
    })
    .await?;
    Ok(Json(EnrollmentStatus { course_id, enrolled }))
}

/// Record the caller's progress through a course.
#[utoipa::path(
    put,
    path = "/v1/enrollments/{course_id}/progress",
    params(("course_id" = u64, Path, description = "Course id")),
    request_body = ProgressRequest,
    tag = "Enrollments",
    security(("bearer" = [])),
    responses(
        (status = 200, body = Enrollment),
        (status = 400, body = ErrorBody),
        (status = 404, description = "Caller is not enrolled", body = ErrorBody)
    )
)]
pub async fn update_progress(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(course_id): Path<CourseId>,
    ApiJson(request): ApiJson<ProgressRequest>,
) -> Result<Json<Enrollment>, ApiError> {
    request.validate()?;
    let store = state.store.clone();
    let enrollment = run_blocking(move || {
        store.write(|scope| -> ServiceResult<Enrollment> {
            let mut enrollment = scope
                .enrollment_for(principal.id, course_id)?
                .ok_or_else(|| {
                    ServiceError::ResourceNotFound(format!(
                        "Enrollment not found for course: {course_id}"
                    ))
                })?;
            require_owner(&principal, &enrollment)?;

            enrollment.progress = request.progress;
            enrollment.last_accessed = Some(Utc::now());
            scope.save_enrollment(&enrollment)?;
            Ok(enrollment)
        })
    })
    .await?;

    Ok(Json(enrollment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{course_request, principal, test_state};
    use crate::auth::Role;

    fn seed_course(state: &AppState) -> CourseId {
        let tutor = principal(state, "t@x.com", Role::Tutor);
        state
            .store
            .write(|scope| scope.create_course(tutor.id, course_request("Rust")))
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn enroll_then_status_and_list() {
        let (state, _dir) = test_state();
        let course_id = seed_course(&state);
        let student = principal(&state, "s@x.com", Role::Student);

        let Json(status) =
            enrollment_status(State(state.clone()), Auth(student.clone()), Path(course_id))
                .await
                .unwrap();
        assert!(!status.enrolled);

        let (code, Json(enrollment)) =
            enroll(State(state.clone()), Auth(student.clone()), Path(course_id))
                .await
                .unwrap();
        assert_eq!(code, StatusCode::CREATED);
        assert_eq!(enrollment.user_id, student.id);
        assert_eq!(enrollment.progress, 0);

        let Json(status) =
            enrollment_status(State(state.clone()), Auth(student.clone()), Path(course_id))
                .await
                .unwrap();
        assert!(status.enrolled);

        let Json(listed) = my_enrollments(State(state), Auth(student)).await.unwrap();
        assert_eq!(listed, vec![enrollment]);
    }

    #[tokio::test]
    async fn second_enrollment_is_conflict() {
        let (state, _dir) = test_state();
        let course_id = seed_course(&state);
        let student = principal(&state, "s@x.com", Role::Student);

        enroll(State(state.clone()), Auth(student.clone()), Path(course_id))
            .await
            .unwrap();
        let err = enroll(State(state), Auth(student), Path(course_id))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn enrolling_in_missing_course_is_not_found() {
        let (state, _dir) = test_state();
        let student = principal(&state, "s@x.com", Role::Student);

        let err = enroll(State(state), Auth(student), Path(42)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn progress_updates_only_callers_enrollment() {
        let (state, _dir) = test_state();
        let course_id = seed_course(&state);
        let student = principal(&state, "s@x.com", Role::Student);
        let other = principal(&state, "o@x.com", Role::Student);
        enroll(State(state.clone()), Auth(student.clone()), Path(course_id))
            .await
            .unwrap();

        let err = update_progress(
            State(state.clone()),
            Auth(other),
            Path(course_id),
            ApiJson(ProgressRequest { progress: 50 }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let Json(updated) = update_progress(
            State(state.clone()),
            Auth(student.clone()),
            Path(course_id),
            ApiJson(ProgressRequest { progress: 50 }),
        )
        .await
        .unwrap();
        assert_eq!(updated.progress, 50);
        assert!(updated.last_accessed.is_some());

        let err = update_progress(
            State(state),
            Auth(student),
            Path(course_id),
            ApiJson(ProgressRequest { progress: 101 }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
