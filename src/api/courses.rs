// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Course and module endpoints.
//!
//! Reads are public, except that an unpublished course is only visible to
//! its owner. Every write loads the course, checks that the caller
//! owns it and applies the change in one write transaction.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use super::{run_blocking, ApiJson, ServiceResult};
use crate::{
    auth::{Auth, OptionalAuth, TutorOnly},
    error::{ApiError, ErrorBody, ServiceError},
    models::{Course, CourseId, CourseRequest, Module, ModuleId, ModuleRequest, Principal},
    state::AppState,
    storage::{
        ownership::{is_owner, require_owner},
        CatalogueRead, OrNotFound, WriteScope,
    },
};

/// Load a course the caller owns.
fn owned_course(
    scope: &WriteScope,
    principal: &Principal,
    course_id: CourseId,
) -> ServiceResult<Course> {
    let course = scope.course(course_id).or_not_found("Course", course_id)?;
    require_owner(principal, &course)?;
    Ok(course)
}

/// Load a module and check that it sits under the given course.
fn module_in_course(
    scope: &WriteScope,
    course_id: CourseId,
    module_id: ModuleId,
) -> ServiceResult<Module> {
    let module = scope.module(module_id).or_not_found("Module", module_id)?;
    if module.course_id != course_id {
        return Err(ServiceError::Validation(format!(
            "Module {module_id} does not belong to course {course_id}"
        )));
    }
    Ok(module)
}

/// List published courses.
#[utoipa::path(
    get,
    path = "/v1/courses",
    tag = "Courses",
    responses((status = 200, body = [Course]))
)]
pub async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, ApiError> {
    let store = state.store.clone();
    let courses = run_blocking(move || Ok(store.read(|scope| scope.published_courses())?)).await?;
    Ok(Json(courses))
}

/// List the calling tutor's courses, published or not.
#[utoipa::path(
    get,
    path = "/v1/courses/mine",
    tag = "Courses",
    security(("bearer" = [])),
    responses(
        (status = 200, body = [Course]),
        (status = 401, body = ErrorBody),
        (status = 403, body = ErrorBody)
    )
)]
pub async fn my_courses(
    State(state): State<AppState>,
    TutorOnly(tutor): TutorOnly,
) -> Result<Json<Vec<Course>>, ApiError> {
    let store = state.store.clone();
    let courses =
        run_blocking(move || Ok(store.read(|scope| scope.courses_by_tutor(tutor.id))?)).await?;
    Ok(Json(courses))
}

/// Fetch one course. Unpublished courses are only visible to their owner.
#[utoipa::path(
    get,
    path = "/v1/courses/{course_id}",
    params(("course_id" = u64, Path, description = "Course id")),
    tag = "Courses",
    responses(
        (status = 200, body = Course),
        (status = 404, description = "Missing, or unpublished and not owned by the caller", body = ErrorBody)
    )
)]
pub async fn get_course(
    State(state): State<AppState>,
    OptionalAuth(caller): OptionalAuth,
    Path(course_id): Path<CourseId>,
) -> Result<Json<Course>, ApiError> {
    let store = state.store.clone();
    let course = run_blocking(move || {
        store.read(|scope| scope.course(course_id).or_not_found("Course", course_id))
    })
    .await?;

    let visible = course.is_published
        || caller
            .as_ref()
            .is_some_and(|principal| is_owner(principal, &course));
    if !visible {
        return Err(ServiceError::not_found("Course", course_id).into());
    }
    Ok(Json(course))
}

/// Create a course owned by the calling tutor.
#[utoipa::path(
    post,
    path = "/v1/courses",
    request_body = CourseRequest,
    tag = "Courses",
    security(("bearer" = [])),
    responses(
        (status = 201, body = Course),
        (status = 400, body = ErrorBody),
        (status = 401, body = ErrorBody),
        (status = 403, body = ErrorBody)
    )
)]
pub async fn create_course(
    State(state): State<AppState>,
    TutorOnly(tutor): TutorOnly,
    ApiJson(request): ApiJson<CourseRequest>,
) -> Result<(StatusCode, Json<Course>), ApiError> {
    request.validate()?;
    let store = state.store.clone();
    let course = run_blocking(move || {
        Ok(store.write(|scope| scope.create_course(tutor.id, request))?)
    })
    .await?;

    info!(course_id = course.id, tutor_id = course.tutor_id, "Created course");
    Ok((StatusCode::CREATED, Json(course)))
}

#[utoipa::path(
    put,
    path = "/v1/courses/{course_id}",
    params(("course_id" = u64, Path, description = "Course id")),
    request_body = CourseRequest,
    tag = "Courses",
    security(("bearer" = [])),
    responses(
        (status = 200, body = Course),
        (status = 403, description = "Caller does not own the course", body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn update_course(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(course_id): Path<CourseId>,
    ApiJson(request): ApiJson<CourseRequest>,
) -> Result<Json<Course>, ApiError> {
    request.validate()?;
    let store = state.store.clone();
    let course = run_blocking(move || {
        store.write(|scope| -> ServiceResult<Course> {
            let mut course = owned_course(scope, &principal, course_id)?;
            course.apply(request);
            scope.save_course(&course)?;
            Ok(course)
        })
    })
    .await?;

    info!(course_id, "Updated course");
    Ok(Json(course))
}

/// Delete a course along with its modules, enrollments, wishlist entries
/// and discussions.
#[utoipa::path(
    delete,
    path = "/v1/courses/{course_id}",
    params(("course_id" = u64, Path, description = "Course id")),
    tag = "Courses",
    security(("bearer" = [])),
    responses(
        (status = 204),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn delete_course(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(course_id): Path<CourseId>,
) -> Result<StatusCode, ApiError> {
    let store = state.store.clone();
    run_blocking(move || {
        store.write(|scope| -> ServiceResult<()> {
            owned_course(scope, &principal, course_id)?;
            scope.delete_course(course_id)?;
            Ok(())
        })
    })
    .await?;

    info!(course_id, "Deleted course");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/courses/{course_id}/modules",
    params(("course_id" = u64, Path, description = "Course id")),
    tag = "Courses",
    responses((status = 200, body = [Module]), (status = 404, body = ErrorBody))
)]
pub async fn list_modules(
    State(state): State<AppState>,
    Path(course_id): Path<CourseId>,
) -> Result<Json<Vec<Module>>, ApiError> {
    let store = state.store.clone();
    let modules = run_blocking(move || {
        store.read(|scope| -> ServiceResult<Vec<Module>> {
            scope.course(course_id).or_not_found("Course", course_id)?;
            Ok(scope.modules_of(course_id)?)
        })
    })
    .await?;
    Ok(Json(modules))
}

#[utoipa::path(
    post,
    path = "/v1/courses/{course_id}/modules",
    params(("course_id" = u64, Path, description = "Course id")),
    request_body = ModuleRequest,
    tag = "Courses",
    security(("bearer" = [])),
    responses(
        (status = 201, body = Module),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn add_module(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(course_id): Path<CourseId>,
    ApiJson(request): ApiJson<ModuleRequest>,
) -> Result<(StatusCode, Json<Module>), ApiError> {
    request.validate()?;
    let store = state.store.clone();
    let module = run_blocking(move || {
        store.write(|scope| -> ServiceResult<Module> {
            owned_course(scope, &principal, course_id)?;
            Ok(scope.create_module(course_id, request)?)
        })
    })
    .await?;

    info!(course_id, module_id = module.id, "Added module");
    Ok((StatusCode::CREATED, Json(module)))
}

#[utoipa::path(
    put,
    path = "/v1/courses/{course_id}/modules/{module_id}",
    params(
        ("course_id" = u64, Path, description = "Course id"),
        ("module_id" = u64, Path, description = "Module id")
    ),
    request_body = ModuleRequest,
    tag = "Courses",
    security(("bearer" = [])),
    responses(
        (status = 200, body = Module),
        (status = 400, description = "Module belongs to another course", body = ErrorBody),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn update_module(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path((course_id, module_id)): Path<(CourseId, ModuleId)>,
    ApiJson(request): ApiJson<ModuleRequest>,
) -> Result<Json<Module>, ApiError> {
    request.validate()?;
    let store = state.store.clone();
    let module = run_blocking(move || {
        store.write(|scope| -> ServiceResult<Module> {
            owned_course(scope, &principal, course_id)?;
            let mut module = module_in_course(scope, course_id, module_id)?;
            module.apply(request);
            scope.save_module(&module)?;
            Ok(module)
        })
    })
    .await?;

    info!(course_id, module_id, "Updated module");
    Ok(Json(module))
}

#[utoipa::path(
    delete,
    path = "/v1/courses/{course_id}/modules/{module_id}",
    params(
        ("course_id" = u64, Path, description = "Course id"),
        ("module_id" = u64, Path, description = "Module id")
    ),
    tag = "Courses",
    security(("bearer" = [])),
    responses(
        (status = 204),
        (status = 400, body = ErrorBody),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn delete_module(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path((course_id, module_id)): Path<(CourseId, ModuleId)>,
) -> Result<StatusCode, ApiError> {
    let store = state.store.clone();
    run_blocking(move || {
        store.write(|scope| -> ServiceResult<()> {
            owned_course(scope, &principal, course_id)?;
            let module = module_in_course(scope, course_id, module_id)?;
            scope.delete_module(&module)?;
            Ok(())
        })
    })
    .await?;

    info!(course_id, module_id, "Deleted module");
    Ok(StatusCode::NO_CONTENT)
}
