// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP surface.
//!
//! Every route sits behind the authentication layer, which runs before any
//! handler and leaves a [`SecurityContext`](crate::auth::SecurityContext)
//! in the request. Catalogue mutations run their ownership check and their
//! write inside one store transaction.

use axum::{
    extract::FromRequest,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{authenticate_request, Role},
    error::{ApiError, ErrorBody, ServiceError},
    models::{
        ActivityDay, AuthResponse, AuthenticateRequest, Course, CourseRequest,
        CreateDiscussionRequest, Discussion, Enrollment, EnrollmentStatus, Module, ModuleRequest,
        ProfileUpdateRequest, ProgressRequest, RegisterRequest, ReplyRequest, UserResponse,
        WishlistItem,
    },
    state::AppState,
};

pub mod auth;
pub mod courses;
pub mod discussions;
pub mod enrollments;
pub mod health;
pub mod users;
pub mod wishlist;

/// JSON body extractor whose rejection uses the API error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

pub(crate) type ServiceResult<T> = Result<T, ServiceError>;

/// Run CPU-bound or blocking work off the async workers.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServiceError::Internal(format!("blocking task failed: {e}")))?;
    Ok(result?)
}

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/authenticate", post(auth::authenticate))
        .route("/users/me", get(users::me))
        .route("/users/me/activity", get(users::my_activity))
        .route("/users/me/profile", put(users::update_profile))
        .route(
            "/courses",
            get(courses::list_courses).post(courses::create_course),
        )
        .route("/courses/mine", get(courses::my_courses))
        .route(
            "/courses/{course_id}",
            get(courses::get_course)
                .put(courses::update_course)
                .delete(courses::delete_course),
        )
        .route(
            "/courses/{course_id}/modules",
            get(courses::list_modules).post(courses::add_module),
        )
        .route(
            "/courses/{course_id}/modules/{module_id}",
            put(courses::update_module).delete(courses::delete_module),
        )
        .route("/enrollments", get(enrollments::my_enrollments))
        .route("/enrollments/{course_id}", post(enrollments::enroll))
        .route(
            "/enrollments/{course_id}/status",
            get(enrollments::enrollment_status),
        )
        .route(
            "/enrollments/{course_id}/progress",
            put(enrollments::update_progress),
        )
        .route("/wishlist", get(wishlist::my_wishlist))
        .route(
            "/wishlist/{course_id}",
            post(wishlist::add_to_wishlist).delete(wishlist::remove_from_wishlist),
        )
        .route("/discussions", post(discussions::create_post))
        .route(
            "/discussions/module/{module_id}",
            get(discussions::list_threads),
        )
        .route(
            "/discussions/{discussion_id}/replies",
            get(discussions::list_replies),
        )
        .route(
            "/discussions/{discussion_id}/reply",
            post(discussions::reply),
        )
        .route(
            "/discussions/{discussion_id}/upvote",
            put(discussions::upvote),
        );

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    let authenticator = state.authenticator.clone();

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn_with_state(
            authenticator,
            authenticate_request,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register,
        auth::authenticate,
        users::me,
        users::my_activity,
        users::update_profile,
        courses::list_courses,
        courses::my_courses,
        courses::get_course,
        courses::create_course,
        courses::update_course,
        courses::delete_course,
        courses::list_modules,
        courses::add_module,
        courses::update_module,
        courses::delete_module,
        enrollments::enroll,
        enrollments::my_enrollments,
        enrollments::enrollment_status,
        enrollments::update_progress,
        wishlist::my_wishlist,
        wishlist::add_to_wishlist,
        wishlist::remove_from_wishlist,
        discussions::list_threads,
        discussions::list_replies,
        discussions::create_post,
        discussions::reply,
        discussions::upvote,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            Role,
            ErrorBody,
            RegisterRequest,
            AuthenticateRequest,
            AuthResponse,
            UserResponse,
            ProfileUpdateRequest,
            ActivityDay,
            Course,
            CourseRequest,
            Module,
            ModuleRequest,
            Enrollment,
            EnrollmentStatus,
            ProgressRequest,
            WishlistItem,
            Discussion,
            CreateDiscussionRequest,
            ReplyRequest,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Registration and token issuance"),
        (name = "Users", description = "The calling principal"),
        (name = "Courses", description = "Courses and their modules"),
        (name = "Enrollments", description = "Course enrollment and progress"),
        (name = "Wishlist", description = "Saved courses"),
        (name = "Discussions", description = "Module discussion threads"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

struct BearerAuth;

impl utoipa::Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
