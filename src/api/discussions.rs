// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Module discussion threads.
//!
//! Reading is public. Posting, replying and upvoting require the caller to
//! own the module's course or be enrolled in it. A reply always inherits the
//! course and module of its parent.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use super::{run_blocking, ApiJson, ServiceResult};
use crate::{
    auth::Auth,
    error::{ApiError, ErrorBody},
    models::{
        validate_discussion_content, CreateDiscussionRequest, Discussion, DiscussionId, Module,
        ModuleId, Principal, ReplyRequest,
    },
    state::AppState,
    storage::{
        ownership::{require_owner_or_enrolled, require_same_course},
        CatalogueRead, OrNotFound, WriteScope,
    },
};

/// Load an existing discussion with its module, checking that the two agree
/// on the course, and authorize the caller against that course.
fn participate_in(
    scope: &WriteScope,
    principal: &Principal,
    discussion_id: DiscussionId,
) -> ServiceResult<(Discussion, Module)> {
    let discussion = scope
        .discussion(discussion_id)
        .or_not_found("Discussion", discussion_id)?;
    let module = scope
        .module(discussion.module_id)
        .or_not_found("Module", discussion.module_id)?;
    require_same_course(&discussion, &module)?;

    let course = scope
        .course(module.course_id)
        .or_not_found("Course", module.course_id)?;
    require_owner_or_enrolled(principal, &course, scope)?;
    Ok((discussion, module))
}

/// Top-level posts under a module, newest first.
#[utoipa::path(
    get,
    path = "/v1/discussions/module/{module_id}",
    params(("module_id" = u64, Path, description = "Module id")),
    tag = "Discussions",
    responses((status = 200, body = [Discussion]), (status = 404, body = ErrorBody))
)]
pub async fn list_threads(
    State(state): State<AppState>,
    Path(module_id): Path<ModuleId>,
) -> Result<Json<Vec<Discussion>>, ApiError> {
    let store = state.store.clone();
    let posts = run_blocking(move || {
        store.read(|scope| -> ServiceResult<Vec<Discussion>> {
            scope.module(module_id).or_not_found("Module", module_id)?;
            Ok(scope.threads_of(module_id)?)
        })
    })
    .await?;
    Ok(Json(posts))
}

/// Replies to a post, oldest first.
#[utoipa::path(
    get,
    path = "/v1/discussions/{discussion_id}/replies",
    params(("discussion_id" = u64, Path, description = "Parent discussion id")),
    tag = "Discussions",
    responses((status = 200, body = [Discussion]), (status = 404, body = ErrorBody))
)]
pub async fn list_replies(
    State(state): State<AppState>,
    Path(discussion_id): Path<DiscussionId>,
) -> Result<Json<Vec<Discussion>>, ApiError> {
    let store = state.store.clone();
    let replies = run_blocking(move || {
        store.read(|scope| -> ServiceResult<Vec<Discussion>> {
            scope
                .discussion(discussion_id)
                .or_not_found("Discussion", discussion_id)?;
            Ok(scope.replies_to(discussion_id)?)
        })
    })
    .await?;
    Ok(Json(replies))
}

/// Start a thread under a module.
#[utoipa::path(
    post,
    path = "/v1/discussions",
    request_body = CreateDiscussionRequest,
    tag = "Discussions",
    security(("bearer" = [])),
    responses(
        (status = 201, body = Discussion),
        (status = 400, body = ErrorBody),
        (status = 403, description = "Caller neither owns nor is enrolled in the course", body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn create_post(
    State(state): State<AppState>,
    Auth(principal): Auth,
    ApiJson(request): ApiJson<CreateDiscussionRequest>,
) -> Result<(StatusCode, Json<Discussion>), ApiError> {
    validate_discussion_content(&request.content)?;
    let store = state.store.clone();
    let post = run_blocking(move || {
        store.write(|scope| -> ServiceResult<Discussion> {
            let module = scope
                .module(request.module_id)
                .or_not_found("Module", request.module_id)?;
            let course = scope
                .course(module.course_id)
                .or_not_found("Course", module.course_id)?;
            require_owner_or_enrolled(&principal, &course, scope)?;

            Ok(scope.create_discussion(principal.id, &module, None, request.content)?)
        })
    })
    .await?;

    info!(discussion_id = post.id, module_id = post.module_id, "Created discussion");
    Ok((StatusCode::CREATED, Json(post)))
}

#[utoipa::path(
    post,
    path = "/v1/discussions/{discussion_id}/reply",
    params(("discussion_id" = u64, Path, description = "Parent discussion id")),
    request_body = ReplyRequest,
    tag = "Discussions",
    security(("bearer" = [])),
    responses(
        (status = 201, body = Discussion),
        (status = 400, body = ErrorBody),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn reply(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(discussion_id): Path<DiscussionId>,
    ApiJson(request): ApiJson<ReplyRequest>,
) -> Result<(StatusCode, Json<Discussion>), ApiError> {
    validate_discussion_content(&request.content)?;
    let store = state.store.clone();
    let reply = run_blocking(move || {
        store.write(|scope| -> ServiceResult<Discussion> {
            let (parent, module) = participate_in(scope, &principal, discussion_id)?;
            Ok(scope.create_discussion(principal.id, &module, Some(parent.id), request.content)?)
        })
    })
    .await?;

    info!(discussion_id = reply.id, parent_id = discussion_id, "Replied to discussion");
    Ok((StatusCode::CREATED, Json(reply)))
}

#[utoipa::path(
    put,
    path = "/v1/discussions/{discussion_id}/upvote",
    params(("discussion_id" = u64, Path, description = "Discussion id")),
    tag = "Discussions",
    security(("bearer" = [])),
    responses(
        (status = 200, body = Discussion),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn upvote(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(discussion_id): Path<DiscussionId>,
) -> Result<Json<Discussion>, ApiError> {
    let store = state.store.clone();
    let discussion = run_blocking(move || {
        store.write(|scope| -> ServiceResult<Discussion> {
            let (mut discussion, _) = participate_in(scope, &principal, discussion_id)?;
            discussion.upvotes = discussion.upvotes.saturating_add(1);
            scope.save_discussion(&discussion)?;
            Ok(discussion)
        })
    })
    .await?;
    Ok(Json(discussion))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{course_request, module_request, principal, test_state};
    use crate::auth::Role;
    use crate::models::{Course, CourseId};
    use crate::storage::StoreError;

    struct Fixture {
        tutor: Principal,
        course: Course,
        module: Module,
    }

    fn fixture(state: &AppState) -> Fixture {
        let tutor = principal(state, "t@x.com", Role::Tutor);
        let (course, module) = state
            .store
            .write(|scope| {
                let course = scope.create_course(tutor.id, course_request("Rust"))?;
                let module = scope.create_module(course.id, module_request("Intro"))?;
                Ok::<_, StoreError>((course, module))
            })
            .unwrap();
        Fixture {
            tutor,
            course,
            module,
        }
    }

    fn enroll(state: &AppState, user: &Principal, course_id: CourseId) {
        state
            .store
            .write(|scope| scope.enroll(user.id, course_id))
            .unwrap();
    }

    async fn post(
        state: &AppState,
        author: &Principal,
        module_id: ModuleId,
        content: &str,
    ) -> Result<Discussion, ApiError> {
        create_post(
            State(state.clone()),
            Auth(author.clone()),
            ApiJson(CreateDiscussionRequest {
                module_id,
                content: content.to_string(),
            }),
        )
        .await
        .map(|(_, Json(post))| post)
    }

    #[tokio::test]
    async fn posting_requires_ownership_or_enrollment() {
        let (state, _dir) = test_state();
        let f = fixture(&state);
        let outsider = principal(&state, "out@x.com", Role::Student);
        let student = principal(&state, "s@x.com", Role::Student);
        enroll(&state, &student, f.course.id);

        let err = post(&state, &outsider, f.module.id, "hi").await.unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let by_student = post(&state, &student, f.module.id, "question").await.unwrap();
        assert_eq!(by_student.course_id, f.course.id);
        assert_eq!(by_student.author_id, student.id);

        let by_owner = post(&state, &f.tutor, f.module.id, "answer").await.unwrap();
        assert_eq!(by_owner.author_id, f.tutor.id);
    }

    #[tokio::test]
    async fn threads_are_listed_newest_first_without_replies() {
        let (state, _dir) = test_state();
        let f = fixture(&state);

        let first = post(&state, &f.tutor, f.module.id, "first").await.unwrap();
        let second = post(&state, &f.tutor, f.module.id, "second").await.unwrap();
        reply(
            State(state.clone()),
            Auth(f.tutor.clone()),
            Path(first.id),
            ApiJson(ReplyRequest {
                content: "reply".to_string(),
            }),
        )
        .await
        .unwrap();

        let Json(threads) = list_threads(State(state.clone()), Path(f.module.id))
            .await
            .unwrap();
        assert_eq!(
            threads.iter().map(|d| d.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );

        let Json(replies) = list_replies(State(state), Path(first.id)).await.unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].parent_id, Some(first.id));
    }

    #[tokio::test]
    async fn reply_inherits_parent_course_and_module() {
        let (state, _dir) = test_state();
        let f = fixture(&state);
        let student = principal(&state, "s@x.com", Role::Student);
        enroll(&state, &student, f.course.id);
        let parent = post(&state, &f.tutor, f.module.id, "welcome").await.unwrap();

        let (status, Json(child)) = reply(
            State(state.clone()),
            Auth(student),
            Path(parent.id),
            ApiJson(ReplyRequest {
                content: "thanks".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(child.course_id, parent.course_id);
        assert_eq!(child.module_id, parent.module_id);
        assert_eq!(child.parent_id, Some(parent.id));

        let outsider = principal(&state, "out@x.com", Role::Student);
        let err = reply(
            State(state),
            Auth(outsider),
            Path(parent.id),
            ApiJson(ReplyRequest {
                content: "me too".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn reply_to_inconsistent_parent_is_internal_error() {
        let (state, _dir) = test_state();
        let f = fixture(&state);
        let parent = post(&state, &f.tutor, f.module.id, "welcome").await.unwrap();

        let mut corrupted = parent.clone();
        corrupted.course_id = f.course.id + 100;
        state
            .store
            .write(|scope| scope.save_discussion(&corrupted))
            .unwrap();

        let err = reply(
            State(state),
            Auth(f.tutor),
            Path(parent.id),
            ApiJson(ReplyRequest {
                content: "hello".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn upvote_counts_for_participants_only() {
        let (state, _dir) = test_state();
        let f = fixture(&state);
        let student = principal(&state, "s@x.com", Role::Student);
        let outsider = principal(&state, "out@x.com", Role::Student);
        enroll(&state, &student, f.course.id);
        let thread = post(&state, &f.tutor, f.module.id, "vote me").await.unwrap();

        let Json(voted) = upvote(State(state.clone()), Auth(student), Path(thread.id))
            .await
            .unwrap();
        assert_eq!(voted.upvotes, 1);

        let err = upvote(State(state), Auth(outsider), Path(thread.id))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn blank_or_missing_targets_are_rejected() {
        let (state, _dir) = test_state();
        let f = fixture(&state);

        let err = post(&state, &f.tutor, f.module.id, "   ").await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = post(&state, &f.tutor, 999, "hi").await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err = upvote(State(state), Auth(f.tutor), Path(999)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
