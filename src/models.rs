// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Data Models
//!
//! Records persisted in the store and the request/response bodies of the
//! REST API. All types derive `Serialize`, `Deserialize`, and `ToSchema`
//! for JSON handling and OpenAPI documentation. Field names are camelCase
//! on the wire.
//!
//! ## Ownership
//!
//! Every mutable record carries an owner reference fixed at creation:
//!
//! | Record | Owner |
//! |--------|-------|
//! | [`Course`] | `tutor_id` |
//! | [`Module`] | the owning course's `tutor_id` (via `course_id`) |
//! | [`Enrollment`] | `user_id` |
//! | [`WishlistItem`] | `user_id` |
//! | [`Discussion`] | `author_id` |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;
use crate::error::ServiceError;

pub type PrincipalId = u64;
pub type CourseId = u64;
pub type ModuleId = u64;
pub type DiscussionId = u64;

/// Maximum discussion post length.
const MAX_DISCUSSION_LEN: usize = 1000;


// =============================================================================
// Principals
// =============================================================================

/// A registered identity.
///
/// Serialized in full for storage only; API responses go through
/// [`UserResponse`] so the password hash never leaves the server.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: PrincipalId,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profession: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Principal")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// A principal that has not been assigned an id yet.
#[derive(Debug, Clone)]
pub struct NewPrincipal {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profession: Option<String>,
    pub bio: Option<String>,
}

/// Public view of a principal.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: PrincipalId,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profession: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl From<&Principal> for UserResponse {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.id,
            email: principal.email.clone(),
            role: principal.role,
            first_name: principal.first_name.clone(),
            last_name: principal.last_name.clone(),
            profession: principal.profession.clone(),
            bio: principal.bio.clone(),
        }
    }
}

/// Request to register a new account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profession: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    /// Defaults to `STUDENT` when omitted.
    #[serde(default)]
    pub role: Option<Role>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ServiceError> {
        validate_email(&self.email)?;
        if self.password.is_empty() {
            return Err(ServiceError::Validation(
                "password: must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Request to authenticate with email and password.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateRequest {
    pub email: String,
    pub password: String,
}

impl AuthenticateRequest {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(ServiceError::Validation(
                "email and password are required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Returned by both registration and authentication.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Signed bearer token.
    pub token: String,
    pub principal_id: PrincipalId,
    /// The account email.
    pub username: String,
    pub role: Role,
}

impl AuthResponse {
    pub fn new(token: String, principal: &Principal) -> Self {
        Self {
            token,
            principal_id: principal.id,
            username: principal.email.clone(),
            role: principal.role,
        }
    }
}

/// Logins recorded for one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDay {
    /// `YYYY-MM-DD`
    pub date: String,
    pub count: u64,
}

/// Partial profile update. Omitted fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profession: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl ProfileUpdateRequest {
    pub fn validate(&self) -> Result<(), ServiceError> {
        check_length("firstName", self.first_name.as_deref(), 2, 50)?;
        check_length("lastName", self.last_name.as_deref(), 2, 50)?;
        check_length("profession", self.profession.as_deref(), 0, 100)?;
        check_length("bio", self.bio.as_deref(), 0, 500)
    }

    /// Copy the provided fields onto `principal`.
    pub fn apply_to(self, principal: &mut Principal) {
        if let Some(first_name) = self.first_name {
            principal.first_name = Some(first_name);
        }
        if let Some(last_name) = self.last_name {
            principal.last_name = Some(last_name);
        }
        if let Some(profession) = self.profession {
            principal.profession = Some(profession);
        }
        if let Some(bio) = self.bio {
            principal.bio = Some(bio);
        }
    }
}

fn check_length(
    field: &str,
    value: Option<&str>,
    min: usize,
    max: usize,
) -> Result<(), ServiceError> {
    let Some(value) = value else {
        return Ok(());
    };
    let len = value.chars().count();
    if len < min || len > max {
        let message = if min == 0 {
            format!("{field}: must not exceed {max} characters")
        } else {
            format!("{field}: must be between {min} and {max} characters")
        };
        return Err(ServiceError::Validation(message));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), ServiceError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ServiceError::Validation(
            "email: must be a well-formed email address".to_string(),
        ))
    }
}

// =============================================================================
// Courses and Modules
// =============================================================================

/// A course authored by a tutor.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    /// Owner. Fixed at creation.
    pub tutor_id: PrincipalId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    pub is_published: bool,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Course {
    /// Overwrite the editable fields. `id`, `tutor_id` and `created_at`
    /// are left untouched.
    pub fn apply(&mut self, request: CourseRequest) {
        self.title = request.title;
        self.description = request.description;
        self.price = request.price;
        self.is_published = request.is_published;
        self.category = request.category;
        self.level = request.level;
        self.thumbnail = request.thumbnail;
    }
}

/// Create/update body for a course.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl CourseRequest {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.title.trim().is_empty() {
            return Err(ServiceError::Validation("title: must not be blank".to_string()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ServiceError::Validation(
                "price: must be a non-negative amount".to_string(),
            ));
        }
        Ok(())
    }
}

/// A unit of course content.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: ModuleId,
    /// Parent course. Fixed at creation; ownership resolves through it.
    pub course_id: CourseId,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub notes_url: Option<String>,
}

impl Module {
    pub fn apply(&mut self, request: ModuleRequest) {
        self.title = request.title;
        self.content = request.content;
        self.video_url = request.video_url;
        self.notes_url = request.notes_url;
    }
}

/// Create/update body for a module.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRequest {
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub notes_url: Option<String>,
}

impl ModuleRequest {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.title.trim().is_empty() {
            return Err(ServiceError::Validation("title: must not be blank".to_string()));
        }
        Ok(())
    }
}

// =============================================================================
// Enrollments and Wishlist
// =============================================================================

/// A student's enrollment in a course.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: u64,
    /// Owner.
    pub user_id: PrincipalId,
    pub course_id: CourseId,
    pub enrolled_at: DateTime<Utc>,
    /// Percentage, 0 to 100.
    pub progress: u8,
    #[serde(default)]
    pub last_accessed: Option<DateTime<Utc>>,
}

/// Body for `PUT /v1/enrollments/{course_id}/progress`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRequest {
    pub progress: u8,
}

impl ProgressRequest {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.progress > 100 {
            return Err(ServiceError::Validation(
                "progress: must be between 0 and 100".to_string(),
            ));
        }
        Ok(())
    }
}

/// Enrollment status of the caller for one course.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentStatus {
    pub course_id: CourseId,
    pub enrolled: bool,
}

/// A course saved to a user's wishlist.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub id: u64,
    /// Owner.
    pub user_id: PrincipalId,
    pub course_id: CourseId,
    pub added_at: DateTime<Utc>,
}

// =============================================================================
// Discussions
// =============================================================================

/// A discussion post or reply under a module.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Discussion {
    pub id: DiscussionId,
    pub author_id: PrincipalId,
    /// Always equal to the module's `course_id`.
    pub course_id: CourseId,
    pub module_id: ModuleId,
    #[serde(default)]
    pub parent_id: Option<DiscussionId>,
    pub content: String,
    pub upvotes: u64,
    pub created_at: DateTime<Utc>,
}

/// Body for `POST /v1/discussions`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDiscussionRequest {
    pub module_id: ModuleId,
    pub content: String,
}

/// Body for `POST /v1/discussions/{id}/reply`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    pub content: String,
}

/// Shared check for post and reply bodies.
pub fn validate_discussion_content(content: &str) -> Result<(), ServiceError> {
    if content.trim().is_empty() {
        return Err(ServiceError::Validation("content: must not be blank".to_string()));
    }
    if content.chars().count() > MAX_DISCUSSION_LEN {
        return Err(ServiceError::Validation(format!(
            "content: must be at most {MAX_DISCUSSION_LEN} characters"
        )));
    }
    Ok(())
}
