// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership and enrollment authorization.
//!
//! Every mutation of a catalogue record passes through one of these checks
//! before it is written. The checks are pure functions of the caller and the
//! records, so handlers run them inside the same write transaction as the
//! mutation they guard.
//!
//! Ownership is strict id equality. No role, Admin included, bypasses it.

use super::{Lookup, ReadScope, StoreResult, WriteScope, ENROLLMENT_INDEX};
use crate::error::ServiceError;
use crate::models::{
    Course, CourseId, Discussion, Enrollment, Module, Principal, PrincipalId, WishlistItem,
};

/// A record with a fixed owner.
pub trait Owned {
    /// Name used in denial messages.
    const KIND: &'static str;

    fn owner_id(&self) -> PrincipalId;
}

impl Owned for Course {
    const KIND: &'static str = "course";

    fn owner_id(&self) -> PrincipalId {
        self.tutor_id
    }
}

impl Owned for Enrollment {
    const KIND: &'static str = "enrollment";

    fn owner_id(&self) -> PrincipalId {
        self.user_id
    }
}

impl Owned for WishlistItem {
    const KIND: &'static str = "wishlist item";

    fn owner_id(&self) -> PrincipalId {
        self.user_id
    }
}

impl Owned for Discussion {
    const KIND: &'static str = "discussion";

    fn owner_id(&self) -> PrincipalId {
        self.author_id
    }
}

/// Answers whether a principal is enrolled in a course.
pub trait EnrollmentLookup {
    fn is_enrolled(&self, user_id: PrincipalId, course_id: CourseId) -> StoreResult<bool>;
}

impl EnrollmentLookup for ReadScope {
    fn is_enrolled(&self, user_id: PrincipalId, course_id: CourseId) -> StoreResult<bool> {
        Ok(self
            .get_indexed(ENROLLMENT_INDEX, (user_id, course_id))?
            .is_some())
    }
}

impl EnrollmentLookup for WriteScope {
    fn is_enrolled(&self, user_id: PrincipalId, course_id: CourseId) -> StoreResult<bool> {
        Ok(self
            .get_indexed(ENROLLMENT_INDEX, (user_id, course_id))?
            .is_some())
    }
}

pub fn is_owner<R: Owned>(principal: &Principal, resource: &R) -> bool {
    principal.id == resource.owner_id()
}

/// Deny unless the principal owns the resource.
pub fn require_owner<R: Owned>(principal: &Principal, resource: &R) -> Result<(), ServiceError> {
    if is_owner(principal, resource) {
        Ok(())
    } else {
        tracing::debug!(
            principal_id = principal.id,
            owner_id = resource.owner_id(),
            kind = R::KIND,
            "Ownership check failed"
        );
        Err(ServiceError::access_denied(format!(
            "You do not own this {}",
            R::KIND
        )))
    }
}

/// Deny unless the principal owns the course or is enrolled in it.
pub fn require_owner_or_enrolled(
    principal: &Principal,
    course: &Course,
    enrollments: &impl EnrollmentLookup,
) -> Result<(), ServiceError> {
    if is_owner(principal, course) || enrollments.is_enrolled(principal.id, course.id)? {
        return Ok(());
    }
    Err(ServiceError::access_denied(
        "You must own or be enrolled in this course",
    ))
}

/// A reply belongs to the course of its parent's module.
///
/// A mismatch means stored data is inconsistent and is reported as an
/// internal failure.
pub fn require_same_course(parent: &Discussion, module: &Module) -> Result<(), ServiceError> {
    if parent.course_id == module.course_id && parent.module_id == module.id {
        Ok(())
    } else {
        Err(ServiceError::Internal(format!(
            "discussion {} references course {} but its module {} belongs to course {}",
            parent.id, parent.course_id, module.id, module.course_id
        )))
    }
}

/// Turn a missing record into [`ServiceError::ResourceNotFound`].
pub trait OrNotFound<T> {
    fn or_not_found(self, resource: &str, id: u64) -> Result<T, ServiceError>;
}

impl<T> OrNotFound<T> for Option<T> {
    fn or_not_found(self, resource: &str, id: u64) -> Result<T, ServiceError> {
        self.ok_or_else(|| ServiceError::not_found(resource, id))
    }
}

impl<T> OrNotFound<T> for StoreResult<Option<T>> {
    fn or_not_found(self, resource: &str, id: u64) -> Result<T, ServiceError> {
        self?.or_not_found(resource, id)
    }
}
