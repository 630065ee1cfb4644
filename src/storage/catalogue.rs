// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Typed access to courses, modules, enrollments, wishlist items and
//! discussions.
//!
//! Reads are available in both scopes through [`CatalogueRead`]. Writes
//! exist only on [`WriteScope`], so callers can run the ownership checks and
//! the mutation in one transaction.

use chrono::Utc;

use super::{
    Lookup, StoreResult, WriteScope, COURSES, DISCUSSIONS, ENROLLMENTS, ENROLLMENT_INDEX,
    MODULES, WISHLIST, WISHLIST_INDEX,
};
use crate::models::{
    Course, CourseId, CourseRequest, Discussion, DiscussionId, Enrollment, Module, ModuleId,
    ModuleRequest, PrincipalId, WishlistItem,
};

/// Conflict message for a second enrollment in the same course.
pub const ALREADY_ENROLLED: &str = "Already enrolled in this course";

/// Conflict message for a course already on the wishlist.
pub const ALREADY_WISHLISTED: &str = "Course is already in the wishlist";

/// Typed catalogue reads.
pub trait CatalogueRead: Lookup + Sized {
    fn course(&self, id: CourseId) -> StoreResult<Option<Course>> {
        self.get_decoded(COURSES, id)
    }

    fn module(&self, id: ModuleId) -> StoreResult<Option<Module>> {
        self.get_decoded(MODULES, id)
    }

    fn discussion(&self, id: DiscussionId) -> StoreResult<Option<Discussion>> {
        self.get_decoded(DISCUSSIONS, id)
    }

    fn enrollment_for(
        &self,
        user_id: PrincipalId,
        course_id: CourseId,
    ) -> StoreResult<Option<Enrollment>> {
        match self.get_indexed(ENROLLMENT_INDEX, (user_id, course_id))? {
            Some(id) => self.get_decoded(ENROLLMENTS, id),
            None => Ok(None),
        }
    }

    fn wishlist_item_for(
        &self,
        user_id: PrincipalId,
        course_id: CourseId,
    ) -> StoreResult<Option<WishlistItem>> {
        match self.get_indexed(WISHLIST_INDEX, (user_id, course_id))? {
            Some(id) => self.get_decoded(WISHLIST, id),
            None => Ok(None),
        }
    }

    fn published_courses(&self) -> StoreResult<Vec<Course>> {
        let mut courses: Vec<Course> = self.scan_decoded(COURSES)?;
        courses.retain(|c| c.is_published);
        Ok(courses)
    }

    fn courses_by_tutor(&self, tutor_id: PrincipalId) -> StoreResult<Vec<Course>> {
        let mut courses: Vec<Course> = self.scan_decoded(COURSES)?;
        courses.retain(|c| c.tutor_id == tutor_id);
        Ok(courses)
    }

    /// Modules of a course in creation order.
    fn modules_of(&self, course_id: CourseId) -> StoreResult<Vec<Module>> {
        let mut modules: Vec<Module> = self.scan_decoded(MODULES)?;
        modules.retain(|m| m.course_id == course_id);
        Ok(modules)
    }

    fn enrollments_of(&self, user_id: PrincipalId) -> StoreResult<Vec<Enrollment>> {
        let mut enrollments: Vec<Enrollment> = self.scan_decoded(ENROLLMENTS)?;
        enrollments.retain(|e| e.user_id == user_id);
        Ok(enrollments)
    }

    /// Newest first.
    fn wishlist_of(&self, user_id: PrincipalId) -> StoreResult<Vec<WishlistItem>> {
        let mut items: Vec<WishlistItem> = self.scan_decoded(WISHLIST)?;
        items.retain(|i| i.user_id == user_id);
        items.sort_by(|a, b| b.added_at.cmp(&a.added_at).then(b.id.cmp(&a.id)));
        Ok(items)
    }

    /// Top-level posts under a module, newest first.
    fn threads_of(&self, module_id: ModuleId) -> StoreResult<Vec<Discussion>> {
        let mut posts: Vec<Discussion> = self.scan_decoded(DISCUSSIONS)?;
        posts.retain(|d| d.module_id == module_id && d.parent_id.is_none());
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(posts)
    }

    /// Replies to a post, oldest first.
    fn replies_to(&self, parent_id: DiscussionId) -> StoreResult<Vec<Discussion>> {
        let mut replies: Vec<Discussion> = self.scan_decoded(DISCUSSIONS)?;
        replies.retain(|d| d.parent_id == Some(parent_id));
        Ok(replies)
    }
}

impl<T: Lookup> CatalogueRead for T {}

impl WriteScope {
    // =========================================================================
    // Courses
    // =========================================================================

    pub fn create_course(&self, tutor_id: PrincipalId, request: CourseRequest) -> StoreResult<Course> {
        let course = Course {
            id: self.next_id("courses")?,
            tutor_id,
            title: request.title,
            description: request.description,
            price: request.price,
            is_published: request.is_published,
            category: request.category,
            level: request.level,
            thumbnail: request.thumbnail,
            created_at: Utc::now(),
        };
        self.put_record(COURSES, course.id, &course)?;
        Ok(course)
    }

    pub fn save_course(&self, course: &Course) -> StoreResult<()> {
        self.put_record(COURSES, course.id, course)
    }

    /// Delete a course with its modules, enrollments, wishlist entries and
    /// discussions.
    pub fn delete_course(&self, course_id: CourseId) -> StoreResult<()> {
        for module in self.modules_of(course_id)? {
            self.delete_module(&module)?;
        }

        let enrollments: Vec<Enrollment> = self.scan_decoded(ENROLLMENTS)?;
        for enrollment in enrollments.iter().filter(|e| e.course_id == course_id) {
            self.release_index(ENROLLMENT_INDEX, (enrollment.user_id, course_id))?;
            self.remove_record(ENROLLMENTS, enrollment.id)?;
        }

        let items: Vec<WishlistItem> = self.scan_decoded(WISHLIST)?;
        for item in items.iter().filter(|i| i.course_id == course_id) {
            self.remove_wishlist_item(item)?;
        }

        self.remove_record(COURSES, course_id)
    }

    // =========================================================================
    // Modules
    // =========================================================================

    pub fn create_module(&self, course_id: CourseId, request: ModuleRequest) -> StoreResult<Module> {
        let module = Module {
            id: self.next_id("modules")?,
            course_id,
            title: request.title,
            content: request.content,
            video_url: request.video_url,
            notes_url: request.notes_url,
        };
        self.put_record(MODULES, module.id, &module)?;
        Ok(module)
    }

    pub fn save_module(&self, module: &Module) -> StoreResult<()> {
        self.put_record(MODULES, module.id, module)
    }

    /// Delete a module and every discussion posted under it.
    pub fn delete_module(&self, module: &Module) -> StoreResult<()> {
        let discussions: Vec<Discussion> = self.scan_decoded(DISCUSSIONS)?;
        for discussion in discussions.iter().filter(|d| d.module_id == module.id) {
            self.remove_record(DISCUSSIONS, discussion.id)?;
        }
        self.remove_record(MODULES, module.id)
    }

    // =========================================================================
    // Enrollments
    // =========================================================================

    pub fn enroll(&self, user_id: PrincipalId, course_id: CourseId) -> StoreResult<Enrollment> {
        let id = self.next_id("enrollments")?;
        self.claim_index(ENROLLMENT_INDEX, (user_id, course_id), id, ALREADY_ENROLLED)?;

        let enrollment = Enrollment {
            id,
            user_id,
            course_id,
            enrolled_at: Utc::now(),
            progress: 0,
            last_accessed: None,
        };
        self.put_record(ENROLLMENTS, id, &enrollment)?;
        Ok(enrollment)
    }

    pub fn save_enrollment(&self, enrollment: &Enrollment) -> StoreResult<()> {
        self.put_record(ENROLLMENTS, enrollment.id, enrollment)
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    pub fn add_to_wishlist(
        &self,
        user_id: PrincipalId,
        course_id: CourseId,
    ) -> StoreResult<WishlistItem> {
        let id = self.next_id("wishlist")?;
        self.claim_index(WISHLIST_INDEX, (user_id, course_id), id, ALREADY_WISHLISTED)?;

        let item = WishlistItem {
            id,
            user_id,
            course_id,
            added_at: Utc::now(),
        };
        self.put_record(WISHLIST, id, &item)?;
        Ok(item)
    }

    pub fn remove_wishlist_item(&self, item: &WishlistItem) -> StoreResult<()> {
        self.release_index(WISHLIST_INDEX, (item.user_id, item.course_id))?;
        self.remove_record(WISHLIST, item.id)
    }

    // =========================================================================
    // Discussions
    // =========================================================================

    pub fn create_discussion(
        &self,
        author_id: PrincipalId,
        module: &Module,
        parent_id: Option<DiscussionId>,
        content: String,
    ) -> StoreResult<Discussion> {
        let discussion = Discussion {
            id: self.next_id("discussions")?,
            author_id,
            course_id: module.course_id,
            module_id: module.id,
            parent_id,
            content,
            upvotes: 0,
            created_at: Utc::now(),
        };
        self.put_record(DISCUSSIONS, discussion.id, &discussion)?;
        Ok(discussion)
    }

    pub fn save_discussion(&self, discussion: &Discussion) -> StoreResult<()> {
        self.put_record(DISCUSSIONS, discussion.id, discussion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::temp_store;
    use crate::storage::{EnrollmentLookup, StoreError};

    fn course_request(title: &str, published: bool) -> CourseRequest {
        CourseRequest {
            title: title.to_string(),
            description: None,
            price: 0.0,
            is_published: published,
            category: None,
            level: None,
            thumbnail: None,
        }
    }

    fn module_request(title: &str) -> ModuleRequest {
        ModuleRequest {
            title: title.to_string(),
            content: None,
            video_url: None,
            notes_url: None,
        }
    }

    #[test]
    fn listing_filters_by_publication_and_tutor() {
        let (store, _dir) = temp_store();
        store
            .write(|scope| {
                scope.create_course(1, course_request("Public", true))?;
                scope.create_course(1, course_request("Draft", false))?;
                scope.create_course(2, course_request("Other", true))?;
                Ok::<_, StoreError>(())
            })
            .unwrap();

        let (published, mine) = store
            .read(|scope| Ok::<_, StoreError>((scope.published_courses()?, scope.courses_by_tutor(1)?)))
            .unwrap();
        assert_eq!(published.len(), 2);
        assert!(published.iter().all(|c| c.is_published));
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|c| c.tutor_id == 1));
    }

    #[test]
    fn second_enrollment_is_a_unique_violation() {
        let (store, _dir) = temp_store();
        store.write(|scope| scope.enroll(5, 1)).unwrap();

        let second = store.write(|scope| scope.enroll(5, 1));
        assert!(matches!(second, Err(StoreError::UniqueViolation(ref m)) if m == ALREADY_ENROLLED));

        let enrolled = store.read(|scope| scope.is_enrolled(5, 1)).unwrap();
        assert!(enrolled);
        assert_eq!(store.read(|scope| scope.enrollments_of(5)).unwrap().len(), 1);
    }

    #[test]
    fn wishlist_add_remove_and_re_add() {
        let (store, _dir) = temp_store();
        let item = store.write(|scope| scope.add_to_wishlist(5, 1)).unwrap();

        let dup = store.write(|scope| scope.add_to_wishlist(5, 1));
        assert!(matches!(dup, Err(StoreError::UniqueViolation(_))));

        store.write(|scope| scope.remove_wishlist_item(&item)).unwrap();
        assert!(store.read(|scope| scope.wishlist_item_for(5, 1)).unwrap().is_none());

        assert!(store.write(|scope| scope.add_to_wishlist(5, 1)).is_ok());
    }

    #[test]
    fn threads_exclude_replies() {
        let (store, _dir) = temp_store();
        let module = store
            .write(|scope| {
                let course = scope.create_course(1, course_request("Rust", true))?;
                scope.create_module(course.id, module_request("Intro"))
            })
            .unwrap();

        let post = store
            .write(|scope| scope.create_discussion(2, &module, None, "Question".into()))
            .unwrap();
        store
            .write(|scope| scope.create_discussion(1, &module, Some(post.id), "Answer".into()))
            .unwrap();

        let threads = store.read(|scope| scope.threads_of(module.id)).unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].id, post.id);
        assert_eq!(threads[0].course_id, module.course_id);

        let replies = store.read(|scope| scope.replies_to(post.id)).unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].content, "Answer");
    }

    #[test]
    fn deleting_course_cascades() {
        let (store, _dir) = temp_store();
        let (course, module) = store
            .write(|scope| {
                let course = scope.create_course(1, course_request("Rust", true))?;
                let module = scope.create_module(course.id, module_request("Intro"))?;
                scope.enroll(5, course.id)?;
                scope.add_to_wishlist(6, course.id)?;
                scope.create_discussion(5, &module, None, "hi".into())?;
                Ok::<_, StoreError>((course, module))
            })
            .unwrap();

        store.write(|scope| scope.delete_course(course.id)).unwrap();

        store
            .read(|scope| {
                assert!(scope.course(course.id)?.is_none());
                assert!(scope.module(module.id)?.is_none());
                assert!(!scope.is_enrolled(5, course.id)?);
                assert!(scope.enrollments_of(5)?.is_empty());
                assert!(scope.wishlist_item_for(6, course.id)?.is_none());
                assert!(scope.threads_of(module.id)?.is_empty());
                Ok::<_, StoreError>(())
            })
            .unwrap();
    }
}
