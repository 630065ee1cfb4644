// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User roles for authorization.
///
/// The set is closed. Authorization decisions match on the variant; the
/// string form only exists on the wire (token `role` claim, API bodies).
///
/// - `Student` - Enrolls in courses, keeps a wishlist, posts in discussions
/// - `Tutor` - Creates courses and owns their content
/// - `Admin` - Operator account; does not bypass ownership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Learner (default for self-registration)
    Student,
    /// Course author
    Tutor,
    /// Operator
    Admin,
}

impl Role {
    /// Parse role from its wire name (case-insensitive).
    pub fn from_str(s: &str) -> Option<Role> {
        match s.to_ascii_uppercase().as_str() {
            "STUDENT" => Some(Role::Student),
            "TUTOR" => Some(Role::Tutor),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Wire name used in token claims.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "STUDENT",
            Role::Tutor => "TUTOR",
            Role::Admin => "ADMIN",
        }
    }
}

impl Default for Role {
    /// Self-registered accounts are students unless a role is supplied.
    fn default() -> Self {
        Role::Student
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
