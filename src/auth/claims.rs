// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claim set.

use serde::{Deserialize, Serialize};

use super::roles::Role;
use crate::models::Principal;

/// Claims carried inside a bearer token.
///
/// All four fields are required; a token missing any of them, or carrying a
/// role outside the closed set, fails to decode and is treated as malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - the principal's email
    pub sub: String,

    /// Role at issuance time
    pub role: Role,

    /// Issued at (unix seconds)
    pub iat: i64,

    /// Expiration (unix seconds)
    pub exp: i64,
}

impl Claims {
    /// Build the claim set for a principal.
    pub fn for_principal(principal: &Principal, now: i64, ttl_secs: i64) -> Self {
        Self {
            sub: principal.email.clone(),
            role: principal.role,
            iat: now,
            exp: now.saturating_add(ttl_secs),
        }
    }

    /// A token stops being valid at `exp` itself.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}
