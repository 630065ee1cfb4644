// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-request identity.

use std::sync::Arc;

use crate::models::Principal;

/// Identity resolved for one request.
///
/// Inserted into the request extensions by the authentication layer before
/// any handler runs and never replaced afterwards. Handlers read it through
/// the extractors in [`super::extractor`].
#[derive(Debug, Clone, Default)]
pub struct SecurityContext {
    principal: Option<Arc<Principal>>,
}

impl SecurityContext {
    pub fn anonymous() -> Self {
        Self { principal: None }
    }

    pub fn authenticated(principal: Principal) -> Self {
        Self {
            principal: Some(Arc::new(principal)),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_deref()
    }
}
