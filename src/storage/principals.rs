// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Principal persistence and the login activity log.
//!
//! The credential service and the request authenticator only see the two
//! traits below, so tests can substitute failing or slow implementations.

use chrono::Utc;
use redb::ReadableTable;

use super::{
    Lookup, ReadScope, Store, StoreError, StoreResult, WriteScope, ACTIVITY, PRINCIPALS,
    PRINCIPAL_EMAIL,
};
use crate::models::{ActivityDay, NewPrincipal, Principal, PrincipalId, ProfileUpdateRequest};

/// Message carried by the uniqueness violation on a taken email.
pub const EMAIL_TAKEN: &str = "email already registered";

/// Loads and saves principals.
pub trait PrincipalStore: Send + Sync {
    fn find_by_email(&self, email: &str) -> StoreResult<Option<Principal>>;

    fn find_by_id(&self, id: PrincipalId) -> StoreResult<Option<Principal>>;

    /// Persist a new principal.
    ///
    /// The email check and the insert happen in one write transaction;
    /// a taken email yields [`StoreError::UniqueViolation`].
    fn save(&self, principal: NewPrincipal) -> StoreResult<Principal>;
}

/// Records logins. Callers treat failures as non-fatal.
pub trait ActivityRecorder: Send + Sync {
    fn record_login(&self, principal_id: PrincipalId) -> StoreResult<()>;
}

impl ReadScope {
    pub fn principal_by_email(&self, email: &str) -> StoreResult<Option<Principal>> {
        let index = self.txn().open_table(PRINCIPAL_EMAIL)?;
        let id = index.get(email)?.map(|v| v.value());
        match id {
            Some(id) => self.get_decoded(PRINCIPALS, id),
            None => Ok(None),
        }
    }

    pub fn activity_of(&self, principal_id: PrincipalId) -> StoreResult<Vec<ActivityDay>> {
        let table = self.txn().open_table(ACTIVITY)?;
        let mut days = Vec::new();
        for entry in table.range((principal_id, "")..(principal_id.saturating_add(1), ""))? {
            let (key, count) = entry?;
            let (_, date) = key.value();
            days.push(ActivityDay {
                date: date.to_string(),
                count: count.value(),
            });
        }
        Ok(days)
    }
}

impl WriteScope {
    fn insert_principal(&self, new: NewPrincipal) -> StoreResult<Principal> {
        {
            let index = self.txn().open_table(PRINCIPAL_EMAIL)?;
            if index.get(new.email.as_str())?.is_some() {
                return Err(StoreError::UniqueViolation(EMAIL_TAKEN.to_string()));
            }
        }

        let principal = Principal {
            id: self.next_id("principals")?,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            first_name: new.first_name,
            last_name: new.last_name,
            profession: new.profession,
            bio: new.bio,
            created_at: Utc::now(),
        };

        self.put_record(PRINCIPALS, principal.id, &principal)?;
        let mut index = self.txn().open_table(PRINCIPAL_EMAIL)?;
        index.insert(principal.email.as_str(), principal.id)?;

        Ok(principal)
    }

    /// Apply a partial profile update. `None` when the principal is gone.
    pub fn update_profile(
        &self,
        id: PrincipalId,
        update: ProfileUpdateRequest,
    ) -> StoreResult<Option<Principal>> {
        let Some(mut principal) = self.get_decoded::<Principal>(PRINCIPALS, id)? else {
            return Ok(None);
        };
        update.apply_to(&mut principal);
        self.put_record(PRINCIPALS, principal.id, &principal)?;
        Ok(Some(principal))
    }

    fn bump_activity(&self, principal_id: PrincipalId, date: &str) -> StoreResult<u64> {
        let mut table = self.txn().open_table(ACTIVITY)?;
        let count = table.get((principal_id, date))?.map(|v| v.value()).unwrap_or(0) + 1;
        table.insert((principal_id, date), count)?;
        Ok(count)
    }
}

impl PrincipalStore for Store {
    fn find_by_email(&self, email: &str) -> StoreResult<Option<Principal>> {
        self.read(|scope| scope.principal_by_email(email))
    }

    fn find_by_id(&self, id: PrincipalId) -> StoreResult<Option<Principal>> {
        self.read(|scope| scope.get_decoded(PRINCIPALS, id))
    }

    fn save(&self, principal: NewPrincipal) -> StoreResult<Principal> {
        self.write(|scope| scope.insert_principal(principal))
    }
}

impl ActivityRecorder for Store {
    fn record_login(&self, principal_id: PrincipalId) -> StoreResult<()> {
        let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        let count = self.write(|scope| scope.bump_activity(principal_id, &today))?;
        tracing::debug!(principal_id, date = %today, count, "Recorded login");
        Ok(())
    }
}

impl Store {
    /// Per-day login counts of a principal, oldest day first.
    pub fn activity_of(&self, principal_id: PrincipalId) -> StoreResult<Vec<ActivityDay>> {
        self.read(|scope| scope.activity_of(principal_id))
    }
}
