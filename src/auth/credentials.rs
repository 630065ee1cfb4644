// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registration and password authentication.
//!
//! Passwords are stored as Argon2id PHC strings. Both operations end by
//! issuing a bearer token and recording a login. The activity write is
//! best-effort: inside a Tokio runtime it is detached onto the blocking pool,
//! so a slow or failing recorder never delays or fails the call.
//!
//! These functions hash passwords and are CPU-bound. Async callers run them
//! on the blocking pool.

use std::sync::Arc;

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, SaltString};
use tracing::{debug, info, warn};

use super::token::TokenCodec;
use crate::error::ServiceError;
use crate::models::{AuthenticateRequest, NewPrincipal, Principal, RegisterRequest};
use crate::storage::{ActivityRecorder, PrincipalStore, StoreError};

/// Hashed at startup and verified against when the email is unknown.
const DUMMY_PASSWORD: &str = "studysync-timing-equalizer";

pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| ServiceError::Internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Registers principals and checks their credentials.
pub struct CredentialService {
    principals: Arc<dyn PrincipalStore>,
    activity: Arc<dyn ActivityRecorder>,
    tokens: Arc<TokenCodec>,
    dummy_hash: String,
}

impl CredentialService {
    pub fn new(
        principals: Arc<dyn PrincipalStore>,
        activity: Arc<dyn ActivityRecorder>,
        tokens: Arc<TokenCodec>,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            principals,
            activity,
            tokens,
            dummy_hash: hash_password(DUMMY_PASSWORD)?,
        })
    }

    /// Create a principal and issue its first token.
    ///
    /// Fails with [`ServiceError::DuplicateEmail`] when the email is taken,
    /// including when a concurrent registration wins the race.
    pub fn register(&self, request: RegisterRequest) -> Result<(Principal, String), ServiceError> {
        request.validate()?;

        if self.principals.find_by_email(&request.email)?.is_some() {
            debug!("Registration rejected: email taken");
            return Err(ServiceError::DuplicateEmail);
        }

        let new = NewPrincipal {
            password_hash: hash_password(&request.password)?,
            email: request.email,
            role: request.role.unwrap_or_default(),
            first_name: request.first_name,
            last_name: request.last_name,
            profession: request.profession,
            bio: request.bio,
        };

        let principal = self.principals.save(new).map_err(|e| match e {
            StoreError::UniqueViolation(_) => ServiceError::DuplicateEmail,
            other => other.into(),
        })?;

        let token = self.issue(&principal)?;
        self.record_login(&principal);

        info!(principal_id = principal.id, role = %principal.role, "Registered principal");
        Ok((principal, token))
    }

    /// Check an email/password pair and issue a token.
    ///
    /// An unknown email and a wrong password fail identically.
    pub fn authenticate(
        &self,
        request: AuthenticateRequest,
    ) -> Result<(Principal, String), ServiceError> {
        request.validate()?;

        let principal = match self.principals.find_by_email(&request.email)? {
            Some(principal) if verify_password(&request.password, &principal.password_hash) => {
                principal
            }
            Some(_) => {
                debug!("Authentication failed");
                return Err(ServiceError::InvalidCredentials);
            }
            None => {
                let _ = verify_password(&request.password, &self.dummy_hash);
                debug!("Authentication failed");
                return Err(ServiceError::InvalidCredentials);
            }
        };

        let token = self.issue(&principal)?;
        self.record_login(&principal);

        debug!(principal_id = principal.id, "Authenticated principal");
        Ok((principal, token))
    }

    fn issue(&self, principal: &Principal) -> Result<String, ServiceError> {
        self.tokens
            .issue(principal)
            .map_err(|e| ServiceError::Internal(e.to_string()))
    }

    fn record_login(&self, principal: &Principal) {
        let activity = Arc::clone(&self.activity);
        let principal_id = principal.id;
        let record = move || {
            if let Err(e) = activity.record_login(principal_id) {
                warn!(principal_id, error = %e, "Failed to record login activity");
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(record);
            }
            // No runtime (sync callers and tests): record inline.
            Err(_) => record(),
        }
    }
}
