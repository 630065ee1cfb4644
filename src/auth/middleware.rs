// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Installed once on the whole router. For every request it resolves the
//! bearer token (if any) into a [`SecurityContext`] and stores it in the
//! request extensions before the handler runs. It never rejects a request:
//! a missing or bad token yields an anonymous context, and handlers that
//! need identity reject through their extractor.
//!
//! ```text
//! NoToken ──────────────────────────────▶ anonymous
//! TokenExtracted ─▶ Rejected ───────────▶ anonymous (reason logged)
//!                └▶ Verified(principal) ─▶ authenticated
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use super::{SecurityContext, TokenCodec};
use crate::models::Principal;
use crate::storage::PrincipalStore;

const BEARER_PREFIX: &str = "Bearer ";

/// Result of resolving one request's credentials.
#[derive(Debug)]
pub enum AuthOutcome {
    /// No usable `Authorization: Bearer` header.
    NoToken,
    /// A token was present but did not yield a principal.
    Rejected(&'static str),
    Verified(Principal),
}

/// Turns a bearer token into a principal.
#[derive(Clone)]
pub struct RequestAuthenticator {
    tokens: Arc<TokenCodec>,
    principals: Arc<dyn PrincipalStore>,
    lookup_timeout: Duration,
}

impl RequestAuthenticator {
    pub fn new(
        tokens: Arc<TokenCodec>,
        principals: Arc<dyn PrincipalStore>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            tokens,
            principals,
            lookup_timeout,
        }
    }

    /// Resolve the request headers into an [`AuthOutcome`].
    pub async fn resolve(&self, headers: &HeaderMap) -> AuthOutcome {
        let Some(token) = bearer_token(headers) else {
            return AuthOutcome::NoToken;
        };

        let claims = match self.tokens.verify(token) {
            Ok(claims) => claims,
            Err(e) => return AuthOutcome::Rejected(e.error_code()),
        };

        // Storage may block; keep it off the async workers and bounded.
        let principals = self.principals.clone();
        let subject = claims.sub;
        let lookup = tokio::task::spawn_blocking(move || principals.find_by_email(&subject));

        match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(Ok(Ok(Some(principal)))) => AuthOutcome::Verified(principal),
            Ok(Ok(Ok(None))) => AuthOutcome::Rejected("unknown_principal"),
            Ok(Ok(Err(e))) => {
                warn!(error = %e, "Principal lookup failed");
                AuthOutcome::Rejected("principal_lookup_failed")
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Principal lookup task failed");
                AuthOutcome::Rejected("principal_lookup_failed")
            }
            Err(_) => {
                warn!(timeout_ms = self.lookup_timeout.as_millis() as u64, "Principal lookup timed out");
                AuthOutcome::Rejected("principal_lookup_timeout")
            }
        }
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix(BEARER_PREFIX)?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Authentication middleware function.
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/v1/courses", get(list_courses))
///     .layer(axum::middleware::from_fn_with_state(
///         authenticator,
///         authenticate_request,
///     ));
/// ```
pub async fn authenticate_request(
    State(authenticator): State<RequestAuthenticator>,
    mut request: Request,
    next: Next,
) -> Response {
    // Populated once; an existing context is left as is.
    if request.extensions().get::<SecurityContext>().is_none() {
        let context = match authenticator.resolve(request.headers()).await {
            AuthOutcome::Verified(principal) => {
                debug!(principal_id = principal.id, "Request authenticated");
                SecurityContext::authenticated(principal)
            }
            AuthOutcome::Rejected(reason) => {
                debug!(reason, "Bearer token rejected");
                SecurityContext::anonymous()
            }
            AuthOutcome::NoToken => SecurityContext::anonymous(),
        };
        request.extensions_mut().insert(context);
    }

    next.run(request).await
}
