// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{CredentialService, RequestAuthenticator, TokenCodec};
use crate::error::ServiceError;
use crate::storage::Store;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub tokens: Arc<TokenCodec>,
    pub credentials: Arc<CredentialService>,
    pub authenticator: RequestAuthenticator,
}

impl AppState {
    /// Wire the services over one store.
    ///
    /// The store serves as principal store and activity recorder.
    pub fn new(
        store: Store,
        tokens: Arc<TokenCodec>,
        auth_lookup_timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let principals = Arc::new(store.clone());
        let credentials = CredentialService::new(principals.clone(), principals.clone(), tokens.clone())?;
        let authenticator = RequestAuthenticator::new(tokens.clone(), principals, auth_lookup_timeout);

        Ok(Self {
            store,
            tokens,
            credentials: Arc::new(credentials),
            authenticator,
        })
    }
}
