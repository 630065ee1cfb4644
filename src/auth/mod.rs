// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Stateless bearer-token authentication for the StudySync API.
//!
//! ## Auth Flow
//!
//! 1. A client registers or authenticates with email and password
//!    (`/v1/auth/*`) and receives an HS256-signed token.
//! 2. The client sends `Authorization: Bearer <token>` on later requests.
//! 3. The server, for every request and before any handler:
//!    - Verifies the signature and expiry of the token
//!    - Loads the principal named by the `sub` claim
//!    - Stores a [`SecurityContext`] in the request extensions
//! 4. Handlers read identity through [`Auth`], [`OptionalAuth`] or
//!    [`TutorOnly`].
//!
//! ## Security
//!
//! - No server-side sessions; a token stays valid until `exp`
//! - Invalid, expired or unknown-subject tokens leave the request
//!   anonymous instead of failing it; protected handlers then answer 401
//! - The role stored with the principal is authoritative; the `role` claim
//!   is informational
//! - No expiry leeway

pub mod claims;
pub mod context;
pub mod credentials;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod roles;
pub mod token;

pub use claims::Claims;
pub use context::SecurityContext;
pub use credentials::CredentialService;
pub use error::TokenError;
pub use extractor::{Auth, OptionalAuth, TutorOnly};
pub use middleware::{authenticate_request, AuthOutcome, RequestAuthenticator};
pub use roles::Role;
pub use token::{Clock, ManualClock, SystemClock, TokenCodec};
