// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token errors.
//!
//! These never reach an HTTP caller. The authentication layer absorbs them
//! and the request continues unauthenticated; the code is only logged.

/// Token issuance/verification error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Segments, header or claims are not well-formed
    Malformed,
    /// Signature does not match the configured key
    InvalidSignature,
    /// `now >= exp`
    Expired,
    /// Signing failed while issuing
    Encoding(String),
}

impl TokenError {
    /// Get the code for this error (used in logs).
    pub fn error_code(&self) -> &'static str {
        match self {
            TokenError::Malformed => "malformed_token",
            TokenError::InvalidSignature => "invalid_signature",
            TokenError::Expired => "token_expired",
            TokenError::Encoding(_) => "token_encoding",
        }
    }
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "Token is malformed"),
            TokenError::InvalidSignature => write!(f, "Token signature is invalid"),
            TokenError::Expired => write!(f, "Token has expired"),
            TokenError::Encoding(msg) => write!(f, "Failed to sign token: {msg}"),
        }
    }
}

impl std::error::Error for TokenError {}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match e.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}
