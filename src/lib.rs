// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! StudySync Server - Course Catalogue API
//!
//! This crate serves a catalogue of courses, modules, enrollments, wishlists
//! and discussion threads behind stateless bearer-token authentication.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token issuance, credential checks and the per-request
//!   authentication layer
//! - `storage` - Embedded redb store and the ownership/enrollment policy

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
