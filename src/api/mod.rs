//
//  atlas-client
//  api/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # API Client Layer
//!
//! HTTP access to the Atlas API.
//!
//! ## Module Structure
//!
//! - [`client`]: [`AtlasClient`], request construction and response classification
//! - [`common`]: error types, error bodies and JSON-API documents
//! - [`v1`]: query-token endpoints (applications, artifacts, build
//!   configurations, Terraform)
//! - [`v2`]: header-token JSON-API endpoints (organizations, configurations,
//!   states)
//!
//! File uploads ([`AtlasClient::put_file`], [`AtlasClient::put_archive`])
//! go to the upload path the server hands out, not through the API base URL.
//!
//! ## Status Handling
//!
//! | Status | Result |
//! |--------|--------|
//! | 200-204 | `Ok(Response)` |
//! | 400, 422 | [`ApiError::Validation`] |
//! | 401 | [`ApiError::Auth`] |
//! | 404 | [`ApiError::NotFound`] |
//! | other | [`ApiError::UnexpectedStatus`] |

pub mod client;
pub mod common;
mod upload;
pub mod v1;
pub mod v2;

pub use client::{AtlasClient, RequestOptions, Response};
pub use common::{ApiError, ApiResult};
