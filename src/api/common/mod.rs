//
//  atlas-client
//  api/common/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Common API Types for both Atlas API generations
//!
//! This module provides the types shared by the query-token (`/api/v1`) and
//! header-token (`/api/v2`) resource modules: the error taxonomy, decoded
//! error bodies and JSON-API documents.
//!
//! # Overview
//!
//! - [`ApiError`] - Unified error type for all API operations
//! - [`ErrorBody`] - Structured body of a 4xx response
//! - [`ValidationErrors`] / [`ErrorDocument`] - The two error encodings
//! - [`Document`] / [`Resource`] - JSON-API documents
//!
//! # Example
//!
//! ```rust
//! use atlas_client::api::common::ApiError;
//!
//! fn handle_result<T>(result: Result<T, ApiError>) {
//!     match result {
//!         Ok(_) => println!("Success!"),
//!         Err(e) if e.is_not_found() => println!("Nothing there yet"),
//!         Err(ApiError::Auth(_)) => println!("Please log in first"),
//!         Err(e) => println!("Error: {}", e),
//!     }
//! }
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::archive::ArchiveError;

mod document;
mod errors;

pub use document::*;
pub use errors::*;

/// Result alias used by every client operation.
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified error type for all Atlas API operations.
///
/// # Variants
///
/// | Variant | Description | HTTP Status |
/// |---------|-------------|-------------|
/// | `MissingUrl` / `InvalidUrl` | Client built without a usable address | N/A |
/// | `MissingUsername` / `MissingPassword` | Login called with blank credentials | N/A |
/// | `NotFound` | Requested resource does not exist | 404 |
/// | `Auth` | Token missing, invalid or expired | 401 |
/// | `Validation` | Request rejected with field or document errors | 400, 422 |
/// | `UnexpectedStatus` | Any other non-success status | other |
/// | `Network` | Connection, TLS or protocol failure | N/A |
/// | `Decode` / `MissingKey` | Success body did not have the expected shape | 2xx |
/// | `Certificate` / `Io` | CA material could not be loaded | N/A |
/// | `Archive` | Packaging an upload payload failed | N/A |
///
/// # Example
///
/// ```rust
/// use atlas_client::api::common::ApiError;
///
/// let err = ApiError::NotFound("/api/v1/artifacts/hashicorp/web".to_string());
/// assert!(err.is_not_found());
/// assert_eq!(err.to_string(), "Resource not found: /api/v1/artifacts/hashicorp/web");
/// ```
///
/// # Notes
///
/// - `Network`, `Decode` and `Archive` convert automatically with `?`
/// - A 404 is never reported as anything other than `NotFound`
#[derive(Error, Debug)]
pub enum ApiError {
    /// The client was constructed with an empty address.
    #[error("client address must not be empty")]
    MissingUrl,

    /// The client address could not be parsed.
    ///
    /// # Parameters
    ///
    /// - `0` - The address as given
    /// - `1` - Why it failed to parse
    #[error("invalid client address {0:?}: {1}")]
    InvalidUrl(String, url::ParseError),

    /// Login was called with an empty username.
    #[error("username must not be empty")]
    MissingUsername,

    /// Login was called with an empty password.
    #[error("password must not be empty")]
    MissingPassword,

    /// The requested resource was not found (HTTP 404).
    ///
    /// # Parameters
    ///
    /// - `0` - The request path that was not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Authentication failed (HTTP 401).
    ///
    /// Carries the decoded body when the server sent one.
    #[error("Authentication failed{}", .0.as_ref().map(|b| format!(": {}", b)).unwrap_or_default())]
    Auth(Option<ErrorBody>),

    /// The server rejected the request (HTTP 400 or 422).
    #[error("Validation failed: {0}")]
    Validation(ErrorBody),

    /// Any status the client does not classify further.
    ///
    /// # Parameters
    ///
    /// - `status` - The HTTP status line
    /// - `body` - The response body, decoded lossily
    #[error("Unexpected status code: {status}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    /// A network-level error occurred during the request.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A success body could not be decoded.
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// A query-token envelope did not contain its wrapper key.
    #[error("Response is missing the {0:?} key")]
    MissingKey(String),

    /// A CA certificate could not be parsed.
    #[error("Invalid certificate {}: {source}", .path.display())]
    Certificate {
        path: PathBuf,
        source: reqwest::Error,
    },

    /// A local file needed by the client could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Building an upload archive failed.
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

impl ApiError {
    /// Returns whether this error reports an absent resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// The structured body of an auth or validation failure, if any.
    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            Self::Auth(body) => body.as_ref(),
            Self::Validation(body) => Some(body),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_auth_message_with_and_without_body() {
        assert_eq!(ApiError::Auth(None).to_string(), "Authentication failed");

        let fields = ValidationErrors(BTreeMap::from([(
            "error".to_string(),
            vec!["Bad login details".to_string()],
        )]));
        let err = ApiError::Auth(Some(ErrorBody::Fields(fields)));
        assert_eq!(err.to_string(), "Authentication failed: error: Bad login details");
        assert!(err.body().is_some());
    }

    #[test]
    fn test_not_found_is_distinguished() {
        assert!(ApiError::NotFound("/x".into()).is_not_found());
        assert!(!ApiError::Auth(None).is_not_found());
        assert!(!ApiError::UnexpectedStatus {
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
        }
        .is_not_found());
    }

    #[test]
    fn test_unexpected_status_message() {
        let err = ApiError::UnexpectedStatus {
            status: reqwest::StatusCode::BAD_GATEWAY,
            body: "upstream".into(),
        };
        assert_eq!(err.to_string(), "Unexpected status code: 502 Bad Gateway");
    }
}
