//
//  atlas-client
//  api/v1/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Atlas API v1 (query-token generation).
//!
//! Each resource nests under a key named after it, e.g.
//! `{"artifact": {...}}`, and validation failures come back as
//! `{"errors": {"field": ["message"]}}`. Calls are methods on
//! [`AtlasClient`](crate::api::AtlasClient), grouped by resource:
//!
//! - [`applications`] - Vagrant applications and their versions
//! - [`artifacts`] - Artifacts, artifact versions and search
//! - [`build_configs`] - Packer build configurations
//! - [`terraform`] - Terraform configurations and environment variables
//!
//! # Example
//!
//! ```rust,no_run
//! use atlas_client::api::AtlasClient;
//!
//! # async fn example() -> Result<(), atlas_client::api::common::ApiError> {
//! let client = AtlasClient::from_env()?;
//! match client.artifact("hashicorp", "web").await {
//!     Ok(artifact) => println!("found {}", artifact.slug()),
//!     Err(e) if e.is_not_found() => println!("no such artifact"),
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```

pub mod applications;
pub mod artifacts;
pub mod build_configs;
pub mod terraform;

pub use applications::*;
pub use artifacts::*;
pub use build_configs::*;
pub use terraform::*;

use serde::{Deserialize, Serialize};

/// Where to send a payload, as issued by a version-creating call.
///
/// Single use; the upload path stops working once the upload completes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadDescriptor {
    /// Upload target, usually on a separate storage host
    pub upload_path: String,

    /// Opaque upload token, when the endpoint issues one
    #[serde(default)]
    pub token: Option<String>,

    /// Version number the upload will become, when known
    #[serde(default)]
    pub version: Option<u64>,
}

/// Joins a user and resource name the way Atlas displays them.
pub(crate) fn slug(user: &str, name: &str) -> String {
    format!("{}/{}", user, name)
}
