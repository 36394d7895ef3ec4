//
//  atlas-client
//  lib.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Atlas Client Library
//!
//! A client for the Atlas build and artifact hosting API.
//!
//! ## Overview
//!
//! The library covers three concerns:
//!
//! - **Requests**: an [`AtlasClient`] that authenticates calls, decodes the
//!   success and error encodings of both API generations, and exposes typed
//!   accessors for applications, artifacts, build configurations, Terraform
//!   configurations and remote state
//! - **Uploads**: streaming a payload to the upload path a resource hands out
//! - **Packaging**: turning a source tree into a gzipped tarball, optionally
//!   limited to the files a version control system tracks
//!
//! ## Module Structure
//!
//! - [`api`]: HTTP client, error taxonomy and resource endpoints
//! - [`auth`]: token transports and password login
//! - [`config`]: client settings from files and the environment
//! - [`archive`]: tar.gz packaging with include/exclude filtering
//! - [`vcs`]: detection of git, Mercurial and Subversion checkouts
//! - [`util`]: small helpers shared by the modules above
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use atlas_client::archive::{self, ArchiveOptions};
//! use atlas_client::api::v1::TerraformConfigVersion;
//! use atlas_client::AtlasClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AtlasClient::from_env()?;
//!
//! let options = ArchiveOptions { vcs: true, ..Default::default() };
//! let archive = archive::create_spooled("./infra".as_ref(), &options)?;
//! let version = TerraformConfigVersion {
//!     metadata: archive.metadata().clone(),
//!     ..Default::default()
//! };
//! let size = archive.size().unwrap_or_default();
//!
//! let number = client
//!     .create_terraform_config_version("hashicorp", "infra", &version, archive, size)
//!     .await?;
//! println!("uploaded version {}", number);
//! # Ok(())
//! # }
//! ```
//!
//! ## API Generations
//!
//! | | Query token (`/api/v1`) | Header token (`/api/v2`) |
//! |---|---|---|
//! | Token | `access_token` parameter | `X-Atlas-Token` header |
//! | Bodies | `{"<resource>": {...}}` | JSON-API documents |
//! | Errors | `{"errors": {"field": [...]}}` | `{"errors": [{"title", "detail"}]}` |

/// HTTP client and resource endpoints.
pub mod api;

/// Tar.gz packaging of files and directory trees.
pub mod archive;

/// Token transports and login.
pub mod auth;

/// Client configuration.
///
/// Settings live in platform-specific locations:
/// - Linux: `~/.config/atlas-client/config.toml`
/// - macOS: `~/Library/Application Support/atlas-client/config.toml`
/// - Windows: `%APPDATA%\atlas-client\config.toml`
pub mod config;

/// Shared helpers.
pub mod util;

/// Version control detection and file listing.
pub mod vcs;

pub use api::{ApiError, AtlasClient};
pub use config::ClientConfig;

/// Application name, used for the configuration directory.
pub const APP_NAME: &str = "atlas-client";

/// Crate version, from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// `User-Agent` sent with every request.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
