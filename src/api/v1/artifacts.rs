//
//  atlas-client
//  api/v1/artifacts.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Artifact API types and calls.
//!
//! An artifact is a named, typed build output (an AMI id, a Docker image, a
//! file). Each upload records a new version carrying an external id and a
//! free-form metadata map, optionally with a file attached.
//!
//! # Example
//!
//! ```rust,no_run
//! use atlas_client::api::v1::{ArtifactSearchOptions, METADATA_ANY_VALUE};
//! use atlas_client::api::AtlasClient;
//!
//! # async fn example() -> Result<(), atlas_client::api::common::ApiError> {
//! let client = AtlasClient::from_env()?;
//! let mut search = ArtifactSearchOptions::new("hashicorp", "web", "amazon.ami");
//! search.metadata.insert("region".to_string(), "us-east-1".to_string());
//! search.metadata.insert("commit".to_string(), METADATA_ANY_VALUE.to_string());
//!
//! for version in client.artifact_search(&search).await? {
//!     println!("v{} {}", version.version, version.external_id);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Notes
//!
//! - Search metadata pairs are sent in key order
//! - A metadata value of [`METADATA_ANY_VALUE`] matches on the key alone

use std::collections::BTreeMap;
use std::io::Read;

use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};

use super::slug;
use crate::api::client::{AtlasClient, RequestOptions};
use crate::api::common::ApiResult;

/// Search metadata value that matches any value for its key.
pub const METADATA_ANY_VALUE: &str = "943febbf-589f-401b-8f25-58f6d8786848";

/// Represents an artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Owning user or organization.
    pub username: String,

    /// Artifact name.
    pub name: String,
}

impl Artifact {
    /// `username/name`.
    pub fn slug(&self) -> String {
        slug(&self.username, &self.name)
    }
}

/// One recorded version of an artifact.
///
/// # Fields
///
/// | Field | Wire name | Description |
/// |-------|-----------|-------------|
/// | `username` | `username` | Owning user |
/// | `name` | `name` | Artifact name |
/// | `artifact_type` | `artifact_type` | Type, e.g. `amazon.ami` |
/// | `external_id` | `external_id` | Id in the outside world, e.g. `ami-1234` |
/// | `version` | `version` | Version number |
/// | `metadata` | `metadata` | Free-form key/value pairs |
/// | `file` | `file` | Whether a file is attached |
/// | `upload_path` | `upload_path` | Where to upload the file |
/// | `upload_token` | `upload_token` | Token for the upload |
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactVersion {
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub artifact_type: String,

    #[serde(default)]
    pub external_id: String,

    #[serde(default)]
    pub version: u64,

    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    #[serde(default)]
    pub file: bool,

    #[serde(default)]
    pub upload_path: String,

    #[serde(default)]
    pub upload_token: String,
}

/// Parameters for [`AtlasClient::artifact_search`].
#[derive(Debug, Clone, Default)]
pub struct ArtifactSearchOptions {
    /// Owning user or organization
    pub user: String,
    /// Artifact name
    pub name: String,
    /// Artifact type, e.g. `amazon.image`
    pub artifact_type: String,

    /// Exact version to match, if any
    pub version: Option<String>,

    /// Metadata that versions must carry; see [`METADATA_ANY_VALUE`]
    pub metadata: BTreeMap<String, String>,
}

impl ArtifactSearchOptions {
    /// Matches every version of one artifact.
    pub fn new(user: &str, name: &str, artifact_type: &str) -> Self {
        Self {
            user: user.to_string(),
            name: name.to_string(),
            artifact_type: artifact_type.to_string(),
            ..Default::default()
        }
    }

    fn params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(version) = self.version.as_deref().filter(|v| !v.is_empty()) {
            params.push(("version".to_string(), version.to_string()));
        }

        for (i, (key, value)) in self.metadata.iter().enumerate() {
            let prefix = format!("metadata.{}.", i + 1);
            params.push((format!("{}key", prefix), key.clone()));
            if value != METADATA_ANY_VALUE {
                params.push((format!("{}value", prefix), value.clone()));
            }
        }
        params
    }
}

/// Parameters for [`AtlasClient::upload_artifact`].
///
/// `R` is the file payload type; use [`UploadArtifactOptions::new`] for a
/// version with no file.
pub struct UploadArtifactOptions<R> {
    /// Owning user or organization
    pub user: String,
    /// Artifact name
    pub name: String,
    /// Artifact type, e.g. `amazon.image`
    pub artifact_type: String,

    /// External id of the new version
    pub id: String,

    /// Metadata stored on the new version
    pub metadata: BTreeMap<String, String>,

    /// Build that produced this version, if any
    pub build_id: Option<u64>,

    /// File to attach and its exact size
    pub file: Option<(R, u64)>,
}

impl UploadArtifactOptions<std::io::Empty> {
    /// Options for a version with no attached file.
    pub fn new(user: &str, name: &str, artifact_type: &str, id: &str) -> Self {
        Self {
            user: user.to_string(),
            name: name.to_string(),
            artifact_type: artifact_type.to_string(),
            id: id.to_string(),
            metadata: BTreeMap::new(),
            build_id: None,
            file: None,
        }
    }
}

impl<R> UploadArtifactOptions<R> {
    /// Attaches a file of `size` bytes.
    pub fn with_file<F>(self, file: F, size: u64) -> UploadArtifactOptions<F> {
        UploadArtifactOptions {
            user: self.user,
            name: self.name,
            artifact_type: self.artifact_type,
            id: self.id,
            metadata: self.metadata,
            build_id: self.build_id,
            file: Some((file, size)),
        }
    }
}

#[derive(Serialize)]
struct ArtifactWrapper<'a> {
    artifact: &'a Artifact,
}

#[derive(Serialize)]
struct ArtifactVersionBody<'a> {
    artifact_version: NewArtifactVersion<'a>,
}

#[derive(Serialize)]
struct NewArtifactVersion<'a> {
    id: &'a str,
    file: bool,
    metadata: &'a BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    build_id: Option<u64>,
}

impl AtlasClient {
    /// Fetches an artifact.
    pub async fn artifact(&self, user: &str, name: &str) -> ApiResult<Artifact> {
        let path = format!("/api/v1/artifacts/{}/{}", user, name);
        self.get(&path).await?.unwrap_key("artifact")
    }

    /// Creates an artifact.
    pub async fn create_artifact(&self, user: &str, name: &str) -> ApiResult<Artifact> {
        tracing::info!("Creating artifact {}", slug(user, name));
        let artifact = Artifact {
            username: user.to_string(),
            name: name.to_string(),
        };
        self.post("/api/v1/artifacts", &ArtifactWrapper { artifact: &artifact })
            .await?
            .unwrap_key("artifact")
    }

    /// Lists versions of an artifact type matching `options`.
    pub async fn artifact_search(
        &self,
        options: &ArtifactSearchOptions,
    ) -> ApiResult<Vec<ArtifactVersion>> {
        let path = format!(
            "/api/v1/artifacts/{}/{}/{}/search",
            options.user, options.name, options.artifact_type
        );
        let request = RequestOptions {
            params: options.params(),
            ..RequestOptions::default()
        };
        self.request(Method::GET, &path, request)
            .await?
            .unwrap_key("versions")
    }

    /// Records a new artifact version, uploading its file if one is given.
    ///
    /// # Returns
    ///
    /// The version as stored, including its upload path.
    pub async fn upload_artifact<R>(
        &self,
        options: UploadArtifactOptions<R>,
    ) -> ApiResult<ArtifactVersion>
    where
        R: Read + Send + 'static,
    {
        tracing::info!(
            "Uploading {} version of {}",
            options.artifact_type,
            slug(&options.user, &options.name)
        );

        let path = format!(
            "/api/v1/artifacts/{}/{}/{}",
            options.user, options.name, options.artifact_type
        );
        let body = ArtifactVersionBody {
            artifact_version: NewArtifactVersion {
                id: &options.id,
                file: options.file.is_some(),
                metadata: &options.metadata,
                build_id: options.build_id,
            },
        };
        let version: ArtifactVersion = self.post(&path, &body).await?.json()?;

        if let Some((file, size)) = options.file {
            self.put_file(&version.upload_path, file, size).await?;
        }
        Ok(version)
    }

    /// Download URL of a version's attached file, or `None` without one.
    pub fn artifact_file_url(&self, version: &ArtifactVersion) -> Option<Url> {
        if !version.file {
            return None;
        }

        let mut url = self.endpoint(&format!(
            "/api/v1/artifacts/{}/{}/{}/file",
            version.username, version.name, version.artifact_type
        ));
        url.query_pairs_mut()
            .append_pair("version", &version.version.to_string());
        Some(url)
    }
}
