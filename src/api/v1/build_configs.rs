//
//  atlas-client
//  api/v1/build_configs.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Packer build configuration API types and calls.

use std::io::Read;

use serde::{Deserialize, Serialize};

use super::{slug, UploadDescriptor};
use crate::api::client::AtlasClient;
use crate::api::common::ApiResult;

/// Represents a Packer build configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Owning user or organization.
    pub username: String,

    /// Build configuration name.
    pub name: String,
}

impl BuildConfig {
    /// `username/name`.
    pub fn slug(&self) -> String {
        slug(&self.username, &self.name)
    }
}

/// One build within a build configuration version.
///
/// # Example
///
/// ```rust
/// use atlas_client::api::v1::BuildConfigBuild;
///
/// let build = BuildConfigBuild::new("web", "amazon-ebs");
/// assert_eq!(
///     serde_json::to_string(&build).unwrap(),
///     r#"{"name":"web","type":"amazon-ebs"}"#
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfigBuild {
    /// Build name from the template.
    pub name: String,

    /// Packer builder type.
    #[serde(rename = "type")]
    pub build_type: String,
}

impl BuildConfigBuild {
    /// A build entry of the given name and builder type.
    pub fn new(name: &str, build_type: &str) -> Self {
        Self {
            name: name.to_string(),
            build_type: build_type.to_string(),
        }
    }
}

#[derive(Serialize)]
struct BuildConfigWrapper<'a> {
    build_configuration: &'a BuildConfig,
}

#[derive(Serialize)]
struct VersionBody<'a> {
    version: VersionBuilds<'a>,
}

#[derive(Serialize)]
struct VersionBuilds<'a> {
    builds: &'a [BuildConfigBuild],
}

impl AtlasClient {
    /// Fetches a build configuration.
    pub async fn build_config(&self, user: &str, name: &str) -> ApiResult<BuildConfig> {
        let path = format!("/api/v1/packer/build-configurations/{}/{}", user, name);
        self.get(&path).await?.unwrap_key("build_configuration")
    }

    /// Creates a build configuration.
    pub async fn create_build_config(&self, user: &str, name: &str) -> ApiResult<BuildConfig> {
        tracing::info!("Creating build configuration {}", slug(user, name));
        let config = BuildConfig {
            username: user.to_string(),
            name: name.to_string(),
        };
        let body = BuildConfigWrapper {
            build_configuration: &config,
        };
        self.post("/api/v1/packer/build-configurations", &body)
            .await?
            .unwrap_key("build_configuration")
    }

    /// Creates a new version of `config` listing `builds`, then uploads the
    /// template payload (`size` bytes from `template`).
    pub async fn upload_build_config_version<R>(
        &self,
        config: &BuildConfig,
        builds: &[BuildConfigBuild],
        template: R,
        size: u64,
    ) -> ApiResult<()>
    where
        R: Read + Send + 'static,
    {
        tracing::info!(
            "Creating version of {} with {} builds",
            config.slug(),
            builds.len()
        );

        let path = format!(
            "/api/v1/packer/build-configurations/{}/{}/version",
            config.username, config.name
        );
        let body = VersionBody {
            version: VersionBuilds { builds },
        };
        let descriptor: UploadDescriptor = self.post(&path, &body).await?.json()?;

        self.put_file(&descriptor.upload_path, template, size).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_build_config() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/packer/build-configurations/hashicorp/existing")
            .with_status(200)
            .with_body(r#"{"build_configuration": {"username": "hashicorp", "name": "existing"}}"#)
            .create_async()
            .await;

        let config = AtlasClient::new(&server.url())
            .unwrap()
            .build_config("hashicorp", "existing")
            .await
            .unwrap();
        assert_eq!(config.slug(), "hashicorp/existing");
    }

    #[tokio::test]
    async fn test_create_build_config() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/packer/build-configurations")
            .match_body(Matcher::Json(json!({
                "build_configuration": {"username": "hashicorp", "name": "new"}
            })))
            .with_status(200)
            .with_body(r#"{"build_configuration": {"username": "hashicorp", "name": "new"}}"#)
            .create_async()
            .await;

        let config = AtlasClient::new(&server.url())
            .unwrap()
            .create_build_config("hashicorp", "new")
            .await
            .unwrap();
        assert_eq!(config.name, "new");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_version() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/api/v1/packer/build-configurations/hashicorp/existing/version")
            .match_body(Matcher::Json(json!({
                "version": {"builds": [{"name": "foo", "type": "ffx"}]}
            })))
            .with_status(200)
            .with_body(r#"{"upload_path": "/_binstore/template"}"#)
            .create_async()
            .await;
        server
            .mock("HEAD", "/_binstore/template")
            .with_status(200)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/_binstore/template")
            .match_body("{}")
            .with_status(200)
            .create_async()
            .await;

        let config = BuildConfig {
            username: "hashicorp".into(),
            name: "existing".into(),
        };
        AtlasClient::new(&server.url())
            .unwrap()
            .upload_build_config_version(
                &config,
                &[BuildConfigBuild::new("foo", "ffx")],
                Cursor::new(b"{}".to_vec()),
                2,
            )
            .await
            .unwrap();

        create.assert_async().await;
        put.assert_async().await;
    }
}
