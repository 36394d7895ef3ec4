//
//  atlas-client
//  api/v1/terraform.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Terraform configuration API types and calls.
//!
//! A configuration version bundles the uploaded module source (usually an
//! [`Archive`](crate::archive::Archive)) with its VCS metadata and variables.

use std::collections::BTreeMap;
use std::io::Read;

use serde::{Deserialize, Serialize};

use super::slug;
use crate::api::client::AtlasClient;
use crate::api::common::{ApiError, ApiResult};

/// A single uploaded version of a Terraform configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerraformConfigVersion {
    /// Version number, assigned by the server.
    #[serde(default)]
    pub version: u64,

    /// Remote state backends the configuration refers to.
    #[serde(default)]
    pub remotes: Vec<String>,

    /// Free-form metadata, typically [`Archive::metadata`](crate::archive::Archive::metadata).
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    /// Plain string variables.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,

    /// Typed variables.
    #[serde(default)]
    pub tf_vars: Vec<TfVar>,
}

/// A Terraform variable, either a plain string or an HCL expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TfVar {
    pub key: String,
    pub value: String,

    /// Whether `value` is HCL rather than a literal string.
    #[serde(rename = "hcl", default)]
    pub is_hcl: bool,
}

#[derive(Serialize)]
struct VersionWrapper<'a> {
    version: &'a TerraformConfigVersion,
}

#[derive(Deserialize)]
struct VersionCreated {
    upload_path: String,
    #[serde(default)]
    version: u64,
}

#[derive(Serialize)]
struct VariablesBody<'a> {
    variables: &'a BTreeMap<String, String>,
}

impl AtlasClient {
    /// Fetches the newest version of a configuration.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the configuration has no versions or does not exist.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use atlas_client::api::AtlasClient;
    ///
    /// # async fn example() -> Result<(), atlas_client::api::common::ApiError> {
    /// let client = AtlasClient::from_env()?;
    /// match client.terraform_config_latest("hashicorp", "infra").await? {
    ///     Some(latest) => println!("latest is v{}", latest.version),
    ///     None => println!("nothing uploaded yet"),
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn terraform_config_latest(
        &self,
        user: &str,
        name: &str,
    ) -> ApiResult<Option<TerraformConfigVersion>> {
        tracing::info!("Getting terraform configuration {}", slug(user, name));
        let path = format!(
            "/api/v1/terraform/configurations/{}/{}/versions/latest",
            user, name
        );

        match self.get(&path).await {
            Ok(response) => response.unwrap_key("version"),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Creates a configuration version and uploads its source.
    ///
    /// # Returns
    ///
    /// The version number the server assigned.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use atlas_client::api::v1::TerraformConfigVersion;
    /// use atlas_client::api::AtlasClient;
    /// use atlas_client::archive::{self, ArchiveOptions};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = AtlasClient::from_env()?;
    /// let options = ArchiveOptions { vcs: true, ..Default::default() };
    /// let archive = archive::create_spooled("./infra".as_ref(), &options)?;
    ///
    /// let version = TerraformConfigVersion {
    ///     metadata: archive.metadata().clone(),
    ///     ..Default::default()
    /// };
    /// let size = archive.size().unwrap_or_default();
    /// let number = client
    ///     .create_terraform_config_version("hashicorp", "infra", &version, archive, size)
    ///     .await?;
    /// println!("created v{}", number);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create_terraform_config_version<R>(
        &self,
        user: &str,
        name: &str,
        version: &TerraformConfigVersion,
        data: R,
        size: u64,
    ) -> ApiResult<u64>
    where
        R: Read + Send + 'static,
    {
        tracing::info!("Creating terraform configuration {}", slug(user, name));
        let path = format!("/api/v1/terraform/configurations/{}/{}/versions", user, name);

        let created: VersionCreated = self
            .post(&path, &VersionWrapper { version })
            .await?
            .json()?;

        self.put_file(&created.upload_path, data, size).await?;
        Ok(created.version)
    }

    /// Sets variables on a Terraform environment.
    ///
    /// Variables not named in `variables` are left unchanged.
    pub async fn update_environment_variables(
        &self,
        user: &str,
        name: &str,
        variables: &BTreeMap<String, String>,
    ) -> ApiResult<()> {
        tracing::info!("Setting variables for environment {}", slug(user, name));
        let path = format!("/api/v1/environments/{}/{}/variables", user, name);
        self.put(&path, &VariablesBody { variables }).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use std::io::Cursor;

    #[test]
    fn test_version_omits_empty_variables() {
        let version = TerraformConfigVersion {
            tf_vars: vec![TfVar {
                key: "region".into(),
                value: "us-east-1".into(),
                is_hcl: false,
            }],
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&version).unwrap(),
            json!({
                "version": 0,
                "remotes": [],
                "metadata": {},
                "tf_vars": [{"key": "region", "value": "us-east-1", "hcl": false}]
            })
        );
    }

    #[tokio::test]
    async fn test_latest() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/terraform/configurations/hashicorp/existing/versions/latest")
            .with_status(200)
            .with_body(r#"{"version": {"version": 5, "remotes": ["foo"], "metadata": {"foo": "bar"}}}"#)
            .create_async()
            .await;

        let latest = AtlasClient::new(&server.url())
            .unwrap()
            .terraform_config_latest("hashicorp", "existing")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.version, 5);
        assert_eq!(latest.remotes, vec!["foo".to_string()]);
    }

    #[tokio::test]
    async fn test_latest_missing_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/terraform/configurations/hashicorp/empty/versions/latest")
            .with_status(404)
            .create_async()
            .await;

        let latest = AtlasClient::new(&server.url())
            .unwrap()
            .terraform_config_latest("hashicorp", "empty")
            .await
            .unwrap();
        assert_eq!(latest, None);
    }

    #[tokio::test]
    async fn test_create_version_uploads() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/terraform/configurations/hashicorp/infra/versions")
            .match_body(Matcher::PartialJson(json!({
                "version": {"metadata": {"branch": "main"}}
            })))
            .with_status(200)
            .with_body(r#"{"upload_path": "/_binstore/tf", "version": 6}"#)
            .create_async()
            .await;
        server
            .mock("HEAD", "/_binstore/tf")
            .with_status(200)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/_binstore/tf")
            .match_header("content-length", "4")
            .with_status(200)
            .create_async()
            .await;

        let version = TerraformConfigVersion {
            metadata: BTreeMap::from([("branch".to_string(), "main".to_string())]),
            ..Default::default()
        };
        let number = AtlasClient::new(&server.url())
            .unwrap()
            .create_terraform_config_version(
                "hashicorp",
                "infra",
                &version,
                Cursor::new(b"slug".to_vec()),
                4,
            )
            .await
            .unwrap();
        assert_eq!(number, 6);
        put.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_environment_variables() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/v1/environments/hashicorp/prod/variables")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"variables": {"AWS_REGION": "eu-west-1"}})))
            .with_status(200)
            .create_async()
            .await;

        let variables = BTreeMap::from([("AWS_REGION".to_string(), "eu-west-1".to_string())]);
        AtlasClient::new(&server.url())
            .unwrap()
            .update_environment_variables("hashicorp", "prod", &variables)
            .await
            .unwrap();
        mock.assert_async().await;
    }
}
