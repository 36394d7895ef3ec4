//
//  atlas-client
//  api/v1/applications.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Vagrant application API types and calls.
//!
//! An application is a named slot owned by a user; each upload creates a new
//! numbered version of it.

use std::io::Read;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{slug, UploadDescriptor};
use crate::api::client::{AtlasClient, RequestOptions};
use crate::api::common::ApiResult;

/// Represents a Vagrant application.
///
/// # Fields
///
/// * `username` - Owning user or organization
/// * `name` - Application name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    /// Owning user or organization.
    pub username: String,

    /// Application name.
    pub name: String,
}

impl App {
    /// `username/name`.
    pub fn slug(&self) -> String {
        slug(&self.username, &self.name)
    }
}

#[derive(Serialize)]
struct AppWrapper<'a> {
    application: &'a App,
}

impl AtlasClient {
    /// Fetches an application.
    ///
    /// # Errors
    ///
    /// [`ApiError::NotFound`](crate::api::common::ApiError::NotFound) if it
    /// does not exist.
    pub async fn app(&self, user: &str, name: &str) -> ApiResult<App> {
        tracing::debug!("Fetching application {}", slug(user, name));
        let path = format!("/api/v1/vagrant/applications/{}/{}", user, name);
        self.get(&path).await?.unwrap_key("application")
    }

    /// Creates an application and returns it as stored.
    pub async fn create_app(&self, user: &str, name: &str) -> ApiResult<App> {
        tracing::info!("Creating application {}", slug(user, name));
        let app = App {
            username: user.to_string(),
            name: name.to_string(),
        };
        self.post("/api/v1/vagrant/applications", &AppWrapper { application: &app })
            .await?
            .json()
    }

    /// Creates a new version of `app` and uploads `size` bytes from `data`
    /// as its content.
    ///
    /// # Returns
    ///
    /// The new version number (0 if the server did not report one).
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use atlas_client::api::AtlasClient;
    /// use atlas_client::archive::{self, ArchiveOptions};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = AtlasClient::from_env()?;
    /// let app = client.app("hashicorp", "web").await?;
    ///
    /// let archive = archive::create_spooled("./web".as_ref(), &ArchiveOptions::default())?;
    /// let size = archive.size().unwrap_or_default();
    /// let version = client.upload_app(&app, archive, size).await?;
    /// println!("uploaded v{}", version);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn upload_app<R>(&self, app: &App, data: R, size: u64) -> ApiResult<u64>
    where
        R: Read + Send + 'static,
    {
        let path = format!(
            "/api/v1/vagrant/applications/{}/{}/versions",
            app.username, app.name
        );
        let descriptor: UploadDescriptor = self
            .request(Method::POST, &path, RequestOptions::new())
            .await?
            .json()?;

        self.put_file(&descriptor.upload_path, data, size).await?;
        Ok(descriptor.version.unwrap_or_default())
    }
}
