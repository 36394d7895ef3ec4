//
//  atlas-client
//  auth/login.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Password login and token verification.

use reqwest::Method;
use serde::Deserialize;

use crate::api::client::{AtlasClient, RequestOptions};
use crate::api::common::{ApiError, ApiResult};
use crate::util::mask_token;

const AUTHENTICATE_PATH: &str = "/api/v1/authenticate";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: String,
}

impl AtlasClient {
    /// Exchanges a username and password for an access token.
    ///
    /// # Parameters
    ///
    /// - `username`: Atlas username or email. Must not be empty.
    /// - `password`: Account password. Must not be empty.
    ///
    /// # Returns
    ///
    /// The new token, which is also stored on the client and sent with every
    /// later request.
    ///
    /// # Errors
    ///
    /// - [`ApiError::MissingUsername`] / [`ApiError::MissingPassword`] before
    ///   any request is made
    /// - [`ApiError::Auth`] with the server's message for bad credentials,
    ///   or when the server answers without a token
    ///
    /// The client's previous token is kept on any error.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use atlas_client::api::AtlasClient;
    ///
    /// # async fn example() -> Result<(), atlas_client::api::common::ApiError> {
    /// let mut client = AtlasClient::new("https://atlas.hashicorp.com")?;
    /// let token = client.login("mitchellh", "s3cret").await?;
    /// assert_eq!(client.token(), Some(token.as_str()));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn login(&mut self, username: &str, password: &str) -> ApiResult<String> {
        if username.is_empty() {
            return Err(ApiError::MissingUsername);
        }
        if password.is_empty() {
            return Err(ApiError::MissingPassword);
        }

        tracing::info!("Logging in as {}", username);

        let description = format!("Created by {}", crate::USER_AGENT);
        let options = RequestOptions::new().form(&[
            ("user[login]", username),
            ("user[password]", password),
            ("user[description]", &description),
        ]);
        let response: TokenResponse = self
            .request(Method::POST, AUTHENTICATE_PATH, options)
            .await?
            .json()?;

        if response.token.is_empty() {
            return Err(ApiError::Auth(None));
        }

        tracing::debug!("Received token {}", mask_token(&response.token));
        self.set_token(response.token.clone());
        Ok(response.token)
    }

    /// Checks that the current token is accepted.
    pub async fn verify(&self) -> ApiResult<()> {
        self.get(AUTHENTICATE_PATH).await?;
        Ok(())
    }
}
