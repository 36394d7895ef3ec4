//
//  atlas-client
//  auth/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Authentication Module
//!
//! Atlas authenticates every request with a single opaque access token. How
//! that token travels depends on the API generation the client talks to,
//! which is fixed when the client is built:
//!
//! - **Query token** (`/api/v1`): `?access_token=<token>` on every request
//! - **Header token** (`/api/v2`): an `X-Atlas-Token: <token>` header
//!
//! ## Module Structure
//!
//! - [`Protocol`]: the two token transports and their error encodings
//! - [`AtlasClient::login`](crate::api::AtlasClient::login): exchanging a
//!   username and password for a token
//!
//! ## Example
//!
//! ```rust,no_run
//! use atlas_client::api::AtlasClient;
//! use atlas_client::auth::Protocol;
//!
//! # async fn example() -> Result<(), atlas_client::api::common::ApiError> {
//! let mut client = AtlasClient::new("https://atlas.hashicorp.com")?
//!     .with_protocol(Protocol::HeaderToken);
//!
//! client.login("mitchellh", "s3cret").await?;
//! client.verify().await?;
//! # Ok(())
//! # }
//! ```

mod login;

use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};

/// Query parameter carrying the token under [`Protocol::QueryToken`].
pub const TOKEN_PARAM: &str = "access_token";

/// Header carrying the token under [`Protocol::HeaderToken`].
pub const TOKEN_HEADER: &str = "X-Atlas-Token";

/// Content type the header-token generation expects on request bodies.
pub const JSON_API_CONTENT_TYPE: &str = "application/vnd.api+json";

/// The token transport and response conventions of one API generation.
///
/// # Variants
///
/// | Variant | Token | Success body | Error body |
/// |---------|-------|--------------|------------|
/// | `QueryToken` | `access_token` query parameter | `{"<resource>": {...}}` | `{"errors": {"field": ["msg"]}}` |
/// | `HeaderToken` | `X-Atlas-Token` header | bare object or JSON-API document | `{"errors": [{"title", "detail"}]}` |
///
/// The two are never mixed on one client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
    /// Token as a query parameter; named-wrapper JSON envelopes.
    #[default]
    QueryToken,
    /// Token as a request header; JSON-API documents.
    HeaderToken,
}

impl Protocol {
    /// Applies `token` to an HTTP request.
    ///
    /// # Parameters
    ///
    /// - `request`: The [`RequestBuilder`] to authenticate.
    /// - `token`: The access token. Callers skip this for an empty token.
    ///
    /// # Returns
    ///
    /// Returns the modified [`RequestBuilder`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use atlas_client::auth::Protocol;
    /// use reqwest::Client;
    ///
    /// let request = Protocol::HeaderToken
    ///     .apply_to_request(Client::new().get("https://atlas.example.com/api/v2/states/1"), "abc")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(request.headers()["X-Atlas-Token"], "abc");
    /// ```
    pub fn apply_to_request(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        match self {
            Self::QueryToken => request.query(&[(TOKEN_PARAM, token)]),
            Self::HeaderToken => request.header(TOKEN_HEADER, token),
        }
    }

    /// Content type sent on every request by default, if any.
    pub fn default_content_type(&self) -> Option<&'static str> {
        match self {
            Self::QueryToken => None,
            Self::HeaderToken => Some(JSON_API_CONTENT_TYPE),
        }
    }
}
