//
//  atlas-client
//  api/v2/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Atlas API v2 (header-token generation).
//!
//! Bodies are JSON-API [`Document`]s and errors are
//! `{"errors": [{"title", "detail", ...}]}`. Build the client with
//! [`Protocol::HeaderToken`](crate::auth::Protocol::HeaderToken) to talk to
//! these endpoints.
//!
//! # Example
//!
//! ```rust,no_run
//! use atlas_client::api::v2::StateVersionAttributes;
//! use atlas_client::api::AtlasClient;
//! use atlas_client::auth::Protocol;
//!
//! # async fn example() -> Result<(), atlas_client::api::common::ApiError> {
//! let client = AtlasClient::from_env()?.with_protocol(Protocol::HeaderToken);
//!
//! let state = client.state("150").await?;
//! for version in state.related_as::<_, StateVersionAttributes>(&state.data, "versions")? {
//!     println!("serial {}", version.attributes.serial);
//! }
//! # Ok(())
//! # }
//! ```

mod resources;

pub use resources::*;

use reqwest::Method;

use crate::api::client::{AtlasClient, RequestOptions};
use crate::api::common::{ApiResult, Document, Resource};
use crate::auth::JSON_API_CONTENT_TYPE;

impl AtlasClient {
    /// Fetches an organization by name.
    pub async fn organization(&self, name: &str) -> ApiResult<Document<Organization>> {
        self.get(&format!("/api/v2/organizations/{}", name))
            .await?
            .document()
    }

    /// Fetches a configuration.
    pub async fn configuration(&self, id: &str) -> ApiResult<Document<Configuration>> {
        self.get(&format!("/api/v2/configurations/{}", id))
            .await?
            .document()
    }

    /// Fetches a state with its versions side-loaded.
    ///
    /// Resolve the versions with
    /// [`Document::related_as`](crate::api::common::Document::related_as)
    /// under the `versions` relationship.
    pub async fn state(&self, id: &str) -> ApiResult<Document<State>> {
        let options = RequestOptions::new().param("include", "versions");
        self.request(Method::GET, &format!("/api/v2/states/{}", id), options)
            .await?
            .document()
    }

    /// Fetches one state version.
    pub async fn state_version(&self, id: &str) -> ApiResult<StateVersion> {
        let document: Document<StateVersion> = self
            .get(&format!("/api/v2/state-versions/{}", id))
            .await?
            .document()?;
        Ok(document.data)
    }

    /// Stores a new version of state `state_id`.
    ///
    /// # Errors
    ///
    /// A rejected write (e.g. a serial that did not increase) comes back as
    /// [`ApiError::Validation`](crate::api::common::ApiError::Validation)
    /// carrying the server's error document.
    pub async fn create_state_version(
        &self,
        state_id: &str,
        version: StateVersionAttributes,
    ) -> ApiResult<StateVersion> {
        tracing::info!("Creating version of state {} (serial {})", state_id, version.serial);

        let resource = Resource::new(kinds::STATE_VERSIONS, version).with_relationship(
            "state",
            kinds::STATES,
            state_id,
        );
        let options = RequestOptions::new()
            .json(&Document::new(resource))?
            .content_type(JSON_API_CONTENT_TYPE);

        let document: Document<StateVersion> = self
            .request(Method::POST, "/api/v2/state-versions", options)
            .await?
            .document()?;
        Ok(document.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::common::{ApiError, ErrorBody};
    use crate::auth::Protocol;
    use mockito::Matcher;
    use serde_json::json;

    const STATE_WITH_VERSIONS: &str = r#"{
        "data": {
            "id": "150",
            "type": "states",
            "attributes": {
                "created-at": "2017-03-10T00:51:19.359Z",
                "updated-at": "2017-03-10T00:52:44.233Z"
            },
            "relationships": {
                "versions": {"data": [{"id": "424", "type": "state-versions"}]}
            }
        },
        "included": [{
            "id": "424",
            "type": "state-versions",
            "attributes": {
                "created-at": "2017-03-10T00:52:44.225Z",
                "updated-at": "2017-03-10T00:52:44.545Z",
                "version": 1,
                "serial": 3,
                "tfstate": "{\"version\": 3}"
            },
            "relationships": {
                "state": {"data": {"id": "150", "type": "states"}}
            }
        }]
    }"#;

    async fn client_for(server: &mockito::Server) -> AtlasClient {
        AtlasClient::new(&server.url())
            .unwrap()
            .with_protocol(Protocol::HeaderToken)
            .with_token("tok")
    }

    #[tokio::test]
    async fn test_state_includes_versions() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v2/states/150")
            .match_query(Matcher::UrlEncoded("include".into(), "versions".into()))
            .match_header("x-atlas-token", "tok")
            .with_status(200)
            .with_body(STATE_WITH_VERSIONS)
            .create_async()
            .await;

        let state = client_for(&server).await.state("150").await.unwrap();
        assert_eq!(state.data.id, "150");
        assert!(state.data.attributes.created_at.is_some());

        let versions: Vec<StateVersion> = state.related_as(&state.data, "versions").unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].id, "424");
        assert_eq!(versions[0].attributes.version, 1);
        assert_eq!(versions[0].attributes.serial, 3);
        assert_eq!(versions[0].attributes.tfstate, r#"{"version": 3}"#);
        assert_eq!(versions[0].linked("state")[0].id, "150");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_state_version() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v2/state-versions/424")
            .with_status(200)
            .with_body(
                r#"{"data": {"id": 424, "type": "state-versions",
                    "attributes": {"version": 1, "serial": 3, "tfstate": "{}"}}}"#,
            )
            .create_async()
            .await;

        let version = client_for(&server).await.state_version("424").await.unwrap();
        assert_eq!(version.id, "424");
        assert_eq!(version.kind, kinds::STATE_VERSIONS);
    }

    #[tokio::test]
    async fn test_organization_and_configuration() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v2/organizations/hashicorp")
            .with_status(200)
            .with_body(
                r#"{"data": {"id": "hashicorp", "type": "organizations",
                    "attributes": {"username": "hashicorp", "email": "ops@example.com"},
                    "relationships": {"configurations": {"data": [{"id": "7", "type": "configurations"}]}}}}"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/api/v2/configurations/7")
            .with_status(200)
            .with_body(
                r#"{"data": {"id": 7, "type": "configurations", "attributes": {"name": "infra"}}}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server).await;
        let org = client.organization("hashicorp").await.unwrap();
        assert_eq!(org.data.attributes.email, "ops@example.com");

        let config_id = org.data.linked("configurations")[0].id.clone();
        let config = client.configuration(&config_id).await.unwrap();
        assert_eq!(config.data.attributes.name, "infra");
    }

    #[tokio::test]
    async fn test_create_state_version() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v2/state-versions")
            .match_header("content-type", "application/vnd.api+json")
            .match_body(Matcher::Json(json!({
                "data": {
                    "type": "state-versions",
                    "attributes": {"version": 1, "serial": 4, "tfstate": "{}"},
                    "relationships": {"state": {"data": {"id": "150", "type": "states"}}}
                }
            })))
            .with_status(201)
            .with_body(
                r#"{"data": {"id": "425", "type": "state-versions",
                    "attributes": {"version": 1, "serial": 4, "tfstate": "{}",
                                   "created-at": "2017-03-11T10:00:00Z"}}}"#,
            )
            .create_async()
            .await;

        let attrs = StateVersionAttributes {
            version: 1,
            serial: 4,
            tfstate: "{}".into(),
            ..Default::default()
        };
        let created = client_for(&server)
            .await
            .create_state_version("150", attrs)
            .await
            .unwrap();
        assert_eq!(created.id, "425");
        assert!(created.attributes.created_at.is_some());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_state_version_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v2/state-versions")
            .with_status(422)
            .with_body(
                r#"{"errors": [{"title": "invalid serial", "detail": "serial must be greater than 3", "status": "422"}]}"#,
            )
            .create_async()
            .await;

        let err = client_for(&server)
            .await
            .create_state_version("150", StateVersionAttributes::default())
            .await
            .unwrap_err();
        match err {
            ApiError::Validation(ErrorBody::Document(doc)) => {
                assert_eq!(doc.to_string(), "invalid serial: serial must be greater than 3");
            }
            other => panic!("expected a document error, got {:?}", other),
        }
    }
}
