//
//  atlas-client
//  api/client.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # HTTP Client Wrapper for the Atlas API
//!
//! This module provides the transport every resource call goes through. It
//! owns the base URL, the access token and the default headers, builds and
//! sends requests, buffers each response body and classifies the status.
//!
//! ## Features
//!
//! - Base-path aware URL joining (`https://host/prefix` + `/api/v1/...`)
//! - Query-token or header-token authentication ([`Protocol`])
//! - Default headers merged under per-call headers
//! - Status classification into [`ApiError`] variants
//! - Custom TLS roots and optional verification bypass
//!
//! ## Status classification
//!
//! | Status | Result |
//! |--------|--------|
//! | 200-204 | `Ok(Response)` |
//! | 400, 422 | [`ApiError::Validation`] |
//! | 401 | [`ApiError::Auth`] |
//! | 404 | [`ApiError::NotFound`] |
//! | other | [`ApiError::UnexpectedStatus`] |

use std::path::{Path, PathBuf};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::{Body, Certificate, Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::common::{ApiError, ApiResult, Document, ErrorBody};
use crate::auth::Protocol;
use crate::config::{ClientConfig, TlsConfig};
use crate::util::{join_path, mask_token};

/// The main HTTP client for the Atlas API.
///
/// Request methods take `&self`, so one client can be shared across tasks
/// (it is `Send + Sync`). Changing the token takes `&mut self`.
///
/// # Creating a Client
///
/// ```rust,no_run
/// use atlas_client::api::AtlasClient;
/// use atlas_client::config::ClientConfig;
///
/// // Address only, no token
/// let anonymous = AtlasClient::new("https://atlas.hashicorp.com")?;
///
/// // From the ATLAS_* environment variables
/// let from_env = AtlasClient::from_env()?;
///
/// // From an explicit configuration
/// let config = ClientConfig {
///     token: Some("abc123".to_string()),
///     ..ClientConfig::default()
/// };
/// let configured = AtlasClient::from_config(&config)?;
/// # Ok::<(), atlas_client::api::common::ApiError>(())
/// ```
#[derive(Debug, Clone)]
pub struct AtlasClient {
    /// Client for API calls
    pub(crate) http: Client,
    /// Client for upload targets; never follows redirects on its own
    pub(crate) upload_http: Client,
    /// Address every request path is joined onto
    pub(crate) base_url: Url,
    /// Access token, sent when present and non-empty
    pub(crate) token: Option<String>,
    /// Token transport and error encoding
    pub(crate) protocol: Protocol,
    /// Headers sent with every request unless overridden per call
    pub(crate) default_headers: HeaderMap,
}

impl AtlasClient {
    /// Creates a client for `address` with no token and default TLS.
    ///
    /// # Errors
    ///
    /// - [`ApiError::MissingUrl`] if `address` is blank
    /// - [`ApiError::InvalidUrl`] if it does not parse
    ///
    /// # Example
    ///
    /// ```rust
    /// use atlas_client::api::{common::ApiError, AtlasClient};
    ///
    /// assert!(matches!(AtlasClient::new(""), Err(ApiError::MissingUrl)));
    /// assert!(AtlasClient::new("https://atlas.example.com").is_ok());
    /// ```
    pub fn new(address: &str) -> ApiResult<Self> {
        let base_url = parse_address(address)?;
        Self::build(base_url, None, Protocol::default(), &TlsConfig::default())
    }

    /// Creates a client from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Fails on an unusable address or unreadable CA material.
    pub fn from_config(config: &ClientConfig) -> ApiResult<Self> {
        let base_url = parse_address(&config.address)?;
        Self::build(base_url, config.token.clone(), config.protocol, &config.tls)
    }

    /// Creates a client configured from the `ATLAS_*` environment variables.
    ///
    /// See [`ClientConfig::from_env`] for the variables read.
    pub fn from_env() -> ApiResult<Self> {
        Self::from_config(&ClientConfig::from_env())
    }

    fn build(
        base_url: Url,
        token: Option<String>,
        protocol: Protocol,
        tls: &TlsConfig,
    ) -> ApiResult<Self> {
        let roots = load_roots(tls)?;
        if tls.insecure {
            tracing::warn!("TLS certificate verification is disabled");
        }

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(crate::USER_AGENT));

        let client = Self {
            http: build_http(&roots, tls.insecure, Policy::default())?,
            upload_http: build_http(&roots, tls.insecure, Policy::none())?,
            base_url,
            token: token.filter(|t| !t.is_empty()),
            protocol: Protocol::default(),
            default_headers,
        };

        tracing::debug!("Created client for {}", client.base_url);
        Ok(client.with_protocol(protocol))
    }

    /// Sets the access token, builder style.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.set_token(token);
        self
    }

    /// Switches the API generation, builder style.
    ///
    /// Header-token clients send `Content-Type: application/vnd.api+json`
    /// by default; query-token clients send no default content type.
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        match protocol.default_content_type() {
            Some(content_type) => {
                self.default_headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
            None => {
                self.default_headers.remove(CONTENT_TYPE);
            }
        }
        self
    }

    /// Replaces the access token. An empty token clears it.
    pub fn set_token(&mut self, token: impl Into<String>) {
        let token = token.into();
        self.token = if token.is_empty() { None } else { Some(token) };
    }

    /// Removes the access token.
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// The current access token, if any.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// The address requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The API generation this client speaks.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Headers sent with every request.
    pub fn default_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.default_headers
    }

    /// Resolves `path` against the base URL, keeping the base path prefix.
    ///
    /// # Example
    ///
    /// ```rust
    /// use atlas_client::api::AtlasClient;
    ///
    /// let client = AtlasClient::new("https://atlas.example.com/foo/bar")?;
    /// assert_eq!(
    ///     client.endpoint("/api/v1/token").as_str(),
    ///     "https://atlas.example.com/foo/bar/api/v1/token"
    /// );
    /// # Ok::<(), atlas_client::api::common::ApiError>(())
    /// ```
    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(&join_path(self.base_url.path(), path));
        url.set_query(None);
        url
    }

    /// Sends a request and classifies the response.
    ///
    /// The body is always read fully before classification, so the returned
    /// [`Response`] (or the error) owns it outright.
    ///
    /// # Parameters
    ///
    /// * `method` - HTTP method
    /// * `path` - Path below the base URL, e.g. `/api/v1/artifacts/hashicorp/web`
    /// * `options` - Query parameters, extra headers and an optional body
    ///
    /// # Errors
    ///
    /// Any non-success status is turned into an [`ApiError`]; see the
    /// module docs for the mapping.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use atlas_client::api::{AtlasClient, RequestOptions};
    /// use reqwest::Method;
    ///
    /// # async fn example() -> Result<(), atlas_client::api::common::ApiError> {
    /// let client = AtlasClient::from_env()?;
    /// let response = client
    ///     .request(
    ///         Method::GET,
    ///         "/api/v1/artifacts/hashicorp/web/amazon.ami/search",
    ///         RequestOptions::new().param("version", "3"),
    ///     )
    ///     .await?;
    /// println!("{}", response.text());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> ApiResult<Response> {
        let url = self.endpoint(path);

        let mut headers = self.default_headers.clone();
        headers.extend(options.headers);
        if let Some(length) = options.body_length {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
        }

        let mut request = self.http.request(method.clone(), url).headers(headers);
        if !options.params.is_empty() {
            request = request.query(&options.params);
        }
        if let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) {
            tracing::debug!("Authenticating with token {}", mask_token(token));
            request = self.protocol.apply_to_request(request, token);
        }
        if let Some(body) = options.body {
            request = request.body(body);
        }

        tracing::debug!("{} {}", method, path);
        let response = Response::buffer(request.send().await?).await?;
        classify(self.protocol, path, response)
    }

    /// Makes an HTTP GET request to `path`.
    pub async fn get(&self, path: &str) -> ApiResult<Response> {
        self.request(Method::GET, path, RequestOptions::default()).await
    }

    /// Makes an HTTP POST request to `path` with a JSON body.
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<Response> {
        self.request(Method::POST, path, RequestOptions::new().json(body)?)
            .await
    }

    /// Makes an HTTP PUT request to `path` with a JSON body.
    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<Response> {
        self.request(Method::PUT, path, RequestOptions::new().json(body)?)
            .await
    }
}

/// Per-call request settings.
///
/// # Example
///
/// ```rust
/// use atlas_client::api::RequestOptions;
///
/// let options = RequestOptions::new()
///     .param("version", "2")
///     .form(&[("user[login]", "mitchellh")]);
/// assert_eq!(options.params, vec![("version".to_string(), "2".to_string())]);
/// ```
#[derive(Debug, Default)]
pub struct RequestOptions {
    /// Query parameters, in order
    pub params: Vec<(String, String)>,
    /// Headers that override the client defaults
    pub headers: HeaderMap,
    /// Request body
    pub body: Option<Body>,
    /// Explicit `Content-Length`, for streamed bodies
    pub body_length: Option<u64>,
}

impl RequestOptions {
    /// Empty options: no parameters, no extra headers, no body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Sets a header, replacing any default of the same name.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the content type.
    pub fn content_type(self, content_type: &'static str) -> Self {
        self.header(CONTENT_TYPE, HeaderValue::from_static(content_type))
    }

    /// Serializes `body` as JSON.
    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> ApiResult<Self> {
        let bytes = serde_json::to_vec(body)?;
        Ok(self.content_type("application/json").body(bytes, None))
    }

    /// Encodes `fields` as an `application/x-www-form-urlencoded` body.
    pub fn form(self, fields: &[(&str, &str)]) -> Self {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        self.content_type("application/x-www-form-urlencoded")
            .body(encoded, None)
    }

    /// Sets a raw body with an optional explicit length.
    pub fn body(mut self, body: impl Into<Body>, length: Option<u64>) -> Self {
        self.body = Some(body.into());
        self.body_length = length;
        self
    }
}

/// A response whose body has been read into memory.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Final URL of the request
    pub url: Url,
    /// The complete body
    pub body: Vec<u8>,
}

impl Response {
    pub(crate) async fn buffer(response: reqwest::Response) -> ApiResult<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = response.bytes().await?.to_vec();

        Ok(Self {
            status,
            headers,
            url,
            body,
        })
    }

    /// Decodes the body as `T`.
    pub fn json<T: DeserializeOwned>(&self) -> ApiResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Decodes the value under top-level `key` as `T`.
    ///
    /// Query-token endpoints wrap each resource in an object keyed by the
    /// resource name, e.g. `{"application": {...}}`.
    ///
    /// # Errors
    ///
    /// [`ApiError::MissingKey`] if the body is an object without `key`.
    pub fn unwrap_key<T: DeserializeOwned>(&self, key: &str) -> ApiResult<T> {
        let mut envelope: serde_json::Map<String, serde_json::Value> = self.json()?;
        let value = envelope
            .remove(key)
            .ok_or_else(|| ApiError::MissingKey(key.to_string()))?;
        Ok(serde_json::from_value(value)?)
    }

    /// Decodes the body as a JSON-API document.
    pub fn document<D: DeserializeOwned>(&self) -> ApiResult<Document<D>> {
        self.json()
    }

    /// The body as text, decoded lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Maps a buffered response to success or a typed error.
pub(crate) fn classify(protocol: Protocol, path: &str, response: Response) -> ApiResult<Response> {
    tracing::debug!("{} responded {}", path, response.status);

    match response.status.as_u16() {
        200..=204 => Ok(response),
        400 | 422 => Err(ApiError::Validation(ErrorBody::parse(
            protocol,
            &response.body,
        ))),
        401 => Err(ApiError::Auth(ErrorBody::parse_optional(
            protocol,
            &response.body,
        ))),
        404 => Err(ApiError::NotFound(path.to_string())),
        _ => Err(ApiError::UnexpectedStatus {
            status: response.status,
            body: response.text(),
        }),
    }
}

fn parse_address(address: &str) -> ApiResult<Url> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ApiError::MissingUrl);
    }
    Url::parse(address).map_err(|e| ApiError::InvalidUrl(address.to_string(), e))
}

fn build_http(roots: &[Certificate], insecure: bool, redirect: Policy) -> ApiResult<Client> {
    let mut builder = Client::builder()
        .redirect(redirect)
        .danger_accept_invalid_certs(insecure);
    for root in roots {
        builder = builder.add_root_certificate(root.clone());
    }
    Ok(builder.build()?)
}

/// Reads `ca_file` and every `.pem`/`.crt` file directly under `ca_path`.
fn load_roots(tls: &TlsConfig) -> ApiResult<Vec<Certificate>> {
    let mut paths: Vec<PathBuf> = tls.ca_file.iter().cloned().collect();

    if let Some(dir) = &tls.ca_path {
        let io_err = |source| ApiError::Io {
            path: dir.clone(),
            source,
        };
        let mut found = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && is_certificate_file(&path) {
                found.push(path);
            }
        }
        found.sort();
        paths.extend(found);
    }

    paths
        .into_iter()
        .map(|path| {
            let pem = std::fs::read(&path).map_err(|source| ApiError::Io {
                path: path.clone(),
                source,
            })?;
            tracing::debug!("Trusting CA certificate {}", path.display());
            Certificate::from_pem(&pem).map_err(|source| ApiError::Certificate { path, source })
        })
        .collect()
}

fn is_certificate_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("pem") | Some("crt")
    )
}
