//
//  atlas-client
//  api/common/errors.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Error bodies returned by the API on 4xx responses.
//!
//! The two API generations encode errors differently and the active
//! [`Protocol`] decides which decoder runs:
//!
//! - Query-token: `{"errors": {"field": ["message", ...]}}`, or the bare list
//!   `{"errors": ["message", ...]}` ([`ValidationErrors`])
//! - Header-token: `{"errors": [{"title", "detail", "code", "status"}]}`
//!   ([`ErrorDocument`])

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::auth::Protocol;

/// Field name under which list-form messages are filed.
pub const BASE_FIELD: &str = "base";

/// Field → messages validation errors.
///
/// # Example
///
/// ```rust
/// use atlas_client::api::common::ValidationErrors;
///
/// let body = br#"{"errors": {"name": ["is taken", "is too short"]}}"#;
/// let errors = ValidationErrors::from_slice(body).unwrap();
/// assert_eq!(errors.to_string(), "name: is taken, name: is too short");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(pub BTreeMap<String, Vec<String>>);

#[derive(Deserialize)]
struct ValidationEnvelope {
    errors: ValidationShape,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ValidationShape {
    Fields(BTreeMap<String, Messages>),
    List(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Messages {
    Many(Vec<String>),
    One(String),
}

impl ValidationErrors {
    /// Decodes a query-token error body, or `None` if it is not one.
    pub fn from_slice(body: &[u8]) -> Option<Self> {
        let envelope: ValidationEnvelope = serde_json::from_slice(body).ok()?;
        let fields = match envelope.errors {
            ValidationShape::Fields(fields) => fields
                .into_iter()
                .map(|(field, messages)| match messages {
                    Messages::Many(list) => (field, list),
                    Messages::One(message) => (field, vec![message]),
                })
                .collect(),
            ValidationShape::List(list) => BTreeMap::from([(BASE_FIELD.to_string(), list)]),
        };
        Some(Self(fields))
    }

    /// Messages recorded against `field`.
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// All messages, each prefixed with its field unless it is [`BASE_FIELD`].
    pub fn messages(&self) -> Vec<String> {
        self.0
            .iter()
            .flat_map(|(field, messages)| {
                messages.iter().map(move |message| {
                    if field == BASE_FIELD {
                        message.clone()
                    } else {
                        format!("{}: {}", field, message)
                    }
                })
            })
            .collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join(", "))
    }
}

/// A JSON-API error document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDocument {
    /// Individual error objects
    #[serde(default)]
    pub errors: Vec<ErrorObject>,
}

/// One entry of an [`ErrorDocument`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Short summary
    #[serde(default)]
    pub title: String,
    /// Explanation specific to this occurrence
    #[serde(default)]
    pub detail: String,
    /// Application-specific error code
    #[serde(default)]
    pub code: String,
    /// HTTP status as a string
    #[serde(default)]
    pub status: String,
}

impl fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.title.is_empty(), self.detail.is_empty()) {
            (false, false) => write!(f, "{}: {}", self.title, self.detail),
            (false, true) => f.write_str(&self.title),
            (true, _) => f.write_str(&self.detail),
        }
    }
}

impl fmt::Display for ErrorDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        f.write_str(&rendered.join("\n"))
    }
}

/// A decoded error response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorBody {
    /// Query-token validation errors
    Fields(ValidationErrors),
    /// Header-token JSON-API error document
    Document(ErrorDocument),
    /// A body that did not decode under the active profile
    Raw(String),
}

impl ErrorBody {
    /// Decodes `body` with the decoder belonging to `protocol`.
    ///
    /// Bodies that do not fit the profile are kept verbatim as
    /// [`ErrorBody::Raw`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use atlas_client::api::common::ErrorBody;
    /// use atlas_client::auth::Protocol;
    ///
    /// let body = br#"{"errors": [{"title": "Invalid", "detail": "serial must increase"}]}"#;
    /// let parsed = ErrorBody::parse(Protocol::HeaderToken, body);
    /// assert_eq!(parsed.to_string(), "Invalid: serial must increase");
    /// ```
    pub fn parse(protocol: Protocol, body: &[u8]) -> Self {
        let decoded = match protocol {
            Protocol::QueryToken => ValidationErrors::from_slice(body).map(Self::Fields),
            Protocol::HeaderToken => serde_json::from_slice::<ErrorDocument>(body)
                .ok()
                .filter(|doc| !doc.errors.is_empty())
                .map(Self::Document),
        };

        decoded.unwrap_or_else(|| Self::Raw(String::from_utf8_lossy(body).trim().to_string()))
    }

    /// Like [`parse`](Self::parse), but `None` for an empty body.
    pub fn parse_optional(protocol: Protocol, body: &[u8]) -> Option<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return None;
        }
        Some(Self::parse(protocol, body))
    }
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fields(errors) => errors.fmt(f),
            Self::Document(doc) => doc.fmt(f),
            Self::Raw(text) if text.is_empty() => f.write_str("empty response body"),
            Self::Raw(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_render_every_pair() {
        let body = br#"{"errors": {"name": ["can't be blank"], "version": ["is invalid", "is taken"]}}"#;
        let errors = ValidationErrors::from_slice(body).unwrap();
        assert_eq!(errors.get("version").len(), 2);
        assert_eq!(
            errors.to_string(),
            "name: can't be blank, version: is invalid, version: is taken"
        );
    }

    #[test]
    fn test_list_form_goes_under_base() {
        let body = br#"{"errors": ["this is an error", "this is another error"]}"#;
        let errors = ValidationErrors::from_slice(body).unwrap();
        assert_eq!(
            errors.get(BASE_FIELD),
            &["this is an error".to_string(), "this is another error".to_string()]
        );
        assert_eq!(errors.to_string(), "this is an error, this is another error");
    }

    #[test]
    fn test_single_message_field() {
        let errors = ValidationErrors::from_slice(br#"{"errors": {"error": "Bad login details"}}"#).unwrap();
        assert_eq!(errors.to_string(), "error: Bad login details");
    }

    #[test]
    fn test_document_joins_with_newlines() {
        let body = br#"{"errors": [
            {"title": "Invalid attribute", "detail": "name is taken", "code": "100", "status": "422"},
            {"title": "Invalid attribute", "detail": "serial must increase"}
        ]}"#;
        let parsed = ErrorBody::parse(Protocol::HeaderToken, body);
        match &parsed {
            ErrorBody::Document(doc) => assert_eq!(doc.errors[0].status, "422"),
            other => panic!("expected document, got {:?}", other),
        }
        assert_eq!(
            parsed.to_string(),
            "Invalid attribute: name is taken\nInvalid attribute: serial must increase"
        );
    }

    #[test]
    fn test_profiles_are_not_auto_detected() {
        let document = br#"{"errors": [{"title": "Bad", "detail": "thing"}]}"#;
        assert!(matches!(
            ErrorBody::parse(Protocol::QueryToken, document),
            ErrorBody::Raw(_)
        ));

        let fields = br#"{"errors": {"name": ["is taken"]}}"#;
        assert!(matches!(ErrorBody::parse(Protocol::HeaderToken, fields), ErrorBody::Raw(_)));
    }

    #[test]
    fn test_optional_parse_of_empty_body() {
        assert_eq!(ErrorBody::parse_optional(Protocol::QueryToken, b"  \n"), None);
        assert_eq!(
            ErrorBody::parse_optional(Protocol::QueryToken, b"nope"),
            Some(ErrorBody::Raw("nope".to_string()))
        );
    }
}
