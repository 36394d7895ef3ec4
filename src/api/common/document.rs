//
//  atlas-client
//  api/common/document.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! JSON-API documents used by the header-token API generation.
//!
//! A [`Document`] carries its primary `data` (one [`Resource`] or a list of
//! them) and the side-loaded `included` resources. Relationships are resolved
//! against `included` with [`Document::related`].

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A JSON-API document.
///
/// `included` is only read; it is never written back on marshal.
///
/// # Example
///
/// ```rust
/// use atlas_client::api::common::{Document, Resource};
/// use serde_json::Value;
///
/// let body = r#"{
///     "data": {"id": 150, "type": "states",
///              "relationships": {"versions": {"data": [{"id": "424", "type": "state-versions"}]}}},
///     "included": [{"id": "424", "type": "state-versions", "attributes": {"serial": 3}}]
/// }"#;
/// let doc: Document<Resource<Value>> = serde_json::from_str(body).unwrap();
/// assert_eq!(doc.data.id, "150");
///
/// let versions = doc.related(&doc.data, "versions");
/// assert_eq!(versions[0].attributes["serial"], 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document<D> {
    /// Primary data
    pub data: D,
    /// Side-loaded resources referenced by relationships
    #[serde(default, skip_serializing)]
    pub included: Vec<Resource<Value>>,
}

impl<D> Document<D> {
    /// Wraps `data` in a document with nothing included.
    pub fn new(data: D) -> Self {
        Self {
            data,
            included: Vec::new(),
        }
    }

    /// Included resources linked from `resource` through relationship `name`.
    ///
    /// Linkage entries with no matching included resource are skipped.
    pub fn related<A>(&self, resource: &Resource<A>, name: &str) -> Vec<&Resource<Value>> {
        let Some(linkage) = resource
            .relationships
            .get(name)
            .and_then(|rel| rel.data.as_ref())
        else {
            return Vec::new();
        };

        linkage
            .identifiers()
            .iter()
            .filter_map(|ident| {
                self.included
                    .iter()
                    .find(|inc| inc.kind == ident.kind && inc.id == ident.id)
            })
            .collect()
    }

    /// Like [`related`](Self::related), decoding each attribute set as `B`.
    pub fn related_as<A, B: DeserializeOwned>(
        &self,
        resource: &Resource<A>,
        name: &str,
    ) -> Result<Vec<Resource<B>>, serde_json::Error> {
        self.related(resource, name)
            .into_iter()
            .map(Resource::decode)
            .collect()
    }
}

/// A JSON-API resource object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource<A> {
    /// Identifier, normalized to a string; omitted on marshal when unset
    #[serde(
        default,
        deserialize_with = "id_from_any",
        skip_serializing_if = "id_is_unset"
    )]
    pub id: String,
    /// Resource type, e.g. `state-versions`
    #[serde(rename = "type")]
    pub kind: String,
    /// Typed attributes
    #[serde(default)]
    pub attributes: A,
    /// Named relationships
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relationships: BTreeMap<String, Relationship>,
}

impl<A> Resource<A> {
    /// Creates an unsaved resource with no id.
    pub fn new(kind: impl Into<String>, attributes: A) -> Self {
        Self {
            id: String::new(),
            kind: kind.into(),
            attributes,
            relationships: BTreeMap::new(),
        }
    }

    /// Adds a to-one relationship pointing at `kind`/`id`.
    pub fn with_relationship(
        mut self,
        name: impl Into<String>,
        kind: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        self.relationships.insert(
            name.into(),
            Relationship {
                data: Some(Linkage::One(Identifier {
                    id: id.into(),
                    kind: kind.into(),
                })),
            },
        );
        self
    }

    /// Identifiers linked through relationship `name`.
    pub fn linked(&self, name: &str) -> &[Identifier] {
        self.relationships
            .get(name)
            .and_then(|rel| rel.data.as_ref())
            .map(Linkage::identifiers)
            .unwrap_or_default()
    }
}

impl Resource<Value> {
    /// Re-decodes loosely typed attributes as `B`.
    pub fn decode<B: DeserializeOwned>(&self) -> Result<Resource<B>, serde_json::Error> {
        let attributes = match &self.attributes {
            Value::Null => serde_json::from_value(Value::Object(Default::default()))?,
            other => serde_json::from_value(other.clone())?,
        };

        Ok(Resource {
            id: self.id.clone(),
            kind: self.kind.clone(),
            attributes,
            relationships: self.relationships.clone(),
        })
    }
}

/// A relationship entry; `data` is null for an empty to-one link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub data: Option<Linkage>,
}

/// Resource linkage: to-one or to-many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Linkage {
    One(Identifier),
    Many(Vec<Identifier>),
}

impl Linkage {
    /// All identifiers in this linkage.
    pub fn identifiers(&self) -> &[Identifier] {
        match self {
            Self::One(ident) => std::slice::from_ref(ident),
            Self::Many(idents) => idents,
        }
    }
}

/// A resource identifier object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(default, deserialize_with = "id_from_any")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Accepts a string, an integer or null as a resource id.
fn id_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "resource id must be a string or number, got {}",
            other
        ))),
    }
}

/// Ids that are empty or zero are not sent.
pub(crate) fn id_is_unset(id: &str) -> bool {
    id.is_empty() || id == "0"
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Named {
        #[serde(default)]
        name: String,
    }

    #[test]
    fn test_numeric_and_string_ids() {
        let numeric: Resource<Named> =
            serde_json::from_value(json!({"id": 150, "type": "states"})).unwrap();
        assert_eq!(numeric.id, "150");

        let text: Resource<Named> =
            serde_json::from_value(json!({"id": "abc", "type": "states"})).unwrap();
        assert_eq!(text.id, "abc");

        let bad = serde_json::from_value::<Resource<Named>>(json!({"id": true, "type": "x"}));
        assert!(bad.is_err());
    }

    #[test]
    fn test_marshal_omits_unset_id_and_included() {
        let mut doc = Document::new(Resource::new("configurations", Named { name: "web".into() }));
        doc.included.push(Resource::new("organizations", Value::Null));

        let encoded = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            encoded,
            json!({"data": {"type": "configurations", "attributes": {"name": "web"}}})
        );

        doc.data.id = "0".into();
        assert!(serde_json::to_value(&doc).unwrap()["data"].get("id").is_none());

        doc.data.id = "12".into();
        assert_eq!(serde_json::to_value(&doc).unwrap()["data"]["id"], "12");
    }

    #[test]
    fn test_relationship_round_trip_shape() {
        let resource = Resource::new("state-versions", Named::default())
            .with_relationship("state", "states", "150");
        let encoded = serde_json::to_value(&resource).unwrap();
        assert_eq!(
            encoded["relationships"],
            json!({"state": {"data": {"id": "150", "type": "states"}}})
        );
        assert_eq!(resource.linked("state")[0].id, "150");
        assert!(resource.linked("missing").is_empty());
    }

    #[test]
    fn test_related_resolves_through_included() {
        let doc: Document<Resource<Named>> = serde_json::from_value(json!({
            "data": {
                "id": "7", "type": "configurations",
                "attributes": {"name": "web"},
                "relationships": {
                    "organization": {"data": {"id": "hashicorp", "type": "organizations"}},
                    "versions": {"data": [
                        {"id": 1, "type": "configuration-versions"},
                        {"id": 2, "type": "configuration-versions"},
                        {"id": 3, "type": "configuration-versions"}
                    ]},
                    "empty": {"data": null}
                }
            },
            "included": [
                {"id": "hashicorp", "type": "organizations", "attributes": {"name": "hashicorp"}},
                {"id": 2, "type": "configuration-versions", "attributes": {"name": "two"}},
                {"id": 1, "type": "configuration-versions", "attributes": {"name": "one"}}
            ]
        }))
        .unwrap();

        let orgs: Vec<Resource<Named>> = doc.related_as(&doc.data, "organization").unwrap();
        assert_eq!(orgs[0].attributes.name, "hashicorp");

        let versions: Vec<Resource<Named>> = doc.related_as(&doc.data, "versions").unwrap();
        let names: Vec<&str> = versions.iter().map(|v| v.attributes.name.as_str()).collect();
        assert_eq!(names, vec!["one", "two"]);

        assert!(doc.related(&doc.data, "empty").is_empty());
        assert!(doc.related(&doc.data, "nope").is_empty());
    }
}
