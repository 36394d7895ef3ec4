//
//  atlas-client
//  api/v2/resources.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Attribute sets of the v2 resource types.
//!
//! Each resource is a [`Resource`] over one of the attribute structs below;
//! the aliases ([`Organization`], [`State`], ...) name the combinations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::common::Resource;

/// JSON-API type names.
pub mod kinds {
    pub const ORGANIZATIONS: &str = "organizations";
    pub const CONFIGURATIONS: &str = "configurations";
    pub const CONFIGURATION_VERSIONS: &str = "configuration-versions";
    pub const STATES: &str = "states";
    pub const STATE_VERSIONS: &str = "state-versions";
}

/// An organization. Relationships: `configurations`, `environments`.
pub type Organization = Resource<OrganizationAttributes>;

/// A Terraform configuration. Relationships: `organization`, `versions`.
pub type Configuration = Resource<ConfigurationAttributes>;

/// A version of a configuration. Relationship: `configuration`.
pub type ConfigurationVersion = Resource<ConfigurationVersionAttributes>;

/// A remote state. Relationship: `versions`.
pub type State = Resource<StateAttributes>;

/// One stored snapshot of a remote state. Relationship: `state`.
pub type StateVersion = Resource<StateVersionAttributes>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OrganizationAttributes {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigurationAttributes {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigurationVersionAttributes {
    #[serde(default)]
    pub version: u64,

    /// Hidden versions are not offered for runs.
    #[serde(default, rename = "is-hidden")]
    pub hidden: bool,

    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StateAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Attributes of a [`StateVersion`].
///
/// Timestamps are set by the server and omitted when creating a version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StateVersionAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub version: u64,

    /// Terraform's state serial; must increase with every write.
    #[serde(default)]
    pub serial: u64,

    /// The raw state document.
    #[serde(default)]
    pub tfstate: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_configuration_version_wire_names() {
        let attrs: ConfigurationVersionAttributes = serde_json::from_value(json!({
            "version": 4, "is-hidden": true, "metadata": {"branch": "main"}, "status": "uploaded"
        }))
        .unwrap();
        assert!(attrs.hidden);
        assert_eq!(attrs.metadata["branch"], "main");
    }

    #[test]
    fn test_state_version_timestamps() {
        let version: StateVersion = serde_json::from_value(json!({
            "id": "424",
            "type": "state-versions",
            "attributes": {
                "created-at": "2017-03-10T00:52:44.225Z",
                "version": 1,
                "serial": 3,
                "tfstate": "{\"version\": 3}"
            }
        }))
        .unwrap();

        let expected = Utc
            .with_ymd_and_hms(2017, 3, 10, 0, 52, 44)
            .unwrap()
            + chrono::Duration::milliseconds(225);
        assert_eq!(version.attributes.created_at, Some(expected));
        assert_eq!(version.attributes.updated_at, None);
        assert_eq!(version.attributes.serial, 3);
    }

    #[test]
    fn test_new_state_version_omits_timestamps() {
        let attrs = StateVersionAttributes {
            version: 1,
            serial: 3,
            tfstate: "{}".into(),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&attrs).unwrap(),
            json!({"version": 1, "serial": 3, "tfstate": "{}"})
        );
    }
}
