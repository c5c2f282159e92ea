//! Golden mapping vectors.
//!
//! Each vector pins the native shape a fixture instance marshals to,
//! rendered as JSON so drift in layout or conversion shows up as a
//! readable diff.

use entimap_value::Entity;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// One pinned property of a marshalled fixture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyVector {
    /// Stored property name.
    pub name: String,
    /// Expected native value, rendered as JSON.
    pub expected: serde_json::Value,
    /// Whether the property must be excluded from indexes.
    pub excluded_from_indexes: bool,
}

impl PropertyVector {
    /// Pins an indexed property.
    pub fn new(name: impl Into<String>, expected: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            expected,
            excluded_from_indexes: false,
        }
    }

    /// Marks the pinned property as excluded from indexes.
    #[must_use]
    pub fn excluded(mut self) -> Self {
        self.excluded_from_indexes = true;
        self
    }
}

/// A pinned mapping outcome for one fixture instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Expected key kind.
    pub kind: String,
    /// Expected ancestor kind, if any.
    pub parent_kind: Option<String>,
    /// Properties that must be present with these exact values.
    pub properties: Vec<PropertyVector>,
    /// Properties that must be absent.
    pub absent: Vec<String>,
}

/// Asserts that a marshalled entity matches a pinned vector.
pub fn assert_vector(native: &Entity, vector: &MappingVector) {
    assert_eq!(
        native.key().map(|k| k.kind().to_string()),
        Some(vector.kind.clone()),
        "Vector {} key kind",
        vector.id
    );
    assert_eq!(
        native
            .key()
            .and_then(|k| k.parent())
            .map(|p| p.kind().to_string()),
        vector.parent_kind.clone(),
        "Vector {} parent kind",
        vector.id
    );
    for pinned in &vector.properties {
        let property = native
            .property(&pinned.name)
            .unwrap_or_else(|| panic!("Vector {} expects property {:?}", vector.id, pinned.name));
        let rendered = serde_json::to_value(property.value()).expect("Failed to render value");
        assert_eq!(
            rendered, pinned.expected,
            "Vector {} property {:?}",
            vector.id, pinned.name
        );
        assert_eq!(
            property.excluded_from_indexes(),
            pinned.excluded_from_indexes,
            "Vector {} property {:?} indexing",
            vector.id, pinned.name
        );
    }
    for name in &vector.absent {
        assert!(
            !native.contains(name),
            "Vector {} forbids property {:?}",
            vector.id, name
        );
    }
}

/// Vectors for [`crate::fixtures::User`] instances.
pub fn user_vectors() -> Vec<MappingVector> {
    vec![
        MappingVector {
            id: "user_full".into(),
            description: "Fully populated user with derived email index".into(),
            kind: "User".into(),
            parent_kind: None,
            properties: vec![
                PropertyVector::new("name", json!({"Text": "Ada Lovelace"})),
                PropertyVector::new("email", json!({"Text": "Ada@Example.com"})),
                PropertyVector::new("$email", json!({"Text": "ada@example.com"})),
                PropertyVector::new("age", json!({"Integer": 36})),
                PropertyVector::new("active", json!({"Bool": true})),
                PropertyVector::new("roles", json!({"List": [{"Text": "admin"}]})),
                PropertyVector::new(
                    "bookmarks",
                    json!({"List": [{"Text": "a"}, {"Text": "b"}, {"Text": "c"}]}),
                ),
                PropertyVector::new(
                    "logins",
                    json!({"List": [
                        {"Integer": 1_700_000_000_000_000i64},
                        {"Integer": 1_700_000_100_000_000i64}
                    ]}),
                ),
                PropertyVector::new("revision", json!({"Integer": 3})),
            ],
            absent: vec!["bio".into()],
        },
        MappingVector {
            id: "user_with_bio".into(),
            description: "Optional bio present and excluded from indexes".into(),
            kind: "User".into(),
            parent_kind: None,
            properties: vec![PropertyVector::new("bio", json!({"Text": "polymath"})).excluded()],
            absent: vec![],
        },
    ]
}

/// Vectors for [`crate::fixtures::Account`] instances.
pub fn account_vectors() -> Vec<MappingVector> {
    vec![MappingVector {
        id: "account_primary".into(),
        description: "Builder-constructed account with a text id and parent".into(),
        kind: "Account".into(),
        parent_kind: Some("User".into()),
        properties: vec![
            PropertyVector::new("balance", json!({"Double": 250.75})),
            PropertyVector::new("opened_at", json!({"Timestamp": 1_700_000_000_000_000i64})),
        ],
        absent: vec![],
    }]
}

/// Vectors for [`crate::fixtures::Customer`] instances.
pub fn customer_vectors() -> Vec<MappingVector> {
    vec![MappingVector {
        id: "customer_layouts".into(),
        description: "Exploded home address beside an imploded office".into(),
        kind: "Customer".into(),
        parent_kind: None,
        properties: vec![
            PropertyVector::new("name", json!({"Text": "Grace"})),
            PropertyVector::new("street", json!({"Text": "1 Infinite Loop"})),
            PropertyVector::new("city", json!({"Text": "Cupertino"})),
            PropertyVector::new("zip", json!({"Text": "95014"})),
            PropertyVector::new(
                "geo",
                json!({"Entity": {
                    "key": null,
                    "properties": [
                        ["lat", {"value": {"Double": 37.33}, "excluded_from_indexes": false}],
                        ["lng", {"value": {"Double": -122.03}, "excluded_from_indexes": false}]
                    ]
                }}),
            ),
            PropertyVector::new(
                "office",
                json!({"Entity": {
                    "key": null,
                    "properties": [
                        ["street", {"value": {"Text": "500 Oracle Pkwy"}, "excluded_from_indexes": false}],
                        ["city", {"value": {"Text": "Redwood City"}, "excluded_from_indexes": false}],
                        ["zip", {"value": {"Text": "94065"}, "excluded_from_indexes": false}],
                        ["geo", {"value": {"Entity": {
                            "key": null,
                            "properties": [
                                ["lat", {"value": {"Double": 37.53}, "excluded_from_indexes": false}],
                                ["lng", {"value": {"Double": -122.26}, "excluded_from_indexes": false}]
                            ]
                        }}, "excluded_from_indexes": false}]
                    ]
                }}),
            ),
        ],
        absent: vec!["home".into()],
    }]
}

/// Vectors for [`crate::fixtures::Order`] instances.
pub fn order_vectors() -> Vec<MappingVector> {
    vec![MappingVector {
        id: "order_custom_converter".into(),
        description: "Wrapper identifier with a custom percentage converter".into(),
        kind: "Order".into(),
        parent_kind: None,
        properties: vec![
            PropertyVector::new("progress", json!({"Integer": 64})),
            PropertyVector::new(
                "items",
                json!({"List": [{"Text": "widget"}, {"Text": "gadget"}]}),
            ),
        ],
        absent: vec![],
    }]
}

/// Generates all mapping vectors as JSON.
pub fn all_vectors_json() -> String {
    let vectors = AllMappingVectors {
        user: user_vectors(),
        account: account_vectors(),
        customer: customer_vectors(),
        order: order_vectors(),
    };

    serde_json::to_string_pretty(&vectors).expect("Failed to serialize vectors")
}

#[derive(Debug, Serialize, Deserialize)]
struct AllMappingVectors {
    user: Vec<MappingVector>,
    account: Vec<MappingVector>,
    customer: Vec<MappingVector>,
    order: Vec<MappingVector>,
}
