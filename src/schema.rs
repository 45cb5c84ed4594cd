//! Defines the closed set of data-shape descriptors (`SchemaNode`).
//!
//! A `SchemaNode` describes the exact shape of the data a query operation will
//! produce, before anything executes. Nodes are plain, acyclic values: they
//! serialize as-is and can cross a process boundary unchanged. Relationship
//! kinds (`LookupBelongs`, `LookupContains`, `LookupHasMany`) embed the target
//! entity's schema by value, so a schema tree never needs back-references.

use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};

/// Rendering format of a boolean field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BooleanFormat {
    Checkbox,
    YesNo,
}

/// Rendering format of a date-time field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateTimeFormat {
    DateTime,
    Date,
    Time,
}

/// One named field of a `Complex` schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexField {
    pub name: String,
    pub title: String,
    pub schema: SchemaNode,
    pub is_nullable: bool,
}

/// The closed, tagged union of data shapes.
///
/// Invariant: `Complex.key` is a subset of its field names; non-empty for root
/// entity schemas, empty for ad-hoc projected shapes.
///
/// Equality is deep structural equality (the derived `PartialEq`), so two
/// `Complex` schemas compare equal only when their fields match field-by-field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EnumAsInner)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SchemaNode {
    Boolean {
        format: BooleanFormat,
    },
    Choice {
        choices: Vec<String>,
        multi: bool,
    },
    DateTime {
        format: DateTimeFormat,
        /// ISO-8601 lower bound, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<String>,
        /// ISO-8601 upper bound, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<String>,
    },
    Integer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lcid: Option<u32>,
    },
    Decimal {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lcid: Option<u32>,
        #[serde(default)]
        show_as_percent: bool,
    },
    Currency {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        lcid: u32,
    },
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<u32>,
    },
    Complex {
        fields: Vec<ComplexField>,
        key: Vec<String>,
    },
    Collection {
        element_schema: Box<SchemaNode>,
    },
    /// Many-to-one: this record embeds foreign key(s) resolving to one target row.
    LookupBelongs {
        lookup_schema: Box<SchemaNode>,
        foreign_field_names: Vec<String>,
    },
    /// One-to-many: target rows whose foreign key points back here.
    LookupContains {
        lookup_schema: Box<SchemaNode>,
        lookup_foreign_field_names: Vec<String>,
    },
    /// Many-to-many via a junction schema.
    LookupHasMany {
        lookup_schema: Box<SchemaNode>,
        relationship_schema: Box<SchemaNode>,
        this_field_names: Vec<String>,
        lookup_field_names: Vec<String>,
    },
}

impl SchemaNode {
    /// A plain integer with no bounds or locale.
    pub fn integer() -> Self {
        SchemaNode::Integer {
            min: None,
            max: None,
            lcid: None,
        }
    }

    /// A plain decimal with no bounds, locale, or percent display.
    pub fn decimal() -> Self {
        SchemaNode::Decimal {
            min: None,
            max: None,
            lcid: None,
            show_as_percent: false,
        }
    }

    /// A currency in the given locale, with no bounds.
    pub fn currency(lcid: u32) -> Self {
        SchemaNode::Currency {
            min: None,
            max: None,
            lcid,
        }
    }

    pub fn text(max_length: Option<u32>) -> Self {
        SchemaNode::Text { max_length }
    }

    pub fn boolean(format: BooleanFormat) -> Self {
        SchemaNode::Boolean { format }
    }

    pub fn collection(element_schema: SchemaNode) -> Self {
        SchemaNode::Collection {
            element_schema: Box::new(element_schema),
        }
    }

    /// The placeholder element shape of an empty collection literal.
    pub fn empty_complex() -> Self {
        SchemaNode::Complex {
            fields: vec![],
            key: vec![],
        }
    }

    /// The wire tag of this node's kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            SchemaNode::Boolean { .. } => "boolean",
            SchemaNode::Choice { .. } => "choice",
            SchemaNode::DateTime { .. } => "dateTime",
            SchemaNode::Integer { .. } => "integer",
            SchemaNode::Decimal { .. } => "decimal",
            SchemaNode::Currency { .. } => "currency",
            SchemaNode::Text { .. } => "text",
            SchemaNode::Complex { .. } => "complex",
            SchemaNode::Collection { .. } => "collection",
            SchemaNode::LookupBelongs { .. } => "lookupBelongs",
            SchemaNode::LookupContains { .. } => "lookupContains",
            SchemaNode::LookupHasMany { .. } => "lookupHasMany",
        }
    }
}

impl std::fmt::Display for SchemaNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaNode::Currency { lcid, .. } => write!(f, "currency(lcid={lcid})"),
            other => other.kind_name().fmt(f),
        }
    }
}
