//! Raw input mirror of the evaluated declaration document.
//!
//! The front end that evaluates schema literals is an external collaborator;
//! by the time a document reaches us it is plain JSON. These types are a
//! faithful serde mirror of that document — no validation happens here
//! beyond shape. Everything semantic (arity, references, parameters) is the
//! resolver's job, so that violations surface as our own errors with
//! schema/property context instead of serde messages.

use indexmap::IndexMap;
use serde::Deserialize;

/// Root declaration: a unit name and an ordered schema list.
#[derive(Debug, Clone, Deserialize)]
pub struct RawUnit {
    pub name: String,
    #[serde(default)]
    pub schemas: Vec<RawSchema>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RawSchema {
    Object(RawObjectSchema),
    Union(RawUnionSchema),
}

impl RawSchema {
    pub fn title(&self) -> &str {
        match self {
            RawSchema::Object(o) => &o.title,
            RawSchema::Union(u) => &u.title,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawObjectSchema {
    #[serde(default)]
    pub title: String,
    /// Declared property order is load-bearing; IndexMap preserves it.
    #[serde(default)]
    pub properties: IndexMap<String, RawProperty>,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub allowed: Option<Vec<String>>,
    #[serde(default)]
    pub nullable: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawUnionSchema {
    #[serde(default)]
    pub title: String,
    /// Each member is a primitive marker (`string`, `integer`, `number`,
    /// `boolean`) or the title of another declared schema.
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<String>,
}

/// One property literal. `kind` stays a string here so an unknown kind is a
/// generation-time error of ours, not a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProperty {
    #[serde(rename = "type", default)]
    pub kind: String,

    // kind = "ref"
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub args: IndexMap<String, RawProperty>,

    // kind = "array"
    #[serde(default)]
    pub items: Option<Box<RawProperty>>,
    #[serde(rename = "uniqueItems", default)]
    pub unique_items: bool,

    // kind = "param"
    #[serde(default)]
    pub param: Option<String>,

    // constraints
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(rename = "minLength", default)]
    pub min_length: Option<u64>,
    #[serde(rename = "maxLength", default)]
    pub max_length: Option<u64>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(rename = "exclusiveMinimum", default)]
    pub exclusive_minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
    #[serde(rename = "exclusiveMaximum", default)]
    pub exclusive_maximum: Option<f64>,
    #[serde(rename = "multipleOf", default)]
    pub multiple_of: Option<f64>,
    #[serde(rename = "minItems", default)]
    pub min_items: Option<u64>,
    #[serde(rename = "maxItems", default)]
    pub max_items: Option<u64>,
}
