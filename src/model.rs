// Strongly-typed semantic model. No serde_json::Value past resolution.

use indexmap::IndexMap;
use ordered_float::OrderedFloat;

/// A named, resolved schema. Created once during resolution, never mutated
/// afterwards; owned by the [`ResolvedUnit`] registry, keyed by title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDefinition {
    pub title: String,
    pub kind: SchemaKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaKind {
    Object(ObjectInfo),
    Union(UnionInfo),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Declared property order is preserved; serialization and field order
    /// everywhere downstream follow this map's order exactly.
    pub properties: IndexMap<String, PropertyDefinition>,
    /// Declared generic type-parameter names, in declaration order.
    pub parameters: Vec<String>,
    pub required: Vec<String>,
    /// Closed-world property whitelist, when declared.
    pub allowed: Option<Vec<String>>,
    /// Properties exempt from non-null enforcement at mutation sites,
    /// independent of the derived per-property `nullable` flag.
    pub nullable_exempt: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionInfo {
    /// Concrete members, in declaration order. Order matters: untagged
    /// decode tries members in this order and commits to the first success.
    pub members: Vec<UnionMember>,
    /// Declared type parameters, each with its synthesized accessor name.
    pub parameters: Vec<UnionParam>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnionMember {
    String,
    Integer,
    Number,
    Boolean,
    /// Reference to another object or union schema, by title.
    Schema(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionParam {
    pub name: String,
    /// Synthesized accessor stem, e.g. `payload` for parameter `Payload`.
    pub accessor: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDefinition {
    pub name: String,
    pub kind: PropertyKind,
    /// Derived: not listed in the enclosing schema's required list.
    pub nullable: bool,
    pub constraints: ValidationConstraints,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    String,
    Integer,
    Number,
    Boolean,
    /// Reference to another schema by title, with type arguments keyed by
    /// the referenced schema's declared parameter names.
    Reference {
        title: String,
        args: IndexMap<String, PropertyDefinition>,
    },
    Array {
        item: Box<PropertyDefinition>,
        /// Selects the set-like wrapper instead of the list-like one.
        unique: bool,
    },
    /// Reference to a type parameter declared by the enclosing schema.
    Param(String),
}

/// Optional per-property bounds. Numeric bounds are stored ordered so the
/// whole model stays `Eq`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationConstraints {
    // string
    pub pattern: Option<String>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub format: Option<String>,
    // integer / number
    pub minimum: Option<OrderedFloat<f64>>,
    pub exclusive_minimum: Option<OrderedFloat<f64>>,
    pub maximum: Option<OrderedFloat<f64>>,
    pub exclusive_maximum: Option<OrderedFloat<f64>>,
    pub multiple_of: Option<OrderedFloat<f64>>,
    // array
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
}

impl ValidationConstraints {
    pub fn has_constraints(&self) -> bool {
        self.pattern.is_some()
            || self.min_length.is_some()
            || self.max_length.is_some()
            || self.format.is_some()
            || self.minimum.is_some()
            || self.exclusive_minimum.is_some()
            || self.maximum.is_some()
            || self.exclusive_maximum.is_some()
            || self.multiple_of.is_some()
            || self.min_items.is_some()
            || self.max_items.is_some()
    }
}

/// The output of one resolution run: every schema of one compilation unit,
/// fully analyzed, in declaration order (after duplicate-title policy).
#[derive(Debug, Clone)]
pub struct ResolvedUnit {
    pub name: String,
    pub schemas: IndexMap<String, SchemaDefinition>,
}

impl ResolvedUnit {
    pub fn schema(&self, title: &str) -> Option<&SchemaDefinition> {
        self.schemas.get(title)
    }

    /// Schemas in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &SchemaDefinition> {
        self.schemas.values()
    }

    pub fn objects(&self) -> impl Iterator<Item = (&SchemaDefinition, &ObjectInfo)> {
        self.schemas.values().filter_map(|s| match &s.kind {
            SchemaKind::Object(obj) => Some((s, obj)),
            SchemaKind::Union(_) => None,
        })
    }

    pub fn unions(&self) -> impl Iterator<Item = (&SchemaDefinition, &UnionInfo)> {
        self.schemas.values().filter_map(|s| match &s.kind {
            SchemaKind::Union(u) => Some((s, u)),
            SchemaKind::Object(_) => None,
        })
    }
}

impl ObjectInfo {
    /// Nullability at mutation sites: the derived flag, widened by the
    /// explicit nullable list.
    pub fn mutation_nullable(&self, property: &str) -> bool {
        self.nullable_exempt.iter().any(|n| n == property)
            || self
                .properties
                .get(property)
                .map(|p| p.nullable)
                .unwrap_or(false)
    }
}

impl UnionInfo {
    /// Concrete members plus type parameters.
    pub fn total_arity(&self) -> usize {
        self.members.len() + self.parameters.len()
    }
}
