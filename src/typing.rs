//! Derived-type computation.
//!
//! Pure lookups over the resolved model: names are fully determined after
//! resolution, so nothing here re-resolves anything.

use crate::model::{
    PropertyDefinition, PropertyKind, ResolvedUnit, SchemaDefinition, SchemaKind,
};
use crate::naming;

/// The Rust storage/return type for a property, as emitted text.
///
/// Number properties become `OrderedFloat<f64>` so generated value types can
/// derive `Eq` and `Hash` structurally.
pub fn derived_type(prop: &PropertyDefinition, unit: &ResolvedUnit) -> String {
    match &prop.kind {
        PropertyKind::String => "String".to_string(),
        PropertyKind::Integer => "i64".to_string(),
        PropertyKind::Number => "OrderedFloat<f64>".to_string(),
        PropertyKind::Boolean => "bool".to_string(),
        PropertyKind::Param(name) => naming::type_name(name),
        PropertyKind::Array { item, unique } => {
            // Arrays whose item type still mentions a type parameter cannot
            // get a standalone named wrapper; they use the generic runtime
            // containers instead.
            if item_mentions_param(item) {
                let container = if *unique { "ValueSet" } else { "ValueList" };
                format!("{container}<{}>", derived_type(item, unit))
            } else {
                naming::wrapper_name(&wrapper_item_title(item, unit), *unique)
            }
        }
        PropertyKind::Reference { title, args } => {
            let name = naming::type_name(title);
            let params = declared_parameters(unit, title);
            if params.is_empty() {
                return name;
            }
            // Substitute in the referenced schema's declared parameter order,
            // not the argument map's order.
            let substituted: Vec<String> = params
                .iter()
                .map(|p| {
                    args.get(*p)
                        .map(|arg| derived_type(arg, unit))
                        .unwrap_or_else(|| naming::type_name(p))
                })
                .collect();
            format!("{name}<{}>", substituted.join(", "))
        }
    }
}

/// The item title a wrapper type is keyed on. Scalars map to the four
/// reserved value names; nested arrays key on the inner wrapper's name.
pub fn wrapper_item_title(item: &PropertyDefinition, unit: &ResolvedUnit) -> String {
    match &item.kind {
        PropertyKind::String => naming::STRING_VALUE.to_string(),
        PropertyKind::Integer => naming::INTEGER_VALUE.to_string(),
        PropertyKind::Number => naming::NUMBER_VALUE.to_string(),
        PropertyKind::Boolean => naming::BOOLEAN_VALUE.to_string(),
        PropertyKind::Reference { title, .. } => title.clone(),
        PropertyKind::Param(name) => name.clone(),
        PropertyKind::Array { item, unique } => {
            naming::wrapper_name(&wrapper_item_title(item, unit), *unique)
        }
    }
}

/// Declared type-parameter names of a schema, in declaration order.
pub fn declared_parameters<'a>(unit: &'a ResolvedUnit, title: &str) -> Vec<&'a str> {
    match unit.schema(title).map(|s| &s.kind) {
        Some(SchemaKind::Object(obj)) => obj.parameters.iter().map(|p| p.as_str()).collect(),
        Some(SchemaKind::Union(u)) => u.parameters.iter().map(|p| p.name.as_str()).collect(),
        None => Vec::new(),
    }
}

/// Whether a reference still carries open genericity at the use site: true
/// when the target declares parameters and at least one supplied argument is
/// (transitively) a type-parameter reference. A closed reference — no
/// declared parameters, or every argument concrete — can be decoded without
/// externally supplied per-parameter decoders.
pub fn needs_generic_form(prop: &PropertyDefinition) -> bool {
    match &prop.kind {
        PropertyKind::Reference { args, .. } => args.values().any(contains_param),
        _ => false,
    }
}

/// True when an array item's derived type mentions a type parameter.
pub fn item_mentions_param(item: &PropertyDefinition) -> bool {
    contains_param(item)
}

fn contains_param(prop: &PropertyDefinition) -> bool {
    match &prop.kind {
        PropertyKind::Param(_) => true,
        PropertyKind::Array { item, .. } => contains_param(item),
        PropertyKind::Reference { args, .. } => args.values().any(contains_param),
        _ => false,
    }
}

/// Only schemas with zero declared parameters can be decoded through the
/// type-erased registry.
pub fn is_closed(schema: &SchemaDefinition) -> bool {
    match &schema.kind {
        SchemaKind::Object(obj) => obj.parameters.is_empty(),
        SchemaKind::Union(u) => u.parameters.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::from_str_with_path;
    use crate::resolve::{GenOptions, resolve};

    fn resolved(src: &str) -> ResolvedUnit {
        resolve(&from_str_with_path(src).unwrap(), &GenOptions::default())
            .unwrap()
            .unit
    }

    #[test]
    fn scalar_and_wrapper_types() {
        let unit = resolved(r#"{ "name": "blog", "schemas": [
            { "kind": "object", "title": "User", "properties": {
                "name": { "type": "string" }, "email": { "type": "string" }
            }, "required": ["name", "email"] },
            { "kind": "object", "title": "Post", "properties": {
                "title": { "type": "string" },
                "score": { "type": "number" },
                "author": { "type": "ref", "schema": "User" },
                "tags": { "type": "array", "items": { "type": "string" } },
                "labels": { "type": "array", "items": { "type": "string" }, "uniqueItems": true }
            }, "required": ["title", "author"] }
        ] }"#);
        let crate::model::SchemaKind::Object(post) = &unit.schema("Post").unwrap().kind else {
            panic!()
        };
        assert_eq!(derived_type(&post.properties["title"], &unit), "String");
        assert_eq!(
            derived_type(&post.properties["score"], &unit),
            "OrderedFloat<f64>"
        );
        assert_eq!(derived_type(&post.properties["author"], &unit), "User");
        assert_eq!(
            derived_type(&post.properties["tags"], &unit),
            "StringValuesList"
        );
        assert_eq!(
            derived_type(&post.properties["labels"], &unit),
            "StringValuesSet"
        );
    }

    #[test]
    fn generic_substitution_follows_declared_order() {
        let unit = resolved(r#"{ "name": "g", "schemas": [
            { "kind": "object", "title": "Pair", "parameters": ["L", "R"], "properties": {
                "left": { "type": "param", "param": "L" },
                "right": { "type": "param", "param": "R" }
            } },
            { "kind": "object", "title": "Holder", "properties": {
                "p": { "type": "ref", "schema": "Pair", "args": {
                    "R": { "type": "integer" },
                    "L": { "type": "string" }
                } }
            } }
        ] }"#);
        let crate::model::SchemaKind::Object(holder) = &unit.schema("Holder").unwrap().kind else {
            panic!()
        };
        // args were supplied R-first; declared order L, R still wins
        assert_eq!(
            derived_type(&holder.properties["p"], &unit),
            "Pair<String, i64>"
        );
        assert!(!needs_generic_form(&holder.properties["p"]));
    }

    #[test]
    fn open_references_are_detected_transitively() {
        let unit = resolved(r#"{ "name": "g", "schemas": [
            { "kind": "object", "title": "Box", "parameters": ["T"], "properties": {
                "value": { "type": "param", "param": "T" }
            } },
            { "kind": "object", "title": "Outer", "parameters": ["U"], "properties": {
                "inner": { "type": "ref", "schema": "Box", "args": {
                    "T": { "type": "array", "items": { "type": "param", "param": "U" } }
                } }
            } }
        ] }"#);
        let crate::model::SchemaKind::Object(outer) = &unit.schema("Outer").unwrap().kind else {
            panic!()
        };
        assert!(needs_generic_form(&outer.properties["inner"]));
        assert_eq!(
            derived_type(&outer.properties["inner"], &unit),
            "Box<ValueList<U>>"
        );
    }
}
