//! Two-pass schema resolution.
//!
//! Declarations may forward-reference each other and may be mutually
//! recursive, so resolution runs in two passes:
//!
//! - **Pass 1 (registration):** every declaration is registered by title.
//!   This registration — title, kind, declared parameter names — is the
//!   placeholder that any cross-reference resolves against.
//! - **Pass 2 (analysis):** each registered schema is analyzed exactly once,
//!   memoized by title. Re-entering an in-progress title reuses the
//!   placeholder instead of recursing, which is what makes cycles terminate;
//!   there is no depth limit.
//!
//! All generation-time validation lives here so the synthesizer can treat
//! the resolved model as trustworthy.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use ordered_float::OrderedFloat;

use crate::error::GenError;
use crate::model::{
    ObjectInfo, PropertyDefinition, PropertyKind, ResolvedUnit, SchemaDefinition, SchemaKind,
    UnionInfo, UnionMember, UnionParam, ValidationConstraints,
};
use crate::naming::{self, NameTable};
use crate::raw::{RawObjectSchema, RawProperty, RawSchema, RawUnionSchema, RawUnit};

// ------------------------------- Policy ---------------------------------- //

/// Arity cap applied only when the legacy switch is on.
const LEGACY_UNION_ARITY_LIMIT: usize = 4;

#[derive(Debug, Clone, Default)]
pub struct GenOptions {
    /// Enforce the legacy ≤4 cap on total union arity.
    pub legacy_union_limit: bool,
}

/// A resolved unit plus the non-fatal diagnostics collected along the way.
/// Printing is the caller's concern; the resolver never touches stderr.
#[derive(Debug)]
pub struct Resolution {
    pub unit: ResolvedUnit,
    pub warnings: Vec<String>,
}

pub fn resolve(raw: &RawUnit, opts: &GenOptions) -> Result<Resolution, GenError> {
    if raw.schemas.is_empty() {
        return Err(GenError::EmptySchemaList {
            unit: raw.name.clone(),
        });
    }

    let mut warnings = Vec::new();

    // ---- Pass 1: register placeholders by title ----
    // Duplicate titles: the later declaration wins (its content replaces the
    // earlier one) while keeping the earlier declaration's position, so
    // output order stays deterministic. Deliberate, warned, tested.
    let mut registry: IndexMap<String, &RawSchema> = IndexMap::new();
    let mut names = NameTable::new();
    for (index, schema) in raw.schemas.iter().enumerate() {
        let title = schema.title();
        if title.is_empty() {
            return Err(GenError::EmptyTitle {
                unit: raw.name.clone(),
                index,
            });
        }
        if registry.insert(title.to_string(), schema).is_some() {
            warnings.push(format!(
                "duplicate schema title `{title}`: the later declaration replaces the earlier one"
            ));
        }
        names.claim(&naming::type_name(title), title)?;
    }

    // ---- Pass 2: full analysis, memoized by title ----
    let mut resolver = Resolver {
        registry: &registry,
        opts,
        resolved: BTreeMap::new(),
        state: BTreeMap::new(),
    };
    for title in registry.keys() {
        resolver.analyze(title)?;
    }

    let mut schemas = IndexMap::new();
    for title in registry.keys() {
        let def = resolver
            .resolved
            .remove(title)
            .unwrap_or_else(|| unreachable!("pass 2 resolved every registered title"));
        schemas.insert(title.clone(), def);
    }

    Ok(Resolution {
        unit: ResolvedUnit {
            name: raw.name.clone(),
            schemas,
        },
        warnings,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    InProgress,
    Done,
}

struct Resolver<'a> {
    registry: &'a IndexMap<String, &'a RawSchema>,
    opts: &'a GenOptions,
    resolved: BTreeMap<String, SchemaDefinition>,
    state: BTreeMap<String, State>,
}

impl<'a> Resolver<'a> {
    /// Analyze `title` at most once. An in-progress or finished title is a
    /// no-op: references to it resolve against its registration.
    fn analyze(&mut self, title: &str) -> Result<(), GenError> {
        if self.state.contains_key(title) {
            return Ok(());
        }
        self.state.insert(title.to_string(), State::InProgress);

        let raw = *self
            .registry
            .get(title)
            .unwrap_or_else(|| unreachable!("analyze is only called for registered titles"));
        let kind = match raw {
            RawSchema::Object(o) => SchemaKind::Object(self.analyze_object(title, o)?),
            RawSchema::Union(u) => SchemaKind::Union(self.analyze_union(title, u)?),
        };

        self.resolved.insert(
            title.to_string(),
            SchemaDefinition {
                title: title.to_string(),
                kind,
            },
        );
        self.state.insert(title.to_string(), State::Done);
        Ok(())
    }

    fn analyze_object(&mut self, title: &str, raw: &RawObjectSchema) -> Result<ObjectInfo, GenError> {
        let mut properties = IndexMap::new();
        for (name, prop) in &raw.properties {
            let kind = self.analyze_property_kind(title, name, prop, &raw.parameters)?;
            let nullable = !raw.required.iter().any(|r| r == name);
            properties.insert(
                name.clone(),
                PropertyDefinition {
                    name: name.clone(),
                    kind,
                    nullable,
                    constraints: constraints_of(title, name, prop)?,
                },
            );
        }
        Ok(ObjectInfo {
            properties,
            parameters: raw.parameters.clone(),
            required: raw.required.clone(),
            allowed: raw.allowed.clone(),
            nullable_exempt: raw.nullable.clone(),
        })
    }

    fn analyze_union(&mut self, title: &str, raw: &RawUnionSchema) -> Result<UnionInfo, GenError> {
        let mut members = Vec::with_capacity(raw.members.len());
        for member in &raw.members {
            let m = match member.as_str() {
                "string" => UnionMember::String,
                "integer" => UnionMember::Integer,
                "number" => UnionMember::Number,
                "boolean" => UnionMember::Boolean,
                other => {
                    let Some(target) = self.registry.get(other).copied() else {
                        return Err(GenError::UnknownUnionMember {
                            title: title.to_string(),
                            member: other.to_string(),
                        });
                    };
                    // A member slot carries no argument list, so a target
                    // that declares parameters can never be instantiated.
                    if let Some(param) = declared_params_of(target).first() {
                        return Err(GenError::GenericUnionMember {
                            title: title.to_string(),
                            member: other.to_string(),
                            param: param.clone(),
                        });
                    }
                    self.analyze(other)?;
                    UnionMember::Schema(other.to_string())
                }
            };
            members.push(m);
        }

        let parameters: Vec<UnionParam> = raw
            .parameters
            .iter()
            .map(|p| UnionParam {
                name: p.clone(),
                accessor: naming::union_param_accessor(p),
            })
            .collect();

        let info = UnionInfo {
            members,
            parameters,
        };
        let arity = info.total_arity();
        if arity < 2 {
            return Err(GenError::UnionArityTooFew {
                title: title.to_string(),
                arity,
            });
        }
        if self.opts.legacy_union_limit && arity > LEGACY_UNION_ARITY_LIMIT {
            return Err(GenError::UnionArityTooMany {
                title: title.to_string(),
                arity,
                limit: LEGACY_UNION_ARITY_LIMIT,
            });
        }

        Ok(info)
    }

    fn analyze_property_kind(
        &mut self,
        schema: &str,
        property: &str,
        raw: &RawProperty,
        declared_params: &[String],
    ) -> Result<PropertyKind, GenError> {
        match raw.kind.as_str() {
            "string" => Ok(PropertyKind::String),
            "integer" => Ok(PropertyKind::Integer),
            "number" => Ok(PropertyKind::Number),
            "boolean" => Ok(PropertyKind::Boolean),
            "array" => {
                let item = raw.items.as_deref().cloned().unwrap_or_default();
                let item_kind =
                    self.analyze_property_kind(schema, property, &item, declared_params)?;
                Ok(PropertyKind::Array {
                    item: Box::new(PropertyDefinition {
                        name: property.to_string(),
                        kind: item_kind,
                        nullable: false,
                        constraints: constraints_of(schema, property, &item)?,
                    }),
                    unique: raw.unique_items,
                })
            }
            "param" => {
                let name = raw.param.clone().unwrap_or_default();
                if !declared_params.iter().any(|p| p == &name) {
                    return Err(GenError::UndeclaredParam {
                        schema: schema.to_string(),
                        property: property.to_string(),
                        param: name,
                    });
                }
                Ok(PropertyKind::Param(name))
            }
            "ref" => {
                let target = raw.schema.clone().unwrap_or_default();
                let Some(target_raw) = self.registry.get(&target).copied() else {
                    return Err(GenError::UnknownReference {
                        schema: schema.to_string(),
                        property: property.to_string(),
                        target,
                    });
                };
                // Placeholder is enough to validate the argument set; the
                // recursive analyze call is memoized, so cycles are safe.
                self.analyze(&target)?;

                let target_params = declared_params_of(target_raw);
                for p in target_params {
                    if !raw.args.contains_key(p) {
                        return Err(GenError::MissingTypeArgument {
                            schema: schema.to_string(),
                            property: property.to_string(),
                            target: target.clone(),
                            param: p.clone(),
                        });
                    }
                }
                for arg in raw.args.keys() {
                    if !target_params.iter().any(|p| p == arg) {
                        return Err(GenError::UnknownTypeArgument {
                            schema: schema.to_string(),
                            property: property.to_string(),
                            target: target.clone(),
                            arg: arg.clone(),
                        });
                    }
                }

                let mut args = IndexMap::new();
                for (key, value) in &raw.args {
                    let kind =
                        self.analyze_property_kind(schema, property, value, declared_params)?;
                    args.insert(
                        key.clone(),
                        PropertyDefinition {
                            name: key.clone(),
                            kind,
                            nullable: false,
                            constraints: constraints_of(schema, property, value)?,
                        },
                    );
                }
                Ok(PropertyKind::Reference {
                    title: target,
                    args,
                })
            }
            other => Err(GenError::UnsupportedKind {
                schema: schema.to_string(),
                property: property.to_string(),
                kind: other.to_string(),
            }),
        }
    }
}

fn declared_params_of(raw: &RawSchema) -> &[String] {
    match raw {
        RawSchema::Object(o) => &o.parameters,
        RawSchema::Union(u) => &u.parameters,
    }
}

fn constraints_of(
    schema: &str,
    property: &str,
    raw: &RawProperty,
) -> Result<ValidationConstraints, GenError> {
    if let Some(pattern) = &raw.pattern {
        // Fail the run now rather than emitting a pattern the generated
        // code cannot compile.
        regex::Regex::new(pattern).map_err(|e| GenError::BadPattern {
            schema: schema.to_string(),
            property: property.to_string(),
            source: Box::new(e),
        })?;
    }
    Ok(ValidationConstraints {
        pattern: raw.pattern.clone(),
        min_length: raw.min_length,
        max_length: raw.max_length,
        format: raw.format.clone(),
        minimum: raw.minimum.map(OrderedFloat),
        exclusive_minimum: raw.exclusive_minimum.map(OrderedFloat),
        maximum: raw.maximum.map(OrderedFloat),
        exclusive_maximum: raw.exclusive_maximum.map(OrderedFloat),
        multiple_of: raw.multiple_of.map(OrderedFloat),
        min_items: raw.min_items,
        max_items: raw.max_items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::from_str_with_path;

    fn unit(src: &str) -> RawUnit {
        from_str_with_path(src).unwrap()
    }

    fn ok(src: &str) -> Resolution {
        resolve(&unit(src), &GenOptions::default()).unwrap()
    }

    fn err(src: &str) -> GenError {
        resolve(&unit(src), &GenOptions::default()).unwrap_err()
    }

    #[test]
    fn empty_schema_list_is_rejected() {
        assert!(matches!(
            err(r#"{ "name": "empty", "schemas": [] }"#),
            GenError::EmptySchemaList { .. }
        ));
    }

    #[test]
    fn empty_title_is_rejected() {
        let e = err(r#"{ "name": "u", "schemas": [{ "kind": "object" }] }"#);
        assert!(matches!(e, GenError::EmptyTitle { index: 0, .. }));
    }

    #[test]
    fn forward_and_mutual_references_resolve() {
        let r = ok(r#"{
            "name": "blog",
            "schemas": [
                { "kind": "object", "title": "Post", "properties": {
                    "author": { "type": "ref", "schema": "User" },
                    "reply": { "type": "ref", "schema": "Post" }
                }, "required": ["author"] },
                { "kind": "object", "title": "User", "properties": {
                    "last": { "type": "ref", "schema": "Post" }
                } }
            ]
        }"#);
        // Post references User before User is declared, User references Post
        // back, and Post references itself. Memoization terminates all of it.
        assert_eq!(r.unit.schemas.len(), 2);
        let post = r.unit.schema("Post").unwrap();
        let SchemaKind::Object(obj) = &post.kind else {
            panic!()
        };
        assert!(!obj.properties["author"].nullable);
        assert!(obj.properties["reply"].nullable);
    }

    #[test]
    fn duplicate_title_last_wins_with_warning() {
        let r = ok(r#"{
            "name": "dup",
            "schemas": [
                { "kind": "object", "title": "Thing", "properties": { "a": { "type": "string" } } },
                { "kind": "object", "title": "Thing", "properties": { "b": { "type": "string" } } }
            ]
        }"#);
        assert_eq!(r.warnings.len(), 1);
        let SchemaKind::Object(obj) = &r.unit.schema("Thing").unwrap().kind else {
            panic!()
        };
        assert!(obj.properties.contains_key("b"), "later declaration wins");
        assert!(!obj.properties.contains_key("a"));
    }

    #[test]
    fn union_arity_one_fails_two_succeeds() {
        let e = err(r#"{ "name": "u", "schemas": [
            { "kind": "union", "title": "Only", "members": ["string"] }
        ] }"#);
        assert!(matches!(e, GenError::UnionArityTooFew { arity: 1, .. }));

        ok(r#"{ "name": "u", "schemas": [
            { "kind": "union", "title": "Id", "members": ["string", "integer"] }
        ] }"#);
    }

    #[test]
    fn type_parameters_count_toward_arity() {
        // one concrete member + one parameter = arity 2
        ok(r#"{ "name": "u", "schemas": [
            { "kind": "union", "title": "Maybe", "members": ["string"], "parameters": ["Payload"] }
        ] }"#);
    }

    #[test]
    fn legacy_mode_caps_arity_at_four() {
        let raw = unit(r#"{ "name": "u", "schemas": [
            { "kind": "union", "title": "Wide",
              "members": ["string", "integer", "number", "boolean"],
              "parameters": ["Extra"] }
        ] }"#);
        resolve(&raw, &GenOptions::default()).unwrap();
        let e = resolve(
            &raw,
            &GenOptions {
                legacy_union_limit: true,
            },
        )
        .unwrap_err();
        assert!(matches!(
            e,
            GenError::UnionArityTooMany {
                arity: 5,
                limit: 4,
                ..
            }
        ));
    }

    #[test]
    fn union_member_referencing_parameterized_schema_is_rejected() {
        // The member slot has nowhere to put a type argument, so a generic
        // target must be refused up front rather than emitted unbound.
        let e = err(r#"{ "name": "u", "schemas": [
            { "kind": "object", "title": "Wrapper", "parameters": ["T"], "properties": {
                "value": { "type": "param", "param": "T" }
            }, "required": ["value"] },
            { "kind": "union", "title": "Event", "members": ["Wrapper", "string"] }
        ] }"#);
        assert!(matches!(
            e,
            GenError::GenericUnionMember { ref title, ref member, ref param }
                if title == "Event" && member == "Wrapper" && param == "T"
        ));
    }

    #[test]
    fn undeclared_param_reference_is_rejected() {
        let e = err(r#"{ "name": "u", "schemas": [
            { "kind": "object", "title": "Box", "properties": {
                "value": { "type": "param", "param": "T" }
            } }
        ] }"#);
        assert!(matches!(e, GenError::UndeclaredParam { ref param, .. } if param == "T"));
    }

    #[test]
    fn missing_type_argument_names_the_parameter() {
        let e = err(r#"{ "name": "u", "schemas": [
            { "kind": "object", "title": "Box", "parameters": ["T"], "properties": {
                "value": { "type": "param", "param": "T" }
            } },
            { "kind": "object", "title": "Holder", "properties": {
                "boxed": { "type": "ref", "schema": "Box" }
            } }
        ] }"#);
        assert!(
            matches!(e, GenError::MissingTypeArgument { ref param, ref target, .. }
                if param == "T" && target == "Box")
        );
    }

    #[test]
    fn unknown_type_argument_is_rejected() {
        let e = err(r#"{ "name": "u", "schemas": [
            { "kind": "object", "title": "Plain", "properties": {} },
            { "kind": "object", "title": "Holder", "properties": {
                "p": { "type": "ref", "schema": "Plain", "args": { "T": { "type": "string" } } }
            } }
        ] }"#);
        assert!(matches!(e, GenError::UnknownTypeArgument { ref arg, .. } if arg == "T"));
    }

    #[test]
    fn unsupported_kind_is_rejected_with_context() {
        let e = err(r#"{ "name": "u", "schemas": [
            { "kind": "object", "title": "Odd", "properties": {
                "weird": { "type": "tuple" }
            } }
        ] }"#);
        assert!(
            matches!(e, GenError::UnsupportedKind { ref property, ref kind, .. }
                if property == "weird" && kind == "tuple")
        );
    }

    #[test]
    fn colliding_derived_identifiers_fail_generation() {
        let e = err(r#"{ "name": "u", "schemas": [
            { "kind": "object", "title": "blog post", "properties": {} },
            { "kind": "object", "title": "Blog_Post", "properties": {} }
        ] }"#);
        assert!(matches!(e, GenError::IdentifierCollision { ref ident, .. } if ident == "BlogPost"));
    }

    #[test]
    fn bad_pattern_fails_at_generation_time() {
        let e = err(r#"{ "name": "u", "schemas": [
            { "kind": "object", "title": "S", "properties": {
                "code": { "type": "string", "pattern": "([" }
            } }
        ] }"#);
        assert!(matches!(e, GenError::BadPattern { .. }));
    }

    #[test]
    fn array_item_reference_resolves_without_its_own_title() {
        let r = ok(r#"{ "name": "u", "schemas": [
            { "kind": "object", "title": "Comment", "properties": {
                "body": { "type": "string" }
            } },
            { "kind": "object", "title": "Post", "properties": {
                "comments": { "type": "array", "items": { "type": "ref", "schema": "Comment" } }
            } }
        ] }"#);
        let SchemaKind::Object(obj) = &r.unit.schema("Post").unwrap().kind else {
            panic!()
        };
        let PropertyKind::Array { item, unique } = &obj.properties["comments"].kind else {
            panic!("expected array kind")
        };
        assert!(!unique);
        assert!(matches!(&item.kind, PropertyKind::Reference { title, .. } if title == "Comment"));
    }
}
