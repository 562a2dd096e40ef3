//! Artifact synthesis.
//!
//! One backend per artifact family, all writing through
//! [`crate::emit::SourceWriter`]:
//!
//! - `value`     — immutable value struct per object schema
//! - `node`      — mutable tree-node view per object schema
//! - `union`     — dispatch enum per union schema
//! - `wrappers`  — one collection wrapper per (item, uniqueness) pair
//! - `aggregate` — the per-unit tree-entry dispatcher
//! - `registry`  — the per-unit type-erased decoder table
//! - `prelude`   — the fixed runtime-interface file generated code uses
//!
//! Everything iterates in declaration order; given the same resolved model
//! the artifact set is byte-for-byte identical.

pub mod aggregate;
pub mod node;
pub mod prelude;
pub mod registry;
pub mod union;
pub mod value;
pub mod wrappers;

use indexmap::IndexMap;

use crate::emit::{NamedArtifact, SourceWriter};
use crate::error::GenError;
use crate::model::{PropertyDefinition, PropertyKind, ResolvedUnit, SchemaKind};
use crate::naming::{self, NameTable};
use crate::typing;

/// A deduplicated collection wrapper: `CommentsList`, `CommentsSet`, ...
/// Identity is (item title, uniqueness), never the referencing property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperSpec {
    pub name: String,
    pub item_title: String,
    /// Derived Rust type of one element.
    pub item_ty: String,
    pub unique: bool,
}

pub fn synthesize(unit: &ResolvedUnit) -> Result<Vec<NamedArtifact>, GenError> {
    let mut names = NameTable::new();
    for schema in unit.iter() {
        names.claim(&naming::type_name(&schema.title), &schema.title)?;
    }
    let wrappers = collect_wrappers(unit, &mut names)?;

    let mut artifacts = Vec::new();
    artifacts.push(prelude::runtime_artifact());
    artifacts.push(wrappers::artifact(&wrappers, unit));
    for schema in unit.iter() {
        match &schema.kind {
            SchemaKind::Object(obj) => {
                artifacts.push(value::artifact(schema, obj, unit));
                artifacts.push(node::artifact(schema, obj, unit));
            }
            SchemaKind::Union(u) => {
                artifacts.push(union::artifact(schema, u, unit));
            }
        }
    }
    artifacts.push(aggregate::artifact(unit, &wrappers));
    artifacts.push(registry::artifact(unit));
    artifacts.push(mod_artifact(unit));
    Ok(artifacts)
}

/// Walk every property in declaration order and collect each wrapper
/// exactly once. Arrays whose item mentions an open type parameter use the
/// generic runtime containers and are skipped here.
pub(crate) fn collect_wrappers(
    unit: &ResolvedUnit,
    names: &mut NameTable,
) -> Result<Vec<WrapperSpec>, GenError> {
    let mut found: IndexMap<String, WrapperSpec> = IndexMap::new();
    for schema in unit.iter() {
        if let SchemaKind::Object(obj) = &schema.kind {
            for prop in obj.properties.values() {
                collect_from_property(prop, unit, names, &mut found)?;
            }
        }
    }
    Ok(found.into_values().collect())
}

fn collect_from_property(
    prop: &PropertyDefinition,
    unit: &ResolvedUnit,
    names: &mut NameTable,
    found: &mut IndexMap<String, WrapperSpec>,
) -> Result<(), GenError> {
    match &prop.kind {
        PropertyKind::Array { item, unique } => {
            collect_from_property(item, unit, names, found)?;
            if typing::item_mentions_param(item) {
                return Ok(());
            }
            let item_title = typing::wrapper_item_title(item, unit);
            let name = naming::wrapper_name(&item_title, *unique);
            // A wrapper may also collide with a schema title; that is a
            // generation-time error like any other identifier collision.
            let descriptor = if *unique {
                format!("set of {item_title}")
            } else {
                format!("list of {item_title}")
            };
            names.claim(&name, &descriptor)?;
            if !found.contains_key(&name) {
                found.insert(
                    name.clone(),
                    WrapperSpec {
                        name,
                        item_title: item_title.clone(),
                        item_ty: typing::derived_type(item, unit),
                        unique: *unique,
                    },
                );
            }
            Ok(())
        }
        PropertyKind::Reference { args, .. } => {
            for arg in args.values() {
                collect_from_property(arg, unit, names, found)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// The `mod.rs` that stitches a generated unit together.
fn mod_artifact(unit: &ResolvedUnit) -> NamedArtifact {
    let mut w = SourceWriter::new();
    w.line(&format!(
        "//! Generated by modelgen from unit `{}`. Do not edit.",
        unit.name
    ));
    w.blank();
    w.line("pub mod runtime;");
    w.line("pub mod wrappers;");
    for schema in unit.iter() {
        let snake = naming::snake_name(&schema.title);
        w.line(&format!("pub mod {snake};"));
        if matches!(schema.kind, SchemaKind::Object(_)) {
            w.line(&format!("pub mod {snake}_node;"));
        }
    }
    w.line("pub mod tree_entry;");
    w.line("pub mod decoders;");
    w.blank();
    w.line("pub use runtime::*;");
    w.line("pub use wrappers::*;");
    for schema in unit.iter() {
        let snake = naming::snake_name(&schema.title);
        let ty = naming::type_name(&schema.title);
        w.line(&format!("pub use {snake}::{ty};"));
        if matches!(schema.kind, SchemaKind::Object(_)) {
            w.line(&format!("pub use {snake}_node::{ty}Node;"));
        }
    }
    NamedArtifact {
        file_name: "mod.rs".to_string(),
        source: w.into_string(),
    }
}

/// Shared field plan: the single source of truth for field order in every
/// encode and decode emission, which is what keeps the two directions of
/// each format in agreement.
#[derive(Debug, Clone)]
pub struct FieldPlan {
    /// Property name as declared (codec key).
    pub key: String,
    /// Rust field name.
    pub field: String,
    /// Derived Rust type.
    pub ty: String,
    pub nullable: bool,
}

pub fn field_plans(obj: &crate::model::ObjectInfo, unit: &ResolvedUnit) -> Vec<FieldPlan> {
    obj.properties
        .values()
        .map(|prop| FieldPlan {
            key: prop.name.clone(),
            field: naming::snake_name(&prop.name),
            ty: typing::derived_type(prop, unit),
            nullable: prop.nullable,
        })
        .collect()
}

/// One of the two text formats, as the trait/method names the generated
/// code uses for it. Encode and decode emission both walk the same
/// [`FieldPlan`] list, which is what keeps the two directions in agreement.
#[derive(Debug, Clone, Copy)]
pub struct TextFormat {
    pub encode_trait: &'static str,
    pub decode_trait: &'static str,
    pub write_trait: &'static str,
    pub read_trait: &'static str,
    pub encode_fn: &'static str,
    pub decode_fn: &'static str,
}

/// Compact delimited block format.
pub const BLOCK: TextFormat = TextFormat {
    encode_trait: "BlockEncode",
    decode_trait: "BlockDecode",
    write_trait: "BlockWrite",
    read_trait: "BlockRead",
    encode_fn: "encode_block",
    decode_fn: "decode_block",
};

/// Line-oriented indented format.
pub const LINES: TextFormat = TextFormat {
    encode_trait: "LineEncode",
    decode_trait: "LineDecode",
    write_trait: "LineWrite",
    read_trait: "LineRead",
    encode_fn: "encode_lines",
    decode_fn: "decode_lines",
};

pub const TEXT_FORMATS: [TextFormat; 2] = [BLOCK, LINES];

/// `<T, U>` for a parameterized schema, empty for a plain one.
pub fn generics_decl(params: &[String]) -> String {
    if params.is_empty() {
        String::new()
    } else {
        format!("<{}>", params.join(", "))
    }
}

/// `<T: Bound, U: Bound>` for trait impl headers.
pub fn generics_bounded(params: &[String], bound: &str) -> String {
    if params.is_empty() {
        String::new()
    } else {
        let list: Vec<String> = params.iter().map(|p| format!("{p}: {bound}")).collect();
        format!("<{}>", list.join(", "))
    }
}
