//! Aggregate-artifact emission: the per-unit tree-entry dispatcher.
//!
//! `tree_entry` turns one type-erased runtime value into its node
//! description: a node label, the labelled edges to its children, and the
//! union slot the value sits in when it arrived through a union. Candidates
//! are checked in a fixed order — the four primitives, then every closed
//! object schema, closed union and wrapper in declaration order, then the
//! generic list and map fallbacks. Parameterized schemas have no entry;
//! their concrete instantiations cannot be enumerated ahead of time.

use crate::emit::{NamedArtifact, SourceWriter};
use crate::model::{ObjectInfo, ResolvedUnit, SchemaDefinition, SchemaKind, UnionInfo};
use crate::naming;
use crate::typing;

use super::{WrapperSpec, field_plans, union};

pub fn artifact(unit: &ResolvedUnit, wrappers: &[WrapperSpec]) -> NamedArtifact {
    let mut w = SourceWriter::new();
    w.line(&format!(
        "//! Generated by modelgen from unit `{}`. Do not edit.",
        unit.name
    ));
    w.blank();
    w.line("use std::any::Any;");
    w.blank();
    w.line("use super::*;");
    w.blank();

    write_entry_type(&mut w);
    w.blank();

    w.open("pub fn tree_entry<'a>(value: &'a dyn Any) -> Result<TreeEntry<'a>, UnrecognizedValue>");
    write_primitive_arms(&mut w);
    for schema in unit.iter().filter(|s| typing::is_closed(s)) {
        match &schema.kind {
            SchemaKind::Object(obj) => write_object_arm(&mut w, schema, obj, unit),
            SchemaKind::Union(info) => write_union_arm(&mut w, schema, info),
        }
    }
    for spec in wrappers {
        write_wrapper_arm(&mut w, spec);
    }
    write_fallback_arms(&mut w);
    w.line("Err(UnrecognizedValue)");
    w.close();

    NamedArtifact {
        file_name: "tree_entry.rs".to_string(),
        source: w.into_string(),
    }
}

fn write_entry_type(w: &mut SourceWriter) {
    w.line("/// One runtime value as a tree node: its label, its labelled");
    w.line("/// child edges, and the union slot it arrived through, if any.");
    w.open("pub struct TreeEntry<'a>");
    w.line("pub node: &'static str,");
    w.line("pub edges: Vec<(String, &'a dyn Any)>,");
    w.line("pub union_slot: Option<&'static str>,");
    w.close();
}

fn write_primitive_arms(w: &mut SourceWriter) {
    for (rust_ty, node) in [
        ("String", naming::STRING_VALUE),
        ("i64", naming::INTEGER_VALUE),
        ("OrderedFloat<f64>", naming::NUMBER_VALUE),
        ("f64", naming::NUMBER_VALUE),
        ("bool", naming::BOOLEAN_VALUE),
    ] {
        w.open(&format!("if value.downcast_ref::<{rust_ty}>().is_some()"));
        w.line(&format!(
            "return Ok(TreeEntry {{ node: {node:?}, edges: Vec::new(), union_slot: None }});"
        ));
        w.close();
    }
}

fn write_object_arm(
    w: &mut SourceWriter,
    schema: &SchemaDefinition,
    obj: &ObjectInfo,
    unit: &ResolvedUnit,
) {
    let ty = naming::type_name(&schema.title);
    w.open(&format!("if let Some(value) = value.downcast_ref::<{ty}>()"));
    w.line("let mut edges: Vec<(String, &dyn Any)> = Vec::new();");
    for plan in field_plans(obj, unit) {
        if plan.nullable {
            // absent optional slots produce no edge
            w.open(&format!("if let Some(child) = &value.{}", plan.field));
            w.line(&format!("edges.push(({:?}.to_string(), child as &dyn Any));", plan.key));
            w.close();
        } else {
            w.line(&format!(
                "edges.push(({:?}.to_string(), &value.{} as &dyn Any));",
                plan.key, plan.field
            ));
        }
    }
    w.line(&format!(
        "return Ok(TreeEntry {{ node: {ty:?}, edges, union_slot: None }});"
    ));
    w.close();
}

fn write_union_arm(w: &mut SourceWriter, schema: &SchemaDefinition, info: &UnionInfo) {
    let ty = naming::type_name(&schema.title);
    w.open(&format!("if let Some(value) = value.downcast_ref::<{ty}>()"));
    w.open("let (slot, inner): (&'static str, &dyn Any) = match value");
    for plan in union::variant_plans(info) {
        w.line(&format!(
            "{ty}::{}(inner) => ({:?}, inner as &dyn Any),",
            plan.variant, plan.stem
        ));
    }
    w.close_with(";");
    w.line("let mut entry = tree_entry(inner)?;");
    w.line("entry.union_slot = Some(slot);");
    w.line("return Ok(entry);");
    w.close();
}

fn write_wrapper_arm(w: &mut SourceWriter, spec: &WrapperSpec) {
    let name = &spec.name;
    w.open(&format!("if let Some(value) = value.downcast_ref::<{name}>()"));
    w.line("let mut edges: Vec<(String, &dyn Any)> = Vec::new();");
    w.open("for (index, item) in value.0.iter().enumerate()");
    w.line("edges.push((index.to_string(), item as &dyn Any));");
    w.close();
    w.line(&format!(
        "return Ok(TreeEntry {{ node: {name:?}, edges, union_slot: None }});"
    ));
    w.close();
}

fn write_fallback_arms(w: &mut SourceWriter) {
    w.open("if let Some(values) = value.downcast_ref::<Vec<Box<dyn Any>>>()");
    w.line("let mut edges: Vec<(String, &dyn Any)> = Vec::new();");
    w.open("for (index, item) in values.iter().enumerate()");
    w.line("edges.push((index.to_string(), item.as_ref()));");
    w.close();
    w.line("return Ok(TreeEntry { node: \"List\", edges, union_slot: None });");
    w.close();
    w.open(
        "if let Some(entries) = value.downcast_ref::<std::collections::BTreeMap<String, Box<dyn Any>>>()",
    );
    w.line("let mut edges: Vec<(String, &dyn Any)> = Vec::new();");
    w.open("for (key, item) in entries");
    w.line("edges.push((key.clone(), item.as_ref()));");
    w.close();
    w.line("return Ok(TreeEntry { node: \"Map\", edges, union_slot: None });");
    w.close();
}

#[cfg(test)]
mod tests {
    use super::super::tests::resolved;
    use super::*;
    use crate::naming::NameTable;
    use crate::synth::collect_wrappers;

    fn emit(src: &str) -> String {
        let unit = resolved(src);
        let mut names = NameTable::new();
        let wrappers = collect_wrappers(&unit, &mut names).unwrap();
        artifact(&unit, &wrappers).source
    }

    #[test]
    fn primitives_come_before_schemas() {
        let src = emit(r#"{ "name": "u", "schemas": [
            { "kind": "object", "title": "User", "properties": {
                "name": { "type": "string" }
            }, "required": ["name"] }
        ] }"#);
        let string_arm = src.find("downcast_ref::<String>()").unwrap();
        let user_arm = src.find("downcast_ref::<User>()").unwrap();
        assert!(string_arm < user_arm);
        assert!(src.contains("Err(UnrecognizedValue)"));
    }

    #[test]
    fn absent_optional_fields_produce_no_edge() {
        let src = emit(r#"{ "name": "u", "schemas": [
            { "kind": "object", "title": "User", "properties": {
                "name": { "type": "string" },
                "bio": { "type": "string" }
            }, "required": ["name"] }
        ] }"#);
        assert!(src.contains("edges.push((\"name\".to_string(), &value.name as &dyn Any));"));
        assert!(src.contains("if let Some(child) = &value.bio {"));
    }

    #[test]
    fn union_values_tag_the_slot_and_recurse() {
        let src = emit(r#"{ "name": "u", "schemas": [
            { "kind": "union", "title": "Id", "members": ["string", "integer"] }
        ] }"#);
        assert!(src.contains("Id::StringValue(inner) => (\"string_value\", inner as &dyn Any),"));
        assert!(src.contains("Id::IntegerValue(inner) => (\"integer_value\", inner as &dyn Any),"));
        assert!(src.contains("entry.union_slot = Some(slot);"));
    }

    #[test]
    fn parameterized_schemas_are_skipped() {
        let src = emit(r#"{ "name": "u", "schemas": [
            { "kind": "object", "title": "Box", "parameters": ["T"], "properties": {
                "value": { "type": "param", "param": "T" }
            }, "required": ["value"] },
            { "kind": "object", "title": "User", "properties": {
                "name": { "type": "string" }
            }, "required": ["name"] }
        ] }"#);
        assert!(!src.contains("downcast_ref::<Box"));
        assert!(src.contains("downcast_ref::<User>()"));
    }
}
