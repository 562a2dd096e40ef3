//! Node-artifact emission: the mutable tree-resident view of one object
//! schema. A node is just an id into an external [`TreeStore`]; accessors
//! read the store on demand and mutators run the same guards the value
//! constructor runs before touching it.
//!
//! Mutator shape depends on slot optionality: a required slot can only be
//! swapped in place, a clearable one gets the full add/replace/remove
//! matrix on (current child, new value).

use crate::emit::{NamedArtifact, SourceWriter};
use crate::guards;
use crate::model::{ObjectInfo, ResolvedUnit, SchemaDefinition};
use crate::naming;

use super::{FieldPlan, field_plans, generics_decl};

pub fn artifact(
    schema: &SchemaDefinition,
    obj: &ObjectInfo,
    unit: &ResolvedUnit,
) -> NamedArtifact {
    let ty = naming::type_name(&schema.title);
    let node_ty = format!("{ty}Node");
    let plans = field_plans(obj, unit);

    let mut w = SourceWriter::new();
    w.line(&format!(
        "//! Generated by modelgen from schema `{}`. Do not edit.",
        schema.title
    ));
    w.blank();
    w.line("use super::*;");
    w.blank();

    let mut wrote_static = false;
    for plan in plans.iter() {
        let prop = &obj.properties[plan.key.as_str()];
        if let Some(g) = guards::guard_at(&ty, prop, obj.mutation_nullable(&plan.key)) {
            if let Some(line) = &g.pattern_static {
                w.line(line);
                wrote_static = true;
            }
        }
    }
    if wrote_static {
        w.blank();
    }

    w.line(&format!(
        "/// Tree-resident view of schema `{}`.",
        schema.title
    ));
    write_struct(&mut w, &node_ty, obj);
    w.blank();

    let impl_generics = impl_generics(&obj.parameters);
    let ty_generics = generics_decl(&obj.parameters);
    w.open(&format!("impl{impl_generics} {node_ty}{ty_generics}"));
    write_attach(&mut w, obj);
    w.blank();
    write_populate(&mut w, &ty, &ty_generics, obj);
    w.blank();
    write_to_value(&mut w, &ty, &ty_generics);
    for plan in &plans {
        w.blank();
        write_accessor(&mut w, &ty, plan);
        w.blank();
        write_setter(&mut w, &ty, obj, plan);
    }
    w.close();

    NamedArtifact {
        file_name: format!("{}_node.rs", naming::snake_name(&schema.title)),
        source: w.into_string(),
    }
}

/// `<T: SubtreeEncode + SubtreeDecode, ...>`: accessors decode, mutators
/// and populate encode, so a parameterized node needs both.
fn impl_generics(params: &[String]) -> String {
    if params.is_empty() {
        String::new()
    } else {
        let list: Vec<String> = params
            .iter()
            .map(|p| format!("{p}: SubtreeEncode + SubtreeDecode"))
            .collect();
        format!("<{}>", list.join(", "))
    }
}

fn write_struct(w: &mut SourceWriter, node_ty: &str, obj: &ObjectInfo) {
    w.line("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]");
    if obj.parameters.is_empty() {
        w.open(&format!("pub struct {node_ty}"));
        w.line("pub id: NodeId,");
    } else {
        w.open(&format!(
            "pub struct {node_ty}{}",
            generics_decl(&obj.parameters)
        ));
        w.line("pub id: NodeId,");
        w.line(&format!(
            "marker: std::marker::PhantomData<({})>,",
            obj.parameters.join(", ")
        ));
    }
    w.close();
}

fn write_attach(w: &mut SourceWriter, obj: &ObjectInfo) {
    w.open("pub fn attach(id: NodeId) -> Self");
    if obj.parameters.is_empty() {
        w.line("Self { id }");
    } else {
        w.line("Self { id, marker: std::marker::PhantomData }");
    }
    w.close();
}

fn write_populate(w: &mut SourceWriter, ty: &str, ty_generics: &str, obj: &ObjectInfo) {
    w.open(&format!(
        "pub fn populate<S: TreeStore>(tree: &mut S, parent: NodeId, key: &str, value: &{ty}{ty_generics}) -> Self"
    ));
    w.line("let id = tree.add_subtree(parent, key, value.to_subtree());");
    if obj.parameters.is_empty() {
        w.line("Self { id }");
    } else {
        w.line("Self { id, marker: std::marker::PhantomData }");
    }
    w.close();
}

fn write_to_value(w: &mut SourceWriter, ty: &str, ty_generics: &str) {
    w.open(&format!(
        "pub fn to_value<S: TreeStore>(&self, tree: &S) -> Result<{ty}{ty_generics}, DecodeError>"
    ));
    w.line(&format!(
        "{ty}::from_subtree(&tree.subtree(self.id))"
    ));
    w.close();
}

fn write_accessor(w: &mut SourceWriter, ty: &str, plan: &FieldPlan) {
    if plan.nullable {
        w.open(&format!(
            "pub fn {}<S: TreeStore>(&self, tree: &S) -> Result<Option<{}>, DecodeError>",
            plan.field, plan.ty
        ));
        w.open(&format!("match tree.child(self.id, {:?})", plan.key));
        w.line(&format!(
            "Some(node) => Ok(Some(<{}>::from_subtree(&tree.subtree(node))?)),",
            plan.ty
        ));
        w.line("None => Ok(None),");
        w.close();
        w.close();
    } else {
        w.open(&format!(
            "pub fn {}<S: TreeStore>(&self, tree: &S) -> Result<{}, DecodeError>",
            plan.field, plan.ty
        ));
        w.line(&format!(
            "let node = tree.child(self.id, {:?}).ok_or(DecodeError::missing_field({:?}, {:?}))?;",
            plan.key, ty, plan.key
        ));
        w.line(&format!("<{}>::from_subtree(&tree.subtree(node))", plan.ty));
        w.close();
    }
}

fn write_setter(w: &mut SourceWriter, ty: &str, obj: &ObjectInfo, plan: &FieldPlan) {
    let prop = &obj.properties[plan.key.as_str()];
    let clearable = obj.mutation_nullable(&plan.key);
    let guard = guards::guard_at(ty, prop, clearable);

    if clearable {
        w.open(&format!(
            "pub fn set_{}<S: TreeStore>(&self, tree: &mut S, {}: Option<{}>) -> Result<(), ModelError>",
            plan.field, plan.field, plan.ty
        ));
        if let Some(g) = &guard {
            g.write_check(w);
        }
        w.open(&format!(
            "match (tree.child(self.id, {:?}), {})",
            plan.key, plan.field
        ));
        w.open("(Some(node), Some(value)) =>");
        w.line("tree.replace_subtree(node, value.to_subtree());");
        w.close();
        w.open("(None, Some(value)) =>");
        w.line(&format!(
            "tree.add_subtree(self.id, {:?}, value.to_subtree());",
            plan.key
        ));
        w.close();
        w.open("(Some(node), None) =>");
        w.line("tree.remove_subtree(node);");
        w.close();
        w.line("(None, None) => {}");
        w.close();
        w.line("Ok(())");
        w.close();
    } else {
        // required slot: swap only, absence is a store-shape error
        w.open(&format!(
            "pub fn set_{}<S: TreeStore>(&self, tree: &mut S, {}: {}) -> Result<(), ModelError>",
            plan.field, plan.field, plan.ty
        ));
        if let Some(g) = &guard {
            g.write_check(w);
        }
        w.line(&format!(
            "let node = tree.child(self.id, {:?}).ok_or(ModelError::missing_slot({:?}, {:?}))?;",
            plan.key, ty, plan.key
        ));
        w.line(&format!(
            "tree.replace_subtree(node, {}.to_subtree());",
            plan.field
        ));
        w.line("Ok(())");
        w.close();
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::resolved;
    use super::*;
    use crate::model::SchemaKind;

    fn emit(src: &str, title: &str) -> String {
        let unit = resolved(src);
        let schema = unit.schema(title).unwrap();
        let SchemaKind::Object(obj) = &schema.kind else {
            panic!()
        };
        artifact(schema, obj, &unit).source
    }

    #[test]
    fn required_slot_setter_swaps_in_place() {
        let src = emit(
            r#"{ "name": "u", "schemas": [
                { "kind": "object", "title": "User", "properties": {
                    "name": { "type": "string" }
                }, "required": ["name"] }
            ] }"#,
            "User",
        );
        assert!(src.contains(
            "pub fn set_name<S: TreeStore>(&self, tree: &mut S, name: String) -> Result<(), ModelError>"
        ));
        assert!(src.contains(
            "let node = tree.child(self.id, \"name\").ok_or(ModelError::missing_slot(\"User\", \"name\"))?;"
        ));
        assert!(src.contains("tree.replace_subtree(node, name.to_subtree());"));
        // no clear path for a required slot
        assert!(!src.contains("remove_subtree"));
    }

    #[test]
    fn clearable_slot_setter_covers_the_full_matrix() {
        let src = emit(
            r#"{ "name": "u", "schemas": [
                { "kind": "object", "title": "User", "properties": {
                    "bio": { "type": "string" }
                } }
            ] }"#,
            "User",
        );
        assert!(src.contains(
            "pub fn set_bio<S: TreeStore>(&self, tree: &mut S, bio: Option<String>) -> Result<(), ModelError>"
        ));
        assert!(src.contains("(Some(node), Some(value)) =>"));
        assert!(src.contains("(None, Some(value)) =>"));
        assert!(src.contains("(Some(node), None) =>"));
        assert!(src.contains("(None, None) => {}"));
        assert!(src.contains("tree.remove_subtree(node);"));
    }

    #[test]
    fn exempt_required_slot_mutates_as_clearable() {
        let src = emit(
            r#"{ "name": "u", "schemas": [
                { "kind": "object", "title": "User", "properties": {
                    "name": { "type": "string" }
                }, "required": ["name"], "nullable": ["name"] }
            ] }"#,
            "User",
        );
        // the field stays required on the value type, yet the node setter
        // accepts clearing it
        assert!(src.contains("name: Option<String>"));
        assert!(src.contains("tree.remove_subtree(node);"));
    }

    #[test]
    fn setter_guard_matches_constructor_guard() {
        let schemas = r#"{ "name": "u", "schemas": [
            { "kind": "object", "title": "Post", "properties": {
                "title": { "type": "string", "minLength": 1, "maxLength": 80 }
            }, "required": ["title"] }
        ] }"#;
        let unit = resolved(schemas);
        let schema = unit.schema("Post").unwrap();
        let SchemaKind::Object(obj) = &schema.kind else {
            panic!()
        };
        let value_src = crate::synth::value::artifact(schema, obj, &unit).source;
        let node_src = artifact(schema, obj, &unit).source;
        let check = "if title.chars().count() < 1 || title.chars().count() > 80 {";
        assert!(value_src.contains(check));
        assert!(node_src.contains(check));
        let err = "ModelError::constraint(\"Post\", \"title\", \"minLength 1, maxLength 80\")";
        assert!(value_src.contains(err));
        assert!(node_src.contains(err));
    }

    #[test]
    fn generic_node_carries_phantom_params() {
        let src = emit(
            r#"{ "name": "u", "schemas": [
                { "kind": "object", "title": "Box", "parameters": ["T"], "properties": {
                    "value": { "type": "param", "param": "T" }
                }, "required": ["value"] }
            ] }"#,
            "Box",
        );
        assert!(src.contains("pub struct BoxNode<T>"));
        assert!(src.contains("marker: std::marker::PhantomData<(T)>"));
        assert!(src.contains("impl<T: SubtreeEncode + SubtreeDecode> BoxNode<T>"));
    }
}
