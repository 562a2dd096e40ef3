//! Value-artifact emission: the immutable representation of one object
//! schema, with a guarded constructor, structural equality/hash, and
//! round-tripping encode/decode for both text formats.

use crate::emit::{NamedArtifact, SourceWriter};
use crate::guards;
use crate::model::{ObjectInfo, ResolvedUnit, SchemaDefinition};
use crate::naming;

use super::{FieldPlan, TEXT_FORMATS, TextFormat, field_plans, generics_bounded, generics_decl};

pub fn artifact(
    schema: &SchemaDefinition,
    obj: &ObjectInfo,
    unit: &ResolvedUnit,
) -> NamedArtifact {
    let ty = naming::type_name(&schema.title);
    let plans = field_plans(obj, unit);
    let guards: Vec<_> = obj
        .properties
        .values()
        .filter_map(|p| guards::guard_for(&ty, p))
        .collect();

    let mut w = SourceWriter::new();
    w.line(&format!(
        "//! Generated by modelgen from schema `{}`. Do not edit.",
        schema.title
    ));
    w.blank();
    w.line("use super::*;");
    w.blank();

    // compiled-pattern bindings, shared by every guard site in this file
    let mut wrote_static = false;
    for g in &guards {
        if let Some(line) = &g.pattern_static {
            w.line(line);
            wrote_static = true;
        }
    }
    if wrote_static {
        w.blank();
    }

    w.line(&format!("/// Value representation of schema `{}`.", schema.title));
    write_struct(&mut w, &ty, obj, &plans);
    w.blank();
    write_constructor(&mut w, &ty, obj, &plans, &guards);
    for format in TEXT_FORMATS {
        w.blank();
        write_encode(&mut w, &ty, &schema.title, obj, &plans, format);
        w.blank();
        write_decode(&mut w, &ty, obj, &plans, format);
    }
    w.blank();
    write_subtree_encode(&mut w, &ty, &schema.title, obj, &plans);
    w.blank();
    write_subtree_decode(&mut w, &ty, obj, &plans);

    NamedArtifact {
        file_name: naming::file_name(&schema.title),
        source: w.into_string(),
    }
}

fn write_struct(w: &mut SourceWriter, ty: &str, obj: &ObjectInfo, plans: &[FieldPlan]) {
    w.line("#[derive(Debug, Clone, PartialEq, Eq, Hash)]");
    w.open(&format!("pub struct {ty}{}", generics_decl(&obj.parameters)));
    for plan in plans {
        if plan.nullable {
            w.line(&format!("pub {}: Option<{}>,", plan.field, plan.ty));
        } else {
            w.line(&format!("pub {}: {},", plan.field, plan.ty));
        }
    }
    w.close();
}

fn write_constructor(
    w: &mut SourceWriter,
    ty: &str,
    obj: &ObjectInfo,
    plans: &[FieldPlan],
    guards: &[guards::Guard],
) {
    let generics = generics_decl(&obj.parameters);
    w.open(&format!("impl{generics} {ty}{generics}"));

    // required parameters first, optional ones after
    let mut params = Vec::new();
    for plan in plans.iter().filter(|p| !p.nullable) {
        params.push(format!("{}: {}", plan.field, plan.ty));
    }
    for plan in plans.iter().filter(|p| p.nullable) {
        params.push(format!("{}: Option<{}>", plan.field, plan.ty));
    }
    w.open(&format!(
        "pub fn new({}) -> Result<Self, ModelError>",
        params.join(", ")
    ));
    for g in guards {
        g.write_check(w);
    }
    let fields: Vec<&str> = plans.iter().map(|p| p.field.as_str()).collect();
    w.line(&format!("Ok(Self {{ {} }})", fields.join(", ")));
    w.close();
    w.close();
}

fn write_encode(
    w: &mut SourceWriter,
    ty: &str,
    title: &str,
    obj: &ObjectInfo,
    plans: &[FieldPlan],
    f: TextFormat,
) {
    let impl_generics = generics_bounded(&obj.parameters, f.encode_trait);
    let ty_generics = generics_decl(&obj.parameters);
    w.open(&format!(
        "impl{impl_generics} {} for {ty}{ty_generics}",
        f.encode_trait
    ));
    w.open(&format!(
        "fn {}<W: {}>(&self, w: &mut W)",
        f.encode_fn, f.write_trait
    ));
    w.line(&format!("w.begin_record({:?});", naming::type_name(title)));
    for plan in plans {
        if plan.nullable {
            // absent optional fields are omitted entirely
            w.open(&format!("if let Some(value) = &self.{}", plan.field));
            w.line(&format!("w.begin_field({:?});", plan.key));
            w.line(&format!("value.{}(w);", f.encode_fn));
            w.line("w.end_field();");
            w.close();
        } else {
            w.line(&format!("w.begin_field({:?});", plan.key));
            w.line(&format!("self.{}.{}(w);", plan.field, f.encode_fn));
            w.line("w.end_field();");
        }
    }
    w.line("w.end_record();");
    w.close();
    w.close();
}

fn write_decode(
    w: &mut SourceWriter,
    ty: &str,
    obj: &ObjectInfo,
    plans: &[FieldPlan],
    f: TextFormat,
) {
    let impl_generics = generics_bounded(&obj.parameters, f.decode_trait);
    let ty_generics = generics_decl(&obj.parameters);
    w.open(&format!(
        "impl{impl_generics} {} for {ty}{ty_generics}",
        f.decode_trait
    ));
    w.open(&format!(
        "fn {}<S: {}>(span: &S) -> Result<Self, DecodeError>",
        f.decode_fn, f.read_trait
    ));
    if let Some(allowed) = &obj.allowed {
        let list: Vec<String> = allowed.iter().map(|a| format!("{a:?}")).collect();
        w.line(&format!(
            "span.reject_unknown_fields(&[{}])?;",
            list.join(", ")
        ));
    }
    for plan in plans {
        if plan.nullable {
            // absence is tolerated, not an error
            w.open(&format!("let {} = match span.field_opt({:?})", plan.field, plan.key));
            w.line(&format!(
                "Some(value) => Some(<{}>::{}(&value)?),",
                plan.ty, f.decode_fn
            ));
            w.line("None => None,");
            w.close_with(";");
        } else {
            w.line(&format!(
                "let {} = <{}>::{}(&span.field({:?})?)?;",
                plan.field, plan.ty, f.decode_fn, plan.key
            ));
        }
    }
    let args = ctor_args(plans);
    w.line(&format!(
        "Self::new({args}).map_err(DecodeError::invalid)"
    ));
    w.close();
    w.close();
}

fn write_subtree_encode(
    w: &mut SourceWriter,
    ty: &str,
    title: &str,
    obj: &ObjectInfo,
    plans: &[FieldPlan],
) {
    let impl_generics = generics_bounded(&obj.parameters, "SubtreeEncode");
    let ty_generics = generics_decl(&obj.parameters);
    w.open(&format!(
        "impl{impl_generics} SubtreeEncode for {ty}{ty_generics}"
    ));
    w.open("fn to_subtree(&self) -> Subtree");
    w.line("let mut children: Vec<(&'static str, Subtree)> = Vec::new();");
    for plan in plans {
        if plan.nullable {
            w.open(&format!("if let Some(value) = &self.{}", plan.field));
            w.line(&format!(
                "children.push(({:?}, value.to_subtree()));",
                plan.key
            ));
            w.close();
        } else {
            w.line(&format!(
                "children.push(({:?}, self.{}.to_subtree()));",
                plan.key, plan.field
            ));
        }
    }
    w.line(&format!(
        "Subtree::Record {{ ty: {:?}, children }}",
        naming::type_name(title)
    ));
    w.close();
    w.close();
}

fn write_subtree_decode(w: &mut SourceWriter, ty: &str, obj: &ObjectInfo, plans: &[FieldPlan]) {
    let impl_generics = generics_bounded(&obj.parameters, "SubtreeDecode");
    let ty_generics = generics_decl(&obj.parameters);
    w.open(&format!(
        "impl{impl_generics} SubtreeDecode for {ty}{ty_generics}"
    ));
    w.open("fn from_subtree(subtree: &Subtree) -> Result<Self, DecodeError>");
    for plan in plans {
        if plan.nullable {
            w.open(&format!(
                "let {} = match subtree.child({:?})",
                plan.field, plan.key
            ));
            w.line(&format!("Some(value) => Some(<{}>::from_subtree(value)?),", plan.ty));
            w.line("None => None,");
            w.close_with(";");
        } else {
            w.line(&format!(
                "let {} = <{}>::from_subtree(subtree.child({:?}).ok_or(DecodeError::missing_field({:?}, {:?}))?)?;",
                plan.field, plan.ty, plan.key, ty, plan.key
            ));
        }
    }
    let args = ctor_args(plans);
    w.line(&format!(
        "Self::new({args}).map_err(DecodeError::invalid)"
    ));
    w.close();
    w.close();
}

/// Constructor arguments in the constructor's own order: required fields in
/// declaration order, then optional ones.
fn ctor_args(plans: &[FieldPlan]) -> String {
    let mut args = Vec::new();
    for plan in plans.iter().filter(|p| !p.nullable) {
        args.push(plan.field.clone());
    }
    for plan in plans.iter().filter(|p| p.nullable) {
        args.push(plan.field.clone());
    }
    args.join(", ")
}
