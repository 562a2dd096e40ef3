//! Union-artifact emission: one dispatch enum per union schema, with a
//! constructor, predicate and borrowing accessor per member. Mutual
//! exclusivity is structural; no runtime tag field exists.
//!
//! Decode order is semantic: members are attempted in declaration order
//! (type parameters after concrete members) and the first decoder that
//! accepts the input wins.

use crate::emit::{NamedArtifact, SourceWriter};
use crate::model::{ResolvedUnit, SchemaDefinition, UnionInfo, UnionMember};
use crate::naming;

use super::{TEXT_FORMATS, TextFormat, generics_bounded, generics_decl};

/// One enum variant: its name, accessor stem, and payload type.
pub(crate) struct VariantPlan {
    pub(crate) variant: String,
    pub(crate) stem: String,
    pub(crate) inner_ty: String,
}

pub fn artifact(
    schema: &SchemaDefinition,
    info: &UnionInfo,
    _unit: &ResolvedUnit,
) -> NamedArtifact {
    let ty = naming::type_name(&schema.title);
    let params: Vec<String> = info.parameters.iter().map(|p| p.name.clone()).collect();
    let plans = variant_plans(info);

    let mut w = SourceWriter::new();
    w.line(&format!(
        "//! Generated by modelgen from schema `{}`. Do not edit.",
        schema.title
    ));
    w.blank();
    w.line("use super::*;");
    w.blank();

    w.line(&format!("/// Dispatch enum for union schema `{}`.", schema.title));
    write_enum(&mut w, &ty, &params, &plans);
    w.blank();
    write_accessors(&mut w, &ty, &params, &plans);
    for format in TEXT_FORMATS {
        w.blank();
        write_encode(&mut w, &ty, &params, &plans, format);
        w.blank();
        write_decode(&mut w, &ty, &params, &plans, format);
    }
    w.blank();
    write_subtree_encode(&mut w, &ty, &params, &plans);
    w.blank();
    write_subtree_decode(&mut w, &ty, &params, &plans);

    NamedArtifact {
        file_name: naming::file_name(&schema.title),
        source: w.into_string(),
    }
}

/// Concrete members first, in declaration order, then type parameters.
pub(crate) fn variant_plans(info: &UnionInfo) -> Vec<VariantPlan> {
    let mut plans = Vec::new();
    for member in &info.members {
        plans.push(match member {
            UnionMember::String => VariantPlan {
                variant: naming::STRING_VALUE.to_string(),
                stem: naming::snake_name(naming::STRING_VALUE),
                inner_ty: "String".to_string(),
            },
            UnionMember::Integer => VariantPlan {
                variant: naming::INTEGER_VALUE.to_string(),
                stem: naming::snake_name(naming::INTEGER_VALUE),
                inner_ty: "i64".to_string(),
            },
            UnionMember::Number => VariantPlan {
                variant: naming::NUMBER_VALUE.to_string(),
                stem: naming::snake_name(naming::NUMBER_VALUE),
                inner_ty: "OrderedFloat<f64>".to_string(),
            },
            UnionMember::Boolean => VariantPlan {
                variant: naming::BOOLEAN_VALUE.to_string(),
                stem: naming::snake_name(naming::BOOLEAN_VALUE),
                inner_ty: "bool".to_string(),
            },
            UnionMember::Schema(title) => VariantPlan {
                variant: naming::type_name(title),
                stem: naming::snake_name(title),
                inner_ty: naming::type_name(title),
            },
        });
    }
    for param in &info.parameters {
        plans.push(VariantPlan {
            variant: naming::type_name(&param.name),
            stem: param.accessor.clone(),
            inner_ty: naming::type_name(&param.name),
        });
    }
    plans
}

fn write_enum(w: &mut SourceWriter, ty: &str, params: &[String], plans: &[VariantPlan]) {
    w.line("#[derive(Debug, Clone, PartialEq, Eq, Hash)]");
    w.open(&format!("pub enum {ty}{}", generics_decl(params)));
    for plan in plans {
        w.line(&format!("{}({}),", plan.variant, plan.inner_ty));
    }
    w.close();
}

fn write_accessors(w: &mut SourceWriter, ty: &str, params: &[String], plans: &[VariantPlan]) {
    let generics = generics_decl(params);
    w.open(&format!("impl{generics} {ty}{generics}"));
    for (i, plan) in plans.iter().enumerate() {
        if i > 0 {
            w.blank();
        }
        w.open(&format!(
            "pub fn {}(value: {}) -> Self",
            plan.stem, plan.inner_ty
        ));
        w.line(&format!("Self::{}(value)", plan.variant));
        w.close();
        w.blank();
        w.open(&format!("pub fn is_{}(&self) -> bool", plan.stem));
        w.line(&format!("matches!(self, Self::{}(_))", plan.variant));
        w.close();
        w.blank();
        w.open(&format!(
            "pub fn as_{}(&self) -> Option<&{}>",
            plan.stem, plan.inner_ty
        ));
        w.open("match self");
        w.line(&format!("Self::{}(value) => Some(value),", plan.variant));
        if plans.len() > 1 {
            w.line("_ => None,");
        }
        w.close();
        w.close();
    }
    w.close();
}

fn write_encode(
    w: &mut SourceWriter,
    ty: &str,
    params: &[String],
    plans: &[VariantPlan],
    f: TextFormat,
) {
    let impl_generics = generics_bounded(params, f.encode_trait);
    let ty_generics = generics_decl(params);
    w.open(&format!(
        "impl{impl_generics} {} for {ty}{ty_generics}",
        f.encode_trait
    ));
    w.open(&format!(
        "fn {}<W: {}>(&self, w: &mut W)",
        f.encode_fn, f.write_trait
    ));
    w.open("match self");
    for plan in plans {
        w.line(&format!(
            "Self::{}(value) => value.{}(w),",
            plan.variant, f.encode_fn
        ));
    }
    w.close();
    w.close();
    w.close();
}

fn write_decode(
    w: &mut SourceWriter,
    ty: &str,
    params: &[String],
    plans: &[VariantPlan],
    f: TextFormat,
) {
    let impl_generics = generics_bounded(params, f.decode_trait);
    let ty_generics = generics_decl(params);
    w.open(&format!(
        "impl{impl_generics} {} for {ty}{ty_generics}",
        f.decode_trait
    ));
    w.open(&format!(
        "fn {}<S: {}>(span: &S) -> Result<Self, DecodeError>",
        f.decode_fn, f.read_trait
    ));
    w.line("// declaration order; first member to accept the input wins");
    for plan in plans {
        w.open(&format!(
            "if let Ok(value) = <{}>::{}(span)",
            plan.inner_ty, f.decode_fn
        ));
        w.line(&format!("return Ok(Self::{}(value));", plan.variant));
        w.close();
    }
    w.line(&format!("Err(DecodeError::no_union_member({ty:?}))"));
    w.close();
    w.close();
}

fn write_subtree_encode(w: &mut SourceWriter, ty: &str, params: &[String], plans: &[VariantPlan]) {
    let impl_generics = generics_bounded(params, "SubtreeEncode");
    let ty_generics = generics_decl(params);
    w.open(&format!(
        "impl{impl_generics} SubtreeEncode for {ty}{ty_generics}"
    ));
    w.open("fn to_subtree(&self) -> Subtree");
    w.open("match self");
    for plan in plans {
        w.line(&format!("Self::{}(value) => value.to_subtree(),", plan.variant));
    }
    w.close();
    w.close();
    w.close();
}

fn write_subtree_decode(w: &mut SourceWriter, ty: &str, params: &[String], plans: &[VariantPlan]) {
    let impl_generics = generics_bounded(params, "SubtreeDecode");
    let ty_generics = generics_decl(params);
    w.open(&format!(
        "impl{impl_generics} SubtreeDecode for {ty}{ty_generics}"
    ));
    w.open("fn from_subtree(subtree: &Subtree) -> Result<Self, DecodeError>");
    w.line("// declaration order; first member to accept the input wins");
    for plan in plans {
        w.open(&format!(
            "if let Ok(value) = <{}>::from_subtree(subtree)",
            plan.inner_ty
        ));
        w.line(&format!("return Ok(Self::{}(value));", plan.variant));
        w.close();
    }
    w.line(&format!("Err(DecodeError::no_union_member({ty:?}))"));
    w.close();
    w.close();
}

#[cfg(test)]
mod tests {
    use super::super::tests::resolved;
    use super::*;
    use crate::model::SchemaKind;

    fn emit(src: &str, title: &str) -> String {
        let unit = resolved(src);
        let schema = unit.schema(title).unwrap();
        let SchemaKind::Union(info) = &schema.kind else {
            panic!()
        };
        artifact(schema, info, &unit).source
    }

    #[test]
    fn primitive_members_use_reserved_variant_names() {
        let src = emit(
            r#"{ "name": "u", "schemas": [
                { "kind": "union", "title": "Id", "members": ["string", "integer"] }
            ] }"#,
            "Id",
        );
        assert!(src.contains("pub enum Id {"));
        assert!(src.contains("StringValue(String),"));
        assert!(src.contains("IntegerValue(i64),"));
        assert!(src.contains("pub fn string_value(value: String) -> Self"));
        assert!(src.contains("pub fn is_integer_value(&self) -> bool"));
        assert!(src.contains("pub fn as_string_value(&self) -> Option<&String>"));
    }

    #[test]
    fn decode_tries_members_in_declaration_order() {
        let src = emit(
            r#"{ "name": "u", "schemas": [
                { "kind": "union", "title": "Id", "members": ["string", "integer"] }
            ] }"#,
            "Id",
        );
        let string_try = src.find("if let Ok(value) = <String>::decode_block(span)").unwrap();
        let integer_try = src.find("if let Ok(value) = <i64>::decode_block(span)").unwrap();
        assert!(string_try < integer_try);
        assert!(src.contains("Err(DecodeError::no_union_member(\"Id\"))"));
    }

    #[test]
    fn schema_members_and_parameters_become_variants() {
        let src = emit(
            r#"{ "name": "u", "schemas": [
                { "kind": "object", "title": "Comment", "properties": {
                    "body": { "type": "string" }
                }, "required": ["body"] },
                { "kind": "union", "title": "Event", "members": ["Comment"], "parameters": ["Payload"] }
            ] }"#,
            "Event",
        );
        assert!(src.contains("pub enum Event<Payload> {"));
        assert!(src.contains("Comment(Comment),"));
        assert!(src.contains("Payload(Payload),"));
        assert!(src.contains("pub fn payload(value: Payload) -> Self"));
        assert!(src.contains("impl<Payload: BlockDecode> BlockDecode for Event<Payload>"));
        // concrete members decode before parameters
        let member_try = src.find("<Comment>::decode_block(span)").unwrap();
        let param_try = src.find("<Payload>::decode_block(span)").unwrap();
        assert!(member_try < param_try);
    }
}
