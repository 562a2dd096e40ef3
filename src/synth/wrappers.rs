//! Wrapper-artifact emission: one newtype per (item, uniqueness) pair used
//! anywhere in the unit, all in one file. Set-like wrappers check element
//! uniqueness at construction and on every decode path.

use crate::emit::{NamedArtifact, SourceWriter};
use crate::model::ResolvedUnit;

use super::{TEXT_FORMATS, TextFormat, WrapperSpec};

pub fn artifact(wrappers: &[WrapperSpec], unit: &ResolvedUnit) -> NamedArtifact {
    let mut w = SourceWriter::new();
    w.line(&format!(
        "//! Generated by modelgen from unit `{}`. Do not edit.",
        unit.name
    ));
    w.blank();
    w.line("use super::*;");
    for spec in wrappers {
        w.blank();
        write_wrapper(&mut w, spec);
    }
    NamedArtifact {
        file_name: "wrappers.rs".to_string(),
        source: w.into_string(),
    }
}

fn write_wrapper(w: &mut SourceWriter, spec: &WrapperSpec) {
    let name = &spec.name;
    let item = &spec.item_ty;
    let flavor = if spec.unique { "Set" } else { "List" };
    w.line(&format!("/// {flavor} of `{}` elements.", spec.item_title));
    w.line("#[derive(Debug, Clone, PartialEq, Eq, Hash)]");
    w.line(&format!("pub struct {name}(pub Vec<{item}>);"));
    w.blank();

    w.open(&format!("impl {name}"));
    if spec.unique {
        w.open(&format!(
            "pub fn new(items: Vec<{item}>) -> Result<Self, ModelError>"
        ));
        w.line(&format!("let mut out: Vec<{item}> = Vec::with_capacity(items.len());"));
        w.open("for item in items");
        w.open("if out.contains(&item)");
        w.line("return Err(ModelError::Duplicate);");
        w.close();
        w.line("out.push(item);");
        w.close();
        w.line("Ok(Self(out))");
        w.close();
    } else {
        w.open(&format!("pub fn new(items: Vec<{item}>) -> Self"));
        w.line("Self(items)");
        w.close();
    }
    w.blank();
    w.open("pub fn len(&self) -> usize");
    w.line("self.0.len()");
    w.close();
    w.blank();
    w.open("pub fn is_empty(&self) -> bool");
    w.line("self.0.is_empty()");
    w.close();
    w.close();

    for format in TEXT_FORMATS {
        w.blank();
        write_encode(w, spec, format);
        w.blank();
        write_decode(w, spec, format);
    }
    w.blank();
    write_subtree_encode(w, spec);
    w.blank();
    write_subtree_decode(w, spec);
}

fn write_encode(w: &mut SourceWriter, spec: &WrapperSpec, f: TextFormat) {
    w.open(&format!("impl {} for {}", f.encode_trait, spec.name));
    w.open(&format!(
        "fn {}<W: {}>(&self, w: &mut W)",
        f.encode_fn, f.write_trait
    ));
    w.line("w.begin_array();");
    w.open("for item in &self.0");
    w.line("w.begin_element();");
    w.line(&format!("item.{}(w);", f.encode_fn));
    w.line("w.end_element();");
    w.close();
    w.line("w.end_array();");
    w.close();
    w.close();
}

fn write_decode(w: &mut SourceWriter, spec: &WrapperSpec, f: TextFormat) {
    w.open(&format!("impl {} for {}", f.decode_trait, spec.name));
    w.open(&format!(
        "fn {}<S: {}>(span: &S) -> Result<Self, DecodeError>",
        f.decode_fn, f.read_trait
    ));
    w.line("let mut items = Vec::new();");
    w.open("for el in span.elements()?");
    w.line(&format!(
        "let item = <{}>::{}(&el)?;",
        spec.item_ty, f.decode_fn
    ));
    if spec.unique {
        w.open("if items.contains(&item)");
        w.line(&format!(
            "return Err(DecodeError::duplicate_element({:?}));",
            spec.name
        ));
        w.close();
    }
    w.line("items.push(item);");
    w.close();
    w.line("Ok(Self(items))");
    w.close();
    w.close();
}

fn write_subtree_encode(w: &mut SourceWriter, spec: &WrapperSpec) {
    w.open(&format!("impl SubtreeEncode for {}", spec.name));
    w.open("fn to_subtree(&self) -> Subtree");
    w.line("Subtree::List(self.0.iter().map(SubtreeEncode::to_subtree).collect())");
    w.close();
    w.close();
}

fn write_subtree_decode(w: &mut SourceWriter, spec: &WrapperSpec) {
    w.open(&format!("impl SubtreeDecode for {}", spec.name));
    w.open("fn from_subtree(subtree: &Subtree) -> Result<Self, DecodeError>");
    w.open("match subtree");
    w.open("Subtree::List(elements) =>");
    w.line("let mut items = Vec::new();");
    w.open("for el in elements");
    w.line(&format!("let item = <{}>::from_subtree(el)?;", spec.item_ty));
    if spec.unique {
        w.open("if items.contains(&item)");
        w.line(&format!(
            "return Err(DecodeError::duplicate_element({:?}));",
            spec.name
        ));
        w.close();
    }
    w.line("items.push(item);");
    w.close();
    w.line("Ok(Self(items))");
    w.close();
    w.line("_ => Err(DecodeError::shape(\"list\")),");
    w.close();
    w.close();
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
        artifact(&wrappers, &unit).source
    }

    #[test]
    fn list_wrapper_is_infallible_set_wrapper_is_not() {
        let src = emit(r#"{ "name": "u", "schemas": [
            { "kind": "object", "title": "Post", "properties": {
                "tags": { "type": "array", "items": { "type": "string" } },
                "labels": { "type": "array", "items": { "type": "string" }, "uniqueItems": true }
            } }
        ] }"#);
        assert!(src.contains("pub struct StringValuesList(pub Vec<String>);"));
        assert!(src.contains("pub struct StringValuesSet(pub Vec<String>);"));
        assert!(src.contains("pub fn new(items: Vec<String>) -> Self"));
        assert!(src.contains("pub fn new(items: Vec<String>) -> Result<Self, ModelError>"));
        assert!(src.contains("return Err(ModelError::Duplicate);"));
    }

    #[test]
    fn set_decode_rejects_duplicates_on_every_path() {
        let src = emit(r#"{ "name": "u", "schemas": [
            { "kind": "object", "title": "Post", "properties": {
                "labels": { "type": "array", "items": { "type": "integer" }, "uniqueItems": true }
            } }
        ] }"#);
        let rejects = src
            .matches("DecodeError::duplicate_element(\"IntegerValuesSet\")")
            .count();
        // block decode, lines decode, and subtree decode all check
        assert_eq!(rejects, 3);
    }

    #[test]
    fn nested_arrays_chain_wrapper_types() {
        let src = emit(r#"{ "name": "u", "schemas": [
            { "kind": "object", "title": "Grid", "properties": {
                "rows": { "type": "array", "items": {
                    "type": "array", "items": { "type": "integer" }
                } }
            } }
        ] }"#);
        assert!(src.contains("pub struct IntegerValuesList(pub Vec<i64>);"));
        assert!(src.contains("pub struct IntegerValuesListsList(pub Vec<IntegerValuesList>);"));
    }
}
