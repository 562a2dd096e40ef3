//! Registry-artifact emission: the per-unit type-erased decoder table.
//!
//! One lookup per text format, keyed by derived type name. Only closed
//! schemas are listed; a parameterized schema has no single decoder to
//! register.

use crate::emit::{NamedArtifact, SourceWriter};
use crate::model::ResolvedUnit;
use crate::naming;
use crate::typing;

use super::{TEXT_FORMATS, TextFormat};

pub fn artifact(unit: &ResolvedUnit) -> NamedArtifact {
    let mut w = SourceWriter::new();
    w.line(&format!(
        "//! Generated by modelgen from unit `{}`. Do not edit.",
        unit.name
    ));
    w.blank();
    w.line("use std::any::Any;");
    w.blank();
    w.line("use super::*;");
    for format in TEXT_FORMATS {
        w.blank();
        write_lookup(&mut w, unit, format);
    }
    NamedArtifact {
        file_name: "decoders.rs".to_string(),
        source: w.into_string(),
    }
}

fn write_lookup(w: &mut SourceWriter, unit: &ResolvedUnit, f: TextFormat) {
    let lookup = match f.decode_fn {
        "decode_block" => "block_decoder",
        _ => "lines_decoder",
    };
    w.open(&format!(
        "pub fn {lookup}<S: {}>(type_name: &str) -> Option<fn(&S) -> Result<Box<dyn Any>, DecodeError>>",
        f.read_trait
    ));
    w.open("match type_name");
    for schema in unit.iter().filter(|s| typing::is_closed(s)) {
        let ty = naming::type_name(&schema.title);
        w.line(&format!(
            "{ty:?} => Some(|span| Ok(Box::new(<{ty}>::{}(span)?) as Box<dyn Any>)),",
            f.decode_fn
        ));
    }
    w.line("_ => None,");
    w.close();
    w.close();
}
