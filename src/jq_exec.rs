//! jq pre-filtering for declaration documents.
//!
//! One filter run may fan a single document out into several declaration
//! units, so the result is a list of JSON texts. Failures are typed by the
//! stage that produced them so the command line can tell a filter that does
//! not parse apart from one that blew up mid-stream.

use jaq_core::{Compiler, Ctx, RcIter, load};
use jaq_json::Val;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("jq filter does not parse: {detail}")]
    Parse { detail: String },

    #[error("jq filter calls undefined names: {detail}")]
    Undefined { detail: String },

    #[error("jq filter failed while running: {detail}")]
    Eval { detail: String },
}

/// Apply `filter_src` to `document` and collect every value the filter
/// yields, serialized back to JSON text.
pub fn apply_filter(filter_src: &str, document: &Value) -> Result<Vec<String>, FilterError> {
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let program = load::File { code: filter_src, path: () };

    let modules = loader.load(&arena, program).map_err(|errs| FilterError::Parse {
        detail: errs
            .iter()
            .map(|(_, e)| format!("{e:?}"))
            .collect::<Vec<_>>()
            .join("; "),
    })?;

    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(|errs| FilterError::Undefined {
            detail: errs
                .iter()
                .flat_map(|(_, list)| list.iter().map(|(name, _)| name.to_string()))
                .collect::<Vec<_>>()
                .join(", "),
        })?;

    let inputs = RcIter::new(core::iter::empty());
    filter
        .run((Ctx::new([], &inputs), Val::from(document.clone())))
        .map(|item| match item {
            Ok(value) => Ok(value.to_string()),
            Err(e) => Err(FilterError::Eval {
                detail: format!("{e:?}"),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identity_filter_passes_the_document_through() {
        let doc = json!({ "name": "u", "schemas": [] });
        let out = apply_filter(".", &doc).unwrap();
        assert_eq!(out.len(), 1);
        let round: Value = serde_json::from_str(&out[0]).unwrap();
        assert_eq!(round, doc);
    }

    #[test]
    fn filter_can_fan_out_into_multiple_units() {
        let doc = json!({ "units": [{ "name": "a" }, { "name": "b" }] });
        let out = apply_filter(".units[]", &doc).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn bad_filter_source_reports_the_parse_stage() {
        let e = apply_filter(".[", &json!(null)).unwrap_err();
        assert!(matches!(e, FilterError::Parse { .. }));
    }

    #[test]
    fn undefined_name_reports_the_compile_stage() {
        let e = apply_filter("no_such_builtin", &json!(null)).unwrap_err();
        assert!(matches!(e, FilterError::Undefined { ref detail } if detail.contains("no_such_builtin")));
    }
}
