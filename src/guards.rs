//! Validation-code emitter.
//!
//! Translates declared constraints into guard source. Purely syntactic: one
//! boolean predicate per constraint field, OR-combined into a single check
//! that raises a `ModelError` naming every bound in the guard. The same
//! [`Guard`] is written verbatim into the value constructor and the
//! tree-node mutator, so the two sites cannot drift apart.

use ordered_float::OrderedFloat;

use crate::emit::SourceWriter;
use crate::model::{PropertyDefinition, PropertyKind};
use crate::naming;

#[derive(Debug, Clone)]
pub struct Guard {
    /// `static NAME_PATTERN: Lazy<Regex> = ...` line, when a pattern
    /// constraint needs a compiled binding the predicate reuses.
    pub pattern_static: Option<String>,
    field: String,
    nullable: bool,
    conditions: Vec<String>,
    bounds: Vec<String>,
    schema_ty: String,
}

/// Build the guard for one property, or `None` when it has no constraints
/// (or a kind no constraint applies to).
pub fn guard_for(schema_ty: &str, prop: &PropertyDefinition) -> Option<Guard> {
    guard_at(schema_ty, prop, prop.nullable)
}

/// Same derivation with the presence-wrapping chosen by the emission site.
/// Mutation sites may widen optionality past the derived field flag, so the
/// wrapping is a site decision, not a property one.
pub fn guard_at(schema_ty: &str, prop: &PropertyDefinition, optional: bool) -> Option<Guard> {
    if !prop.constraints.has_constraints() {
        return None;
    }
    let field = naming::snake_name(&prop.name);
    let c = &prop.constraints;
    let mut conditions = Vec::new();
    let mut bounds = Vec::new();
    let mut pattern_static = None;

    match &prop.kind {
        PropertyKind::String => {
            if let Some(n) = c.min_length {
                conditions.push(format!("{field}.chars().count() < {n}"));
                bounds.push(format!("minLength {n}"));
            }
            if let Some(n) = c.max_length {
                conditions.push(format!("{field}.chars().count() > {n}"));
                bounds.push(format!("maxLength {n}"));
            }
            if let Some(p) = &c.pattern {
                let ident = format!("{}_PATTERN", field.to_uppercase());
                pattern_static = Some(format!(
                    "static {ident}: Lazy<Regex> = Lazy::new(|| Regex::new({}).unwrap());",
                    str_literal(p)
                ));
                conditions.push(format!("!{ident}.is_match({field}.as_str())"));
                bounds.push(format!("pattern {p}"));
            }
        }
        PropertyKind::Integer => {
            let expr = |deref: bool| if deref { format!("*{field}") } else { field.clone() };
            let e = expr(optional);
            if let Some(m) = c.minimum {
                conditions.push(format!("{} < {}", e, int_bound(m, Round::Up)));
                bounds.push(format!("minimum {}", num(m)));
            }
            if let Some(m) = c.exclusive_minimum {
                conditions.push(format!("{} <= {}", e, int_bound(m, Round::Down)));
                bounds.push(format!("exclusiveMinimum {}", num(m)));
            }
            if let Some(m) = c.maximum {
                conditions.push(format!("{} > {}", e, int_bound(m, Round::Down)));
                bounds.push(format!("maximum {}", num(m)));
            }
            if let Some(m) = c.exclusive_maximum {
                conditions.push(format!("{} >= {}", e, int_bound(m, Round::Up)));
                bounds.push(format!("exclusiveMaximum {}", num(m)));
            }
            if let Some(m) = c.multiple_of {
                if m.0.fract() == 0.0 {
                    conditions.push(format!("{} % {} != 0", e, m.0 as i64));
                } else {
                    // An integer can still be a multiple of a fractional
                    // base (5 is a multiple of 2.5), so test in f64.
                    conditions.push(format!("({} as f64) % {} != 0.0", e, num(m)));
                }
                bounds.push(format!("multipleOf {}", num(m)));
            }
        }
        PropertyKind::Number => {
            // OrderedFloat storage: predicates compare the inner f64.
            if let Some(m) = c.minimum {
                conditions.push(format!("{field}.0 < {}", num(m)));
                bounds.push(format!("minimum {}", num(m)));
            }
            if let Some(m) = c.exclusive_minimum {
                conditions.push(format!("{field}.0 <= {}", num(m)));
                bounds.push(format!("exclusiveMinimum {}", num(m)));
            }
            if let Some(m) = c.maximum {
                conditions.push(format!("{field}.0 > {}", num(m)));
                bounds.push(format!("maximum {}", num(m)));
            }
            if let Some(m) = c.exclusive_maximum {
                conditions.push(format!("{field}.0 >= {}", num(m)));
                bounds.push(format!("exclusiveMaximum {}", num(m)));
            }
            if let Some(m) = c.multiple_of {
                conditions.push(format!("{field}.0 % {} != 0.0", num(m)));
                bounds.push(format!("multipleOf {}", num(m)));
            }
        }
        PropertyKind::Array { .. } => {
            if let Some(n) = c.min_items {
                conditions.push(format!("{field}.len() < {n}"));
                bounds.push(format!("minItems {n}"));
            }
            if let Some(n) = c.max_items {
                conditions.push(format!("{field}.len() > {n}"));
                bounds.push(format!("maxItems {n}"));
            }
        }
        // No guardable constraints for these kinds.
        PropertyKind::Boolean | PropertyKind::Reference { .. } | PropertyKind::Param(_) => {}
    }

    if conditions.is_empty() {
        return None;
    }
    Some(Guard {
        pattern_static,
        field,
        nullable: optional,
        conditions,
        bounds,
        schema_ty: schema_ty.to_string(),
    })
}

impl Guard {
    /// Write the inline check. Byte-identical at every emission site for a
    /// given property.
    pub fn write_check(&self, w: &mut SourceWriter) {
        let field = &self.field;
        let cond = self.conditions.join(" || ");
        let err = format!(
            "return Err(ModelError::constraint({}, {}, {}));",
            str_literal(&self.schema_ty),
            str_literal(field),
            str_literal(&self.bounds.join(", "))
        );
        if self.nullable {
            w.open(&format!("if let Some({field}) = &{field}"));
            w.open(&format!("if {cond}"));
            w.line(&err);
            w.close();
            w.close();
        } else {
            w.open(&format!("if {cond}"));
            w.line(&err);
            w.close();
        }
    }
}

/// Deterministic f64 rendering: `1` stays `1.0`, `2.5` stays `2.5`.
fn num(v: OrderedFloat<f64>) -> String {
    let f = v.0;
    if f.fract() == 0.0 && f.is_finite() {
        format!("{:.1}", f)
    } else {
        format!("{f:?}")
    }
}

#[derive(Clone, Copy)]
enum Round {
    Up,
    Down,
}

/// Bound text for an integer-kind comparison. Integral bounds compare as
/// i64 literals. A fractional bound snaps to the nearest integer that keeps
/// the written predicate exact over integers; the caller picks the
/// direction to match its comparison operator.
fn int_bound(v: OrderedFloat<f64>, round: Round) -> String {
    if v.0.fract() == 0.0 {
        format!("{}", v.0 as i64)
    } else {
        let snapped = match round {
            Round::Up => v.0.ceil(),
            Round::Down => v.0.floor(),
        };
        format!("({snapped:?} as i64)")
    }
}

fn str_literal(s: &str) -> String {
    format!("{s:?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ValidationConstraints;

    fn prop(kind: PropertyKind, nullable: bool, c: ValidationConstraints) -> PropertyDefinition {
        PropertyDefinition {
            name: "title".to_string(),
            kind,
            nullable,
            constraints: c,
        }
    }

    fn rendered(g: &Guard) -> String {
        let mut w = SourceWriter::new();
        g.write_check(&mut w);
        w.into_string()
    }

    #[test]
    fn no_constraints_means_no_guard() {
        let p = prop(PropertyKind::String, false, ValidationConstraints::default());
        assert!(guard_for("Post", &p).is_none());
    }

    #[test]
    fn string_bounds_or_combine_into_one_check() {
        let c = ValidationConstraints {
            min_length: Some(1),
            max_length: Some(80),
            pattern: Some("^[a-z]+$".to_string()),
            ..Default::default()
        };
        let g = guard_for("Post", &prop(PropertyKind::String, false, c)).unwrap();
        let src = rendered(&g);
        assert!(src.contains("title.chars().count() < 1 || title.chars().count() > 80 ||"));
        assert!(src.contains("minLength 1, maxLength 80, pattern ^[a-z]+$"));
        assert!(
            g.pattern_static
                .as_ref()
                .unwrap()
                .contains("TITLE_PATTERN: Lazy<Regex>")
        );
    }

    #[test]
    fn nullable_guard_only_fires_when_present() {
        let c = ValidationConstraints {
            min_items: Some(1),
            ..Default::default()
        };
        let item = Box::new(prop(
            PropertyKind::String,
            false,
            ValidationConstraints::default(),
        ));
        let g = guard_for(
            "Post",
            &prop(PropertyKind::Array { item, unique: false }, true, c),
        )
        .unwrap();
        let src = rendered(&g);
        assert!(src.contains("if let Some(title) = &title"));
        assert!(src.contains("title.len() < 1"));
    }

    #[test]
    fn fractional_integer_bounds_snap_toward_the_violating_side() {
        // maximum 2.5 over integers admits {.., 1, 2}: the check must catch
        // 3, so the bound floors. exclusiveMinimum 0.5 admits {1, 2, ..}:
        // the non-strict check floors too, so 1 passes and 0 trips.
        let c = ValidationConstraints {
            exclusive_minimum: Some(OrderedFloat(0.5)),
            maximum: Some(OrderedFloat(2.5)),
            ..Default::default()
        };
        let g = guard_for("Post", &prop(PropertyKind::Integer, false, c)).unwrap();
        let src = rendered(&g);
        assert!(src.contains("title <= (0.0 as i64) || title > (2.0 as i64)"));
        assert!(src.contains("exclusiveMinimum 0.5, maximum 2.5"));
    }

    #[test]
    fn fractional_multiple_of_on_integers_tests_in_float() {
        let c = ValidationConstraints {
            multiple_of: Some(OrderedFloat(2.5)),
            ..Default::default()
        };
        let g = guard_for("Post", &prop(PropertyKind::Integer, false, c)).unwrap();
        let src = rendered(&g);
        // 5 % 2.5 == 0.0, so a multiple survives the guard.
        assert!(src.contains("(title as f64) % 2.5 != 0.0"));
    }

    #[test]
    fn number_bounds_render_deterministically() {
        let c = ValidationConstraints {
            minimum: Some(OrderedFloat(0.0)),
            exclusive_maximum: Some(OrderedFloat(5.5)),
            ..Default::default()
        };
        let g = guard_for("Post", &prop(PropertyKind::Number, false, c)).unwrap();
        let src = rendered(&g);
        assert!(src.contains("title.0 < 0.0 || title.0 >= 5.5"));
    }
}
