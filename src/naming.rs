//! Naming & deduplication engine.
//!
//! Every identifier in the generated output is derived here, and only here,
//! so the resolver and the synthesizer can never disagree on a name.
//! Derivations are pure; collisions are detected by the [`NameTable`], never
//! silently resolved — two distinct titles collapsing to one identifier is a
//! generation-time error.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::GenError;

/// Reserved derived names for the four primitive union members. These are
/// also the wrapper item titles for arrays of scalars.
pub const STRING_VALUE: &str = "StringValue";
pub const INTEGER_VALUE: &str = "IntegerValue";
pub const NUMBER_VALUE: &str = "NumberValue";
pub const BOOLEAN_VALUE: &str = "BooleanValue";

static WORD_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z]+[a-z0-9]*|[a-z0-9]+").unwrap());

/// Split a title into words: space/underscore/dash delimiters plus camel
/// boundaries. `"blog post"`, `"blog_post"` and `"BlogPost"` all yield
/// `["blog", "post"]`.
fn words(title: &str) -> Vec<String> {
    let mut out = Vec::new();
    for chunk in title.split(|c: char| c == ' ' || c == '_' || c == '-') {
        for m in WORD_BOUNDARY.find_iter(chunk) {
            out.push(m.as_str().to_lowercase());
        }
    }
    out
}

/// Title → PascalCase type name.
pub fn type_name(title: &str) -> String {
    let mut out = String::new();
    for w in words(title) {
        let mut chars = w.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Title → snake_case, used for file names and field names.
pub fn snake_name(title: &str) -> String {
    words(title).join("_")
}

pub fn file_name(title: &str) -> String {
    format!("{}.rs", snake_name(title))
}

/// Accessor stem synthesized for a union type parameter.
pub fn union_param_accessor(param: &str) -> String {
    snake_name(param)
}

/// Naive English pluralization; enough for type titles.
fn pluralize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('y') {
        if !stem.is_empty() && !stem.ends_with(|c: char| "aeiou".contains(c)) {
            return format!("{stem}ies");
        }
    }
    if word.ends_with('s')
        || word.ends_with('x')
        || word.ends_with('z')
        || word.ends_with("ch")
        || word.ends_with("sh")
    {
        return format!("{word}es");
    }
    format!("{word}s")
}

/// Wrapper-type name for "collection of item". Keyed by the item's derived
/// title and the uniqueness flag only — never by the referencing property —
/// so every `list of Comment` in the whole model lands on one wrapper.
pub fn wrapper_name(item_title: &str, unique: bool) -> String {
    let base = pluralize(&type_name(item_title));
    if unique {
        format!("{base}Set")
    } else {
        format!("{base}List")
    }
}

/// Unit-scoped record of every claimed identifier. First claim wins the
/// name; a second claim from a *different* title is a collision error, and
/// a re-claim from the same title is a no-op (wrappers are claimed once per
/// referencing property).
#[derive(Debug, Default)]
pub struct NameTable {
    claimed: BTreeMap<String, String>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, ident: &str, title: &str) -> Result<(), GenError> {
        match self.claimed.get(ident) {
            None => {
                self.claimed.insert(ident.to_string(), title.to_string());
                Ok(())
            }
            Some(owner) if owner == title => Ok(()),
            Some(owner) => Err(GenError::IdentifierCollision {
                first: owner.clone(),
                second: title.to_string(),
                ident: ident.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn casing_handles_delimiters_and_camel_humps() {
        assert_eq!(type_name("blog post"), "BlogPost");
        assert_eq!(type_name("blog_post"), "BlogPost");
        assert_eq!(type_name("BlogPost"), "BlogPost");
        assert_eq!(snake_name("BlogPost"), "blog_post");
        assert_eq!(snake_name("HTTP request"), "http_request");
    }

    #[test]
    fn wrapper_names_key_on_item_and_uniqueness_only() {
        assert_eq!(wrapper_name("Comment", false), "CommentsList");
        assert_eq!(wrapper_name("Comment", true), "CommentsSet");
        assert_eq!(wrapper_name("Category", false), "CategoriesList");
        assert_eq!(wrapper_name(STRING_VALUE, false), "StringValuesList");
    }

    #[test]
    fn colliding_titles_are_an_error_not_a_merge() {
        let mut table = NameTable::new();
        table.claim("BlogPost", "blog post").unwrap();
        // same title re-claiming is fine (happens for shared wrappers)
        table.claim("BlogPost", "blog post").unwrap();
        let err = table.claim("BlogPost", "Blog_Post").unwrap_err();
        assert!(matches!(err, GenError::IdentifierCollision { .. }));
    }
}
