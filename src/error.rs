//! Generation-time error taxonomy.
//!
//! Everything here aborts the compilation unit that raised it; none of these
//! are recoverable. Errors that only exist inside *emitted* code (constraint
//! guards firing, union decode exhaustion) are not modeled here — they are
//! text we generate, not values we return.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenError {
    #[error("unit `{unit}`: schema at index {index} has an empty or missing title")]
    EmptyTitle { unit: String, index: usize },

    #[error("unit `{unit}` declares no schemas")]
    EmptySchemaList { unit: String },

    #[error("union `{title}` declares {arity} variant(s); at least 2 are required")]
    UnionArityTooFew { title: String, arity: usize },

    #[error("union `{title}` declares {arity} variants; legacy mode allows at most {limit}")]
    UnionArityTooMany {
        title: String,
        arity: usize,
        limit: usize,
    },

    #[error("property `{schema}.{property}` references undeclared type parameter `{param}`")]
    UndeclaredParam {
        schema: String,
        property: String,
        param: String,
    },

    #[error(
        "property `{schema}.{property}` must supply type argument `{param}` declared by `{target}`"
    )]
    MissingTypeArgument {
        schema: String,
        property: String,
        target: String,
        param: String,
    },

    #[error(
        "property `{schema}.{property}` supplies type argument `{arg}`, which `{target}` does not declare"
    )]
    UnknownTypeArgument {
        schema: String,
        property: String,
        target: String,
        arg: String,
    },

    #[error("property `{schema}.{property}` has unsupported kind `{kind}`")]
    UnsupportedKind {
        schema: String,
        property: String,
        kind: String,
    },

    #[error("property `{schema}.{property}` references unknown schema `{target}`")]
    UnknownReference {
        schema: String,
        property: String,
        target: String,
    },

    #[error("union `{title}` lists unknown member `{member}`")]
    UnknownUnionMember { title: String, member: String },

    #[error(
        "union `{title}` member `{member}` leaves type parameter `{param}` unsupplied; members cannot reference parameterized schemas"
    )]
    GenericUnionMember {
        title: String,
        member: String,
        param: String,
    },

    #[error("titles `{first}` and `{second}` both derive the identifier `{ident}`")]
    IdentifierCollision {
        first: String,
        second: String,
        ident: String,
    },

    #[error("pattern on `{schema}.{property}` does not compile: {source}")]
    BadPattern {
        schema: String,
        property: String,
        #[source]
        source: Box<regex::Error>,
    },
}
