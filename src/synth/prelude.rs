//! The fixed runtime-interface artifact.
//!
//! Every generated unit ships one copy of `runtime.rs`: the trait surface
//! the generated code compiles against. The tree store and the two text
//! codecs are collaborators the embedding application implements; only
//! their *interfaces* are emitted here.

use crate::emit::NamedArtifact;

pub fn runtime_artifact() -> NamedArtifact {
    NamedArtifact {
        file_name: "runtime.rs".to_string(),
        source: RUNTIME_SRC.to_string(),
    }
}

const RUNTIME_SRC: &str = r#"//! Runtime interface for modelgen-generated code. Do not edit.
//!
//! The tree store and the block/lines codecs are supplied by the embedding
//! application; generated code only ever talks to the traits declared here.

pub use once_cell::sync::Lazy;
pub use ordered_float::OrderedFloat;
pub use regex::Regex;

// ------------------------------- Errors ---------------------------------- //

/// Raised by generated constructors and mutators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    Constraint {
        schema: &'static str,
        property: &'static str,
        bounds: &'static str,
    },
    MissingSlot {
        schema: &'static str,
        property: &'static str,
    },
    Duplicate,
}

impl ModelError {
    pub fn constraint(
        schema: &'static str,
        property: &'static str,
        bounds: &'static str,
    ) -> Self {
        ModelError::Constraint {
            schema,
            property,
            bounds,
        }
    }

    pub fn missing_slot(schema: &'static str, property: &'static str) -> Self {
        ModelError::MissingSlot { schema, property }
    }
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::Constraint {
                schema,
                property,
                bounds,
            } => write!(f, "{schema}.{property} violates {bounds}"),
            ModelError::MissingSlot { schema, property } => {
                write!(f, "{schema}.{property}: required slot is absent")
            }
            ModelError::Duplicate => write!(f, "duplicate element in a set-like collection"),
        }
    }
}

impl std::error::Error for ModelError {}

/// Raised by generated decode paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    MissingField {
        schema: &'static str,
        field: &'static str,
    },
    Shape {
        expected: &'static str,
    },
    UnknownField {
        schema: &'static str,
        field: String,
    },
    NoUnionMember {
        union: &'static str,
    },
    DuplicateElement {
        wrapper: &'static str,
    },
    Invalid(ModelError),
}

impl DecodeError {
    pub fn missing_field(schema: &'static str, field: &'static str) -> Self {
        DecodeError::MissingField { schema, field }
    }

    pub fn shape(expected: &'static str) -> Self {
        DecodeError::Shape { expected }
    }

    pub fn no_union_member(union: &'static str) -> Self {
        DecodeError::NoUnionMember { union }
    }

    pub fn duplicate_element(wrapper: &'static str) -> Self {
        DecodeError::DuplicateElement { wrapper }
    }

    pub fn invalid(err: ModelError) -> Self {
        DecodeError::Invalid(err)
    }
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::MissingField { schema, field } => {
                write!(f, "{schema}: missing field `{field}`")
            }
            DecodeError::Shape { expected } => write!(f, "expected {expected}"),
            DecodeError::UnknownField { schema, field } => {
                write!(f, "{schema}: unknown field `{field}`")
            }
            DecodeError::NoUnionMember { union } => {
                write!(f, "{union}: no member decoder accepted the input")
            }
            DecodeError::DuplicateElement { wrapper } => {
                write!(f, "{wrapper}: duplicate element")
            }
            DecodeError::Invalid(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// The tree-entry dispatcher found no match for a runtime value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnrecognizedValue;

impl std::fmt::Display for UnrecognizedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unrecognized runtime value")
    }
}

impl std::error::Error for UnrecognizedValue {}

// ------------------------------ Tree store -------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

/// A detached payload, built by generated `populate` paths and read back by
/// generated accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subtree {
    String(String),
    Integer(i64),
    Number(OrderedFloat<f64>),
    Boolean(bool),
    Record {
        ty: &'static str,
        children: Vec<(&'static str, Subtree)>,
    },
    List(Vec<Subtree>),
}

impl Subtree {
    pub fn child(&self, key: &str) -> Option<&Subtree> {
        match self {
            Subtree::Record { children, .. } => {
                children.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
            }
            _ => None,
        }
    }
}

pub trait TreeStore {
    fn add_subtree(&mut self, parent: NodeId, key: &str, subtree: Subtree) -> NodeId;
    fn replace_subtree(&mut self, node: NodeId, subtree: Subtree) -> NodeId;
    fn remove_subtree(&mut self, node: NodeId);
    fn child(&self, node: NodeId, key: &str) -> Option<NodeId>;
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn subtree(&self, node: NodeId) -> Subtree;
}

// ------------------------------ Text codecs ------------------------------- //

/// Sink for the compact delimited block format.
pub trait BlockWrite {
    fn begin_record(&mut self, ty: &str);
    fn end_record(&mut self);
    fn begin_field(&mut self, name: &str);
    fn end_field(&mut self);
    fn begin_array(&mut self);
    fn end_array(&mut self);
    fn begin_element(&mut self);
    fn end_element(&mut self);
    fn string(&mut self, value: &str);
    fn integer(&mut self, value: i64);
    fn number(&mut self, value: f64);
    fn boolean(&mut self, value: bool);
}

/// A span of block-format text, with the two extraction primitives the
/// generated decode paths need.
pub trait BlockRead: Sized {
    fn field(&self, name: &str) -> Result<Self, DecodeError>;
    fn field_opt(&self, name: &str) -> Option<Self>;
    fn elements(&self) -> Result<Vec<Self>, DecodeError>;
    fn as_string(&self) -> Result<String, DecodeError>;
    fn as_integer(&self) -> Result<i64, DecodeError>;
    fn as_number(&self) -> Result<f64, DecodeError>;
    fn as_boolean(&self) -> Result<bool, DecodeError>;
    fn reject_unknown_fields(&self, allowed: &[&str]) -> Result<(), DecodeError>;
}

/// Sink for the line-oriented indented format. Same surface as
/// [`BlockWrite`]; the writer decides layout.
pub trait LineWrite {
    fn begin_record(&mut self, ty: &str);
    fn end_record(&mut self);
    fn begin_field(&mut self, name: &str);
    fn end_field(&mut self);
    fn begin_array(&mut self);
    fn end_array(&mut self);
    fn begin_element(&mut self);
    fn end_element(&mut self);
    fn string(&mut self, value: &str);
    fn integer(&mut self, value: i64);
    fn number(&mut self, value: f64);
    fn boolean(&mut self, value: bool);
}

pub trait LineRead: Sized {
    fn field(&self, name: &str) -> Result<Self, DecodeError>;
    fn field_opt(&self, name: &str) -> Option<Self>;
    fn elements(&self) -> Result<Vec<Self>, DecodeError>;
    fn as_string(&self) -> Result<String, DecodeError>;
    fn as_integer(&self) -> Result<i64, DecodeError>;
    fn as_number(&self) -> Result<f64, DecodeError>;
    fn as_boolean(&self) -> Result<bool, DecodeError>;
    fn reject_unknown_fields(&self, allowed: &[&str]) -> Result<(), DecodeError>;
}

// --------------------------- Codec trait pairs ---------------------------- //

pub trait BlockEncode {
    fn encode_block<W: BlockWrite>(&self, w: &mut W);
}

pub trait BlockDecode: Sized {
    fn decode_block<S: BlockRead>(span: &S) -> Result<Self, DecodeError>;
}

pub trait LineEncode {
    fn encode_lines<W: LineWrite>(&self, w: &mut W);
}

pub trait LineDecode: Sized {
    fn decode_lines<S: LineRead>(span: &S) -> Result<Self, DecodeError>;
}

pub trait SubtreeEncode {
    fn to_subtree(&self) -> Subtree;
}

pub trait SubtreeDecode: Sized {
    fn from_subtree(subtree: &Subtree) -> Result<Self, DecodeError>;
}

// --------------------------- Scalar codec impls --------------------------- //

impl BlockEncode for String {
    fn encode_block<W: BlockWrite>(&self, w: &mut W) {
        w.string(self.as_str());
    }
}

impl BlockDecode for String {
    fn decode_block<S: BlockRead>(span: &S) -> Result<Self, DecodeError> {
        span.as_string()
    }
}

impl LineEncode for String {
    fn encode_lines<W: LineWrite>(&self, w: &mut W) {
        w.string(self.as_str());
    }
}

impl LineDecode for String {
    fn decode_lines<S: LineRead>(span: &S) -> Result<Self, DecodeError> {
        span.as_string()
    }
}

impl SubtreeEncode for String {
    fn to_subtree(&self) -> Subtree {
        Subtree::String(self.clone())
    }
}

impl SubtreeDecode for String {
    fn from_subtree(subtree: &Subtree) -> Result<Self, DecodeError> {
        match subtree {
            Subtree::String(v) => Ok(v.clone()),
            _ => Err(DecodeError::shape("string")),
        }
    }
}

impl BlockEncode for i64 {
    fn encode_block<W: BlockWrite>(&self, w: &mut W) {
        w.integer(*self);
    }
}

impl BlockDecode for i64 {
    fn decode_block<S: BlockRead>(span: &S) -> Result<Self, DecodeError> {
        span.as_integer()
    }
}

impl LineEncode for i64 {
    fn encode_lines<W: LineWrite>(&self, w: &mut W) {
        w.integer(*self);
    }
}

impl LineDecode for i64 {
    fn decode_lines<S: LineRead>(span: &S) -> Result<Self, DecodeError> {
        span.as_integer()
    }
}

impl SubtreeEncode for i64 {
    fn to_subtree(&self) -> Subtree {
        Subtree::Integer(*self)
    }
}

impl SubtreeDecode for i64 {
    fn from_subtree(subtree: &Subtree) -> Result<Self, DecodeError> {
        match subtree {
            Subtree::Integer(v) => Ok(*v),
            _ => Err(DecodeError::shape("integer")),
        }
    }
}

impl BlockEncode for OrderedFloat<f64> {
    fn encode_block<W: BlockWrite>(&self, w: &mut W) {
        w.number(self.0);
    }
}

impl BlockDecode for OrderedFloat<f64> {
    fn decode_block<S: BlockRead>(span: &S) -> Result<Self, DecodeError> {
        Ok(OrderedFloat(span.as_number()?))
    }
}

impl LineEncode for OrderedFloat<f64> {
    fn encode_lines<W: LineWrite>(&self, w: &mut W) {
        w.number(self.0);
    }
}

impl LineDecode for OrderedFloat<f64> {
    fn decode_lines<S: LineRead>(span: &S) -> Result<Self, DecodeError> {
        Ok(OrderedFloat(span.as_number()?))
    }
}

impl SubtreeEncode for OrderedFloat<f64> {
    fn to_subtree(&self) -> Subtree {
        Subtree::Number(*self)
    }
}

impl SubtreeDecode for OrderedFloat<f64> {
    fn from_subtree(subtree: &Subtree) -> Result<Self, DecodeError> {
        match subtree {
            Subtree::Number(v) => Ok(*v),
            _ => Err(DecodeError::shape("number")),
        }
    }
}

impl BlockEncode for bool {
    fn encode_block<W: BlockWrite>(&self, w: &mut W) {
        w.boolean(*self);
    }
}

impl BlockDecode for bool {
    fn decode_block<S: BlockRead>(span: &S) -> Result<Self, DecodeError> {
        span.as_boolean()
    }
}

impl LineEncode for bool {
    fn encode_lines<W: LineWrite>(&self, w: &mut W) {
        w.boolean(*self);
    }
}

impl LineDecode for bool {
    fn decode_lines<S: LineRead>(span: &S) -> Result<Self, DecodeError> {
        span.as_boolean()
    }
}

impl SubtreeEncode for bool {
    fn to_subtree(&self) -> Subtree {
        Subtree::Boolean(*self)
    }
}

impl SubtreeDecode for bool {
    fn from_subtree(subtree: &Subtree) -> Result<Self, DecodeError> {
        match subtree {
            Subtree::Boolean(v) => Ok(*v),
            _ => Err(DecodeError::shape("boolean")),
        }
    }
}

// ------------------------- Generic containers ----------------------------- //

/// List over an open type parameter; named wrappers cover the closed cases.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueList<T>(pub Vec<T>);

impl<T> ValueList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self(items)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T: BlockEncode> BlockEncode for ValueList<T> {
    fn encode_block<W: BlockWrite>(&self, w: &mut W) {
        w.begin_array();
        for item in &self.0 {
            w.begin_element();
            item.encode_block(w);
            w.end_element();
        }
        w.end_array();
    }
}

impl<T: BlockDecode> BlockDecode for ValueList<T> {
    fn decode_block<S: BlockRead>(span: &S) -> Result<Self, DecodeError> {
        let mut items = Vec::new();
        for el in span.elements()? {
            items.push(T::decode_block(&el)?);
        }
        Ok(Self(items))
    }
}

impl<T: LineEncode> LineEncode for ValueList<T> {
    fn encode_lines<W: LineWrite>(&self, w: &mut W) {
        w.begin_array();
        for item in &self.0 {
            w.begin_element();
            item.encode_lines(w);
            w.end_element();
        }
        w.end_array();
    }
}

impl<T: LineDecode> LineDecode for ValueList<T> {
    fn decode_lines<S: LineRead>(span: &S) -> Result<Self, DecodeError> {
        let mut items = Vec::new();
        for el in span.elements()? {
            items.push(T::decode_lines(&el)?);
        }
        Ok(Self(items))
    }
}

impl<T: SubtreeEncode> SubtreeEncode for ValueList<T> {
    fn to_subtree(&self) -> Subtree {
        Subtree::List(self.0.iter().map(SubtreeEncode::to_subtree).collect())
    }
}

impl<T: SubtreeDecode> SubtreeDecode for ValueList<T> {
    fn from_subtree(subtree: &Subtree) -> Result<Self, DecodeError> {
        match subtree {
            Subtree::List(items) => Ok(Self(
                items
                    .iter()
                    .map(T::from_subtree)
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            _ => Err(DecodeError::shape("list")),
        }
    }
}

/// Set-like counterpart; element uniqueness is checked on construction and
/// on decode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueSet<T: PartialEq>(pub Vec<T>);

impl<T: PartialEq> ValueSet<T> {
    pub fn new(items: Vec<T>) -> Result<Self, ModelError> {
        let mut out: Vec<T> = Vec::with_capacity(items.len());
        for item in items {
            if out.contains(&item) {
                return Err(ModelError::Duplicate);
            }
            out.push(item);
        }
        Ok(Self(out))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T: PartialEq + BlockEncode> BlockEncode for ValueSet<T> {
    fn encode_block<W: BlockWrite>(&self, w: &mut W) {
        w.begin_array();
        for item in &self.0 {
            w.begin_element();
            item.encode_block(w);
            w.end_element();
        }
        w.end_array();
    }
}

impl<T: PartialEq + BlockDecode> BlockDecode for ValueSet<T> {
    fn decode_block<S: BlockRead>(span: &S) -> Result<Self, DecodeError> {
        let mut items = Vec::new();
        for el in span.elements()? {
            let item = T::decode_block(&el)?;
            if items.contains(&item) {
                return Err(DecodeError::duplicate_element("ValueSet"));
            }
            items.push(item);
        }
        Ok(Self(items))
    }
}

impl<T: PartialEq + LineEncode> LineEncode for ValueSet<T> {
    fn encode_lines<W: LineWrite>(&self, w: &mut W) {
        w.begin_array();
        for item in &self.0 {
            w.begin_element();
            item.encode_lines(w);
            w.end_element();
        }
        w.end_array();
    }
}

impl<T: PartialEq + LineDecode> LineDecode for ValueSet<T> {
    fn decode_lines<S: LineRead>(span: &S) -> Result<Self, DecodeError> {
        let mut items = Vec::new();
        for el in span.elements()? {
            let item = T::decode_lines(&el)?;
            if items.contains(&item) {
                return Err(DecodeError::duplicate_element("ValueSet"));
            }
            items.push(item);
        }
        Ok(Self(items))
    }
}

impl<T: PartialEq + SubtreeEncode> SubtreeEncode for ValueSet<T> {
    fn to_subtree(&self) -> Subtree {
        Subtree::List(self.0.iter().map(SubtreeEncode::to_subtree).collect())
    }
}

impl<T: PartialEq + SubtreeDecode> SubtreeDecode for ValueSet<T> {
    fn from_subtree(subtree: &Subtree) -> Result<Self, DecodeError> {
        match subtree {
            Subtree::List(items) => {
                let mut out = Vec::new();
                for item in items {
                    let item = T::from_subtree(item)?;
                    if out.contains(&item) {
                        return Err(DecodeError::duplicate_element("ValueSet"));
                    }
                    out.push(item);
                }
                Ok(Self(out))
            }
            _ => Err(DecodeError::shape("list")),
        }
    }
}
"#;
