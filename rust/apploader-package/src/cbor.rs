// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Generic CBOR item tree with borrowed byte and text strings.
//!
//! `parse_with_views` turns an encoded buffer into an [`Item`] tree. Byte and
//! text strings are not copied: they borrow from the input, and byte strings
//! remember their offset. Package-specific rules live in `package.rs`; this
//! module only enforces what is needed to produce a well-formed tree:
//!
//! - definite lengths only (an indefinite byte string has no contiguous view),
//! - bounded nesting depth,
//! - exactly one root item with no trailing bytes.

use std::fmt;

use minicbor::data::Type;
use minicbor::Decoder;

use crate::view::ByteView;

/// Default maximum nesting depth for arrays, maps and tags.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Limits applied while building the item tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseLimits {
    /// Maximum container nesting depth; the root item is at depth 1.
    pub max_depth: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CborParseError {
    #[error("empty input")]
    Empty,

    #[error("CBOR decode failed: {0}")]
    Decode(String),

    #[error("indefinite-length {what} at offset {offset} is not supported")]
    IndefiniteLength { what: &'static str, offset: usize },

    #[error("nesting depth exceeds limit of {max}")]
    TooDeep { max: usize },

    #[error("unexpected CBOR item {what} at offset {offset}")]
    Unexpected { what: String, offset: usize },

    #[error("{0} trailing bytes after root item")]
    TrailingBytes(usize),
}

impl CborParseError {
    /// Normalize decoder failures so the underlying error type stays private.
    fn decode<E: fmt::Display>(e: E) -> Self {
        Self::Decode(e.to_string())
    }
}

/// The CBOR type of a decoded value, used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Uint,
    NegInt,
    Bytes,
    Text,
    Array,
    Map,
    Bool,
    Null,
    Undefined,
    Simple,
    Float,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Uint => "unsigned integer",
            Kind::NegInt => "negative integer",
            Kind::Bytes => "byte string",
            Kind::Text => "text string",
            Kind::Array => "array",
            Kind::Map => "map",
            Kind::Bool => "bool",
            Kind::Null => "null",
            Kind::Undefined => "undefined",
            Kind::Simple => "simple value",
            Kind::Float => "float",
        };
        f.write_str(name)
    }
}

/// A decoded CBOR value. Containers hold fully decoded children.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Uint(u64),
    /// Negative integers span `-2^64..=-1`, which needs more than `i64`.
    NegInt(i128),
    Bytes(ByteView<'a>),
    Text(&'a str),
    Array(Vec<Item<'a>>),
    Map(Vec<(Item<'a>, Item<'a>)>),
    Bool(bool),
    Null,
    Undefined,
    Simple(u8),
    Float(f64),
}

impl Value<'_> {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Uint(_) => Kind::Uint,
            Value::NegInt(_) => Kind::NegInt,
            Value::Bytes(_) => Kind::Bytes,
            Value::Text(_) => Kind::Text,
            Value::Array(_) => Kind::Array,
            Value::Map(_) => Kind::Map,
            Value::Bool(_) => Kind::Bool,
            Value::Null => Kind::Null,
            Value::Undefined => Kind::Undefined,
            Value::Simple(_) => Kind::Simple,
            Value::Float(_) => Kind::Float,
        }
    }
}

/// A value together with the semantic tags wrapped around it, outermost first.
#[derive(Debug, Clone, PartialEq)]
pub struct Item<'a> {
    tags: Vec<u64>,
    value: Value<'a>,
}

impl<'a> Item<'a> {
    pub fn new(tags: Vec<u64>, value: Value<'a>) -> Self {
        Self { tags, value }
    }

    pub fn tags(&self) -> &[u64] {
        &self.tags
    }

    pub fn semantic_tag_count(&self) -> usize {
        self.tags.len()
    }

    /// Outermost semantic tag, if any.
    pub fn semantic_tag(&self) -> Option<u64> {
        self.tags.first().copied()
    }

    pub fn value(&self) -> &Value<'a> {
        &self.value
    }

    pub fn kind(&self) -> Kind {
        self.value.kind()
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self.value {
            Value::Uint(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Item<'a>]> {
        match &self.value {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Item<'a>, Item<'a>)]> {
        match &self.value {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_view_bstr(&self) -> Option<ByteView<'a>> {
        match self.value {
            Value::Bytes(view) => Some(view),
            _ => None,
        }
    }
}

/// Parse `input` into an item tree, borrowing all strings from `input`.
pub fn parse_with_views<'a>(input: &'a [u8], limits: &ParseLimits) -> Result<Item<'a>, CborParseError> {
    if input.is_empty() {
        return Err(CborParseError::Empty);
    }

    let mut dec = Decoder::new(input);
    let item = parse_item(&mut dec, limits, 1)?;

    let trailing = input.len() - dec.position();
    if trailing != 0 {
        return Err(CborParseError::TrailingBytes(trailing));
    }

    Ok(item)
}

fn parse_item<'a>(dec: &mut Decoder<'a>, limits: &ParseLimits, depth: usize) -> Result<Item<'a>, CborParseError> {
    if depth > limits.max_depth {
        return Err(CborParseError::TooDeep { max: limits.max_depth });
    }

    let mut tags = Vec::new();
    while matches!(dec.datatype().map_err(CborParseError::decode)?, Type::Tag) {
        let tag = dec.tag().map_err(CborParseError::decode)?;
        tags.push(tag.as_u64());
    }

    let value = parse_value(dec, limits, depth)?;
    Ok(Item { tags, value })
}

fn parse_value<'a>(dec: &mut Decoder<'a>, limits: &ParseLimits, depth: usize) -> Result<Value<'a>, CborParseError> {
    let offset = dec.position();
    let value = match dec.datatype().map_err(CborParseError::decode)? {
        Type::U8 | Type::U16 | Type::U32 | Type::U64 => Value::Uint(dec.u64().map_err(CborParseError::decode)?),
        Type::I8 | Type::I16 | Type::I32 | Type::I64 | Type::Int => {
            let int = dec.int().map_err(CborParseError::decode)?;
            Value::NegInt(i128::from(int))
        }
        Type::Bytes => {
            let bytes = dec.bytes().map_err(CborParseError::decode)?;
            // The content ends where the decoder now stands.
            let start = dec.position() - bytes.len();
            Value::Bytes(ByteView::new(bytes, start))
        }
        Type::String => Value::Text(dec.str().map_err(CborParseError::decode)?),
        Type::Array => {
            let len = definite_len(dec.array().map_err(CborParseError::decode)?, "array", offset)?;
            let mut items = Vec::with_capacity(bounded_capacity(dec, len, 1));
            for _ in 0..len {
                items.push(parse_item(dec, limits, depth + 1)?);
            }
            Value::Array(items)
        }
        Type::Map => {
            let len = definite_len(dec.map().map_err(CborParseError::decode)?, "map", offset)?;
            let mut entries = Vec::with_capacity(bounded_capacity(dec, len, 2));
            for _ in 0..len {
                let key = parse_item(dec, limits, depth + 1)?;
                let value = parse_item(dec, limits, depth + 1)?;
                entries.push((key, value));
            }
            Value::Map(entries)
        }
        Type::Bool => Value::Bool(dec.bool().map_err(CborParseError::decode)?),
        Type::Null => {
            dec.null().map_err(CborParseError::decode)?;
            Value::Null
        }
        Type::Undefined => {
            dec.undefined().map_err(CborParseError::decode)?;
            Value::Undefined
        }
        Type::Simple => Value::Simple(dec.simple().map_err(CborParseError::decode)?),
        Type::F16 => Value::Float(f64::from(dec.f16().map_err(CborParseError::decode)?)),
        Type::F32 => Value::Float(f64::from(dec.f32().map_err(CborParseError::decode)?)),
        Type::F64 => Value::Float(dec.f64().map_err(CborParseError::decode)?),
        Type::BytesIndef => return Err(CborParseError::IndefiniteLength { what: "byte string", offset }),
        Type::StringIndef => return Err(CborParseError::IndefiniteLength { what: "text string", offset }),
        Type::ArrayIndef => return Err(CborParseError::IndefiniteLength { what: "array", offset }),
        Type::MapIndef => return Err(CborParseError::IndefiniteLength { what: "map", offset }),
        other => {
            return Err(CborParseError::Unexpected {
                what: format!("{other:?}"),
                offset,
            })
        }
    };
    Ok(value)
}

fn definite_len(len: Option<u64>, what: &'static str, offset: usize) -> Result<u64, CborParseError> {
    len.ok_or(CborParseError::IndefiniteLength { what, offset })
}

/// Each element takes at least `min_item_size` bytes, so a declared length can
/// never justify reserving more slots than the remaining input could fill.
fn bounded_capacity(dec: &Decoder<'_>, len: u64, min_item_size: usize) -> usize {
    let remaining = (dec.input().len() - dec.position()) / min_item_size;
    usize::try_from(len).map_or(remaining, |len| len.min(remaining))
}
