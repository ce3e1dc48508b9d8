//! # Tag Codec
//!
//! Lossless conversion between item metadata tags and JSON values.
//!
//! ## Codec Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tag Codec Mapping                                │
//! │                                                                         │
//! │  TagValue                         JSON                                 │
//! │  ────────                         ────                                 │
//! │  Compound { name → value }   ──►  { "name": value, ... }               │
//! │  List [ ... ]               ──►  [ ... ]                               │
//! │  String                      ──►  "..."                                │
//! │  Byte/Short/Int/Long         ──►  number                               │
//! │  Float/Double                ──►  number                               │
//! │  ByteArray/IntArray/         ──►  [ number, ... ]                      │
//! │  LongArray                                                             │
//! │                                                                         │
//! │  DECODE INFERENCE (reproduced from the original bridge)                │
//! │  ──────────────────────────────────────────────────────                │
//! │  number with float lexeme    ──►  Double                               │
//! │  integral, fits i32          ──►  Int                                  │
//! │  integral, larger            ──►  Long                                 │
//! │  boolean                     ──►  Byte(0|1)                            │
//! │  array                       ──►  List (array kinds are NOT restored)  │
//! │  null                        ──►  Parse error naming the key path      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Round-Trip Guarantee
//! `decode(encode(t)) == t` holds for every tree built from the 64-bit-safe
//! subset: Compound, List, String, Int, Long, Double. The narrower kinds
//! (Byte, Short, Float, and the typed arrays) survive encoding but come
//! back widened - this is a deliberate compatibility quirk of the wire
//! format, not something to fix here.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Tag Value
// =============================================================================

/// A node in an item's metadata tree.
///
/// ## Design Notes
/// - `Compound` uses a `BTreeMap` so equality and the encoded JSON are
///   insensitive to field insertion order. This is what makes identity
///   keys stable under reordering.
/// - `List` is homogeneous by convention, but the codec does not enforce
///   homogeneity; the game engine does.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    /// 8-bit signed integer. Also carries booleans as 0/1.
    Byte(i8),
    /// 16-bit signed integer.
    Short(i16),
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// Packed byte array.
    ByteArray(Vec<i8>),
    /// Packed int array.
    IntArray(Vec<i32>),
    /// Packed long array.
    LongArray(Vec<i64>),
    /// Ordered sequence of tags.
    List(Vec<TagValue>),
    /// Named fields, keys unique.
    Compound(BTreeMap<String, TagValue>),
}

impl TagValue {
    /// Returns the kind name as a string (for logging and error messages).
    pub fn kind_name(&self) -> &'static str {
        match self {
            TagValue::Byte(_) => "Byte",
            TagValue::Short(_) => "Short",
            TagValue::Int(_) => "Int",
            TagValue::Long(_) => "Long",
            TagValue::Float(_) => "Float",
            TagValue::Double(_) => "Double",
            TagValue::String(_) => "String",
            TagValue::ByteArray(_) => "ByteArray",
            TagValue::IntArray(_) => "IntArray",
            TagValue::LongArray(_) => "LongArray",
            TagValue::List(_) => "List",
            TagValue::Compound(_) => "Compound",
        }
    }

    /// Builds a compound from an iterator of (name, value) pairs.
    pub fn compound<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, TagValue)>,
        K: Into<String>,
    {
        TagValue::Compound(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect(),
        )
    }

    /// Canonical JSON text of this tag (sorted compound keys).
    ///
    /// Equal tags always produce identical text, which is what the
    /// identity-key hash relies on.
    pub fn canonical_json(&self) -> String {
        // Object keys come from a BTreeMap, so serialization order is
        // already canonical.
        encode(self).to_string()
    }
}

// =============================================================================
// Encoding: TagValue → JSON
// =============================================================================

/// Encodes a tag tree into a JSON value.
///
/// Total over the union: every `TagValue` has a JSON form. Note that
/// non-finite floats have no JSON number literal and encode as `null`,
/// which will not survive a decode - the game engine never produces them
/// in item metadata.
pub fn encode(tag: &TagValue) -> Value {
    match tag {
        TagValue::Byte(v) => Value::Number(Number::from(*v)),
        TagValue::Short(v) => Value::Number(Number::from(*v)),
        TagValue::Int(v) => Value::Number(Number::from(*v)),
        TagValue::Long(v) => Value::Number(Number::from(*v)),
        TagValue::Float(v) => json_number(f64::from(*v)),
        TagValue::Double(v) => json_number(*v),
        TagValue::String(v) => Value::String(v.clone()),
        TagValue::ByteArray(v) => Value::Array(
            v.iter().map(|b| Value::Number(Number::from(*b))).collect(),
        ),
        TagValue::IntArray(v) => Value::Array(
            v.iter().map(|i| Value::Number(Number::from(*i))).collect(),
        ),
        TagValue::LongArray(v) => Value::Array(
            v.iter().map(|l| Value::Number(Number::from(*l))).collect(),
        ),
        TagValue::List(items) => Value::Array(items.iter().map(encode).collect()),
        TagValue::Compound(fields) => {
            let mut object = Map::new();
            for (name, value) in fields {
                object.insert(name.clone(), encode(value));
            }
            Value::Object(object)
        }
    }
}

fn json_number(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

// =============================================================================
// Decoding: JSON → TagValue
// =============================================================================

/// Decodes a JSON value into a tag tree.
///
/// ## Numeric Subtype Inference
/// JSON numbers carry no tag kind, so the kind is inferred, not declared:
/// a number parsed with a float lexeme becomes `Double`; an integral
/// number becomes `Int` when it fits a signed 32-bit range and `Long`
/// otherwise. Narrower input kinds (Byte, Short, Float) therefore do not
/// round-trip - preserve this behavior, the marketplace depends on it.
///
/// Fails with [`CoreError::Parse`] naming the offending key path on any
/// node that is neither object, array, nor primitive.
pub fn decode(json: &Value) -> CoreResult<TagValue> {
    let mut path = PathTracker::new();
    decode_node(json, &mut path)
}

fn decode_node(json: &Value, path: &mut PathTracker) -> CoreResult<TagValue> {
    match json {
        Value::Object(object) => {
            let mut fields = BTreeMap::new();
            for (name, value) in object {
                path.push_field(name);
                fields.insert(name.clone(), decode_node(value, path)?);
                path.pop();
            }
            Ok(TagValue::Compound(fields))
        }
        Value::Array(items) => {
            let mut list = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                path.push_index(index);
                list.push(decode_node(item, path)?);
                path.pop();
            }
            Ok(TagValue::List(list))
        }
        Value::String(s) => Ok(TagValue::String(s.clone())),
        Value::Bool(b) => Ok(TagValue::Byte(i8::from(*b))),
        Value::Number(n) => decode_number(n, path),
        Value::Null => Err(path.error("null is not a tag value")),
    }
}

fn decode_number(n: &Number, path: &PathTracker) -> CoreResult<TagValue> {
    // serde_json marks a number as f64 exactly when its lexeme had a
    // decimal point or exponent, which matches the original inference.
    if n.is_f64() {
        let v = n
            .as_f64()
            .ok_or_else(|| path.error("unrepresentable float"))?;
        return Ok(TagValue::Double(v));
    }
    match n.as_i64() {
        Some(v) if v >= i64::from(i32::MIN) && v <= i64::from(i32::MAX) => {
            Ok(TagValue::Int(v as i32))
        }
        Some(v) => Ok(TagValue::Long(v)),
        // u64 beyond i64::MAX has no signed tag kind
        None => Err(path.error("integer out of signed 64-bit range")),
    }
}

// =============================================================================
// Key Path Tracking
// =============================================================================

/// Tracks the dotted/indexed path to the node being decoded, so parse
/// errors can name it (`Display.Lore[2]`).
struct PathTracker {
    segments: Vec<PathSegment>,
}

enum PathSegment {
    Field(String),
    Index(usize),
}

impl PathTracker {
    fn new() -> Self {
        PathTracker { segments: Vec::new() }
    }

    fn push_field(&mut self, name: &str) {
        self.segments.push(PathSegment::Field(name.to_string()));
    }

    fn push_index(&mut self, index: usize) {
        self.segments.push(PathSegment::Index(index));
    }

    fn pop(&mut self) {
        self.segments.pop();
    }

    fn render(&self) -> String {
        if self.segments.is_empty() {
            return "<root>".to_string();
        }
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                PathSegment::Field(name) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(name);
                }
                PathSegment::Index(index) => {
                    let _ = write!(out, "[{index}]");
                }
            }
        }
        out
    }

    fn error(&self, reason: &str) -> CoreError {
        CoreError::Parse {
            path: self.render(),
            reason: reason.to_string(),
        }
    }
}

// =============================================================================
// Serde Integration
// =============================================================================
// Item records embed tags directly in wire payloads, so TagValue plugs
// into serde by delegating to the codec.

impl Serialize for TagValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        encode(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TagValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = Value::deserialize(deserializer)?;
        decode(&json).map_err(D::Error::custom)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
