//! Glue between the context store and the values it holds.
//!
//! Values are plain `serde_json::Value`s. This module supplies the pieces a
//! context needs on top of them: a coarse type tag, typed extraction, a
//! canonical content hash and the text a value contributes to substitution.

use std::fmt;

use itertools::Itertools;
use serde::Serialize;
use serde_json::{Number, Value};

use crate::hash::ContextHasher;

/// Dynamic type tag of a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Null,
    Bool,
    Int,
    Float,
    String,
    Array,
    Object,
}

impl DataType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => DataType::Null,
            Value::Bool(_) => DataType::Bool,
            Value::Number(n) if n.is_i64() || n.is_u64() => DataType::Int,
            Value::Number(_) => DataType::Float,
            Value::String(_) => DataType::String,
            Value::Array(_) => DataType::Array,
            Value::Object(_) => DataType::Object,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DataType::Null => "null",
            DataType::Bool => "bool",
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::String => "string",
            DataType::Array => "array",
            DataType::Object => "object",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Types that can be read out of a stored value.
///
/// Integers widen to floats, but floats never narrow to integers.
pub trait FromData: Sized {
    const TYPE_NAME: &'static str;

    fn from_data(value: &Value) -> Option<Self>;
}

impl FromData for f64 {
    const TYPE_NAME: &'static str = "float";

    fn from_data(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromData for f32 {
    const TYPE_NAME: &'static str = "float";

    fn from_data(value: &Value) -> Option<Self> {
        value.as_f64().map(|f| f as f32)
    }
}

impl FromData for i64 {
    const TYPE_NAME: &'static str = "int";

    fn from_data(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FromData for i32 {
    const TYPE_NAME: &'static str = "int";

    fn from_data(value: &Value) -> Option<Self> {
        value.as_i64().and_then(|i| i32::try_from(i).ok())
    }
}

impl FromData for u64 {
    const TYPE_NAME: &'static str = "int";

    fn from_data(value: &Value) -> Option<Self> {
        value.as_u64()
    }
}

impl FromData for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_data(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromData for String {
    const TYPE_NAME: &'static str = "string";

    fn from_data(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }
}

impl FromData for Value {
    const TYPE_NAME: &'static str = "value";

    fn from_data(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

// Tags keep values of different types from colliding in the hash.
const TAG_NULL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_UINT: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_STRING: u8 = 5;
const TAG_ARRAY: u8 = 6;
const TAG_OBJECT: u8 = 7;

/// Appends the content of `value` to `hasher`.
///
/// Values that compare equal always append identical bytes. Object members
/// are visited in sorted key order whatever order the map keeps them in.
pub fn append_hash(value: &Value, hasher: &mut ContextHasher) {
    match value {
        Value::Null => hasher.append_tag(TAG_NULL),
        Value::Bool(b) => {
            hasher.append_tag(TAG_BOOL);
            hasher.append_tag(u8::from(*b));
        }
        Value::Number(n) => append_number(n, hasher),
        Value::String(s) => {
            hasher.append_tag(TAG_STRING);
            hasher.append_str(s);
        }
        Value::Array(items) => {
            hasher.append_tag(TAG_ARRAY);
            hasher.append_u64(items.len() as u64);
            for item in items {
                append_hash(item, hasher);
            }
        }
        Value::Object(map) => {
            hasher.append_tag(TAG_OBJECT);
            hasher.append_u64(map.len() as u64);
            for (key, item) in map.iter().sorted_by(|a, b| a.0.cmp(b.0)) {
                hasher.append_str(key);
                append_hash(item, hasher);
            }
        }
    }
}

fn append_number(n: &Number, hasher: &mut ContextHasher) {
    if let Some(i) = n.as_i64() {
        hasher.append_tag(TAG_INT);
        hasher.append_i64(i);
    } else if let Some(u) = n.as_u64() {
        hasher.append_tag(TAG_UINT);
        hasher.append_u64(u);
    } else if let Some(f) = n.as_f64() {
        hasher.append_tag(TAG_FLOAT);
        hasher.append_f64(f);
    }
}

/// Decimal text of a numeric value, or `None` for anything else.
pub fn number_text(value: &Value) -> Option<String> {
    let Value::Number(n) = value else {
        return None;
    };
    if let Some(i) = n.as_i64() {
        Some(i.to_string())
    } else if let Some(u) = n.as_u64() {
        Some(u.to_string())
    } else {
        n.as_f64().map(|f| f.to_string())
    }
}
