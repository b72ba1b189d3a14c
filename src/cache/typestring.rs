//! Typestring Codec Module
//!
//! Encodes typed keys and values as tagged strings ("typestrings") so their
//! runtime type survives a transport that only carries strings.

use std::collections::HashMap;
use std::fmt;

use crate::error::{CacheError, Result};

// == Type Tags ==
/// Tag prefix for string keys and values.
const STRING_TAG: &str = "s|";
/// Tag prefix for integer keys and values.
const INT_TAG: &str = "i|";
/// Tag prefix for float values.
const FLOAT_TAG: &str = "f|";
/// Tag prefix for boolean values.
const BOOL_TAG: &str = "b|";

// == Cache Key ==
/// A key accepted by the cache: a string or an integer.
///
/// Keys travel to the store as tagged strings, so the string `"1"` and the
/// integer `1` encode differently and address distinct entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RedisKey {
    String(String),
    Int(i64),
}

impl RedisKey {
    // == Encode ==
    /// Encodes the key into its tagged string form.
    pub fn to_typestring(&self) -> String {
        match self {
            RedisKey::String(s) => format!("{}{}", STRING_TAG, s),
            RedisKey::Int(i) => format!("{}{}", INT_TAG, i),
        }
    }

    // == Decode ==
    /// Decodes a tagged string back into a typed key.
    ///
    /// Exact inverse of [`RedisKey::to_typestring`]: the key always comes
    /// back with its original type. Strings that were not produced by the
    /// encoder fail with [`CacheError::CorruptData`].
    pub fn from_typestring(raw: &str) -> Result<Self> {
        if let Some(body) = raw.strip_prefix(STRING_TAG) {
            Ok(RedisKey::String(body.to_string()))
        } else if let Some(body) = raw.strip_prefix(INT_TAG) {
            Ok(RedisKey::Int(body.parse().map_err(|_| corrupt("integer key", raw))?))
        } else {
            Err(corrupt("key", raw))
        }
    }
}

// == Cache Value ==
/// A value accepted by the cache: a string, an integer, a float, or a boolean.
///
/// The closed set of variants is what makes encoding total: anything the
/// type system lets into the cache can be written, and anything written can
/// be read back unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum RedisValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl RedisValue {
    // == Encode ==
    /// Encodes the value into its tagged string form.
    ///
    /// Booleans are written as `b|1` / `b|0`. They never share the integer
    /// tag, so a stored boolean can never decode as an integer.
    pub fn to_typestring(&self) -> String {
        match self {
            RedisValue::String(s) => format!("{}{}", STRING_TAG, s),
            RedisValue::Int(i) => format!("{}{}", INT_TAG, i),
            RedisValue::Float(x) => format!("{}{}", FLOAT_TAG, x),
            RedisValue::Bool(b) => format!("{}{}", BOOL_TAG, if *b { "1" } else { "0" }),
        }
    }

    // == Decode ==
    /// Decodes a tagged string back into a typed value.
    ///
    /// Exact inverse of [`RedisValue::to_typestring`]. An unknown tag or a
    /// payload that does not parse under its tag fails with
    /// [`CacheError::CorruptData`]; the only way to hit that is writing to
    /// the namespace hash without going through the cache.
    pub fn from_typestring(raw: &str) -> Result<Self> {
        if let Some(body) = raw.strip_prefix(STRING_TAG) {
            Ok(RedisValue::String(body.to_string()))
        } else if let Some(body) = raw.strip_prefix(INT_TAG) {
            Ok(RedisValue::Int(body.parse().map_err(|_| corrupt("integer", raw))?))
        } else if let Some(body) = raw.strip_prefix(FLOAT_TAG) {
            Ok(RedisValue::Float(body.parse().map_err(|_| corrupt("float", raw))?))
        } else if let Some(body) = raw.strip_prefix(BOOL_TAG) {
            match body {
                "1" => Ok(RedisValue::Bool(true)),
                "0" => Ok(RedisValue::Bool(false)),
                _ => Err(corrupt("boolean", raw)),
            }
        } else {
            Err(corrupt("value", raw))
        }
    }

    // == Type Name ==
    /// Human-readable name of the value's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            RedisValue::String(_) => "string",
            RedisValue::Int(_) => "integer",
            RedisValue::Float(_) => "float",
            RedisValue::Bool(_) => "boolean",
        }
    }
}

// == Increment Amount ==
/// A signed amount accepted by increment and decrement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Amount {
    Int(i64),
    Float(f64),
}

impl Amount {
    /// Returns the amount with its sign flipped.
    pub fn negated(self) -> Self {
        match self {
            // i64::MIN has no positive counterpart; saturate instead of wrapping
            Amount::Int(i) => Amount::Int(i.saturating_neg()),
            Amount::Float(x) => Amount::Float(-x),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Int(i) => write!(f, "{}", i),
            Amount::Float(x) => write!(f, "{}", x),
        }
    }
}

// == Conversions ==
impl From<&str> for RedisKey {
    fn from(s: &str) -> Self {
        RedisKey::String(s.to_string())
    }
}

impl From<String> for RedisKey {
    fn from(s: String) -> Self {
        RedisKey::String(s)
    }
}

impl From<i64> for RedisKey {
    fn from(i: i64) -> Self {
        RedisKey::Int(i)
    }
}

impl From<i32> for RedisKey {
    fn from(i: i32) -> Self {
        RedisKey::Int(i64::from(i))
    }
}

impl From<&str> for RedisValue {
    fn from(s: &str) -> Self {
        RedisValue::String(s.to_string())
    }
}

impl From<String> for RedisValue {
    fn from(s: String) -> Self {
        RedisValue::String(s)
    }
}

impl From<i64> for RedisValue {
    fn from(i: i64) -> Self {
        RedisValue::Int(i)
    }
}

impl From<i32> for RedisValue {
    fn from(i: i32) -> Self {
        RedisValue::Int(i64::from(i))
    }
}

impl From<f64> for RedisValue {
    fn from(x: f64) -> Self {
        RedisValue::Float(x)
    }
}

impl From<bool> for RedisValue {
    fn from(b: bool) -> Self {
        RedisValue::Bool(b)
    }
}

impl From<i64> for Amount {
    fn from(i: i64) -> Self {
        Amount::Int(i)
    }
}

impl From<i32> for Amount {
    fn from(i: i32) -> Self {
        Amount::Int(i64::from(i))
    }
}

impl From<f64> for Amount {
    fn from(x: f64) -> Self {
        Amount::Float(x)
    }
}

// == Map Helpers ==
/// Encodes a typed mapping into (field, value) typestring pairs for a bulk
/// write.
pub fn encode_map(items: &HashMap<RedisKey, RedisValue>) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| (k.to_typestring(), v.to_typestring()))
        .collect()
}

/// Decodes the raw (field, value) typestring pairs of a whole namespace
/// hash back into a typed mapping.
pub fn decode_map(raw: HashMap<String, String>) -> Result<HashMap<RedisKey, RedisValue>> {
    raw.into_iter()
        .map(|(k, v)| {
            Ok((
                RedisKey::from_typestring(&k)?,
                RedisValue::from_typestring(&v)?,
            ))
        })
        .collect()
}

// == Utility Functions ==
/// Builds the corrupt-data error for a raw string that failed to decode.
fn corrupt(expected: &str, raw: &str) -> CacheError {
    CacheError::CorruptData(format!("cannot decode {} from {:?}", expected, raw))
}
