//! Catalog records.
//!
//! A record describes one generated artifact: the parameters it was produced
//! with, plus the content hash that keys it in the catalog. Parameters are an
//! open map so new generators can add fields without a schema change.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::digest::ContentDigest;

/// Reserved key holding the content hash in the persisted object
pub const HASH_KEY: &str = "hash";

/// Generation parameters, keyed by name
pub type Params = BTreeMap<String, ParamValue>;

/// Parameter value.
///
/// Generators write scalars. Lists, objects and nulls only show up in
/// hand-edited or foreign records and are kept as they are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<ParamValue>),
    Map(BTreeMap<String, ParamValue>),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Integer(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Text(v) => write!(f, "{}", v),
            ParamValue::Null | ParamValue::List(_) | ParamValue::Map(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                write!(f, "{}", json)
            }
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Integer(v)
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        ParamValue::Integer(i64::from(v))
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

/// One entry in the catalog
///
/// Serializes as a flat object: `{"length": 7, "width": 5, "hash": "abc123"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Caller-supplied generation parameters, passed through unmodified
    #[serde(flatten)]
    pub params: Params,

    /// Content digest of the artifact this record describes
    pub hash: String,
}

impl Record {
    /// Create a record with no parameters
    pub fn new(hash: impl Into<String>) -> Self {
        Self {
            params: Params::new(),
            hash: hash.into(),
        }
    }

    /// Create a record for an artifact digest
    pub fn for_digest(digest: &ContentDigest) -> Self {
        Self::new(digest.as_str())
    }

    /// Add a parameter
    ///
    /// The reserved `hash` key is ignored; it would shadow the real field.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        let key = key.into();
        if key != HASH_KEY {
            self.params.insert(key, value.into());
        }
        self
    }

    /// Add multiple parameters
    pub fn with_params(mut self, params: impl IntoIterator<Item = (String, ParamValue)>) -> Self {
        for (key, value) in params {
            self = self.with_param(key, value);
        }
        self
    }

    /// Look up a parameter
    pub fn param(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    /// Whether the hash field carries a value
    pub fn has_hash(&self) -> bool {
        !self.hash.trim().is_empty()
    }
}
