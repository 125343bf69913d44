use std::collections::BTreeMap;
use std::fmt;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Metadata keys attached to decoded entities.
pub mod keys {
    pub const POLARITY: &str = "polarity";
    pub const UNIT: &str = "unit";
    pub const SIGNAL: &str = "signal";
    pub const DATE: &str = "date";
    pub const VIAL_POSITION: &str = "vialpos";
    pub const VENDOR: &str = "vendor";
}

/// A single value of the open metadata map.
///
/// Serialized externally tagged, `{"char":"+"}`, so a single character
/// reads back as `Char` and not as one-letter `Text`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[serde(rename_all = "lowercase")]
pub enum MetadataValue {
    Text(String),
    Char(char),
}

impl MetadataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            MetadataValue::Char(c) => Some(*c),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Text(s) => write!(f, "{s}"),
            MetadataValue::Char(c) => write!(f, "{c}"),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

impl From<char> for MetadataValue {
    fn from(value: char) -> Self {
        MetadataValue::Char(value)
    }
}

pub type Metadata = BTreeMap<String, MetadataValue>;
