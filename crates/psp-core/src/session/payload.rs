//! Opaque JSON payloads carried verbatim.

use crate::error::Result;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use serde_json::value::RawValue;

/// A JSON fragment the storage layer stores without interpreting.
///
/// The original text is kept as-is: key order, number formatting and
/// whitespace inside the fragment are written back exactly as they were read.
#[derive(Debug, Clone)]
pub struct RawPayload(Box<RawValue>);

impl RawPayload {
    /// Wraps JSON text, rejecting it if it is not valid JSON.
    pub fn from_json(text: impl Into<String>) -> Result<Self> {
        Ok(Self(RawValue::from_string(text.into())?))
    }

    /// Serializes `value` into a payload.
    pub fn from_value<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self(serde_json::value::to_raw_value(value)?))
    }

    /// The payload text exactly as stored.
    pub fn as_str(&self) -> &str {
        self.0.get()
    }

    /// Parses the payload into a `serde_json::Value`.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::from_str(self.0.get())?)
    }
}

impl PartialEq for RawPayload {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for RawPayload {}

impl Serialize for RawPayload {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RawPayload {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Box::<RawValue>::deserialize(deserializer).map(Self)
    }
}
