//! Miscellaneous common types used throughout the X402 codebase.

use std::fmt::Display;

use base64::{Engine, prelude::BASE64_STANDARD};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Represents any JSON value. Used for serializing/deserializing arbitrary JSON data.
pub type AnyJson = serde_json::Value;

/// Represents the X402 protocol version, either v1 or v2.
///
/// ```
/// use x402_core::types::X402Version;
///
/// let v: X402Version = serde_json::from_value(serde_json::json!(1)).unwrap();
/// assert_eq!(v, X402Version::V1);
/// assert_eq!(serde_json::to_value(X402Version::V2).unwrap(), serde_json::json!(2));
/// assert!(serde_json::from_value::<X402Version>(serde_json::json!(3)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum X402Version {
    /// Version 1 of the X402 protocol: `"x402Version": 1`.
    #[default]
    V1,
    /// Version 2 of the X402 protocol: `"x402Version": 2`.
    V2,
}

impl Serialize for X402Version {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            X402Version::V1 => serializer.serialize_i8(1),
            X402Version::V2 => serializer.serialize_i8(2),
        }
    }
}

impl<'de> Deserialize<'de> for X402Version {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let v = i8::deserialize(deserializer)?;
        match v {
            1 => Ok(X402Version::V1),
            2 => Ok(X402Version::V2),
            _ => Err(serde::de::Error::custom(format!(
                "Unsupported X402 version {}; expected 1 or 2",
                v
            ))),
        }
    }
}

impl Display for X402Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            X402Version::V1 => write!(f, "1"),
            X402Version::V2 => write!(f, "2"),
        }
    }
}

/// Represents a base64-encoded header value for X402 protocol headers.
///
/// Every X402 header carries a JSON document encoded with standard base64.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base64EncodedHeader(pub String);

impl Base64EncodedHeader {
    /// Serialize `value` to JSON and base64-encode it.
    pub fn encode<T: Serialize>(value: &T) -> crate::Result<Self> {
        let json = serde_json::to_string(value)?;
        Ok(Base64EncodedHeader(BASE64_STANDARD.encode(json)))
    }

    /// Base64-decode the header and parse the JSON document inside.
    pub fn decode<T: DeserializeOwned>(&self) -> crate::Result<T> {
        let decoded_bytes = BASE64_STANDARD.decode(self.0.trim())?;
        let json_str = String::from_utf8(decoded_bytes)?;
        Ok(serde_json::from_str(&json_str)?)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Base64EncodedHeader {
    fn from(value: &str) -> Self {
        Base64EncodedHeader(value.to_string())
    }
}

impl Serialize for Base64EncodedHeader {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Base64EncodedHeader {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Base64EncodedHeader(s))
    }
}

impl Display for Base64EncodedHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn header_decode_reports_each_failure_layer() {
        let not_base64 = Base64EncodedHeader::from("%%%");
        assert!(matches!(
            not_base64.decode::<AnyJson>(),
            Err(crate::Error::Base64DecodeError(_))
        ));

        let not_json = Base64EncodedHeader(BASE64_STANDARD.encode("hello"));
        assert!(matches!(
            not_json.decode::<AnyJson>(),
            Err(crate::Error::SerdeJsonError(_))
        ));
    }

    #[test]
    fn header_encode_is_standard_base64_of_json() {
        let header = Base64EncodedHeader::encode(&json!({"a": 1})).unwrap();
        assert_eq!(header.as_str(), "eyJhIjoxfQ==");
        assert_eq!(header.decode::<AnyJson>().unwrap(), json!({"a": 1}));
    }
}
