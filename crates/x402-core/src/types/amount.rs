//! [`AmountValue`] represents an amount in the smallest units of an asset.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

/// An amount of an asset in its smallest units (e.g. `100000` = 0.1 USDC).
///
/// Uses a `u128` internally so that any token amount fits. On the wire it is a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AmountValue(pub u128);

impl From<u32> for AmountValue {
    fn from(value: u32) -> Self {
        AmountValue(value as u128)
    }
}

impl From<u64> for AmountValue {
    fn from(value: u64) -> Self {
        AmountValue(value as u128)
    }
}

impl From<u128> for AmountValue {
    fn from(value: u128) -> Self {
        AmountValue(value)
    }
}

impl FromStr for AmountValue {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u128>().map(AmountValue)
    }
}

impl Display for AmountValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for AmountValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AmountValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn amounts_travel_as_strings() {
        let amount = AmountValue::from(100_000u64);
        assert_eq!(serde_json::to_value(amount).unwrap(), json!("100000"));

        let parsed: AmountValue = serde_json::from_value(json!("340282366920938463463374607431768211455")).unwrap();
        assert_eq!(parsed, AmountValue(u128::MAX));
    }

    #[test]
    fn rejects_non_numeric_amounts() {
        assert!(serde_json::from_value::<AmountValue>(json!("0.10")).is_err());
        assert!(serde_json::from_value::<AmountValue>(json!(100)).is_err());
    }
}
