//! Dollar-denominated prices and their conversion to asset units.

use std::{fmt::Display, str::FromStr};

use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use x402_core::types::AmountValue;

use crate::errors::Error;

const CURRENCY_PREFIX: char = '$';

/// A positive USD price written the way vendors list it, e.g. `"$0.10"`.
///
/// The decimal scale is preserved, so a price displays exactly as it was listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Price(Decimal);

impl Price {
    pub fn new(value: Decimal) -> Result<Self, Error> {
        if value > Decimal::ZERO {
            Ok(Price(value))
        } else {
            Err(Error::validation("price", "must be positive"))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// The price in the smallest units of an asset with `decimals` decimals.
    ///
    /// Fails if the price is more precise than the asset can represent.
    pub fn to_atomic(&self, decimals: u8) -> Result<AmountValue, Error> {
        let scale = 10u64
            .checked_pow(u32::from(decimals))
            .map(Decimal::from)
            .ok_or_else(|| Error::validation("price", format!("{decimals} decimals out of range")))?;
        let scaled = self
            .0
            .checked_mul(scale)
            .ok_or_else(|| Error::validation("price", "too large"))?;

        if !scaled.fract().is_zero() {
            return Err(Error::validation(
                "price",
                format!("more precise than {decimals} decimal places"),
            ));
        }

        scaled
            .to_u128()
            .map(AmountValue)
            .ok_or_else(|| Error::validation("price", "out of range"))
    }
}

impl FromStr for Price {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .trim()
            .strip_prefix(CURRENCY_PREFIX)
            .ok_or_else(|| Error::validation("price", format!("'{s}' must start with '$'")))?;

        let value = Decimal::from_str_exact(digits)
            .map_err(|err| Error::validation("price", format!("'{s}' is not a decimal: {err}")))?;

        Price::new(value)
    }
}

impl Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{CURRENCY_PREFIX}{}", self.0)
    }
}

impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
