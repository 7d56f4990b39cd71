use std::{
    fmt::{Debug, Display},
    str::FromStr,
};

use serde::Serialize;

use super::Asset;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EvmAddress(pub alloy_primitives::Address);

impl From<alloy_primitives::Address> for EvmAddress {
    fn from(addr: alloy_primitives::Address) -> Self {
        EvmAddress(addr)
    }
}

impl FromStr for EvmAddress {
    type Err = alloy_primitives::hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let addr = alloy_primitives::Address::from_str(s)?;
        Ok(EvmAddress(addr))
    }
}

impl Display for EvmAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Debug for EvmAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EvmAddress({})", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Eip712Domain {
    pub name: &'static str,
    pub version: &'static str,
}

const USDC_DOMAIN: Eip712Domain = Eip712Domain {
    name: "USD Coin",
    version: "2",
};

pub(super) fn usdc(address: &'static str) -> Asset {
    Asset {
        address,
        decimals: 6,
        name: "USD Coin",
        symbol: "USDC",
        eip712: Some(USDC_DOMAIN),
    }
}
