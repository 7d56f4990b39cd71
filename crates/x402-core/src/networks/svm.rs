use std::{
    fmt::{Debug, Display},
    str::FromStr,
};

use solana_pubkey::Pubkey;

use super::Asset;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SvmAddress(pub Pubkey);

impl From<Pubkey> for SvmAddress {
    fn from(pk: Pubkey) -> Self {
        SvmAddress(pk)
    }
}

impl FromStr for SvmAddress {
    type Err = <Pubkey as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pk = Pubkey::from_str(s)?;
        Ok(SvmAddress(pk))
    }
}

impl Display for SvmAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Debug for SvmAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SvmAddress({})", self.0)
    }
}

pub(super) fn usdc(address: &'static str) -> Asset {
    Asset {
        address,
        decimals: 6,
        name: "USD Coin",
        symbol: "USDC",
        eip712: None,
    }
}
