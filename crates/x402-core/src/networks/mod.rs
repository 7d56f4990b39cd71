//! Networks a seller can be paid on.
//!
//! Each [`Network`] knows its family, the USDC asset used for payments on it, and how to
//! validate an address.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

pub mod evm;
pub mod svm;

/// A series of network families, e.g. EVM, SVM, etc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkFamily {
    Evm,
    Svm,
}

/// A supported payment network, identified on the wire by its X402 v1 name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Ethereum,
    EthereumSepolia,
    Base,
    BaseSepolia,
    Solana,
    SolanaDevnet,
}

/// An asset payments are denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asset {
    pub address: &'static str,
    pub decimals: u8,
    pub name: &'static str,
    pub symbol: &'static str,
    /// EIP-712 domain of the token contract, required by EVM `exact` payments.
    pub eip712: Option<evm::Eip712Domain>,
}

impl Network {
    pub const ALL: [Network; 6] = [
        Network::Ethereum,
        Network::EthereumSepolia,
        Network::Base,
        Network::BaseSepolia,
        Network::Solana,
        Network::SolanaDevnet,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Network::Ethereum => "ethereum",
            Network::EthereumSepolia => "ethereum-sepolia",
            Network::Base => "base",
            Network::BaseSepolia => "base-sepolia",
            Network::Solana => "solana",
            Network::SolanaDevnet => "solana-devnet",
        }
    }

    pub fn family(&self) -> NetworkFamily {
        match self {
            Network::Ethereum | Network::EthereumSepolia | Network::Base | Network::BaseSepolia => {
                NetworkFamily::Evm
            }
            Network::Solana | Network::SolanaDevnet => NetworkFamily::Svm,
        }
    }

    /// The USDC deployment on this network.
    pub fn usdc(&self) -> Asset {
        match self {
            Network::Ethereum => evm::usdc("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
            Network::EthereumSepolia => evm::usdc("0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238"),
            Network::Base => evm::usdc("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
            Network::BaseSepolia => evm::usdc("0x036CbD53842c5426634e7929541eC2318f3dCF7e"),
            Network::Solana => svm::usdc("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"),
            Network::SolanaDevnet => svm::usdc("4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU"),
        }
    }

    /// Parses `address` for this network and returns its canonical text form.
    pub fn validate_address(&self, address: &str) -> crate::Result<String> {
        let parsed = match self.family() {
            NetworkFamily::Evm => address
                .parse::<evm::EvmAddress>()
                .map(|a| a.to_string())
                .map_err(|err| err.to_string()),
            NetworkFamily::Svm => address
                .parse::<svm::SvmAddress>()
                .map(|a| a.to_string())
                .map_err(|err| err.to_string()),
        };

        parsed.map_err(|reason| crate::Error::InvalidAddress {
            network: self.name().to_string(),
            address: address.to_string(),
            reason,
        })
    }
}

impl FromStr for Network {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Network::ALL
            .into_iter()
            .find(|n| n.name() == s)
            .ok_or_else(|| crate::Error::UnsupportedNetwork(s.to_string()))
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Serialize for Network {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Network {
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
    use super::*;

    #[test]
    fn network_names_round_trip() {
        for network in Network::ALL {
            assert_eq!(network.name().parse::<Network>().unwrap(), network);
        }
        assert!(matches!(
            "polygon".parse::<Network>(),
            Err(crate::Error::UnsupportedNetwork(_))
        ));
    }

    #[test]
    fn usdc_is_six_decimals_everywhere() {
        for network in Network::ALL {
            let asset = network.usdc();
            assert_eq!(asset.decimals, 6, "{network}");
            assert_eq!(asset.symbol, "USDC");
            assert_eq!(
                asset.eip712.is_some(),
                network.family() == NetworkFamily::Evm
            );
        }
    }

    #[test]
    fn addresses_are_validated_per_family() {
        let evm = "0x1111111111111111111111111111111111111111";
        let svm = "Ge3jkza5KRfXvaq3GELNLh6V1pjjdEKNpEdGXJgjjKUR";

        assert_eq!(Network::Base.validate_address(evm).unwrap(), evm);
        assert_eq!(Network::Solana.validate_address(svm).unwrap(), svm);

        assert!(Network::Base.validate_address(svm).is_err());
        assert!(Network::SolanaDevnet.validate_address(evm).is_err());
        assert!(Network::BaseSepolia.validate_address("0x1234").is_err());
    }
}
