//! Vendors and the priced resources they sell.

use bon::Builder;
use serde::{Deserialize, Serialize};
use x402_core::{networks::Network, types::AnyJson};

use crate::{domain::price::Price, errors::Error};

/// A seller on the marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    id: String,
    name: String,
    network: Network,
    settlement_address: String,
}

impl Vendor {
    /// Creates a vendor, validating its settlement address for `network`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        network: Network,
        settlement_address: &str,
    ) -> Result<Self, Error> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::validation("vendor_id", "must not be empty"));
        }

        let settlement_address = network
            .validate_address(settlement_address)
            .map_err(|err| Error::validation("settlement_address", err))?;

        Ok(Vendor {
            id,
            name: name.into(),
            network,
            settlement_address,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Where the vendor receives funds.
    pub fn settlement_address(&self) -> &str {
        &self.settlement_address
    }
}

/// What a successful payment for a product buys.
///
/// Fixed when the product is registered; it is never inferred from the product's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// Settlement issues an access credential on the spot.
    Credential,
    /// Settlement schedules a task that the vendor fulfills later.
    AsyncTask,
}

/// A priced resource, addressed by `(vendor_id, path)`.
///
/// ```
/// use x402_core::networks::Network;
/// use x402_marketplace::domain::catalog::{Product, ProductKind};
///
/// let product = Product::builder()
///     .id("translate")
///     .vendor_id("acme")
///     .path("/v1/translate")
///     .price("$0.10".parse().unwrap())
///     .network(Network::BaseSepolia)
///     .kind(ProductKind::AsyncTask)
///     .description("Translate a document")
///     .build();
///
/// assert_eq!(product.mime_type, "application/json");
/// ```
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[builder(into)]
    pub id: String,
    #[builder(into)]
    pub vendor_id: String,
    #[builder(into)]
    pub path: String,
    pub price: Price,
    pub network: Network,
    pub kind: ProductKind,
    #[builder(into)]
    pub description: String,
    #[builder(into, default = "application/json".to_string())]
    pub mime_type: String,
    /// Vendor-defined data, opaque to the marketplace.
    #[builder(default)]
    pub data: AnyJson,
}
