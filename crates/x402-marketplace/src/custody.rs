//! Custody of settled funds for asynchronously fulfilled products.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{catalog::Vendor, payment::Payment},
    errors::ServiceError,
};

/// The answer of a custody executor to a release or refund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CustodyResult {
    Completed { transaction: String },
    Rejected { reason: String },
}

/// Holds settled funds until fulfillment decides where they go.
///
/// `Err` means the executor could not be reached; a refused movement is
/// [`CustodyResult::Rejected`].
#[async_trait]
pub trait Custody: Send + Sync {
    /// Where buyers pay when funds are held.
    fn address(&self) -> &str;

    /// Moves the held funds of `payment` to the vendor.
    async fn release(
        &self,
        payment: &Payment,
        vendor_address: &str,
    ) -> Result<CustodyResult, ServiceError>;

    /// Returns the held funds of `payment` to its payer.
    async fn refund(&self, payment: &Payment) -> Result<CustodyResult, ServiceError>;
}

/// How settled funds are captured, chosen once when the marketplace is assembled.
#[derive(Clone, Default)]
pub enum CaptureMode {
    /// Buyers pay the vendor directly; nothing is held.
    #[default]
    Direct,
    /// Buyers pay the custody address; async products hold funds until fulfillment ends.
    Custodial(Arc<dyn Custody>),
}

impl CaptureMode {
    pub fn custodial(custody: impl Custody + 'static) -> Self {
        CaptureMode::Custodial(Arc::new(custody))
    }

    /// The address payment terms point buyers at.
    pub fn target_address<'a>(&'a self, vendor: &'a Vendor) -> &'a str {
        match self {
            CaptureMode::Direct => vendor.settlement_address(),
            CaptureMode::Custodial(custody) => custody.address(),
        }
    }

    pub fn custody(&self) -> Option<&Arc<dyn Custody>> {
        match self {
            CaptureMode::Direct => None,
            CaptureMode::Custodial(custody) => Some(custody),
        }
    }
}

impl std::fmt::Debug for CaptureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureMode::Direct => write!(f, "Direct"),
            CaptureMode::Custodial(custody) => {
                f.debug_tuple("Custodial").field(&custody.address()).finish()
            }
        }
    }
}
