//! Wire types of the X402 HTTP transport (protocol version 1).
//!
//! A seller answers an unpaid request with `402 Payment Required` and a [`PaymentRequired`]
//! body listing the [`PaymentRequirements`] it accepts. The buyer retries with an `X-PAYMENT`
//! header carrying a base64 [`PaymentPayload`]. Once settled, the seller returns the
//! [`SettlementResponse`] in the `X-PAYMENT-RESPONSE` header.

use bon::Builder;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::{AmountValue, AnyJson, Base64EncodedHeader, X402Version};

/// Request header carrying the buyer's payment proof.
pub const PAYMENT_HEADER: &str = "X-PAYMENT";

/// Response header carrying the settlement proof.
pub const PAYMENT_RESPONSE_HEADER: &str = "X-PAYMENT-RESPONSE";

/// What is being sold: the metadata echoed in payment terms and in the `402` response.
#[derive(Builder, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Resource URL.
    pub url: Url,
    /// Description of the resource.
    #[builder(into)]
    pub description: String,
    /// MIME type of the resource.
    #[builder(into)]
    pub mime_type: String,
}

/// One acceptable way to pay for a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    /// Scheme name, defined in "schemes" protocol
    pub scheme: String,
    /// Network name, defined in "schemes" protocol
    pub network: String,
    /// Maximum amount required for the payment in smallest units
    pub max_amount_required: AmountValue,
    /// Resource URL being paid for
    pub resource: Url,
    /// Description of the resource
    pub description: String,
    /// MIME type of the resource
    pub mime_type: String,
    /// Destination address or account to pay to
    pub pay_to: String,
    /// Maximum timeout in seconds for the payment to be completed
    pub max_timeout_seconds: u64,
    /// Asset address or identifier
    pub asset: String,
    /// Extra fields for extensibility
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<AnyJson>,
}

/// A signed payment presented by the buyer.
///
/// `payload` is scheme specific and opaque to the seller; only the facilitator interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub x402_version: X402Version,
    pub scheme: String,
    pub network: String,
    pub payload: AnyJson,
}

/// The body of a `402 Payment Required` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequired {
    pub x402_version: X402Version,
    pub error: String,
    pub accepts: Vec<PaymentRequirements>,
}

/// Proof of a settled payment, returned to the buyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResponse {
    pub success: bool,
    pub transaction: String,
    pub network: String,
    pub payer: String,
}

impl TryFrom<&PaymentPayload> for Base64EncodedHeader {
    type Error = crate::Error;

    fn try_from(value: &PaymentPayload) -> Result<Self, Self::Error> {
        Base64EncodedHeader::encode(value)
    }
}

impl TryFrom<&Base64EncodedHeader> for PaymentPayload {
    type Error = crate::Error;

    fn try_from(value: &Base64EncodedHeader) -> Result<Self, Self::Error> {
        value.decode()
    }
}

impl TryFrom<&PaymentRequired> for Base64EncodedHeader {
    type Error = crate::Error;

    fn try_from(value: &PaymentRequired) -> Result<Self, Self::Error> {
        Base64EncodedHeader::encode(value)
    }
}

impl TryFrom<&SettlementResponse> for Base64EncodedHeader {
    type Error = crate::Error;

    fn try_from(value: &SettlementResponse) -> Result<Self, Self::Error> {
        Base64EncodedHeader::encode(value)
    }
}

impl TryFrom<&Base64EncodedHeader> for SettlementResponse {
    type Error = crate::Error;

    fn try_from(value: &Base64EncodedHeader) -> Result<Self, Self::Error> {
        value.decode()
    }
}

/// Selects the payment requirements a payment payload was made against.
///
/// The first entry with the payload's scheme and network wins.
pub fn select_requirement<'a>(
    requirements: &'a [PaymentRequirements],
    payload: &PaymentPayload,
) -> Option<&'a PaymentRequirements> {
    requirements
        .iter()
        .find(|pr| pr.scheme == payload.scheme && pr.network == payload.network)
}
