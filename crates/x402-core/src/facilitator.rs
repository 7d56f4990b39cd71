//! The facilitator interface: verification and settlement of payment proofs.
//!
//! The cryptographic checks and the on-chain transfer are the facilitator's business. A seller
//! only hands it the presented [`PaymentPayload`] together with the [`PaymentRequirements`] it
//! was made against and acts on the answer.

use serde::{Deserialize, Serialize};

use crate::{
    transport::{PaymentPayload, PaymentRequirements, SettlementResponse},
    types::Base64EncodedHeader,
};

/// A payment proof and the terms it claims to satisfy.
#[derive(Debug, Clone)]
pub struct FacilitatorRequest {
    /// The raw `X-PAYMENT` header, forwarded as received.
    pub payment_header: Base64EncodedHeader,
    pub payment_payload: PaymentPayload,
    pub payment_requirements: PaymentRequirements,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResponse {
    Valid(VerifyValid),
    Invalid(VerifyInvalid),
}

impl VerifyResponse {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyResponse::Valid(_))
    }

    pub fn valid(payer: impl Into<String>) -> Self {
        VerifyResponse::Valid(VerifyValid {
            payer: payer.into(),
        })
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        VerifyResponse::Invalid(VerifyInvalid {
            invalid_reason: reason.into(),
            payer: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyValid {
    pub payer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyInvalid {
    pub invalid_reason: String,
    pub payer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleResponse {
    Success(SettleSuccess),
    Failed(SettleFailed),
}

impl SettleResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, SettleResponse::Success(_))
    }

    pub fn success(success: SettleSuccess) -> Self {
        SettleResponse::Success(success)
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        SettleResponse::Failed(SettleFailed {
            error_reason: reason.into(),
            payer: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleSuccess {
    pub payer: String,
    pub transaction: String,
    pub network: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleFailed {
    pub error_reason: String,
    pub payer: Option<String>,
}

impl From<SettleSuccess> for SettlementResponse {
    fn from(success: SettleSuccess) -> Self {
        SettlementResponse {
            success: true,
            transaction: success.transaction,
            network: success.network,
            payer: success.payer,
        }
    }
}

/// X402 facilitator interface.
///
/// `Err` is reserved for failing to reach the facilitator at all. A declined payment is an
/// [`VerifyResponse::Invalid`] or [`SettleResponse::Failed`] answer.
pub trait Facilitator {
    type Error: std::error::Error;

    fn verify(
        &self,
        request: FacilitatorRequest,
    ) -> impl Future<Output = Result<VerifyResponse, Self::Error>> + Send;

    fn settle(
        &self,
        request: FacilitatorRequest,
    ) -> impl Future<Output = Result<SettleResponse, Self::Error>> + Send;
}
