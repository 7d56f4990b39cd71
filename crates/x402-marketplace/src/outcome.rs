//! The decided result of a request for a priced resource.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use x402_core::{
    transport::{PaymentRequired, Resource, SettlementResponse},
    types::Base64EncodedHeader,
};

use crate::{
    domain::{payment::PaymentId, task::TaskId},
    ports::IssuedCredential,
};

/// Which half of a `(vendor, path)` lookup came up empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Missing {
    Vendor,
    Resource,
}

/// Every way a purchase request can end.
///
/// Declines are values, not errors: a transport layer maps each variant to a response with
/// [`Outcome::status`] and, on success, the [`Outcome::payment_response_header`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "outcome",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum Outcome {
    /// No usable payment was presented; `unpaid` lists the terms to pay under.
    PaymentRequired {
        unpaid: PaymentRequired,
        resource: Resource,
    },
    CredentialIssued {
        payment_id: PaymentId,
        credential: IssuedCredential,
        settlement: SettlementResponse,
    },
    TaskCreated {
        task_id: TaskId,
        payment_id: PaymentId,
        settlement: SettlementResponse,
    },
    VerificationFailed {
        reason: String,
    },
    SettlementFailed {
        reason: String,
    },
    NotFound {
        missing: Missing,
        reason: String,
    },
}

impl Outcome {
    pub fn status(&self) -> StatusCode {
        match self {
            Outcome::PaymentRequired { .. }
            | Outcome::VerificationFailed { .. }
            | Outcome::SettlementFailed { .. } => StatusCode::PAYMENT_REQUIRED,
            Outcome::CredentialIssued { .. } => StatusCode::OK,
            Outcome::TaskCreated { .. } => StatusCode::ACCEPTED,
            Outcome::NotFound { .. } => StatusCode::NOT_FOUND,
        }
    }

    /// A human-readable account of the outcome.
    pub fn reason(&self) -> String {
        match self {
            Outcome::PaymentRequired { unpaid, .. } => unpaid.error.clone(),
            Outcome::CredentialIssued { credential, .. } => {
                format!("credential {} issued", credential.reference)
            }
            Outcome::TaskCreated { task_id, .. } => format!("task {task_id} created"),
            Outcome::VerificationFailed { reason } => {
                format!("payment verification failed: {reason}")
            }
            Outcome::SettlementFailed { reason } => format!("payment settlement failed: {reason}"),
            Outcome::NotFound { reason, .. } => reason.clone(),
        }
    }

    pub fn settlement(&self) -> Option<&SettlementResponse> {
        match self {
            Outcome::CredentialIssued { settlement, .. } | Outcome::TaskCreated { settlement, .. } => {
                Some(settlement)
            }
            _ => None,
        }
    }

    /// The `X-PAYMENT-RESPONSE` header value for settled outcomes.
    pub fn payment_response_header(&self) -> Option<Base64EncodedHeader> {
        let settlement = self.settlement()?;
        Base64EncodedHeader::try_from(settlement)
            .inspect_err(|_err| {
                #[cfg(feature = "tracing")]
                tracing::warn!("Failed to encode X-PAYMENT-RESPONSE header: {_err}; skipping");
            })
            .ok()
    }
}
