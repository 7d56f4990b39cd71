//! The record of one settled purchase and its custody lifecycle.
//!
//! ```text
//!   direct capture ──────────────────────────► SETTLED
//!   custodial capture ─► PENDING_ESCROW ─┬─ release ─► SETTLED
//!                                        └─ refund ──► REFUNDED
//!   any state ── mark_failed ──► FAILED
//! ```
//!
//! Transitions never mutate in place: each returns the next snapshot with its `version` bumped,
//! and an illegal transition leaves the current snapshot untouched.

use std::fmt::Display;

use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use x402_core::networks::Network;

use crate::{
    domain::price::Price,
    errors::{Entity, Error},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(pub Uuid);

impl PaymentId {
    pub fn new() -> Self {
        PaymentId(Uuid::new_v4())
    }
}

impl Default for PaymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Captured into custody, waiting on the fulfillment outcome.
    PendingEscrow,
    Settled,
    Refunded,
    Failed,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::PendingEscrow => "PENDING_ESCROW",
            PaymentStatus::Settled => "SETTLED",
            PaymentStatus::Refunded => "REFUNDED",
            PaymentStatus::Failed => "FAILED",
        };
        write!(f, "{s}")
    }
}

/// The facts known about a payment at settlement time.
#[derive(Builder, Debug, Clone)]
pub struct SettledPayment {
    #[builder(into)]
    pub product_id: String,
    #[builder(into)]
    pub vendor_id: String,
    pub amount: Price,
    pub network: Network,
    /// Address the buyer paid from.
    #[builder(into)]
    pub payer: String,
    /// Settlement transaction reference returned by the facilitator.
    #[builder(into)]
    pub transaction: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    id: PaymentId,
    product_id: String,
    vendor_id: String,
    amount: Price,
    network: Network,
    payer: String,
    transaction: String,
    status: PaymentStatus,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    release_transaction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    released_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refund_transaction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refunded_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
    version: u64,
}

impl Payment {
    /// A payment captured straight to the vendor: `SETTLED`, no expiry.
    pub fn direct(settled: SettledPayment) -> Result<Self, Error> {
        Self::create(settled, PaymentStatus::Settled, None)
    }

    /// A payment captured into custody: `PENDING_ESCROW` until released or refunded.
    pub fn with_custody(settled: SettledPayment, expires_at: DateTime<Utc>) -> Result<Self, Error> {
        Self::create(settled, PaymentStatus::PendingEscrow, Some(expires_at))
    }

    fn create(
        settled: SettledPayment,
        status: PaymentStatus,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Self, Error> {
        let payer = settled
            .network
            .validate_address(&settled.payer)
            .map_err(|err| Error::validation("payer", err))?;
        if settled.transaction.trim().is_empty() {
            return Err(Error::validation("transaction", "must not be empty"));
        }

        Ok(Payment {
            id: PaymentId::new(),
            product_id: settled.product_id,
            vendor_id: settled.vendor_id,
            amount: settled.amount,
            network: settled.network,
            payer,
            transaction: settled.transaction,
            status,
            created_at: Utc::now(),
            release_transaction: None,
            released_at: None,
            refund_transaction: None,
            refunded_at: None,
            expires_at,
            version: 1,
        })
    }

    /// Custody paid the vendor: `PENDING_ESCROW` → `SETTLED`.
    pub fn release(&self, transaction: impl Into<String>) -> Result<Self, Error> {
        let transaction = self.custody_transition(transaction.into(), "release")?;

        let mut next = self.next_version();
        next.status = PaymentStatus::Settled;
        next.release_transaction = Some(transaction);
        next.released_at = Some(Utc::now());
        Ok(next)
    }

    /// Custody returned the funds to the buyer: `PENDING_ESCROW` → `REFUNDED`.
    pub fn refund(&self, transaction: impl Into<String>) -> Result<Self, Error> {
        let transaction = self.custody_transition(transaction.into(), "refund")?;

        let mut next = self.next_version();
        next.status = PaymentStatus::Refunded;
        next.refund_transaction = Some(transaction);
        next.refunded_at = Some(Utc::now());
        Ok(next)
    }

    /// Marks the payment as failed, whatever its current state.
    ///
    /// Release and refund stamps are cleared: they only describe `SETTLED` and `REFUNDED` payments.
    pub fn mark_failed(&self) -> Self {
        let mut next = self.next_version();
        next.status = PaymentStatus::Failed;
        next.release_transaction = None;
        next.released_at = None;
        next.refund_transaction = None;
        next.refunded_at = None;
        next
    }

    /// Whether a custody deadline exists and has passed.
    ///
    /// Informational only: nothing acts on an expired hold automatically.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }

    fn custody_transition(&self, transaction: String, action: &'static str) -> Result<String, Error> {
        if self.status != PaymentStatus::PendingEscrow {
            return Err(Error::transition(Entity::Payment, self.status, action));
        }
        if transaction.trim().is_empty() {
            return Err(Error::validation("transaction", "must not be empty"));
        }
        Ok(transaction)
    }

    fn next_version(&self) -> Self {
        let mut next = self.clone();
        next.version += 1;
        next
    }

    pub fn id(&self) -> PaymentId {
        self.id
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn vendor_id(&self) -> &str {
        &self.vendor_id
    }

    pub fn amount(&self) -> Price {
        self.amount
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn payer(&self) -> &str {
        &self.payer
    }

    /// The settlement transaction that captured the buyer's funds.
    pub fn transaction(&self) -> &str {
        &self.transaction
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn release_transaction(&self) -> Option<&str> {
        self.release_transaction.as_deref()
    }

    pub fn released_at(&self) -> Option<DateTime<Utc>> {
        self.released_at
    }

    pub fn refund_transaction(&self) -> Option<&str> {
        self.refund_transaction.as_deref()
    }

    pub fn refunded_at(&self) -> Option<DateTime<Utc>> {
        self.refunded_at
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Optimistic concurrency version; starts at 1 and grows by one per transition.
    pub fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::TimeDelta;

    use super::*;

    pub(crate) fn settled_payment() -> SettledPayment {
        SettledPayment::builder()
            .product_id("translate")
            .vendor_id("acme")
            .amount("$0.10".parse().unwrap())
            .network(Network::BaseSepolia)
            .payer("0x2222222222222222222222222222222222222222")
            .transaction("0xsettle")
            .build()
    }

    fn held() -> Payment {
        Payment::with_custody(settled_payment(), Utc::now() + TimeDelta::days(7)).unwrap()
    }

    #[test]
    fn direct_capture_is_settled_without_expiry() {
        let payment = Payment::direct(settled_payment()).unwrap();
        assert_eq!(payment.status(), PaymentStatus::Settled);
        assert_eq!(payment.expires_at(), None);
        assert_eq!(payment.release_transaction(), None);
        assert_eq!(payment.version(), 1);
        assert!(!payment.is_expired());
    }

    #[test]
    fn custodial_capture_is_pending_with_expiry() {
        let payment = held();
        assert_eq!(payment.status(), PaymentStatus::PendingEscrow);
        assert!(payment.expires_at().is_some());
        assert!(!payment.is_expired());
    }

    #[test]
    fn release_stamps_release_fields_only() {
        let payment = held();
        let released = payment.release("0xrelease").unwrap();

        assert_eq!(released.status(), PaymentStatus::Settled);
        assert_eq!(released.release_transaction(), Some("0xrelease"));
        assert!(released.released_at().is_some());
        assert_eq!(released.refund_transaction(), None);
        assert_eq!(released.refunded_at(), None);
        assert_eq!(released.version(), 2);

        // The previous snapshot is untouched.
        assert_eq!(payment.status(), PaymentStatus::PendingEscrow);
    }

    #[test]
    fn refund_stamps_refund_fields_only() {
        let refunded = held().refund("0xrefund").unwrap();

        assert_eq!(refunded.status(), PaymentStatus::Refunded);
        assert_eq!(refunded.refund_transaction(), Some("0xrefund"));
        assert!(refunded.refunded_at().is_some());
        assert_eq!(refunded.release_transaction(), None);
    }

    #[test]
    fn release_and_refund_require_pending_escrow() {
        let settled = Payment::direct(settled_payment()).unwrap();
        let refunded = held().refund("0xrefund").unwrap();
        let failed = held().mark_failed();

        for payment in [&settled, &refunded, &failed] {
            let before = payment.clone();
            let err = payment.release("0xrelease").unwrap_err();
            assert!(matches!(
                err,
                Error::InvalidStateTransition {
                    entity: Entity::Payment,
                    action: "release",
                    ..
                }
            ));
            assert!(payment.refund("0xrefund").is_err());
            assert_eq!(payment, &before);
        }
    }

    #[test]
    fn failed_payments_carry_no_custody_stamps() {
        let released = held().release("0xrelease").unwrap();
        let failed = released.mark_failed();

        assert_eq!(failed.status(), PaymentStatus::Failed);
        assert_eq!(failed.release_transaction(), None);
        assert_eq!(failed.released_at(), None);
        assert_eq!(failed.version(), 3);

        let failed = held().refund("0xrefund").unwrap().mark_failed();
        assert_eq!(failed.refund_transaction(), None);
        assert_eq!(failed.refunded_at(), None);
        assert_eq!(failed.status(), PaymentStatus::Failed);
    }

    #[test]
    fn rejects_malformed_payer_and_empty_transactions() {
        let mut settled = settled_payment();
        settled.payer = "not-an-address".to_string();
        assert!(matches!(
            Payment::direct(settled).unwrap_err(),
            Error::ValidationFailed { field: "payer", .. }
        ));

        let mut settled = settled_payment();
        settled.transaction = String::new();
        assert!(Payment::direct(settled).is_err());

        assert!(matches!(
            held().release(" ").unwrap_err(),
            Error::ValidationFailed { field: "transaction", .. }
        ));
    }

    #[test]
    fn expiry_is_relative_to_the_given_instant() {
        let payment = held();
        let expires_at = payment.expires_at().unwrap();

        assert!(!payment.is_expired_at(expires_at));
        assert!(payment.is_expired_at(expires_at + TimeDelta::seconds(1)));
    }

    #[test]
    fn serializes_status_in_screaming_case() {
        let json = serde_json::to_value(held()).unwrap();
        assert_eq!(json["status"], "PENDING_ESCROW");
        assert_eq!(json["amount"], "$0.10");
        assert!(json.get("releaseTransaction").is_none());
    }
}
