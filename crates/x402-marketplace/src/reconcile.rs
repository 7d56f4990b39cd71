//! Expired custody holds.
//!
//! A `PENDING_ESCROW` payment whose `expires_at` has passed is never refunded automatically.
//! [`ExpiredHoldSweep`] finds such holds and hands each one to an [`ExpiredHoldHandler`], where
//! operators plug in whatever policy they run out of band.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    domain::payment::{Payment, PaymentStatus},
    errors::{Error, ServiceError},
    ports::PaymentStore,
};

#[async_trait]
pub trait ExpiredHoldHandler: Send + Sync {
    async fn on_expired(&self, payment: &Payment) -> Result<(), ServiceError>;
}

/// Reports expired holds in the logs and does nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogExpiredHolds;

#[async_trait]
impl ExpiredHoldHandler for LogExpiredHolds {
    async fn on_expired(&self, _payment: &Payment) -> Result<(), ServiceError> {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            "Custody hold of payment {} (vendor '{}', {}) expired at {:?}",
            _payment.id(),
            _payment.vendor_id(),
            _payment.amount(),
            _payment.expires_at()
        );

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Payments still held in custody.
    pub examined: usize,
    pub expired: usize,
    pub handler_failures: usize,
}

pub struct ExpiredHoldSweep {
    payments: Arc<dyn PaymentStore>,
    handler: Arc<dyn ExpiredHoldHandler>,
}

impl ExpiredHoldSweep {
    pub fn new(payments: Arc<dyn PaymentStore>) -> Self {
        Self::with_handler(payments, Arc::new(LogExpiredHolds))
    }

    pub fn with_handler(
        payments: Arc<dyn PaymentStore>,
        handler: Arc<dyn ExpiredHoldHandler>,
    ) -> Self {
        ExpiredHoldSweep { payments, handler }
    }

    /// Holds whose deadline passed before `now`.
    pub async fn expired_holds(&self, now: DateTime<Utc>) -> Result<Vec<Payment>, Error> {
        Ok(self
            .payments
            .list_by_status(PaymentStatus::PendingEscrow)
            .await?
            .into_iter()
            .filter(|payment| payment.is_expired_at(now))
            .collect())
    }

    /// Passes every currently expired hold to the handler once.
    ///
    /// A failing handler does not stop the sweep.
    pub async fn run_once(&self) -> Result<SweepReport, Error> {
        let now = Utc::now();
        let held = self
            .payments
            .list_by_status(PaymentStatus::PendingEscrow)
            .await?;

        let mut report = SweepReport {
            examined: held.len(),
            ..SweepReport::default()
        };

        for payment in held.iter().filter(|payment| payment.is_expired_at(now)) {
            report.expired += 1;
            if let Err(_err) = self.handler.on_expired(payment).await {
                #[cfg(feature = "tracing")]
                tracing::warn!("Expired hold handler failed for payment {}: {_err}", payment.id());

                report.handler_failures += 1;
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Swept {} held payments: {} expired, {} handler failures",
            report.examined,
            report.expired,
            report.handler_failures
        );

        Ok(report)
    }
}
