//! Vendor-side task lifecycle and the custody movements that follow it.
//!
//! Recording a fulfillment result and moving held funds are separate steps. The task transition
//! is persisted first and is never rolled back; the custody movement afterwards is best-effort
//! and its failure only shows up in the returned [`CustodyAction`] and the logs. A payment left
//! in `PENDING_ESCROW` that way stays visible to [`crate::reconcile`].

use std::sync::Arc;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::{
    custody::{CaptureMode, CustodyResult},
    domain::{
        payment::{Payment, PaymentStatus},
        task::{Task, TaskId, TaskStatus},
    },
    errors::{Error, NotFound},
    ports::{Catalog, PaymentStore, TaskStore},
};

/// What happened to the funds behind a task once its result was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CustodyAction {
    /// The payment was not held in custody.
    NotRequired,
    Released { transaction: String },
    Refunded { transaction: String },
    /// The movement did not happen; the payment is still `PENDING_ESCROW`.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentReport {
    pub task: Task,
    pub custody: CustodyAction,
}

#[derive(Debug, Clone, Copy)]
enum Movement {
    Release,
    Refund,
}

#[derive(Builder, Clone)]
pub struct FulfillmentCoordinator {
    catalog: Arc<dyn Catalog>,
    payments: Arc<dyn PaymentStore>,
    tasks: Arc<dyn TaskStore>,
    #[builder(default)]
    capture: CaptureMode,
}

impl FulfillmentCoordinator {
    pub async fn task(&self, task_id: TaskId) -> Result<Task, Error> {
        self.tasks
            .get(task_id)
            .await?
            .ok_or_else(|| NotFound::Task(task_id).into())
    }

    /// The vendor's tasks waiting to be picked up, oldest first.
    pub async fn pending_tasks(&self, vendor_id: &str) -> Result<Vec<Task>, Error> {
        Ok(self
            .tasks
            .list_by_vendor(vendor_id, Some(TaskStatus::Pending))
            .await?)
    }

    pub async fn start_processing(&self, task_id: TaskId, vendor_id: &str) -> Result<Task, Error> {
        let task = self.vendor_task(task_id, vendor_id).await?;
        let processing = task.start_processing()?;
        self.tasks.update(processing.clone()).await?;

        #[cfg(feature = "tracing")]
        tracing::info!("Task {task_id} started processing");

        Ok(processing)
    }

    /// Records a successful result, then releases held funds to the vendor.
    pub async fn complete(
        &self,
        task_id: TaskId,
        vendor_id: &str,
        result: impl Into<String>,
    ) -> Result<FulfillmentReport, Error> {
        let task = self.vendor_task(task_id, vendor_id).await?;
        let completed = task.complete(result)?;
        self.tasks.update(completed.clone()).await?;

        #[cfg(feature = "tracing")]
        tracing::info!("Task {task_id} completed");

        let custody = self.move_funds(&completed, Movement::Release).await;
        Ok(FulfillmentReport {
            task: completed,
            custody,
        })
    }

    /// Records a failure, then refunds held funds to the buyer.
    pub async fn fail(
        &self,
        task_id: TaskId,
        vendor_id: &str,
        error_message: impl Into<String>,
    ) -> Result<FulfillmentReport, Error> {
        let task = self.vendor_task(task_id, vendor_id).await?;
        let failed = task.fail(error_message)?;
        self.tasks.update(failed.clone()).await?;

        #[cfg(feature = "tracing")]
        tracing::info!("Task {task_id} failed");

        let custody = self.move_funds(&failed, Movement::Refund).await;
        Ok(FulfillmentReport {
            task: failed,
            custody,
        })
    }

    /// Tasks of other vendors are reported as missing.
    async fn vendor_task(&self, task_id: TaskId, vendor_id: &str) -> Result<Task, Error> {
        match self.tasks.get(task_id).await? {
            Some(task) if task.vendor_id() == vendor_id => Ok(task),
            _ => Err(NotFound::Task(task_id).into()),
        }
    }

    async fn move_funds(&self, task: &Task, movement: Movement) -> CustodyAction {
        match self.try_move_funds(task, movement).await {
            Ok(action) => action,
            Err(reason) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    "Custody {movement:?} for payment {} (task {}) did not happen: {reason}",
                    task.payment_id(),
                    task.id()
                );

                CustodyAction::Failed { reason }
            }
        }
    }

    async fn try_move_funds(&self, task: &Task, movement: Movement) -> Result<CustodyAction, String> {
        let payment = self
            .payments
            .get(task.payment_id())
            .await
            .map_err(|err| err.to_string())?
            .ok_or_else(|| NotFound::Payment(task.payment_id()).to_string())?;

        if payment.status() != PaymentStatus::PendingEscrow {
            return Ok(CustodyAction::NotRequired);
        }

        let custody = self
            .capture
            .custody()
            .ok_or_else(|| "payment is held in custody but no custody service is configured".to_string())?;

        let result = match movement {
            Movement::Release => {
                let vendor = self
                    .catalog
                    .vendor(payment.vendor_id())
                    .await
                    .map_err(|err| err.to_string())?
                    .ok_or_else(|| NotFound::Vendor(payment.vendor_id().to_string()).to_string())?;
                custody.release(&payment, vendor.settlement_address()).await
            }
            Movement::Refund => custody.refund(&payment).await,
        }
        .map_err(|err| err.to_string())?;

        let transaction = match result {
            CustodyResult::Completed { transaction } => transaction,
            CustodyResult::Rejected { reason } => return Err(reason),
        };

        self.record_movement(&payment, movement, &transaction)
            .await
            .map_err(|err| {
                #[cfg(feature = "tracing")]
                tracing::error!(
                    "Custody moved funds of payment {} in {transaction} but the record was not updated: {err}",
                    payment.id()
                );

                err.to_string()
            })?;

        #[cfg(feature = "tracing")]
        tracing::info!("Custody {movement:?} of payment {} in {transaction}", payment.id());

        Ok(match movement {
            Movement::Release => CustodyAction::Released { transaction },
            Movement::Refund => CustodyAction::Refunded { transaction },
        })
    }

    async fn record_movement(
        &self,
        payment: &Payment,
        movement: Movement,
        transaction: &str,
    ) -> Result<(), Error> {
        let next = match movement {
            Movement::Release => payment.release(transaction)?,
            Movement::Refund => payment.refund(transaction)?,
        };
        self.payments.update(next).await?;
        Ok(())
    }
}
