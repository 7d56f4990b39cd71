//! One unit of asynchronous fulfillment work, tied to exactly one payment.
//!
//! A task moves strictly `PENDING → PROCESSING → {COMPLETED, FAILED}`. Every transition returns a
//! new snapshot with a later `updated_at` and the next `version`.

use std::fmt::Display;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use x402_core::types::AnyJson;

use crate::{
    domain::payment::{Payment, PaymentId},
    errors::{Entity, Error},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    pub fn new() -> Self {
        TaskId(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Processing => "PROCESSING",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: TaskId,
    payment_id: PaymentId,
    product_id: String,
    vendor_id: String,
    buyer_address: String,
    request_payload: AnyJson,
    status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl Task {
    /// A `PENDING` task fulfilling `payment` for `buyer_address`.
    pub fn create(
        payment: &Payment,
        buyer_address: impl Into<String>,
        request_payload: AnyJson,
    ) -> Result<Self, Error> {
        let buyer_address = buyer_address.into();
        if buyer_address.trim().is_empty() {
            return Err(Error::validation("buyer_address", "must not be empty"));
        }

        let now = Utc::now();
        Ok(Task {
            id: TaskId::new(),
            payment_id: payment.id(),
            product_id: payment.product_id().to_string(),
            vendor_id: payment.vendor_id().to_string(),
            buyer_address,
            request_payload,
            status: TaskStatus::Pending,
            result: None,
            error_message: None,
            created_at: now,
            updated_at: now,
            version: 1,
        })
    }

    pub fn start_processing(&self) -> Result<Self, Error> {
        self.expect_status(TaskStatus::Pending, "start processing")?;
        Ok(self.advance(TaskStatus::Processing))
    }

    pub fn complete(&self, result: impl Into<String>) -> Result<Self, Error> {
        self.expect_status(TaskStatus::Processing, "complete")?;
        let mut next = self.advance(TaskStatus::Completed);
        next.result = Some(result.into());
        Ok(next)
    }

    pub fn fail(&self, error_message: impl Into<String>) -> Result<Self, Error> {
        self.expect_status(TaskStatus::Processing, "fail")?;
        let mut next = self.advance(TaskStatus::Failed);
        next.error_message = Some(error_message.into());
        Ok(next)
    }

    fn expect_status(&self, expected: TaskStatus, action: &'static str) -> Result<(), Error> {
        if self.status == expected {
            Ok(())
        } else {
            Err(Error::transition(Entity::Task, self.status, action))
        }
    }

    fn advance(&self, status: TaskStatus) -> Self {
        // Clock resolution may not separate two quick transitions.
        let floor = self.updated_at + TimeDelta::microseconds(1);
        let mut next = self.clone();
        next.status = status;
        next.updated_at = Utc::now().max(floor);
        next.version += 1;
        next
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn payment_id(&self) -> PaymentId {
        self.payment_id
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn vendor_id(&self) -> &str {
        &self.vendor_id
    }

    pub fn buyer_address(&self) -> &str {
        &self.buyer_address
    }

    /// The buyer's request body, opaque to the marketplace.
    pub fn request_payload(&self) -> &AnyJson {
        &self.request_payload
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Present iff the task is `COMPLETED`.
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Present iff the task is `FAILED`.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}
