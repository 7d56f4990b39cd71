//! Persistence and collaborator ports.
//!
//! The coordinator only sees these traits; [`crate::infrastructure`] ships in-memory
//! implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use x402_core::types::AnyJson;

use crate::{
    domain::{
        catalog::{Product, Vendor},
        payment::{Payment, PaymentId, PaymentStatus},
        task::{Task, TaskId, TaskStatus},
    },
    errors::{ServiceError, StoreError},
};

#[async_trait]
pub trait Catalog: Send + Sync {
    async fn vendor(&self, vendor_id: &str) -> Result<Option<Vendor>, StoreError>;
    async fn product(&self, vendor_id: &str, path: &str) -> Result<Option<Product>, StoreError>;
}

/// Payment records. Never deletes.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn insert(&self, payment: Payment) -> Result<(), StoreError>;

    /// Replaces the stored record with `payment`, which must be its direct successor: the stored
    /// version has to be exactly `payment.version() - 1`, otherwise [`StoreError::Conflict`].
    async fn update(&self, payment: Payment) -> Result<(), StoreError>;

    async fn get(&self, id: PaymentId) -> Result<Option<Payment>, StoreError>;
    async fn list_by_status(&self, status: PaymentStatus) -> Result<Vec<Payment>, StoreError>;
}

/// Task records. Never deletes.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert(&self, task: Task) -> Result<(), StoreError>;

    /// Same versioning contract as [`PaymentStore::update`].
    async fn update(&self, task: Task) -> Result<(), StoreError>;

    async fn get(&self, id: TaskId) -> Result<Option<Task>, StoreError>;

    /// The vendor's tasks, oldest first, optionally restricted to one status.
    async fn list_by_vendor(
        &self,
        vendor_id: &str,
        status: Option<TaskStatus>,
    ) -> Result<Vec<Task>, StoreError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRequest {
    pub payment_id: PaymentId,
    pub vendor_id: String,
    pub product_id: String,
    pub buyer_address: String,
    pub label: String,
    /// The buyer's request body.
    pub payload: AnyJson,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCredential {
    /// Identifier of the issued credential, safe to log.
    pub reference: String,
    /// The credential itself, when the issuer hands it out once at creation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

/// Mints access credentials for credential products.
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    async fn issue(&self, request: CredentialRequest) -> Result<IssuedCredential, ServiceError>;
}
