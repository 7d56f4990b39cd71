use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    domain::{
        catalog::{Product, Vendor},
        payment::{Payment, PaymentId, PaymentStatus},
        task::{Task, TaskId, TaskStatus},
    },
    errors::{Error, NotFound, StoreError},
    ports::{Catalog, PaymentStore, TaskStore},
};

/// A thread-safe in-memory vendor and product catalog.
#[derive(Default, Clone)]
pub struct InMemoryCatalog {
    vendors: Arc<RwLock<HashMap<String, Vendor>>>,
    products: Arc<RwLock<HashMap<(String, String), Product>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a vendor.
    pub async fn register_vendor(&self, vendor: Vendor) {
        let mut vendors = self.vendors.write().await;
        vendors.insert(vendor.id().to_string(), vendor);
    }

    /// Adds or replaces the product at `(product.vendor_id, product.path)`.
    ///
    /// The vendor must already be registered and sell on the same network, and the price must be
    /// representable in the network's USDC units.
    pub async fn register_product(&self, product: Product) -> Result<(), Error> {
        let vendors = self.vendors.read().await;
        let vendor = vendors
            .get(&product.vendor_id)
            .ok_or_else(|| NotFound::Vendor(product.vendor_id.clone()))?;

        if vendor.network() != product.network {
            return Err(Error::validation(
                "network",
                format!(
                    "product on {} but vendor '{}' settles on {}",
                    product.network,
                    vendor.id(),
                    vendor.network()
                ),
            ));
        }

        product.price.to_atomic(product.network.usdc().decimals)?;

        let mut products = self.products.write().await;
        products.insert((product.vendor_id.clone(), product.path.clone()), product);
        Ok(())
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn vendor(&self, vendor_id: &str) -> Result<Option<Vendor>, StoreError> {
        let vendors = self.vendors.read().await;
        Ok(vendors.get(vendor_id).cloned())
    }

    async fn product(&self, vendor_id: &str, path: &str) -> Result<Option<Product>, StoreError> {
        let products = self.products.read().await;
        Ok(products
            .get(&(vendor_id.to_string(), path.to_string()))
            .cloned())
    }
}

/// A thread-safe in-memory payment store.
///
/// Each update holds the write lock across its version check, so concurrent writers of one
/// record serialize and all but the first see [`StoreError::Conflict`].
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    payments: Arc<RwLock<HashMap<PaymentId, Payment>>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, payment: Payment) -> Result<(), StoreError> {
        let mut payments = self.payments.write().await;
        if payments.contains_key(&payment.id()) {
            return Err(StoreError::Duplicate(payment.id().to_string()));
        }
        payments.insert(payment.id(), payment);
        Ok(())
    }

    async fn update(&self, payment: Payment) -> Result<(), StoreError> {
        let mut payments = self.payments.write().await;
        let stored = payments
            .get(&payment.id())
            .ok_or_else(|| StoreError::Missing(payment.id().to_string()))?;
        check_version(&payment.id().to_string(), stored.version(), payment.version())?;
        payments.insert(payment.id(), payment);
        Ok(())
    }

    async fn get(&self, id: PaymentId) -> Result<Option<Payment>, StoreError> {
        let payments = self.payments.read().await;
        Ok(payments.get(&id).cloned())
    }

    async fn list_by_status(&self, status: PaymentStatus) -> Result<Vec<Payment>, StoreError> {
        let payments = self.payments.read().await;
        let mut matching: Vec<Payment> = payments
            .values()
            .filter(|payment| payment.status() == status)
            .cloned()
            .collect();
        matching.sort_by_key(|payment| payment.created_at());
        Ok(matching)
    }
}

/// A thread-safe in-memory task store, with the same update discipline as
/// [`InMemoryPaymentStore`].
#[derive(Default, Clone)]
pub struct InMemoryTaskStore {
    tasks: Arc<RwLock<HashMap<TaskId, Task>>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, task: Task) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.id()) {
            return Err(StoreError::Duplicate(task.id().to_string()));
        }
        tasks.insert(task.id(), task);
        Ok(())
    }

    async fn update(&self, task: Task) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        let stored = tasks
            .get(&task.id())
            .ok_or_else(|| StoreError::Missing(task.id().to_string()))?;
        check_version(&task.id().to_string(), stored.version(), task.version())?;
        tasks.insert(task.id(), task);
        Ok(())
    }

    async fn get(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.get(&id).cloned())
    }

    async fn list_by_vendor(
        &self,
        vendor_id: &str,
        status: Option<TaskStatus>,
    ) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        let mut matching: Vec<Task> = tasks
            .values()
            .filter(|task| task.vendor_id() == vendor_id)
            .filter(|task| status.is_none_or(|status| task.status() == status))
            .cloned()
            .collect();
        matching.sort_by_key(|task| task.created_at());
        Ok(matching)
    }
}

fn check_version(id: &str, stored: u64, next: u64) -> Result<(), StoreError> {
    if stored.checked_add(1) == Some(next) {
        Ok(())
    } else {
        Err(StoreError::Conflict {
            id: id.to_string(),
            expected: next.saturating_sub(1),
            found: stored,
        })
    }
}
