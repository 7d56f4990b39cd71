#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use serde_json::json;
use url_macro::url;
use x402_core::{
    facilitator::{
        Facilitator, FacilitatorRequest, SettleResponse, SettleSuccess, VerifyResponse,
    },
    networks::Network,
    transport::PaymentRequirements,
    types::{AnyJson, Base64EncodedHeader},
};
use x402_marketplace::{
    custody::{CaptureMode, Custody, CustodyResult},
    domain::{
        catalog::{Product, ProductKind, Vendor},
        payment::Payment,
    },
    errors::ServiceError,
    fulfillment::FulfillmentCoordinator,
    infrastructure::{InMemoryCatalog, InMemoryPaymentStore, InMemoryTaskStore},
    orchestrator::{PurchaseRequest, RequestOrchestrator},
    ports::{CredentialIssuer, CredentialRequest, IssuedCredential},
};

pub const VENDOR_ID: &str = "acme";
pub const VENDOR_ADDRESS: &str = "0x1111111111111111111111111111111111111111";
pub const BUYER_ADDRESS: &str = "0x2222222222222222222222222222222222222222";
pub const CUSTODY_ADDRESS: &str = "0x3333333333333333333333333333333333333333";
pub const TASK_PATH: &str = "/v1/translate";
pub const CREDENTIAL_PATH: &str = "/v1/keys";
pub const SETTLE_TX: &str = "0xsettle";
pub const NETWORK: Network = Network::BaseSepolia;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, thiserror::Error)]
#[error("facilitator unreachable")]
pub struct Unreachable;

/// A facilitator with canned verdicts that counts its calls.
#[derive(Clone)]
pub struct FakeFacilitator {
    verify: Option<VerifyResponse>,
    settle: Option<SettleResponse>,
    pub verify_calls: Arc<AtomicUsize>,
    pub settle_calls: Arc<AtomicUsize>,
    pub last_requirements: Arc<Mutex<Option<PaymentRequirements>>>,
}

impl FakeFacilitator {
    pub fn accepting() -> Self {
        FakeFacilitator {
            verify: Some(VerifyResponse::valid(BUYER_ADDRESS)),
            settle: Some(SettleResponse::success(SettleSuccess {
                payer: BUYER_ADDRESS.to_string(),
                transaction: SETTLE_TX.to_string(),
                network: NETWORK.name().to_string(),
            })),
            verify_calls: Arc::default(),
            settle_calls: Arc::default(),
            last_requirements: Arc::default(),
        }
    }

    /// Neither call reaches the facilitator.
    pub fn unreachable() -> Self {
        FakeFacilitator {
            verify: None,
            settle: None,
            ..Self::accepting()
        }
    }

    pub fn with_verify(mut self, verify: VerifyResponse) -> Self {
        self.verify = Some(verify);
        self
    }

    pub fn with_settle(mut self, settle: Option<SettleResponse>) -> Self {
        self.settle = settle;
        self
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn settle_calls(&self) -> usize {
        self.settle_calls.load(Ordering::SeqCst)
    }
}

impl Facilitator for FakeFacilitator {
    type Error = Unreachable;

    async fn verify(&self, request: FacilitatorRequest) -> Result<VerifyResponse, Unreachable> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_requirements.lock().unwrap() = Some(request.payment_requirements);
        self.verify.clone().ok_or(Unreachable)
    }

    async fn settle(&self, _request: FacilitatorRequest) -> Result<SettleResponse, Unreachable> {
        self.settle_calls.fetch_add(1, Ordering::SeqCst);
        self.settle.clone().ok_or(Unreachable)
    }
}

/// A custody executor that counts movements and can be switched off.
#[derive(Clone, Default)]
pub struct FakeCustody {
    pub release_calls: Arc<AtomicUsize>,
    pub refund_calls: Arc<AtomicUsize>,
    pub released_to: Arc<Mutex<Vec<String>>>,
    offline: Arc<AtomicBool>,
    reject: Arc<AtomicBool>,
}

impl FakeCustody {
    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn reject_movements(&self) {
        self.reject.store(true, Ordering::SeqCst);
    }

    pub fn release_calls(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }

    pub fn refund_calls(&self) -> usize {
        self.refund_calls.load(Ordering::SeqCst)
    }

    fn answer(&self, transaction: String) -> Result<CustodyResult, ServiceError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ServiceError::new("custody", "connection refused"));
        }
        if self.reject.load(Ordering::SeqCst) {
            return Ok(CustodyResult::Rejected {
                reason: "hold already moved".to_string(),
            });
        }
        Ok(CustodyResult::Completed { transaction })
    }
}

#[async_trait]
impl Custody for FakeCustody {
    fn address(&self) -> &str {
        CUSTODY_ADDRESS
    }

    async fn release(
        &self,
        payment: &Payment,
        vendor_address: &str,
    ) -> Result<CustodyResult, ServiceError> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        self.released_to
            .lock()
            .unwrap()
            .push(vendor_address.to_string());
        self.answer(format!("0xrelease-{}", payment.id()))
    }

    async fn refund(&self, payment: &Payment) -> Result<CustodyResult, ServiceError> {
        self.refund_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(format!("0xrefund-{}", payment.id()))
    }
}

/// Issues one credential per request and remembers what it was asked for.
#[derive(Clone, Default)]
pub struct FakeIssuer {
    pub requests: Arc<Mutex<Vec<CredentialRequest>>>,
}

#[async_trait]
impl CredentialIssuer for FakeIssuer {
    async fn issue(&self, request: CredentialRequest) -> Result<IssuedCredential, ServiceError> {
        let reference = format!("cred_{}", request.payment_id);
        self.requests.lock().unwrap().push(request);
        Ok(IssuedCredential {
            reference,
            secret: Some("sk_test_secret".to_string()),
        })
    }
}

/// A marketplace wired to in-memory stores and fakes, with vendor `acme` selling one task
/// product and one credential product on Base Sepolia.
pub struct Harness {
    pub catalog: InMemoryCatalog,
    pub payments: InMemoryPaymentStore,
    pub tasks: InMemoryTaskStore,
    pub facilitator: FakeFacilitator,
    pub custody: Option<FakeCustody>,
    pub issuer: FakeIssuer,
    pub orchestrator: RequestOrchestrator<FakeFacilitator>,
    pub fulfillment: FulfillmentCoordinator,
}

impl Harness {
    pub async fn direct() -> Self {
        Self::build(FakeFacilitator::accepting(), None).await
    }

    pub async fn custodial() -> Self {
        Self::build(FakeFacilitator::accepting(), Some(FakeCustody::default())).await
    }

    pub async fn build(facilitator: FakeFacilitator, custody: Option<FakeCustody>) -> Self {
        init_tracing();

        let catalog = InMemoryCatalog::new();
        catalog
            .register_vendor(Vendor::new(VENDOR_ID, "Acme", NETWORK, VENDOR_ADDRESS).unwrap())
            .await;
        catalog
            .register_product(
                Product::builder()
                    .id("translate")
                    .vendor_id(VENDOR_ID)
                    .path(TASK_PATH)
                    .price("$0.10".parse().unwrap())
                    .network(NETWORK)
                    .kind(ProductKind::AsyncTask)
                    .description("Translate a document")
                    .build(),
            )
            .await
            .unwrap();
        catalog
            .register_product(
                Product::builder()
                    .id("api-key")
                    .vendor_id(VENDOR_ID)
                    .path(CREDENTIAL_PATH)
                    .price("$1.00".parse().unwrap())
                    .network(NETWORK)
                    .kind(ProductKind::Credential)
                    .description("API access key")
                    .mime_type("text/plain")
                    .build(),
            )
            .await
            .unwrap();

        let payments = InMemoryPaymentStore::new();
        let tasks = InMemoryTaskStore::new();
        let issuer = FakeIssuer::default();
        let capture = match &custody {
            Some(custody) => CaptureMode::custodial(custody.clone()),
            None => CaptureMode::Direct,
        };

        let orchestrator = RequestOrchestrator::builder()
            .facilitator(facilitator.clone())
            .catalog(Arc::new(catalog.clone()))
            .payments(Arc::new(payments.clone()))
            .tasks(Arc::new(tasks.clone()))
            .issuer(Arc::new(issuer.clone()))
            .capture(capture.clone())
            .build();
        let fulfillment = FulfillmentCoordinator::builder()
            .catalog(Arc::new(catalog.clone()))
            .payments(Arc::new(payments.clone()))
            .tasks(Arc::new(tasks.clone()))
            .capture(capture)
            .build();

        Harness {
            catalog,
            payments,
            tasks,
            facilitator,
            custody,
            issuer,
            orchestrator,
            fulfillment,
        }
    }

    pub fn custody(&self) -> &FakeCustody {
        self.custody.as_ref().expect("harness built without custody")
    }
}

pub fn payment_header(scheme: &str, network: &str) -> String {
    Base64EncodedHeader::encode(&json!({
        "x402Version": 1,
        "scheme": scheme,
        "network": network,
        "payload": {
            "signature": "0xsig",
            "authorization": {"from": BUYER_ADDRESS, "value": "100000"}
        }
    }))
    .unwrap()
    .0
}

pub fn valid_header() -> String {
    payment_header("exact", NETWORK.name())
}

pub fn request(path: &str, header: Option<String>, payload: AnyJson) -> PurchaseRequest {
    PurchaseRequest::builder()
        .vendor_id(VENDOR_ID)
        .path(path)
        .resource_url(url!("https://market.example.com/acme/v1/translate"))
        .maybe_payment_header(header)
        .payload(payload)
        .build()
}
