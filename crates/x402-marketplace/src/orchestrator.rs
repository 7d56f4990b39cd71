//! Decides the outcome of one request for a priced resource.
//!
//! The procedure runs in order and stops at the first step that decides:
//!
//! 1. resolve vendor and product (`not_found` otherwise);
//! 2. build payment terms pointing at the capture target;
//! 3. no `X-PAYMENT` header → `payment_required`;
//! 4. undecodable proof, or proof for terms no longer offered → `payment_required`;
//! 5. verify with the facilitator (`verification_failed` otherwise);
//! 6. settle once, never retried (`settlement_failed` otherwise);
//! 7. record the payment, then issue a credential or schedule a task depending on the product.
//!
//! Nothing is persisted unless step 6 succeeds.

use std::{fmt::Display, sync::Arc};

use bon::{Builder, bon};
use chrono::{DateTime, Utc};
use url::Url;
use x402_core::{
    facilitator::{Facilitator, SettleResponse, SettleSuccess, VerifyResponse},
    transport::{PaymentRequirements, Resource, SettlementResponse},
    types::AnyJson,
};

use crate::{
    config::MarketplaceConfig,
    custody::CaptureMode,
    domain::{
        catalog::{Product, ProductKind, Vendor},
        payment::{Payment, SettledPayment},
        task::Task,
    },
    errors::{Error, NotFound},
    gateway::{PaymentGateway, PaymentProof, ResourceConfig},
    outcome::{Missing, Outcome},
    ports::{Catalog, CredentialIssuer, CredentialRequest, PaymentStore, TaskStore},
};

/// One incoming request for a priced resource.
#[derive(Builder, Debug, Clone)]
pub struct PurchaseRequest {
    #[builder(into)]
    pub vendor_id: String,
    #[builder(into)]
    pub path: String,
    /// The URL the buyer requested, echoed in payment terms.
    pub resource_url: Url,
    /// The raw `X-PAYMENT` header, if one was sent.
    #[builder(into)]
    pub payment_header: Option<String>,
    /// The request body.
    #[builder(default)]
    pub payload: AnyJson,
}

pub struct RequestOrchestrator<F: Facilitator> {
    gateway: PaymentGateway<F>,
    catalog: Arc<dyn Catalog>,
    payments: Arc<dyn PaymentStore>,
    tasks: Arc<dyn TaskStore>,
    issuer: Arc<dyn CredentialIssuer>,
    capture: CaptureMode,
    config: MarketplaceConfig,
}

#[bon]
impl<F: Facilitator> RequestOrchestrator<F> {
    #[builder]
    pub fn new(
        facilitator: F,
        catalog: Arc<dyn Catalog>,
        payments: Arc<dyn PaymentStore>,
        tasks: Arc<dyn TaskStore>,
        issuer: Arc<dyn CredentialIssuer>,
        #[builder(default)] capture: CaptureMode,
        #[builder(default)] config: MarketplaceConfig,
    ) -> Self {
        RequestOrchestrator {
            gateway: PaymentGateway::new(facilitator, &config),
            catalog,
            payments,
            tasks,
            issuer,
            capture,
            config,
        }
    }

    pub fn gateway(&self) -> &PaymentGateway<F> {
        &self.gateway
    }

    pub fn capture(&self) -> &CaptureMode {
        &self.capture
    }

    /// Runs the purchase procedure for `request`.
    ///
    /// Declines come back as [`Outcome`] values; `Err` is reserved for failing stores,
    /// collaborators, and records that violate an invariant.
    pub async fn handle(&self, request: PurchaseRequest) -> Result<Outcome, Error> {
        let Some(vendor) = self.catalog.vendor(&request.vendor_id).await? else {
            return Ok(not_found(
                Missing::Vendor,
                NotFound::Vendor(request.vendor_id),
            ));
        };
        let Some(product) = self.catalog.product(vendor.id(), &request.path).await? else {
            return Ok(not_found(
                Missing::Resource,
                NotFound::Resource {
                    vendor_id: request.vendor_id,
                    path: request.path,
                },
            ));
        };

        let resource = Resource::builder()
            .url(request.resource_url)
            .description(product.description.as_str())
            .mime_type(product.mime_type.as_str())
            .build();
        let requirements = self.gateway.build_requirements(
            &ResourceConfig::builder()
                .price(product.price)
                .network(product.network)
                .pay_to(self.capture.target_address(&vendor))
                .resource(resource.clone())
                .build(),
        )?;

        let Some(header) = request.payment_header else {
            return Ok(self.payment_required(requirements, resource, "X-PAYMENT header is required"));
        };

        let proof = match self.gateway.parse_payment_proof(&header) {
            Ok(proof) => proof,
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Rejected undecodable X-PAYMENT header: {err}");

                return Ok(self.payment_required(
                    requirements,
                    resource,
                    format!("Failed to parse X-PAYMENT header: {err}"),
                ));
            }
        };

        let Some(selected) = self.gateway.match_requirement(&requirements, &proof).cloned() else {
            let reason = format!(
                "No payment requirements accept scheme '{}' on network '{}'",
                proof.payload.scheme, proof.payload.network
            );
            return Ok(self.payment_required(requirements, resource, reason));
        };

        let verified_payer = match self.gateway.verify(&proof, &selected).await {
            Ok(VerifyResponse::Valid(valid)) => valid.payer,
            Ok(VerifyResponse::Invalid(invalid)) => {
                return Ok(Outcome::VerificationFailed {
                    reason: invalid.invalid_reason,
                });
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Failed to verify payment: {err}");

                return Ok(Outcome::VerificationFailed {
                    reason: err.to_string(),
                });
            }
        };

        // The payer must be recordable before any funds are captured.
        let verified_payer = match product.network.validate_address(&verified_payer) {
            Ok(payer) => payer,
            Err(err) => {
                return Ok(Outcome::VerificationFailed {
                    reason: format!("unusable payer: {err}"),
                });
            }
        };

        #[cfg(feature = "tracing")]
        tracing::debug!("Payment verified: payer='{verified_payer}'");

        let settled = match self.settle(&proof, &selected).await {
            Ok(settled) => settled,
            Err(outcome) => return Ok(outcome),
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Payment settled: payer='{}', transaction='{}', network='{}'",
            settled.payer,
            settled.transaction,
            settled.network
        );

        let buyer = product
            .network
            .validate_address(&settled.payer)
            .unwrap_or(verified_payer);
        let record = SettledPayment::builder()
            .product_id(product.id.as_str())
            .vendor_id(vendor.id())
            .amount(product.price)
            .network(product.network)
            .payer(buyer.as_str())
            .transaction(settled.transaction.as_str())
            .build();
        let settlement = SettlementResponse::from(settled);

        match product.kind {
            ProductKind::Credential => {
                self.issue_credential(&vendor, &product, record, settlement, request.payload)
                    .await
            }
            ProductKind::AsyncTask => {
                self.schedule_task(record, settlement, buyer, request.payload)
                    .await
            }
        }
    }

    async fn settle(
        &self,
        proof: &PaymentProof,
        selected: &PaymentRequirements,
    ) -> Result<SettleSuccess, Outcome> {
        match self.gateway.settle(proof, selected).await {
            Ok(SettleResponse::Success(success)) => Ok(success),
            Ok(SettleResponse::Failed(failed)) => Err(Outcome::SettlementFailed {
                reason: failed.error_reason,
            }),
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Failed to settle payment: {err}");

                Err(Outcome::SettlementFailed {
                    reason: err.to_string(),
                })
            }
        }
    }

    async fn issue_credential(
        &self,
        vendor: &Vendor,
        product: &Product,
        record: SettledPayment,
        settlement: SettlementResponse,
        payload: AnyJson,
    ) -> Result<Outcome, Error> {
        let payment = Payment::direct(record)?;
        self.payments.insert(payment.clone()).await?;

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Recorded payment {} for credential product '{}'",
            payment.id(),
            product.id
        );

        let label = payload
            .get("label")
            .and_then(AnyJson::as_str)
            .filter(|label| !label.trim().is_empty())
            .unwrap_or(self.config.default_credential_label.as_str())
            .to_string();

        let credential = self
            .issuer
            .issue(CredentialRequest {
                payment_id: payment.id(),
                vendor_id: vendor.id().to_string(),
                product_id: product.id.clone(),
                buyer_address: payment.payer().to_string(),
                label,
                payload,
            })
            .await?;

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Issued credential {} for payment {}",
            credential.reference,
            payment.id()
        );

        Ok(Outcome::CredentialIssued {
            payment_id: payment.id(),
            credential,
            settlement,
        })
    }

    async fn schedule_task(
        &self,
        record: SettledPayment,
        settlement: SettlementResponse,
        buyer: String,
        payload: AnyJson,
    ) -> Result<Outcome, Error> {
        let payment = match &self.capture {
            CaptureMode::Direct => Payment::direct(record)?,
            CaptureMode::Custodial(_) => Payment::with_custody(record, self.hold_expiry())?,
        };
        self.payments.insert(payment.clone()).await?;

        let task = Task::create(&payment, buyer, payload)?;
        self.tasks.insert(task.clone()).await?;

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Created task {} for payment {} ({})",
            task.id(),
            payment.id(),
            payment.status()
        );

        Ok(Outcome::TaskCreated {
            task_id: task.id(),
            payment_id: payment.id(),
            settlement,
        })
    }

    fn hold_expiry(&self) -> DateTime<Utc> {
        Utc::now()
            .checked_add_signed(self.config.custody_timeout())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    fn payment_required(
        &self,
        requirements: Vec<PaymentRequirements>,
        resource: Resource,
        reason: impl Into<String>,
    ) -> Outcome {
        Outcome::PaymentRequired {
            unpaid: self.gateway.build_unpaid_response(requirements, reason),
            resource,
        }
    }
}

fn not_found(missing: Missing, err: impl Display) -> Outcome {
    Outcome::NotFound {
        missing,
        reason: err.to_string(),
    }
}
