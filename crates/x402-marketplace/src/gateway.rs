//! Payment terms, proof parsing, and facilitator calls for priced resources.

use bon::Builder;
use x402_core::{
    facilitator::{Facilitator, FacilitatorRequest, SettleResponse, VerifyResponse},
    networks::Network,
    transport::{PaymentPayload, PaymentRequired, PaymentRequirements, Resource, select_requirement},
    types::{Base64EncodedHeader, X402Version},
};

use crate::{config::MarketplaceConfig, domain::price::Price, errors::Error};

/// What to charge for one resource, and where buyers send the funds.
#[derive(Builder, Debug, Clone)]
pub struct ResourceConfig {
    pub price: Price,
    pub network: Network,
    #[builder(into)]
    pub pay_to: String,
    pub resource: Resource,
}

/// A presented `X-PAYMENT` header together with its decoded payload.
#[derive(Debug, Clone)]
pub struct PaymentProof {
    pub header: Base64EncodedHeader,
    pub payload: PaymentPayload,
}

#[derive(Debug, Clone)]
pub struct PaymentGateway<F: Facilitator> {
    facilitator: F,
    scheme: String,
    max_timeout_seconds: u64,
}

impl<F: Facilitator> PaymentGateway<F> {
    pub fn new(facilitator: F, config: &MarketplaceConfig) -> Self {
        PaymentGateway {
            facilitator,
            scheme: config.scheme.clone(),
            max_timeout_seconds: config.max_timeout_seconds,
        }
    }

    pub fn facilitator(&self) -> &F {
        &self.facilitator
    }

    /// The terms a buyer may pay under: the network's USDC, in atomic units, sent to `pay_to`.
    pub fn build_requirements(
        &self,
        config: &ResourceConfig,
    ) -> Result<Vec<PaymentRequirements>, Error> {
        let asset = config.network.usdc();
        let amount = config.price.to_atomic(asset.decimals)?;
        let extra = asset
            .eip712
            .map(serde_json::to_value)
            .transpose()
            .map_err(|err| Error::validation("extra", err))?;

        Ok(vec![PaymentRequirements {
            scheme: self.scheme.clone(),
            network: config.network.name().to_string(),
            max_amount_required: amount,
            resource: config.resource.url.clone(),
            description: config.resource.description.clone(),
            mime_type: config.resource.mime_type.clone(),
            pay_to: config.pay_to.clone(),
            max_timeout_seconds: self.max_timeout_seconds,
            asset: asset.address.to_string(),
            extra,
        }])
    }

    pub fn build_unpaid_response(
        &self,
        requirements: Vec<PaymentRequirements>,
        error: impl Into<String>,
    ) -> PaymentRequired {
        PaymentRequired {
            x402_version: X402Version::V1,
            error: error.into(),
            accepts: requirements,
        }
    }

    pub fn parse_payment_proof(&self, header: &str) -> x402_core::Result<PaymentProof> {
        let header = Base64EncodedHeader::from(header);
        let payload = PaymentPayload::try_from(&header)?;
        Ok(PaymentProof { header, payload })
    }

    pub fn match_requirement<'a>(
        &self,
        requirements: &'a [PaymentRequirements],
        proof: &PaymentProof,
    ) -> Option<&'a PaymentRequirements> {
        select_requirement(requirements, &proof.payload)
    }

    pub async fn verify(
        &self,
        proof: &PaymentProof,
        requirement: &PaymentRequirements,
    ) -> Result<VerifyResponse, F::Error> {
        self.facilitator
            .verify(Self::request(proof, requirement))
            .await
    }

    pub async fn settle(
        &self,
        proof: &PaymentProof,
        requirement: &PaymentRequirements,
    ) -> Result<SettleResponse, F::Error> {
        self.facilitator
            .settle(Self::request(proof, requirement))
            .await
    }

    fn request(proof: &PaymentProof, requirement: &PaymentRequirements) -> FacilitatorRequest {
        FacilitatorRequest {
            payment_header: proof.header.clone(),
            payment_payload: proof.payload.clone(),
            payment_requirements: requirement.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use serde_json::json;
    use url_macro::url;
    use x402_core::types::AmountValue;

    use super::*;

    struct Accepting;

    impl Facilitator for Accepting {
        type Error = Infallible;

        async fn verify(&self, request: FacilitatorRequest) -> Result<VerifyResponse, Infallible> {
            assert_eq!(request.payment_requirements.scheme, "exact");
            Ok(VerifyResponse::valid("0xpayer"))
        }

        async fn settle(&self, _request: FacilitatorRequest) -> Result<SettleResponse, Infallible> {
            Ok(SettleResponse::failed("insufficient_funds"))
        }
    }

    fn gateway() -> PaymentGateway<Accepting> {
        PaymentGateway::new(Accepting, &MarketplaceConfig::default())
    }

    fn resource_config(network: Network, pay_to: &str) -> ResourceConfig {
        ResourceConfig::builder()
            .price("$0.10".parse().unwrap())
            .network(network)
            .pay_to(pay_to)
            .resource(
                Resource::builder()
                    .url(url!("https://market.example.com/acme/v1/translate"))
                    .description("Translate a document")
                    .mime_type("application/json")
                    .build(),
            )
            .build()
    }

    fn proof(scheme: &str, network: &str) -> PaymentProof {
        let header = Base64EncodedHeader::encode(&json!({
            "x402Version": 1,
            "scheme": scheme,
            "network": network,
            "payload": {"signature": "0xsig"}
        }))
        .unwrap();
        gateway().parse_payment_proof(header.as_str()).unwrap()
    }

    #[test]
    fn evm_terms_carry_usdc_and_eip712_domain() {
        let requirements = gateway()
            .build_requirements(&resource_config(
                Network::BaseSepolia,
                "0x1111111111111111111111111111111111111111",
            ))
            .unwrap();

        assert_eq!(requirements.len(), 1);
        let pr = &requirements[0];
        assert_eq!(pr.scheme, "exact");
        assert_eq!(pr.network, "base-sepolia");
        assert_eq!(pr.max_amount_required, AmountValue(100_000));
        assert_eq!(pr.pay_to, "0x1111111111111111111111111111111111111111");
        assert_eq!(pr.asset, "0x036CbD53842c5426634e7929541eC2318f3dCF7e");
        assert_eq!(pr.max_timeout_seconds, 300);
        assert_eq!(pr.extra, Some(json!({"name": "USD Coin", "version": "2"})));
    }

    #[test]
    fn solana_terms_have_no_extra() {
        let requirements = gateway()
            .build_requirements(&resource_config(
                Network::SolanaDevnet,
                "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU",
            ))
            .unwrap();
        assert_eq!(requirements[0].network, "solana-devnet");
        assert_eq!(requirements[0].extra, None);
    }

    #[test]
    fn unpaid_response_is_version_one() {
        let gateway = gateway();
        let requirements = gateway
            .build_requirements(&resource_config(
                Network::Base,
                "0x1111111111111111111111111111111111111111",
            ))
            .unwrap();
        let unpaid = gateway.build_unpaid_response(requirements.clone(), "X-PAYMENT header is required");

        let json = serde_json::to_value(&unpaid).unwrap();
        assert_eq!(json["x402Version"], 1);
        assert_eq!(json["error"], "X-PAYMENT header is required");
        assert_eq!(unpaid.accepts, requirements);
    }

    #[test]
    fn malformed_proofs_are_rejected() {
        assert!(gateway().parse_payment_proof("not base64!").is_err());
        let not_a_payload = Base64EncodedHeader::encode(&json!({"hello": "world"})).unwrap();
        assert!(gateway().parse_payment_proof(not_a_payload.as_str()).is_err());
    }

    #[test]
    fn matches_on_scheme_and_network() {
        let gateway = gateway();
        let requirements = gateway
            .build_requirements(&resource_config(
                Network::Base,
                "0x1111111111111111111111111111111111111111",
            ))
            .unwrap();

        assert!(gateway.match_requirement(&requirements, &proof("exact", "base")).is_some());
        assert!(gateway.match_requirement(&requirements, &proof("exact", "solana")).is_none());
        assert!(gateway.match_requirement(&requirements, &proof("upto", "base")).is_none());
    }

    #[tokio::test]
    async fn forwards_verdicts_from_the_facilitator() {
        let gateway = gateway();
        let requirements = gateway
            .build_requirements(&resource_config(
                Network::Base,
                "0x1111111111111111111111111111111111111111",
            ))
            .unwrap();
        let proof = proof("exact", "base");

        let verified = gateway.verify(&proof, &requirements[0]).await.unwrap();
        assert_eq!(verified, VerifyResponse::valid("0xpayer"));

        let settled = gateway.settle(&proof, &requirements[0]).await.unwrap();
        assert_eq!(settled, SettleResponse::failed("insufficient_funds"));
    }
}
