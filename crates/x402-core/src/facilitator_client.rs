//! A remote facilitator reached over HTTP.

use http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    facilitator::{
        Facilitator, FacilitatorRequest, SettleFailed, SettleResponse, SettleSuccess,
        VerifyInvalid, VerifyResponse, VerifyValid,
    },
    transport::{PaymentPayload, PaymentRequirements},
    types::{Base64EncodedHeader, X402Version},
};

/// A facilitator client that posts to `{base_url}/verify` and `{base_url}/settle`.
///
/// ```
/// use http::{HeaderName, HeaderValue};
/// use url_macro::url;
/// use x402_core::facilitator_client::HttpFacilitator;
///
/// let facilitator = HttpFacilitator::from_url(url!("https://facilitator.example.com/"))
///     .header(
///         &HeaderName::from_static("x-api-key"),
///         &HeaderValue::from_static("secret"),
///     );
/// ```
#[derive(Debug, Clone)]
pub struct HttpFacilitator {
    pub base_url: Url,
    pub client: reqwest::Client,
    pub headers: HeaderMap,
}

/// Request body of both facilitator endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilitatorWireRequest {
    pub x402_version: X402Version,
    pub payment_header: Base64EncodedHeader,
    pub payment_payload: PaymentPayload,
    pub payment_requirements: PaymentRequirements,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilitatorWireVerifyResponse {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_reason: Option<String>,
    pub payer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilitatorWireSettleResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
    pub payer: Option<String>,
    pub transaction: Option<String>,
    pub network: Option<String>,
}

impl From<FacilitatorRequest> for FacilitatorWireRequest {
    fn from(request: FacilitatorRequest) -> Self {
        FacilitatorWireRequest {
            x402_version: request.payment_payload.x402_version,
            payment_header: request.payment_header,
            payment_payload: request.payment_payload,
            payment_requirements: request.payment_requirements,
        }
    }
}

impl From<FacilitatorWireVerifyResponse> for VerifyResponse {
    fn from(response: FacilitatorWireVerifyResponse) -> Self {
        if response.is_valid {
            VerifyResponse::Valid(VerifyValid {
                payer: response.payer.unwrap_or_default(),
            })
        } else {
            VerifyResponse::Invalid(VerifyInvalid {
                invalid_reason: response
                    .invalid_reason
                    .unwrap_or_else(|| "unspecified".to_string()),
                payer: response.payer,
            })
        }
    }
}

impl From<FacilitatorWireSettleResponse> for SettleResponse {
    fn from(response: FacilitatorWireSettleResponse) -> Self {
        if response.success {
            SettleResponse::Success(SettleSuccess {
                payer: response.payer.unwrap_or_default(),
                transaction: response.transaction.unwrap_or_default(),
                network: response.network.unwrap_or_default(),
            })
        } else {
            SettleResponse::Failed(SettleFailed {
                error_reason: response
                    .error_reason
                    .unwrap_or_else(|| "unspecified".to_string()),
                payer: response.payer,
            })
        }
    }
}

impl HttpFacilitator {
    pub fn from_url(base_url: Url) -> Self {
        HttpFacilitator {
            base_url,
            client: reqwest::Client::new(),
            headers: HeaderMap::new(),
        }
    }

    /// Attach a header (e.g. an API key) to every facilitator call.
    pub fn header(mut self, key: &HeaderName, value: &HeaderValue) -> Self {
        self.headers.insert(key, value.to_owned());
        self
    }

    async fn post<Res>(
        &self,
        path: &str,
        request: FacilitatorRequest,
    ) -> Result<Res, HttpFacilitatorError>
    where
        Res: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(self.base_url.join(path)?)
            .headers(self.headers.clone())
            .json(&FacilitatorWireRequest::from(request))
            .send()
            .await?
            .json::<Res>()
            .await?;

        Ok(response)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HttpFacilitatorError {
    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),
    #[error("HTTP request error: {0}")]
    HttpRequestError(#[from] reqwest::Error),
}

impl Facilitator for HttpFacilitator {
    type Error = HttpFacilitatorError;

    async fn verify(&self, request: FacilitatorRequest) -> Result<VerifyResponse, Self::Error> {
        let response: FacilitatorWireVerifyResponse = self.post("verify", request).await?;

        #[cfg(feature = "tracing")]
        tracing::debug!(valid = response.is_valid, "facilitator verify answered");

        Ok(response.into())
    }

    async fn settle(&self, request: FacilitatorRequest) -> Result<SettleResponse, Self::Error> {
        let response: FacilitatorWireSettleResponse = self.post("settle", request).await?;

        #[cfg(feature = "tracing")]
        tracing::debug!(success = response.success, "facilitator settle answered");

        Ok(response.into())
    }
}
