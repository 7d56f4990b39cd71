use bon::Builder;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

const DEFAULT_CUSTODY_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;
const DEFAULT_MAX_TIMEOUT_SECONDS: u64 = 300;
const DEFAULT_SCHEME: &str = "exact";
const DEFAULT_CREDENTIAL_LABEL: &str = "x402 access credential";

/// Marketplace behavior configuration.
///
/// Every field has a default, so a partial document deserializes:
///
/// ```
/// use x402_marketplace::config::MarketplaceConfig;
///
/// let config: MarketplaceConfig =
///     serde_json::from_str(r#"{"maxTimeoutSeconds": 60}"#).unwrap();
///
/// assert_eq!(config.max_timeout_seconds, 60);
/// assert_eq!(config.custody_timeout().num_days(), 7);
/// ```
#[derive(Builder, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarketplaceConfig {
    /// How long custodially held funds wait for fulfillment before the hold counts as expired.
    #[builder(default = DEFAULT_CUSTODY_TIMEOUT_SECS)]
    pub custody_timeout_secs: u64,

    /// `maxTimeoutSeconds` advertised in payment terms.
    #[builder(default = DEFAULT_MAX_TIMEOUT_SECONDS)]
    pub max_timeout_seconds: u64,

    /// Payment scheme advertised in payment terms.
    #[builder(into, default = DEFAULT_SCHEME.to_string())]
    pub scheme: String,

    /// Label given to issued credentials when the buyer does not choose one.
    #[builder(into, default = DEFAULT_CREDENTIAL_LABEL.to_string())]
    pub default_credential_label: String,
}

impl MarketplaceConfig {
    pub fn custody_timeout(&self) -> TimeDelta {
        let secs = i64::try_from(self.custody_timeout_secs).unwrap_or(i64::MAX);
        TimeDelta::try_seconds(secs).unwrap_or(TimeDelta::MAX)
    }
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        MarketplaceConfig::builder().build()
    }
}
