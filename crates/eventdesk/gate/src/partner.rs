//! Ad partner permission check

use crate::error::{GateError, GateResult};
use crate::location::CountryCode;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_PARTNER_ENDPOINT: &str =
    "https://us-central1-o7tools.cloudfunctions.net/fun7-ad-partner";
const DEFAULT_PARTNER_USERNAME: &str = "fun7user";
const DEFAULT_PARTNER_PASSWORD: &str = "fun7pass";
const DEFAULT_PERMITTED_SENTINEL: &str = "sure, why not!";
const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Asks the partner whether ads events are allowed for a country.
///
/// `Ok(false)` is a clean denial; `Err` means the partner could not answer.
#[async_trait]
pub trait PartnerPermissionCheck: Send + Sync {
    async fn check_permission(&self, country: &CountryCode) -> GateResult<bool>;
}

/// Partner endpoint and credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerConfig {
    #[serde(default = "default_partner_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_partner_username")]
    pub username: String,

    #[serde(default = "default_partner_password")]
    pub password: String,

    /// Exact `ads` value that means "permitted"
    #[serde(default = "default_permitted_sentinel")]
    pub permitted_sentinel: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for PartnerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_partner_endpoint(),
            username: default_partner_username(),
            password: default_partner_password(),
            permitted_sentinel: default_permitted_sentinel(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_partner_endpoint() -> String {
    DEFAULT_PARTNER_ENDPOINT.to_string()
}

fn default_partner_username() -> String {
    DEFAULT_PARTNER_USERNAME.to_string()
}

fn default_partner_password() -> String {
    DEFAULT_PARTNER_PASSWORD.to_string()
}

fn default_permitted_sentinel() -> String {
    DEFAULT_PERMITTED_SENTINEL.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

#[derive(Debug, Default, Deserialize)]
struct AdPartnerResponse {
    #[serde(default)]
    ads: Option<String>,
}

/// HTTP client for the ad partner endpoint
#[derive(Debug, Clone)]
pub struct AdPartnerClient {
    client: Client,
    config: PartnerConfig,
}

impl AdPartnerClient {
    pub fn new(config: PartnerConfig) -> GateResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| {
                GateError::PartnerUnavailable(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    fn classify_status(status: StatusCode) -> GateError {
        match status {
            StatusCode::UNAUTHORIZED => GateError::PartnerUnauthorized,
            StatusCode::BAD_REQUEST => GateError::PartnerBadRequest,
            other => GateError::PartnerUnavailable(format!("partner returned {}", other)),
        }
    }
}

#[async_trait]
impl PartnerPermissionCheck for AdPartnerClient {
    async fn check_permission(&self, country: &CountryCode) -> GateResult<bool> {
        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[("countryCode", country.as_str())])
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await
            .map_err(|e| GateError::PartnerUnavailable(format!("partner request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify_status(status));
        }

        // A body we cannot decode carries no permission.
        let parsed = match response.json::<AdPartnerResponse>().await {
            Ok(parsed) => parsed,
            Err(e) if e.is_decode() => {
                tracing::warn!(error = %e, "Unreadable ad partner response, treating as denial");
                AdPartnerResponse::default()
            }
            Err(e) => {
                return Err(GateError::PartnerUnavailable(format!(
                    "partner response lost: {}",
                    e
                )))
            }
        };

        Ok(parsed.ads.as_deref() == Some(self.config.permitted_sentinel.as_str()))
    }
}
