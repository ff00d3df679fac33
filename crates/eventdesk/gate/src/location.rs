//! Client address to country resolution

use crate::error::{GateError, GateResult};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

const DEFAULT_GEO_ENDPOINT: &str = "http://ip-api.com/json";
const DEFAULT_COUNTRY: &str = "US";
const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Two-letter country code as reported by the lookup service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryCode(String);

impl CountryCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps a client network address to a country code
#[async_trait]
pub trait LocationResolver: Send + Sync {
    async fn resolve_country(&self, address: &str) -> GateResult<CountryCode>;
}

/// Geolocation lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoConfig {
    /// Base URL; the address is appended as the last path segment
    #[serde(default = "default_geo_endpoint")]
    pub endpoint: String,

    /// Country returned for loopback addresses without a lookup
    #[serde(default = "default_country")]
    pub default_country: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            endpoint: default_geo_endpoint(),
            default_country: default_country(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_geo_endpoint() -> String {
    DEFAULT_GEO_ENDPOINT.to_string()
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Whether `address` names the local host.
///
/// Matches `127.0.0.1`, `::1`, the IPv4-mapped form of `127.0.0.1` that
/// dual-stack listeners report, and anything containing `localhost`.
pub fn is_loopback_address(address: &str) -> bool {
    if address.contains("localhost") {
        return true;
    }
    match address.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => v4 == Ipv4Addr::LOCALHOST,
        Ok(IpAddr::V6(v6)) => {
            v6.is_loopback() || v6.to_ipv4_mapped() == Some(Ipv4Addr::LOCALHOST)
        }
        Err(_) => false,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
    status: Option<String>,
    message: Option<String>,
    country_code: Option<String>,
}

/// Resolver backed by an ip-api.com style JSON endpoint
#[derive(Debug, Clone)]
pub struct IpApiLocationResolver {
    client: Client,
    endpoint: Url,
    default_country: CountryCode,
}

impl IpApiLocationResolver {
    pub fn new(config: &GeoConfig) -> GateResult<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            GateError::LocationUnavailable(format!(
                "invalid geolocation endpoint '{}': {}",
                config.endpoint, e
            ))
        })?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| {
                GateError::LocationUnavailable(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            endpoint,
            default_country: CountryCode::new(config.default_country.clone()),
        })
    }

    fn lookup_url(&self, address: &str) -> GateResult<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| {
                GateError::LocationUnavailable(format!(
                    "geolocation endpoint '{}' cannot take a path",
                    self.endpoint
                ))
            })?
            .pop_if_empty()
            .push(address);
        Ok(url)
    }
}

#[async_trait]
impl LocationResolver for IpApiLocationResolver {
    async fn resolve_country(&self, address: &str) -> GateResult<CountryCode> {
        if is_loopback_address(address) {
            tracing::debug!(client_address = %address, "Loopback address, skipping geolocation");
            return Ok(self.default_country.clone());
        }

        let url = self.lookup_url(address)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GateError::LocationUnavailable(format!("lookup request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GateError::LocationUnavailable(format!(
                "lookup returned {}",
                status
            )));
        }

        let body: IpApiResponse = response
            .json()
            .await
            .map_err(|e| GateError::LocationUnavailable(format!("invalid lookup response: {}", e)))?;

        match body.country_code {
            Some(code) if !code.trim().is_empty() => Ok(CountryCode::new(code)),
            _ => Err(GateError::LocationUnavailable(format!(
                "lookup returned no country code (status: {}, message: {})",
                body.status.as_deref().unwrap_or("unknown"),
                body.message.as_deref().unwrap_or("none")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver_for(endpoint: &str) -> IpApiLocationResolver {
        IpApiLocationResolver::new(&GeoConfig {
            endpoint: endpoint.to_string(),
            timeout_ms: 500,
            ..Default::default()
        })
        .unwrap()
    }

    // Nothing listens on the discard port, so any lookup would fail.
    const UNREACHABLE: &str = "http://127.0.0.1:9/json";

    #[test]
    fn test_loopback_detection() {
        assert!(is_loopback_address("127.0.0.1"));
        assert!(is_loopback_address("::1"));
        assert!(is_loopback_address("::ffff:127.0.0.1"));
        assert!(is_loopback_address("localhost"));
        assert!(is_loopback_address("my.localhost.dev"));
        assert!(!is_loopback_address("8.8.8.8"));
        assert!(!is_loopback_address("10.0.0.1"));
        assert!(!is_loopback_address(""));
    }

    #[tokio::test]
    async fn test_loopback_resolves_to_default_country() {
        let resolver = resolver_for(UNREACHABLE);
        for address in ["127.0.0.1", "::1", "localhost"] {
            let country = resolver.resolve_country(address).await.unwrap();
            assert_eq!(country.as_str(), "US");
        }
    }

    #[tokio::test]
    async fn test_lookup_returns_country_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json/8.8.8.8"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "country": "Slovenia",
                "countryCode": "SI"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resolver = resolver_for(&format!("{}/json", server.uri()));
        let country = resolver.resolve_country("8.8.8.8").await.unwrap();
        assert_eq!(country, CountryCode::new("SI"));
    }

    #[tokio::test]
    async fn test_lookup_failure_status_is_location_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let resolver = resolver_for(&format!("{}/json", server.uri()));
        let err = resolver.resolve_country("8.8.8.8").await.unwrap_err();
        assert!(matches!(err, GateError::LocationUnavailable(_)));
    }

    #[tokio::test]
    async fn test_lookup_without_country_code_is_location_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "fail",
                "message": "private range"
            })))
            .mount(&server)
            .await;

        let resolver = resolver_for(&format!("{}/json", server.uri()));
        let err = resolver.resolve_country("10.1.2.3").await.unwrap_err();
        assert!(matches!(err, GateError::LocationUnavailable(_)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_location_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let resolver = resolver_for(&format!("{}/json", server.uri()));
        let err = resolver.resolve_country("8.8.4.4").await.unwrap_err();
        assert!(matches!(err, GateError::LocationUnavailable(_)));
    }

    #[tokio::test]
    async fn test_lookup_timeout_is_location_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "countryCode": "DE" }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let resolver = resolver_for(&format!("{}/json", server.uri()));
        let err = resolver.resolve_country("1.1.1.1").await.unwrap_err();
        assert!(matches!(err, GateError::LocationUnavailable(_)));
    }

    #[tokio::test]
    async fn test_unreachable_lookup_is_location_unavailable() {
        let resolver = resolver_for(UNREACHABLE);
        let err = resolver.resolve_country("8.8.8.8").await.unwrap_err();
        assert!(matches!(err, GateError::LocationUnavailable(_)));
    }

    proptest! {
        #[test]
        fn any_localhost_string_bypasses_lookup(prefix in "[a-z0-9.:-]{0,12}", suffix in "[a-z0-9.:-]{0,12}") {
            let address = format!("{}localhost{}", prefix, suffix);
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let resolver = resolver_for(UNREACHABLE);
            let country = runtime.block_on(resolver.resolve_country(&address)).unwrap();
            prop_assert_eq!(country.as_str(), "US");
        }
    }
}
