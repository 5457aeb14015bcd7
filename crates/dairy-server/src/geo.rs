//! IP geolocation used to enrich audit metadata.

use async_trait::async_trait;
use dairy_core::GeoConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Location fields merged into audit metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub city: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub ip: Option<String>,
}

impl GeoLocation {
    /// Metadata fragment with only the known fields.
    pub fn to_metadata(&self) -> Map<String, Value> {
        let mut map = Map::new();
        let mut put = |key: &str, value: Option<Value>| {
            if let Some(value) = value {
                map.insert(key.to_string(), value);
            }
        };
        put("city", self.city.clone().map(Value::from));
        put("country", self.country.clone().map(Value::from));
        put("region", self.region.clone().map(Value::from));
        put("latitude", self.latitude.map(Value::from));
        put("longitude", self.longitude.map(Value::from));
        put("ip", self.ip.clone().map(Value::from));
        map
    }
}

#[derive(Debug, Error)]
pub enum GeoError {
    /// The provider could not be reached or answered with an error.
    #[error("geolocation upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Lookups are turned off.
    #[error("geolocation disabled")]
    Disabled,
}

/// Resolves an IP address to a location.
#[async_trait]
pub trait GeoLocator: Send + Sync {
    async fn resolve(&self, ip: &str) -> Result<GeoLocation, GeoError>;
}

/// Locator used when geolocation is not configured.
pub struct DisabledLocator;

#[async_trait]
impl GeoLocator for DisabledLocator {
    async fn resolve(&self, _ip: &str) -> Result<GeoLocation, GeoError> {
        Err(GeoError::Disabled)
    }
}

/// ipstack-compatible HTTP lookup.
pub struct IpStackLocator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct IpStackResponse {
    city: Option<String>,
    country_name: Option<String>,
    region_name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    ip: Option<String>,
    error: Option<IpStackError>,
}

#[derive(Debug, Deserialize)]
struct IpStackError {
    info: Option<String>,
}

impl IpStackLocator {
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self, GeoError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GeoError::UpstreamUnavailable(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self, ip: &str) -> String {
        format!(
            "{}/{}?access_key={}",
            self.base_url,
            urlencoding::encode(ip),
            urlencoding::encode(&self.api_key)
        )
    }
}

#[async_trait]
impl GeoLocator for IpStackLocator {
    async fn resolve(&self, ip: &str) -> Result<GeoLocation, GeoError> {
        let body: IpStackResponse = self
            .client
            .get(self.url(ip))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| GeoError::UpstreamUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| GeoError::UpstreamUnavailable(e.to_string()))?;

        if let Some(error) = body.error {
            return Err(GeoError::UpstreamUnavailable(
                error.info.unwrap_or_else(|| "provider returned an error".to_string()),
            ));
        }

        Ok(GeoLocation {
            city: body.city,
            country: body.country_name,
            region: body.region_name,
            latitude: body.latitude,
            longitude: body.longitude,
            ip: body.ip,
        })
    }
}

/// Build the locator described by `config`.
pub fn create_locator(config: &GeoConfig) -> Arc<dyn GeoLocator> {
    if !config.enabled {
        return Arc::new(DisabledLocator);
    }
    let Some(api_key) = config.resolve_api_key() else {
        tracing::warn!(
            env = config.api_key_env.as_deref().unwrap_or("-"),
            "Geolocation enabled without an API key, lookups disabled"
        );
        return Arc::new(DisabledLocator);
    };
    match IpStackLocator::new(
        &config.base_url,
        api_key,
        Duration::from_millis(config.timeout_ms),
    ) {
        Ok(locator) => Arc::new(locator),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to build geolocation client, lookups disabled");
            Arc::new(DisabledLocator)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_skips_unknown_fields() {
        let location = GeoLocation {
            city: Some("Anand".to_string()),
            latitude: Some(22.55),
            ip: Some("203.0.113.7".to_string()),
            ..Default::default()
        };
        let meta = location.to_metadata();
        assert_eq!(meta.len(), 3);
        assert_eq!(meta["city"], "Anand");
        assert!(meta.get("country").is_none());
    }

    #[test]
    fn test_url_encodes_parts() {
        let locator = IpStackLocator::new(
            "http://api.ipstack.com/",
            "k&y".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            locator.url("2001:db8::1"),
            "http://api.ipstack.com/2001%3Adb8%3A%3A1?access_key=k%26y"
        );
    }

    #[test]
    fn test_provider_error_body_parses() {
        let body: IpStackResponse = serde_json::from_str(
            r#"{"success": false, "error": {"code": 101, "info": "invalid access key"}}"#,
        )
        .unwrap();
        assert_eq!(body.error.unwrap().info.as_deref(), Some("invalid access key"));
    }

    #[tokio::test]
    async fn test_disabled_locator() {
        let locator = create_locator(&GeoConfig::default());
        assert!(matches!(locator.resolve("1.2.3.4").await, Err(GeoError::Disabled)));
    }
}
