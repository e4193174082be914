//! Caching layer for GPS provider answers.
//!
//! Dispatch screens poll ETAs for every active trip. Positions move slowly
//! compared with the polling rate, so answers are cached per (unit,
//! destination) for a short TTL. "No estimate" answers are cached too.

use std::time::Duration;

use futures::future::join_all;
use moka::future::Cache as MokaCache;
use tracing::warn;

use crate::domain::{TerminalCode, UnitNumber};

use super::client::{GpsClient, GpsEta};
use super::error::GpsError;

type EtaKey = (UnitNumber, TerminalCode);

/// Configuration for the GPS cache.
#[derive(Debug, Clone)]
pub struct GpsCacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for GpsCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            max_capacity: 1000,
        }
    }
}

/// GPS client with caching.
pub struct CachedGpsClient {
    client: GpsClient,
    etas: MokaCache<EtaKey, Option<GpsEta>>,
}

impl CachedGpsClient {
    pub fn new(client: GpsClient, config: &GpsCacheConfig) -> Self {
        let etas = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();
        Self { client, etas }
    }

    /// Live ETA for a unit, using the cache when possible.
    pub async fn unit_eta(
        &self,
        unit: &UnitNumber,
        destination: &TerminalCode,
    ) -> Result<Option<GpsEta>, GpsError> {
        let key = (unit.clone(), *destination);
        if let Some(cached) = self.etas.get(&key).await {
            return Ok(cached);
        }

        let fetched = self.client.unit_eta(unit, destination).await?;
        self.etas.insert(key, fetched.clone()).await;
        Ok(fetched)
    }

    /// Live ETA, with provider failures logged and treated as no estimate.
    pub async fn unit_eta_or_none(
        &self,
        unit: &UnitNumber,
        destination: &TerminalCode,
    ) -> Option<GpsEta> {
        match self.unit_eta(unit, destination).await {
            Ok(eta) => eta,
            Err(e) => {
                warn!(unit = %unit, destination = %destination, error = %e, "GPS lookup failed");
                None
            }
        }
    }

    /// Look up several units concurrently. Results follow the input order.
    pub async fn unit_etas(&self, requests: &[EtaKey]) -> Vec<Option<GpsEta>> {
        join_all(
            requests
                .iter()
                .map(|(unit, destination)| self.unit_eta_or_none(unit, destination)),
        )
        .await
    }

    pub fn cache_entry_count(&self) -> u64 {
        self.etas.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gps::GpsConfig;

    #[test]
    fn default_config() {
        let config = GpsCacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(60));
        assert_eq!(config.max_capacity, 1000);
    }

    #[tokio::test]
    async fn empty_batch_makes_no_requests() {
        let client = GpsClient::new(GpsConfig::new("http://127.0.0.1:9", "key")).unwrap();
        let cached = CachedGpsClient::new(client, &GpsCacheConfig::default());
        assert!(cached.unit_etas(&[]).await.is_empty());
        assert_eq!(cached.cache_entry_count(), 0);
    }

    #[tokio::test]
    async fn unreachable_provider_degrades_to_no_estimate() {
        let client = GpsClient::new(GpsConfig::new("http://127.0.0.1:9", "key").with_timeout(1))
            .unwrap();
        let cached = CachedGpsClient::new(client, &GpsCacheConfig::default());
        let den = TerminalCode::parse("DEN").unwrap();
        assert_eq!(cached.unit_eta_or_none(&"TR10".into(), &den).await, None);
    }
}
