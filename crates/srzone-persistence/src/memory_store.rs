//! In-process zone store.
//!
//! Mirrors the Redis store's semantics (full replace, per-period expiry,
//! ordering by center) without a server. Used for dry runs and tests.

use crate::error::PersistenceResult;
use crate::store::{zone_key, zone_ttl, ZoneStore};
use async_trait::async_trait;
use parking_lot::RwLock;
use srzone_core::{Period, Zone};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

struct StoredSet {
    zones: Vec<Zone>,
    expires_at: Instant,
}

/// Zone store kept in memory.
#[derive(Default)]
pub struct MemoryZoneStore {
    sets: RwLock<HashMap<String, StoredSet>>,
}

impl MemoryZoneStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining expiry of a live set.
    pub fn ttl_remaining(&self, symbol: &str, period: &Period) -> Option<Duration> {
        let now = Instant::now();
        self.sets
            .read()
            .get(&zone_key(symbol, period))
            .filter(|set| set.expires_at > now)
            .map(|set| set.expires_at - now)
    }

    /// Number of live sets.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.sets
            .read()
            .values()
            .filter(|set| set.expires_at > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ZoneStore for MemoryZoneStore {
    async fn save_zones(
        &self,
        symbol: &str,
        period: &Period,
        zones: &[Zone],
    ) -> PersistenceResult<()> {
        let key = zone_key(symbol, period);
        let mut sorted = zones.to_vec();
        sorted.sort_by(|a, b| a.price_center.total_cmp(&b.price_center));

        let set = StoredSet {
            zones: sorted,
            expires_at: Instant::now() + zone_ttl(period),
        };
        self.sets.write().insert(key.clone(), set);

        debug!(key = %key, zones = zones.len(), "Zone set replaced (memory)");
        Ok(())
    }

    async fn get_zones(&self, symbol: &str, period: &Period) -> PersistenceResult<Vec<Zone>> {
        let key = zone_key(symbol, period);
        let now = Instant::now();
        let zones = self
            .sets
            .read()
            .get(&key)
            .filter(|set| set.expires_at > now)
            .map(|set| set.zones.clone())
            .unwrap_or_default();
        Ok(zones)
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}
