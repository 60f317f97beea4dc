//! Redis-backed zone store.

use crate::error::PersistenceResult;
use crate::store::{zone_key, zone_ttl, ZoneStore};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use srzone_core::{Period, Zone};
use tracing::{debug, info, warn};

/// Zone store on Redis sorted sets.
///
/// Each save runs DEL + ZADD… + EXPIRE as one MULTI/EXEC pipeline, so a
/// reader sees either the previous set or the new one, never a mix. A
/// failed save leaves the previous set to expire on its own.
#[derive(Clone)]
pub struct RedisZoneStore {
    conn: MultiplexedConnection,
}

impl RedisZoneStore {
    /// Connect to `redis_url` (e.g. `redis://127.0.0.1:6379/`).
    pub async fn connect(redis_url: &str) -> PersistenceResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_tokio_connection().await?;
        info!(redis_url = %redis_url, "Connected to Redis zone store");
        Ok(Self { conn })
    }

    /// Remaining expiry of a stored set in seconds (`None` when missing).
    pub async fn ttl_secs(&self, symbol: &str, period: &Period) -> PersistenceResult<Option<i64>> {
        let mut conn = self.conn.clone();
        let ttl: i64 = conn.ttl(zone_key(symbol, period)).await?;
        // -2: no key, -1: no expiry
        Ok((ttl >= 0).then_some(ttl))
    }
}

#[async_trait]
impl ZoneStore for RedisZoneStore {
    async fn save_zones(
        &self,
        symbol: &str,
        period: &Period,
        zones: &[Zone],
    ) -> PersistenceResult<()> {
        let key = zone_key(symbol, period);
        let ttl = zone_ttl(period);

        let mut pipe = redis::pipe();
        pipe.atomic().del(&key).ignore();

        let mut written = 0usize;
        for zone in zones {
            match serde_json::to_string(zone) {
                Ok(member) => {
                    pipe.zadd(&key, member, zone.price_center).ignore();
                    written += 1;
                }
                Err(e) => {
                    warn!(
                        %symbol,
                        %period,
                        price_center = zone.price_center,
                        error = %e,
                        "Skipping zone that failed to serialize"
                    );
                }
            }
        }

        pipe.cmd("EXPIRE").arg(&key).arg(ttl.as_secs()).ignore();

        let mut conn = self.conn.clone();
        pipe.query_async::<_, ()>(&mut conn).await?;

        debug!(
            key = %key,
            zones = written,
            ttl_secs = ttl.as_secs(),
            "Zone set replaced"
        );
        Ok(())
    }

    async fn get_zones(&self, symbol: &str, period: &Period) -> PersistenceResult<Vec<Zone>> {
        let key = zone_key(symbol, period);
        let mut conn = self.conn.clone();
        let members: Vec<String> = conn.zrange(&key, 0, -1).await?;
        Ok(decode_zones(&key, &members))
    }

    fn backend_type(&self) -> &'static str {
        "redis"
    }
}

/// Decode sorted-set members, skipping records that are not valid zones.
fn decode_zones(key: &str, members: &[String]) -> Vec<Zone> {
    members
        .iter()
        .filter_map(|member| match serde_json::from_str::<Zone>(member) {
            Ok(zone) => Some(zone),
            Err(e) => {
                warn!(key = %key, error = %e, "Skipping unreadable zone record");
                None
            }
        })
        .collect()
}
