//! Periodic liveness probe: database round-trip, broker connectivity, then a
//! heartbeat artifact external supervisors watch.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, error};

use newsranker_broker::Broker;

/// Probe forever. A failed probe skips the tick; the artifact is only
/// refreshed when both dependencies answer.
pub async fn run(pool: PgPool, broker: Broker, heartbeat_file: String, interval_secs: u64) {
    loop {
        tokio::time::sleep(Duration::from_secs(interval_secs)).await;

        if let Err(err) = newsranker_store::ping(&pool).await {
            error!(%err, "health check failed: database unreachable");
            continue;
        }

        if !broker.connected() {
            error!("health check failed: broker disconnected");
            continue;
        }

        debug!("health check ok");
        if let Err(err) = emit_heartbeat(&heartbeat_file).await {
            error!(%err, heartbeat_file, "emitting heartbeat failed");
        }
    }
}

/// Refresh the heartbeat artifact's contents and mtime.
pub async fn emit_heartbeat(path: &str) -> std::io::Result<()> {
    tokio::fs::write(path, Utc::now().to_rfc3339()).await
}
