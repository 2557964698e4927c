//! Configuration reconciler.
//!
//! Every successful (re)connection gets the persisted configuration
//! replayed onto the board: the activation pattern first, then each
//! segment's drive level. Runs after a short settling delay so the board
//! finishes its own post-connect setup, and re-checks the connection
//! generation so a replay never lands on a newer connection than the one
//! that scheduled it.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use edemaflex_core::prelude::*;
use edemaflex_core::types::CharacteristicKey;

use crate::engine::{connection_active, settings_snapshot, write_value, EngineInner};

/// Delay between the connection succeeding and the replay starting.
pub(crate) const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Schedule the replay for the connection identified by `gen`.
pub(crate) fn spawn_apply(inner: Arc<EngineInner>, gen: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(SETTLE_DELAY).await;
        if !connection_active(&inner, gen) {
            debug!("Skipping configuration replay, connection is gone");
            return;
        }
        apply(&inner, gen).await;
    })
}

/// Push the persisted pattern and every drive level. A per-channel write
/// failure is logged and the rest still apply.
async fn apply(inner: &Arc<EngineInner>, gen: u64) {
    let settings = settings_snapshot(inner);
    let mode = settings.mode();
    info!(
        "Applying persisted configuration: pattern {}, levels {:?}",
        mode,
        settings.pwm_levels
    );

    // Pattern before any drive level.
    let code = mode.code().to_string();
    if let Err(e) = write_value(inner, CharacteristicKey::Led, &code).await {
        warn!("Failed to apply activation pattern: {}", e);
    }

    for key in CharacteristicKey::SEGMENTS {
        if !connection_active(inner, gen) {
            debug!("Connection lost mid-replay, abandoning remaining levels");
            return;
        }
        let level = settings.level_for(key).to_string();
        if let Err(e) = write_value(inner, key, &level).await {
            warn!("Failed to apply drive level for {}: {}", key, e);
        }
    }
}
