//! Simulated glove peripheral.
//!
//! Generates the same telemetry shape as the board firmware without any
//! hardware: a repeating 13-step activation cycle, derived purely from the
//! elapsed time since `start` was written. Because the sequence is a
//! function of the clock rather than a background task, reads are
//! deterministic and the simulator needs no teardown.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use edemaflex_core::prelude::*;
use edemaflex_core::types::CharacteristicKey;

use super::{
    stage, StatusSender, Transport, STAGE_CHARACTERISTICS, STAGE_CONNECTING, STAGE_REQUESTING,
    STAGE_SERVICE,
};

/// One activation step lasts this long before the cycle advances.
pub const STEP_PERIOD: Duration = Duration::from_secs(3);

/// Steps 0..=5 walk the six finger positions, 6..=12 the seven palm
/// positions, then the cycle repeats.
pub const CYCLE_STEPS: u64 = 13;

/// Latency simulated between connection stages.
const STAGE_DELAY: Duration = Duration::from_millis(150);

/// In-memory peripheral with the real transport's contract.
///
/// Writes to `led` and the segment (drive-level) channels are stored but
/// never influence the simulated firing sequence.
pub struct MockTransport {
    /// Last value written per control channel (`led`, `start`, levels).
    written: HashMap<CharacteristicKey, String>,
    /// When the current run started; `None` while stopped.
    started_at: Option<Instant>,
}

impl MockTransport {
    /// "Connect" to the simulator. Replays the real staged status messages
    /// with a little latency; never fails.
    pub async fn connect(status: StatusSender) -> Result<Self> {
        for message in [
            STAGE_REQUESTING,
            STAGE_CONNECTING,
            STAGE_SERVICE,
            STAGE_CHARACTERISTICS,
        ] {
            stage(&status, message);
            tokio::time::sleep(STAGE_DELAY).await;
        }

        let mut written = HashMap::new();
        for key in CharacteristicKey::ALL {
            written.insert(key, key.idle_value());
        }

        info!("Mock transport connected");
        Ok(Self {
            written,
            started_at: None,
        })
    }

    /// Current step of the activation cycle, or `None` while stopped.
    fn step(&self) -> Option<u64> {
        self.started_at
            .map(|start| (start.elapsed().as_secs() / STEP_PERIOD.as_secs()) % CYCLE_STEPS)
    }

    /// Telemetry bit-string for `key` at cycle position `step`.
    ///
    /// Steps 0..=5: position `step` fires on all five fingers, palm idle.
    /// Steps 6..=12: palm position `step - 6` fires, fingers idle.
    fn telemetry_at(key: CharacteristicKey, step: u64) -> String {
        let len = match key.telemetry_len() {
            Some(len) => len,
            None => return key.idle_value(),
        };

        let firing = if key == CharacteristicKey::Palm {
            (step >= 6).then(|| (step - 6) as usize)
        } else {
            (step < 6).then_some(step as usize)
        };

        match firing {
            Some(position) => {
                let mut bits = vec![b'0'; len];
                bits[position] = b'1';
                // Positions are always in range: step < 6 for fingers
                // (len 6), step - 6 < 7 for the palm (len 7).
                String::from_utf8(bits).unwrap_or_else(|_| key.idle_value())
            }
            None => key.idle_value(),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn read_value(&mut self, key: CharacteristicKey) -> Result<String> {
        if !key.is_segment() {
            return Ok(self
                .written
                .get(&key)
                .cloned()
                .unwrap_or_else(|| key.idle_value()));
        }

        match self.step() {
            Some(step) => Ok(Self::telemetry_at(key, step)),
            None => Ok(key.idle_value()),
        }
    }

    async fn write_value(&mut self, key: CharacteristicKey, value: &str) -> Result<()> {
        if key == CharacteristicKey::Start {
            match value {
                "1" => {
                    if self.started_at.is_none() {
                        self.started_at = Some(Instant::now());
                        debug!("Mock board started");
                    }
                }
                _ => {
                    self.started_at = None;
                    debug!("Mock board stopped");
                }
            }
        }
        self.written.insert(key, value.to_string());
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.started_at = None;
        for key in CharacteristicKey::ALL {
            self.written.insert(key, key.idle_value());
        }
        info!("Mock transport disconnected");
    }

    fn is_mock(&self) -> bool {
        true
    }
}
