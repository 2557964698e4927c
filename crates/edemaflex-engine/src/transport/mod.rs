//! Peripheral transport seam: one contract, two backends.
//!
//! The state machine only ever talks to [`Transport`]; whether the other
//! end is a physical glove ([`ble::BleTransport`]) or the in-memory
//! simulator ([`mock::MockTransport`]) is decided at connect time.

pub mod ble;
pub mod mock;

use async_trait::async_trait;
use tokio::sync::mpsc;

use edemaflex_core::prelude::*;
use edemaflex_core::types::CharacteristicKey;

pub use ble::BleTransport;
pub use mock::MockTransport;

/// Channel for staged connection-phase strings ("Getting service…" etc.).
/// Receivers surface them as the human-readable connection status.
pub type StatusSender = mpsc::UnboundedSender<String>;

/// Connection stages, surfaced in order while a connect attempt runs.
/// The mock backend replays the same stages so both look identical to the
/// status surface.
pub(crate) const STAGE_REQUESTING: &str = "Requesting Bluetooth device...";
pub(crate) const STAGE_CONNECTING: &str = "Connecting to GATT server...";
pub(crate) const STAGE_SERVICE: &str = "Getting service...";
pub(crate) const STAGE_CHARACTERISTICS: &str = "Getting characteristics...";

/// Push one staged status message, ignoring a dropped receiver.
pub(crate) fn stage(status: &StatusSender, message: &str) {
    debug!("connect stage: {}", message);
    let _ = status.send(message.to_string());
}

/// Read/write surface of a connected glove peripheral.
///
/// Values on the wire are short UTF-8 payloads: bit-strings for segment
/// telemetry, digit codes for `led`, `start`, and drive levels. There is
/// no binary framing.
#[async_trait]
pub trait Transport: Send {
    /// Read the current value of one characteristic.
    async fn read_value(&mut self, key: CharacteristicKey) -> Result<String>;

    /// Write a value to one characteristic.
    async fn write_value(&mut self, key: CharacteristicKey, value: &str) -> Result<()>;

    /// Release the link. Idempotent: disconnecting a dead transport is a
    /// no-op, never an error.
    async fn disconnect(&mut self);

    /// Whether this transport is the simulator.
    fn is_mock(&self) -> bool;
}
