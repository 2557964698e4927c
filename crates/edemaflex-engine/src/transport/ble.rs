//! Real glove peripheral over Bluetooth Low Energy (btleplug).
//!
//! Connect resolves the fixed service and all eight characteristics up
//! front; a single missing characteristic aborts the whole attempt so the
//! engine never holds a half-usable handle.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{
    Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use tokio::time::{sleep, Instant};
use uuid::Uuid;

use edemaflex_core::prelude::*;
use edemaflex_core::types::{CharacteristicKey, SERVICE_UUID};

use super::{
    stage, StatusSender, Transport, STAGE_CHARACTERISTICS, STAGE_CONNECTING, STAGE_REQUESTING,
    STAGE_SERVICE,
};

/// How long to scan for an advertising glove before giving up.
const SCAN_WINDOW: Duration = Duration::from_secs(10);

/// Pause between peripheral-list polls while scanning.
const SCAN_POLL: Duration = Duration::from_millis(250);

/// Connected BLE glove: one peripheral handle plus the resolved
/// characteristic set. At most one lives per engine instance.
pub struct BleTransport {
    peripheral: Peripheral,
    characteristics: HashMap<CharacteristicKey, Characteristic>,
}

impl BleTransport {
    /// Scan for the glove service, open the link, and resolve every
    /// characteristic. Any resolution failure aborts the attempt with a
    /// connect error carrying the underlying cause.
    pub async fn connect(status: StatusSender) -> Result<Self> {
        let service_uuid = parse_uuid(SERVICE_UUID)?;

        stage(&status, STAGE_REQUESTING);
        let adapter = default_adapter().await?;
        let peripheral = discover_peripheral(&adapter, service_uuid).await?;

        stage(&status, STAGE_CONNECTING);
        peripheral
            .connect()
            .await
            .map_err(|e| Error::connect(format!("Failed to connect to GATT server: {e}")))?;

        stage(&status, STAGE_SERVICE);
        if let Err(e) = peripheral.discover_services().await {
            abort_connect(&peripheral).await;
            return Err(Error::connect(format!("Service discovery failed: {e}")));
        }
        let has_service = peripheral
            .services()
            .iter()
            .any(|service| service.uuid == service_uuid);
        if !has_service {
            abort_connect(&peripheral).await;
            return Err(Error::connect("Glove service not found on peripheral"));
        }

        stage(&status, STAGE_CHARACTERISTICS);
        let available = peripheral.characteristics();
        let mut characteristics = HashMap::new();
        for key in CharacteristicKey::ALL {
            let uuid = parse_uuid(key.uuid())?;
            match available.iter().find(|c| c.uuid == uuid) {
                Some(characteristic) => {
                    characteristics.insert(key, characteristic.clone());
                }
                None => {
                    abort_connect(&peripheral).await;
                    return Err(Error::connect(format!(
                        "Characteristic '{key}' not found on peripheral"
                    )));
                }
            }
        }

        info!("Connected to glove peripheral {}", peripheral.id());
        Ok(Self {
            peripheral,
            characteristics,
        })
    }

    fn characteristic(&self, key: CharacteristicKey) -> Result<&Characteristic> {
        self.characteristics.get(&key).ok_or(Error::NotConnected)
    }
}

#[async_trait]
impl Transport for BleTransport {
    async fn read_value(&mut self, key: CharacteristicKey) -> Result<String> {
        let characteristic = self.characteristic(key)?;
        let raw = self
            .peripheral
            .read(characteristic)
            .await
            .map_err(|e| Error::characteristic_io(key.name(), e.to_string()))?;
        String::from_utf8(raw)
            .map_err(|_| Error::characteristic_io(key.name(), "payload is not valid UTF-8"))
    }

    async fn write_value(&mut self, key: CharacteristicKey, value: &str) -> Result<()> {
        let characteristic = self.characteristic(key)?;
        self.peripheral
            .write(characteristic, value.as_bytes(), WriteType::WithResponse)
            .await
            .map_err(|e| Error::characteristic_io(key.name(), e.to_string()))
    }

    async fn disconnect(&mut self) {
        match self.peripheral.is_connected().await {
            Ok(true) => {
                if let Err(e) = self.peripheral.disconnect().await {
                    warn!("Failed to disconnect peripheral cleanly: {}", e);
                } else {
                    info!("Disconnected from glove peripheral");
                }
            }
            Ok(false) => {}
            Err(e) => debug!("Could not query connection state: {}", e),
        }
    }

    fn is_mock(&self) -> bool {
        false
    }
}

/// First usable Bluetooth adapter on this host.
async fn default_adapter() -> Result<Adapter> {
    let manager = Manager::new()
        .await
        .map_err(|e| Error::connect(format!("Bluetooth unavailable: {e}")))?;
    let adapters = manager
        .adapters()
        .await
        .map_err(|e| Error::connect(format!("Failed to enumerate adapters: {e}")))?;
    adapters
        .into_iter()
        .next()
        .ok_or_else(|| Error::connect("No Bluetooth adapter found"))
}

/// Scan until a peripheral advertising the glove service appears, bounded
/// by [`SCAN_WINDOW`].
async fn discover_peripheral(adapter: &Adapter, service_uuid: Uuid) -> Result<Peripheral> {
    adapter
        .start_scan(ScanFilter {
            services: vec![service_uuid],
        })
        .await
        .map_err(|e| Error::connect(format!("Failed to start scan: {e}")))?;

    let deadline = Instant::now() + SCAN_WINDOW;
    let found = loop {
        let peripherals = adapter
            .peripherals()
            .await
            .map_err(|e| Error::connect(format!("Failed to list peripherals: {e}")))?;

        let mut matched = None;
        for peripheral in peripherals {
            let Ok(Some(properties)) = peripheral.properties().await else {
                continue;
            };
            if properties.services.contains(&service_uuid) {
                matched = Some(peripheral);
                break;
            }
        }
        if let Some(peripheral) = matched {
            break Some(peripheral);
        }

        if Instant::now() >= deadline {
            break None;
        }
        sleep(SCAN_POLL).await;
    };

    if let Err(e) = adapter.stop_scan().await {
        debug!("Failed to stop scan cleanly: {}", e);
    }

    found.ok_or_else(|| Error::connect("No glove advertising the service was found"))
}

/// Best-effort disconnect after a failed connect attempt, so a half-open
/// handle is never left behind.
async fn abort_connect(peripheral: &Peripheral) {
    if let Err(e) = peripheral.disconnect().await {
        debug!("Cleanup disconnect after failed connect: {}", e);
    }
}

fn parse_uuid(text: &str) -> Result<Uuid> {
    Uuid::parse_str(text).map_err(|e| Error::connect(format!("Invalid UUID '{text}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_and_characteristic_uuids_parse() {
        assert!(parse_uuid(SERVICE_UUID).is_ok());
        for key in CharacteristicKey::ALL {
            assert!(parse_uuid(key.uuid()).is_ok(), "bad uuid for {key}");
        }
    }

    #[test]
    fn test_characteristic_uuids_share_the_board_suffix() {
        // The firmware allocates all characteristics in one UUID block;
        // resolving them relies on exact matches, not the suffix, but a
        // typo here would make connect fail against real hardware.
        for key in CharacteristicKey::ALL {
            assert!(key.uuid().ends_with("e8f2-537e-4f6c-d104768a1214"));
        }
    }
}
