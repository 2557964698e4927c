//! Core domain types: characteristic channels, activation patterns, and
//! connection phases for the glove peripheral.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// GATT service advertised by the glove board.
pub const SERVICE_UUID: &str = "4fafc201-1fb5-459e-8fcc-c5c9c331914b";

/// Commanded drive intensity ceiling (0 = off, 5 = max).
pub const MAX_DRIVE_LEVEL: u8 = 5;

/// Drive level applied to every segment until a clinician changes it.
pub const DEFAULT_DRIVE_LEVEL: u8 = 3;

/// One of the eight data channels exposed by the glove peripheral.
///
/// The channel set is fixed by the board firmware; there is no dynamic
/// discovery. `Led` carries the activation-pattern code, `Start` the run
/// flag, and the remaining six are per-segment telemetry/drive channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CharacteristicKey {
    Led,
    Start,
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
    Palm,
}

impl CharacteristicKey {
    /// Every channel, in wire-table order.
    pub const ALL: [CharacteristicKey; 8] = [
        CharacteristicKey::Led,
        CharacteristicKey::Start,
        CharacteristicKey::Thumb,
        CharacteristicKey::Index,
        CharacteristicKey::Middle,
        CharacteristicKey::Ring,
        CharacteristicKey::Pinky,
        CharacteristicKey::Palm,
    ];

    /// The six segment channels (telemetry + drive level).
    pub const SEGMENTS: [CharacteristicKey; 6] = [
        CharacteristicKey::Thumb,
        CharacteristicKey::Index,
        CharacteristicKey::Middle,
        CharacteristicKey::Ring,
        CharacteristicKey::Pinky,
        CharacteristicKey::Palm,
    ];

    /// Lowercase channel name as used in settings files and status lines.
    pub fn name(&self) -> &'static str {
        match self {
            CharacteristicKey::Led => "led",
            CharacteristicKey::Start => "start",
            CharacteristicKey::Thumb => "thumb",
            CharacteristicKey::Index => "index",
            CharacteristicKey::Middle => "middle",
            CharacteristicKey::Ring => "ring",
            CharacteristicKey::Pinky => "pinky",
            CharacteristicKey::Palm => "palm",
        }
    }

    /// Fixed GATT characteristic address for this channel.
    pub fn uuid(&self) -> &'static str {
        match self {
            CharacteristicKey::Led => "19b10011-e8f2-537e-4f6c-d104768a1214",
            CharacteristicKey::Start => "19b10013-e8f2-537e-4f6c-d104768a1214",
            CharacteristicKey::Thumb => "19b10014-e8f2-537e-4f6c-d104768a1214",
            CharacteristicKey::Index => "19b10015-e8f2-537e-4f6c-d104768a1214",
            CharacteristicKey::Middle => "19b10016-e8f2-537e-4f6c-d104768a1214",
            CharacteristicKey::Ring => "19b10017-e8f2-537e-4f6c-d104768a1214",
            CharacteristicKey::Pinky => "19b10018-e8f2-537e-4f6c-d104768a1214",
            CharacteristicKey::Palm => "19b10019-e8f2-537e-4f6c-d104768a1214",
        }
    }

    /// Whether this channel carries per-segment telemetry.
    pub fn is_segment(&self) -> bool {
        !matches!(self, CharacteristicKey::Led | CharacteristicKey::Start)
    }

    /// Bit-string length of this channel's telemetry value.
    ///
    /// Fingers report six actuator positions, the palm seven. `None` for
    /// the `led` and `start` control channels.
    pub fn telemetry_len(&self) -> Option<usize> {
        match self {
            CharacteristicKey::Palm => Some(7),
            key if key.is_segment() => Some(6),
            _ => None,
        }
    }

    /// All-zero telemetry value for a segment channel (`"0"` otherwise).
    pub fn idle_value(&self) -> String {
        match self.telemetry_len() {
            Some(len) => "0".repeat(len),
            None => "0".to_string(),
        }
    }

    /// Channel name with a leading capital, for status lines.
    pub fn display_name(&self) -> String {
        let name = self.name();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    }
}

impl fmt::Display for CharacteristicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CharacteristicKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CharacteristicKey::ALL
            .iter()
            .find(|key| key.name() == s)
            .copied()
            .ok_or_else(|| Error::validation(format!("unknown characteristic '{s}'")))
    }
}

/// Per-segment telemetry snapshot keyed by channel.
pub type SegmentReadings = BTreeMap<CharacteristicKey, String>;

/// Global activation pattern: how many actuators fire simultaneously.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActivationMode {
    #[default]
    Single,
    Dual,
    Triple,
}

impl ActivationMode {
    /// Decode a wire/settings code. Returns `None` outside `0..=2`.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ActivationMode::Single),
            1 => Some(ActivationMode::Dual),
            2 => Some(ActivationMode::Triple),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            ActivationMode::Single => 0,
            ActivationMode::Dual => 1,
            ActivationMode::Triple => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActivationMode::Single => "Single",
            ActivationMode::Dual => "Dual",
            ActivationMode::Triple => "Triple",
        }
    }
}

impl fmt::Display for ActivationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Point-in-time snapshot of the engine's observable state.
///
/// This is what external collaborators (CLI, UI) render; it carries no
/// handles into the engine and is cheap to clone.
#[derive(Debug, Clone)]
pub struct EngineStatus {
    /// Human-readable connection phase string.
    pub connection_status: String,
    /// Latest error, if any. A later successful operation clears it.
    pub error_message: Option<String>,
    pub is_connected: bool,
    pub is_running: bool,
    pub is_mock_mode: bool,
    /// Wall-clock start of the current session, if one is running.
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Countdown display, `mm:ss` until auto-stop.
    pub remaining: String,
}

/// Connection lifecycle phase of one engine instance.
///
/// `Running` implies connected; the mock/real distinction is an orthogonal
/// flag on the session, not a phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionPhase {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Running,
}

impl ConnectionPhase {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionPhase::Connected | ConnectionPhase::Running)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, ConnectionPhase::Running)
    }
}
