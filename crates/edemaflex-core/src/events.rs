//! Events emitted by the session engine for external collaborators.

use crate::types::CharacteristicKey;

/// Notification pushed by the engine as the session evolves.
///
/// The engine also exposes snapshot getters; the event stream exists so a
/// collaborator can render changes without polling. Events are
/// fire-and-forget: a dropped receiver never blocks the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The human-readable connection status changed.
    StatusChanged(String),
    /// A fresh telemetry value arrived for one segment channel.
    TelemetryUpdated {
        key: CharacteristicKey,
        value: String,
    },
    /// Countdown tick, formatted `mm:ss` until auto-stop.
    CountdownTick { remaining: String },
    /// The session ended autonomously (auto-stop after the configured
    /// duration). Emitted exactly once per session.
    SessionEnded,
    /// A recoverable error was surfaced to the error message.
    EngineError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_are_comparable() {
        assert_eq!(EngineEvent::SessionEnded, EngineEvent::SessionEnded);
        assert_ne!(
            EngineEvent::StatusChanged("Board started".to_string()),
            EngineEvent::SessionEnded
        );
    }

    #[test]
    fn test_telemetry_event_carries_key_and_value() {
        let event = EngineEvent::TelemetryUpdated {
            key: CharacteristicKey::Thumb,
            value: "010000".to_string(),
        };
        match event {
            EngineEvent::TelemetryUpdated { key, value } => {
                assert_eq!(key, CharacteristicKey::Thumb);
                assert_eq!(value.len(), 6);
            }
            _ => panic!("expected telemetry event"),
        }
    }
}
