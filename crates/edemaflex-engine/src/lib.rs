//! # edemaflex-engine - Device Connection & Session Engine
//!
//! Owns the glove's wireless connection lifecycle, serializes
//! characteristic I/O, drives the session countdown and auto-stop, and
//! replays persisted configuration onto every fresh connection.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        GloveEngine                           │
//! │                                                              │
//! │  commands ──▶ state machine ──▶ reader (one read in flight)  │
//! │                   │    ▲             │                       │
//! │                   │    └─ events     ▼                       │
//! │                   │          Transport (dyn)                 │
//! │                   │          ┌──────────┬───────────┐        │
//! │  reconciler ──────┘          │ BLE real │ Mock sim  │        │
//! │  (replay persisted config)   └──────────┴───────────┘        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The state machine depends only on the [`transport::Transport`] trait;
//! mock and real sessions follow identical transitions.

pub mod config;
pub mod engine;
pub(crate) mod reader;
pub(crate) mod reconciler;
pub mod transport;

pub use config::{GloveSettings, SettingsStore};
pub use engine::{GloveEngine, DEFAULT_SESSION_DURATION};
pub use transport::{BleTransport, MockTransport, Transport};

// Re-export the core surface so engine consumers need a single import.
pub use edemaflex_core::{
    ActivationMode, CharacteristicKey, ConnectionPhase, EngineEvent, EngineStatus, Error, Result,
    SegmentReadings,
};
