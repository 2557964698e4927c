//! # edemaflex-core - Core Domain Types
//!
//! Foundation crate for the EdemaFlex glove controller. Provides the
//! characteristic/channel model, activation patterns, connection phases,
//! engine events, error handling, and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on
//! external crates (chrono, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`CharacteristicKey`] - One of the eight fixed data channels on the glove
//! - [`ActivationMode`] - Global compression pattern (Single, Dual, Triple)
//! - [`ConnectionPhase`] - Engine lifecycle phase (Disconnected → Running)
//! - [`EngineStatus`] - Cloneable snapshot of the observable engine state
//! - [`SegmentReadings`] - Per-segment telemetry bit-string map
//!
//! ### Events (`events`)
//! - [`EngineEvent`] - Push notifications for status, telemetry, countdown,
//!   and the single end-of-session signal
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum covering connect, characteristic I/O,
//!   validation, and configuration failures
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use edemaflex_core::prelude::*;
//! ```

pub mod error;
pub mod events;
pub mod logging;
pub mod types;

/// Prelude for common imports used throughout all EdemaFlex crates
pub mod prelude {
    pub use super::error::{Error, Result};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use error::{Error, Result};
pub use events::EngineEvent;
pub use types::{
    ActivationMode, CharacteristicKey, ConnectionPhase, EngineStatus, SegmentReadings,
    DEFAULT_DRIVE_LEVEL, MAX_DRIVE_LEVEL, SERVICE_UUID,
};
