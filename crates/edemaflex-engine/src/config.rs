//! Persisted clinician configuration: per-segment drive levels and the
//! global activation pattern, stored as TOML and surviving restarts.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use edemaflex_core::prelude::*;
use edemaflex_core::types::{
    ActivationMode, CharacteristicKey, DEFAULT_DRIVE_LEVEL, MAX_DRIVE_LEVEL,
};

const SETTINGS_FILENAME: &str = "settings.toml";
const CONFIG_DIR: &str = "edemaflex";

// ─────────────────────────────────────────────────────────────────────────────
// GloveSettings
// ─────────────────────────────────────────────────────────────────────────────

/// Settings the Configuration Reconciler replays on every (re)connection.
///
/// Exactly two entries survive restarts: the six segment drive levels and
/// the activation-pattern code. Only engine commands mutate this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GloveSettings {
    /// Drive level per segment channel name, 0..=5.
    #[serde(default = "default_pwm_levels")]
    pub pwm_levels: BTreeMap<String, u8>,

    /// Activation-pattern code, 0..=2.
    #[serde(default)]
    pub activation_mode: u8,
}

fn default_pwm_levels() -> BTreeMap<String, u8> {
    CharacteristicKey::SEGMENTS
        .iter()
        .map(|key| (key.name().to_string(), DEFAULT_DRIVE_LEVEL))
        .collect()
}

impl Default for GloveSettings {
    fn default() -> Self {
        Self {
            pwm_levels: default_pwm_levels(),
            activation_mode: ActivationMode::default().code(),
        }
    }
}

impl GloveSettings {
    /// Drive level for one segment, falling back to the default when the
    /// file predates a segment or dropped an entry.
    pub fn level_for(&self, key: CharacteristicKey) -> u8 {
        self.pwm_levels
            .get(key.name())
            .copied()
            .unwrap_or(DEFAULT_DRIVE_LEVEL)
    }

    pub fn set_level(&mut self, key: CharacteristicKey, level: u8) {
        self.pwm_levels.insert(key.name().to_string(), level);
    }

    pub fn mode(&self) -> ActivationMode {
        ActivationMode::from_code(self.activation_mode).unwrap_or_default()
    }

    pub fn set_mode(&mut self, mode: ActivationMode) {
        self.activation_mode = mode.code();
    }

    /// Drive-level view keyed by [`CharacteristicKey`], as the engine
    /// exposes it to collaborators.
    pub fn levels(&self) -> BTreeMap<CharacteristicKey, u8> {
        CharacteristicKey::SEGMENTS
            .iter()
            .map(|key| (*key, self.level_for(*key)))
            .collect()
    }

    /// Clamp any out-of-range values read from disk back into bounds.
    fn sanitize(mut self) -> Self {
        for (name, level) in self.pwm_levels.iter_mut() {
            if *level > MAX_DRIVE_LEVEL {
                warn!(
                    "Drive level {} for '{}' out of range, clamping to {}",
                    level, name, MAX_DRIVE_LEVEL
                );
                *level = MAX_DRIVE_LEVEL;
            }
        }
        if ActivationMode::from_code(self.activation_mode).is_none() {
            warn!(
                "Activation mode {} out of range, resetting to default",
                self.activation_mode
            );
            self.activation_mode = ActivationMode::default().code();
        }
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SettingsStore
// ─────────────────────────────────────────────────────────────────────────────

/// Owns the settings file. The engine reads/writes persisted configuration
/// only through this narrow interface.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store backed by an explicit file path (tests, portable installs).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the platform config location,
    /// e.g. `~/.config/edemaflex/settings.toml`.
    pub fn open_default() -> Result<Self> {
        let base = dirs::config_dir()
            .ok_or_else(|| Error::config("could not determine the user config directory"))?;
        Ok(Self::new(base.join(CONFIG_DIR).join(SETTINGS_FILENAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings from disk.
    ///
    /// Returns defaults if the file doesn't exist or can't be parsed.
    pub fn load(&self) -> GloveSettings {
        if !self.path.exists() {
            debug!("No settings file at {:?}, using defaults", self.path);
            return GloveSettings::default();
        }

        match std::fs::read_to_string(&self.path) {
            Ok(content) => match toml::from_str::<GloveSettings>(&content) {
                Ok(settings) => {
                    debug!("Loaded settings from {:?}", self.path);
                    settings.sanitize()
                }
                Err(e) => {
                    warn!("Failed to parse {:?}: {}", self.path, e);
                    GloveSettings::default()
                }
            },
            Err(e) => {
                warn!("Failed to read {:?}: {}", self.path, e);
                GloveSettings::default()
            }
        }
    }

    /// Save settings to disk.
    ///
    /// Uses atomic write (temp file + rename) for safety.
    pub fn save(&self, settings: &GloveSettings) -> Result<()> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| Error::config("settings path has no parent directory"))?;
        if !dir.exists() {
            std::fs::create_dir_all(dir)
                .map_err(|e| Error::config(format!("Failed to create settings dir: {e}")))?;
        }

        let content = toml::to_string_pretty(settings)
            .map_err(|e| Error::config(format!("Failed to serialize settings: {e}")))?;

        let temp_path = dir.join(".settings.toml.tmp");
        std::fs::write(&temp_path, &content)
            .map_err(|e| Error::config(format!("Failed to write temp file: {e}")))?;
        std::fs::rename(&temp_path, &self.path)
            .map_err(|e| Error::config(format!("Failed to rename temp file: {e}")))?;

        info!("Saved settings to {:?}", self.path);
        Ok(())
    }
}
