//! Presentation settings
//!
//! Persisted in LocalStorage on the web; read from a JSON file named by
//! `PRIZE_WHEEL_CONFIG` natively. Missing fields take their defaults.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::sim::{RevealTimings, SessionConfig, SpinConfig, StopTimings};

pub use crate::sim::Orientation;

/// Audio assets and levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub music_source: String,
    pub stop_sfx_source: String,
    /// Nominal background music level (0.0 - 1.0)
    pub music_volume: f32,
    /// Stop sound effect level (0.0 - 1.0)
    pub stop_sfx_volume: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            music_source: "assets/sounds/background.mp3".into(),
            stop_sfx_source: "assets/sounds/stop.mp3".into(),
            music_volume: NORMAL_VOLUME,
            stop_sfx_volume: STOP_SFX_VOLUME,
        }
    }
}

/// Stop sequence and spin timings (ms)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    pub duck_fade_ms: u64,
    pub restore_fade_ms: u64,
    pub unlock_fade_ms: u64,
    pub stop_sfx_delay_ms: u64,
    pub settle_delay_ms: u64,
    pub idle_period_ms: u64,
    pub stop_duration_ms: u64,
    pub stop_min_rotations: u32,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            duck_fade_ms: DUCK_FADE_MS,
            restore_fade_ms: RESTORE_FADE_MS,
            unlock_fade_ms: UNLOCK_FADE_MS,
            stop_sfx_delay_ms: STOP_SFX_DELAY_MS,
            settle_delay_ms: SETTLE_DELAY_MS,
            idle_period_ms: IDLE_PERIOD_MS,
            stop_duration_ms: STOP_DURATION_MS,
            stop_min_rotations: STOP_MIN_ROTATIONS,
        }
    }
}

/// End screen reveal cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealSettings {
    /// Prize items shown in portrait
    pub item_count: u8,
    pub entrance_delay_ms: u64,
    pub text_swap_ms: u64,
    pub text_phase_ms: u64,
    pub item_pop_ms: u64,
    pub item_restore_ms: u64,
    /// Each text in the text-only landscape cycle
    pub landscape_text_ms: u64,
}

impl Default for RevealSettings {
    fn default() -> Self {
        Self {
            item_count: ITEM_COUNT,
            entrance_delay_ms: ENTRANCE_DELAY_MS,
            text_swap_ms: TEXT_SWAP_MS,
            text_phase_ms: TEXT_PHASE_MS,
            item_pop_ms: ITEM_POP_MS,
            item_restore_ms: ITEM_RESTORE_MS,
            landscape_text_ms: LANDSCAPE_TEXT_MS,
        }
    }
}

/// All presentation settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub timing: TimingSettings,
    pub reveal: RevealSettings,
    /// Starting layout
    pub orientation: Orientation,
    /// Fixed seed for the resting angle; random per session if unset
    pub seed: Option<u64>,
}

impl Settings {
    /// Environment variable naming a JSON settings file (native only)
    pub const CONFIG_ENV: &'static str = "PRIZE_WHEEL_CONFIG";

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "prize_wheel_settings";

    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the sequencer cannot honor
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, volume) in [
            ("audio.music_volume", self.audio.music_volume),
            ("audio.stop_sfx_volume", self.audio.stop_sfx_volume),
        ] {
            if !(0.0..=1.0).contains(&volume) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{volume} is outside 0.0 - 1.0"),
                });
            }
        }
        if self.timing.stop_min_rotations == 0 {
            return Err(ConfigError::Invalid {
                field: "timing.stop_min_rotations",
                reason: "must be at least 1".into(),
            });
        }
        if self.timing.idle_period_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "timing.idle_period_ms",
                reason: "must be positive".into(),
            });
        }
        let reveal = &self.reveal;
        if reveal.text_phase_ms <= reveal.text_swap_ms {
            return Err(ConfigError::Invalid {
                field: "reveal.text_phase_ms",
                reason: format!(
                    "{} must be longer than text_swap_ms ({})",
                    reveal.text_phase_ms, reveal.text_swap_ms
                ),
            });
        }
        for (field, ms) in [
            ("reveal.text_swap_ms", reveal.text_swap_ms),
            ("reveal.item_pop_ms", reveal.item_pop_ms),
            ("reveal.item_restore_ms", reveal.item_restore_ms),
            ("reveal.landscape_text_ms", reveal.landscape_text_ms),
        ] {
            if ms == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be positive".into(),
                });
            }
        }
        Ok(())
    }

    /// Build the session configuration, using `fallback_seed` when no seed is set
    pub fn session_config(&self, fallback_seed: u64) -> SessionConfig {
        SessionConfig {
            music_source: self.audio.music_source.clone(),
            stop_sfx_source: self.audio.stop_sfx_source.clone(),
            music_volume: self.audio.music_volume,
            stop_sfx_volume: self.audio.stop_sfx_volume,
            timings: StopTimings {
                duck_fade_ms: self.timing.duck_fade_ms,
                restore_fade_ms: self.timing.restore_fade_ms,
                unlock_fade_ms: self.timing.unlock_fade_ms,
                stop_sfx_delay_ms: self.timing.stop_sfx_delay_ms,
                settle_delay_ms: self.timing.settle_delay_ms,
            },
            spin: SpinConfig {
                min_rotations: self.timing.stop_min_rotations,
                stop_duration_ms: self.timing.stop_duration_ms,
                idle_period_ms: self.timing.idle_period_ms,
            },
            reveal: RevealTimings {
                entrance_delay_ms: self.reveal.entrance_delay_ms,
                text_swap_ms: self.reveal.text_swap_ms,
                text_phase_ms: self.reveal.text_phase_ms,
                item_pop_ms: self.reveal.item_pop_ms,
                item_restore_ms: self.reveal.item_restore_ms,
                landscape_text_ms: self.reveal.landscape_text_ms,
            },
            item_count: self.reveal.item_count,
            orientation: self.orientation,
            seed: self.seed.unwrap_or(fallback_seed),
        }
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Load settings from the file named by `PRIZE_WHEEL_CONFIG`, or defaults
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let Ok(path) = std::env::var(Self::CONFIG_ENV) else {
            log::info!("Using default settings");
            return Self::default();
        };
        match Self::load_file(&path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path);
                settings
            }
            Err(e) => {
                log::warn!("Ignoring {}: {}", path, e);
                Self::default()
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        settings.validate().unwrap();
        let config = settings.session_config(7);
        assert_eq!(config.seed, 7);
        assert_eq!(config.music_volume, 0.15);
        assert_eq!(config.spin.stop_duration_ms, 3500);
        assert_eq!(config.reveal.text_swap_ms, 1500);
        assert_eq!(config.reveal.landscape_text_ms, 2500);
        assert_eq!(config.item_count, 4);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings =
            Settings::from_json(r#"{ "seed": 5, "orientation": "Landscape", "reveal": { "item_count": 2 } }"#)
                .unwrap();
        assert_eq!(settings.seed, Some(5));
        assert_eq!(settings.orientation, Orientation::Landscape);
        assert_eq!(settings.reveal.item_count, 2);
        assert_eq!(settings.reveal.item_pop_ms, ITEM_POP_MS);
        assert_eq!(settings.session_config(99).seed, 5);
    }

    #[test]
    fn test_rejects_bad_volume() {
        let err = Settings::from_json(r#"{ "audio": { "music_volume": 1.5 } }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "audio.music_volume",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_inverted_text_phase() {
        let err = Settings::from_json(r#"{ "reveal": { "text_swap_ms": 3000 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_rejects_zero_reveal_timings() {
        let err = Settings::from_json(
            r#"{ "orientation": "Landscape", "reveal": { "text_swap_ms": 0, "text_phase_ms": 0 } }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "reveal.text_phase_ms",
                ..
            }
        ));

        let err = Settings::from_json(r#"{ "reveal": { "text_swap_ms": 0 } }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "reveal.text_swap_ms",
                ..
            }
        ));

        for field in ["item_pop_ms", "item_restore_ms", "landscape_text_ms"] {
            let json = format!(r#"{{ "reveal": {{ "{field}": 0 }} }}"#);
            assert!(Settings::from_json(&json).is_err(), "{field}");
        }
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            Settings::from_json("{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::load_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_json_roundtrip_keeps_values() {
        let mut settings = Settings::default();
        settings.timing.stop_duration_ms = 4200;
        settings.seed = Some(1);
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }
}
