//! TOML-based analytics configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

/// Top-level analytics configuration parsed from TOML.
///
/// All fields have defaults matching the built-in farm settings. Load from
/// TOML with [`AnalyticsConfig::from_toml_file`] or use
/// [`AnalyticsConfig::defaults`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyticsConfig {
    /// Harvest projection tunables.
    #[serde(default)]
    pub harvest: HarvestSettings,
    /// Feeding ration and schedule tunables.
    #[serde(default)]
    pub feeding: FeedingSettings,
    /// Sample-slot ingestion tunables.
    #[serde(default)]
    pub sampling: SamplingSettings,
}

/// Harvest projection settings.
///
/// Passed by value into the growth-rate and harvest components on every
/// call, so a runtime override is picked up by the very next computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarvestSettings {
    /// Target harvest weight (g).
    pub target_weight_grams: f64,
    /// Growth rate used when history is too short or non-positive (g/day).
    pub default_growth_rate_g_per_day: f64,
}

impl HarvestSettings {
    pub const DEFAULT_TARGET_WEIGHT_G: f64 = 500.0;
    pub const DEFAULT_GROWTH_RATE_G_PER_DAY: f64 = 3.0;
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            target_weight_grams: Self::DEFAULT_TARGET_WEIGHT_G,
            default_growth_rate_g_per_day: Self::DEFAULT_GROWTH_RATE_G_PER_DAY,
        }
    }
}

/// Feeding ration settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedingSettings {
    /// Daily ration as a percentage of body weight (0-100).
    pub feeding_rate_percent: f64,
    /// Fish age assumed when a cage has never been sampled (days).
    pub default_fish_age_days: i64,
}

impl Default for FeedingSettings {
    fn default() -> Self {
        Self {
            feeding_rate_percent: 3.0,
            default_fish_age_days: 30,
        }
    }
}

/// Device-driven sample ingestion settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplingSettings {
    /// Number of sample slots opened per sampling.
    pub slots_per_sampling: usize,
    /// Maximum attempts when drawing a unique DOC code.
    pub doc_max_attempts: u32,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            slots_per_sampling: 30,
            doc_max_attempts: 32,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"harvest.target_weight_grams"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl AnalyticsConfig {
    /// Returns the built-in defaults (500 g target, 3 g/day, 3% feeding rate).
    pub fn defaults() -> Self {
        Self::default()
    }

    /// Nursery preset: small target and slow default growth for fry cages.
    pub fn nursery() -> Self {
        Self {
            harvest: HarvestSettings {
                target_weight_grams: 50.0,
                default_growth_rate_g_per_day: 0.5,
            },
            feeding: FeedingSettings {
                feeding_rate_percent: 5.0,
                default_fish_age_days: 7,
            },
            sampling: SamplingSettings::default(),
        }
    }

    /// Grow-out preset: market-size target for table fish.
    pub fn grow_out() -> Self {
        Self {
            harvest: HarvestSettings {
                target_weight_grams: 800.0,
                default_growth_rate_g_per_day: 3.5,
            },
            feeding: FeedingSettings {
                feeding_rate_percent: 2.5,
                default_fish_age_days: 60,
            },
            sampling: SamplingSettings::default(),
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["default", "nursery", "grow_out"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "default" => Ok(Self::defaults()),
            "nursery" => Ok(Self::nursery()),
            "grow_out" => Ok(Self::grow_out()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = self.harvest.validate();

        let f = &self.feeding;
        if !(f.feeding_rate_percent > 0.0 && f.feeding_rate_percent <= 100.0) {
            errors.push(ConfigError {
                field: "feeding.feeding_rate_percent".into(),
                message: "must be in (0, 100]".into(),
            });
        }
        if f.default_fish_age_days < 0 {
            errors.push(ConfigError {
                field: "feeding.default_fish_age_days".into(),
                message: "must be >= 0".into(),
            });
        }

        let s = &self.sampling;
        if !(1..=1000).contains(&s.slots_per_sampling) {
            errors.push(ConfigError {
                field: "sampling.slots_per_sampling".into(),
                message: "must be in [1, 1000]".into(),
            });
        }
        if s.doc_max_attempts == 0 {
            errors.push(ConfigError {
                field: "sampling.doc_max_attempts".into(),
                message: "must be > 0".into(),
            });
        }

        errors
    }
}

impl HarvestSettings {
    /// Validates the harvest settings against the accepted input ranges.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if !(1.0..=10_000.0).contains(&self.target_weight_grams) {
            errors.push(ConfigError {
                field: "harvest.target_weight_grams".into(),
                message: "must be in [1, 10000]".into(),
            });
        }
        if !(0.1..=100.0).contains(&self.default_growth_rate_g_per_day) {
            errors.push(ConfigError {
                field: "harvest.default_growth_rate_g_per_day".into(),
                message: "must be in [0.1, 100]".into(),
            });
        }
        errors
    }
}

/// Process-wide harvest settings that may be overridden at runtime.
///
/// Readers take a copy with [`SettingsStore::snapshot`] at the start of each
/// computation; nothing holds on to a stale value.
#[derive(Debug, Default)]
pub struct SettingsStore {
    inner: RwLock<HarvestSettings>,
}

impl SettingsStore {
    pub fn new(settings: HarvestSettings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }

    /// Current settings.
    pub fn snapshot(&self) -> HarvestSettings {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the settings after validating them.
    ///
    /// # Errors
    ///
    /// Returns every violated constraint; the stored value is left untouched.
    pub fn replace(&self, settings: HarvestSettings) -> Result<(), Vec<ConfigError>> {
        let errors = settings.validate();
        if !errors.is_empty() {
            return Err(errors);
        }
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = settings;
        tracing::info!(
            target_weight_grams = settings.target_weight_grams,
            default_growth_rate_g_per_day = settings.default_growth_rate_g_per_day,
            "harvest settings updated"
        );
        Ok(())
    }
}
