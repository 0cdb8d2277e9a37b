//! Global settings loaded from TOML.
//!
//! - `init_custom(toml_content)` sets a custom TOML before first `settings()` call
//! - `settings()` returns `&'static Settings` (lazy-init singleton)
//! - Default values are embedded via `include_str!("default_settings.toml")`

use std::path::PathBuf;
use std::sync::OnceLock;

use serde::Deserialize;

use crate::converter::{Beam, DecoderConfig, Interpolation};
use crate::model::ModelConfig;
use crate::symbol::SymbolMode;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

static CUSTOM_TOML: OnceLock<String> = OnceLock::new();

/// Set custom TOML before first `settings()` call.
pub fn init_custom(toml_content: String) -> Result<(), SettingsError> {
    parse_settings_toml(&toml_content)?;
    CUSTOM_TOML
        .set(toml_content)
        .map_err(|_| SettingsError::AlreadyInitialized)
}

/// Get or initialize the global settings singleton.
pub fn settings() -> &'static Settings {
    static INSTANCE: OnceLock<Settings> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        let toml_str = CUSTOM_TOML
            .get()
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_SETTINGS_TOML);
        // custom TOML was validated by init_custom, the default by build.rs
        parse_settings_toml(toml_str).expect("settings TOML must be valid")
    })
}

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("settings already initialized")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub model: ModelSettings,
    pub decoder: DecoderSettings,
    pub data: DataSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelSettings {
    pub n_gram: usize,
    pub alpha: f64,
    pub beta: f64,
    pub threshold: u32,
    pub dual_syllable: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecoderSettings {
    pub pruning: bool,
    pub begin_cut: usize,
    pub top_num: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataSettings {
    pub vocabulary: PathBuf,
    pub syllables: PathBuf,
    pub model_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    pub unrecognized_marker: String,
}

impl Settings {
    pub fn mode(&self) -> SymbolMode {
        SymbolMode::from_dual(self.model.dual_syllable)
    }

    pub fn decoder_config(&self) -> DecoderConfig {
        DecoderConfig {
            weights: Interpolation {
                alpha: self.model.alpha,
                beta: self.model.beta,
            },
            beam: self.decoder.pruning.then_some(Beam {
                begin_cut: self.decoder.begin_cut,
                top_num: self.decoder.top_num,
            }),
        }
    }

    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            order: self.model.n_gram,
            mode: self.mode(),
            threshold: self.model.threshold,
            decoder: self.decoder_config(),
        }
    }
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings = toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    macro_rules! check_unit_interval {
        ($section:ident . $field:ident) => {
            if !(0.0..=1.0).contains(&s.$section.$field) {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must lie in [0, 1]".to_string(),
                });
            }
        };
    }
    macro_rules! check_positive_usize {
        ($section:ident . $field:ident) => {
            if s.$section.$field == 0 {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must be positive".to_string(),
                });
            }
        };
    }

    if !(2..=3).contains(&s.model.n_gram) {
        return Err(SettingsError::InvalidValue {
            field: "model.n_gram".to_string(),
            reason: "must be 2 or 3".to_string(),
        });
    }
    check_unit_interval!(model.alpha);
    check_unit_interval!(model.beta);
    if s.model.alpha + s.model.beta > 1.0 {
        return Err(SettingsError::InvalidValue {
            field: "model.beta".to_string(),
            reason: "alpha + beta must not exceed 1".to_string(),
        });
    }

    check_positive_usize!(decoder.top_num);

    Ok(())
}
