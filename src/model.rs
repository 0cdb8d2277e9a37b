//! The trained language model: reference data, count tables and decoder
//! settings behind one read-only handle.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::converter::{convert, Beam, Conversion, DecodeError, DecoderConfig, Interpolation};
use crate::dict::{DictError, SyllableTable, Vocabulary};
use crate::ngram::{CodecError, NGramCounts};
use crate::symbol::SymbolMode;
use crate::train::{train_text, PhoneticOracle, TrainError};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error(transparent)]
    Dict(#[from] DictError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Train(#[from] TrainError),

    #[error("invalid model configuration: {0}")]
    InvalidConfig(String),
}

/// Hyperparameters of a model.
///
/// `order` and `mode` are recorded in the model file; the rest are
/// supplied again every time a model is loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelConfig {
    pub order: usize,
    pub mode: SymbolMode,
    pub threshold: u32,
    pub decoder: DecoderConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            order: 2,
            mode: SymbolMode::Single,
            threshold: 1,
            decoder: DecoderConfig::default(),
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        if !(2..=3).contains(&self.order) {
            return Err(ModelError::InvalidConfig(format!(
                "n-gram order must be 2 or 3, got {}",
                self.order
            )));
        }
        let Interpolation { alpha, beta } = self.decoder.weights;
        if !(0.0..=1.0).contains(&alpha) || !(0.0..=1.0).contains(&beta) {
            return Err(ModelError::InvalidConfig(format!(
                "interpolation weights must lie in [0, 1], got alpha={alpha} beta={beta}"
            )));
        }
        if alpha + beta > 1.0 {
            return Err(ModelError::InvalidConfig(format!(
                "alpha + beta must not exceed 1, got {}",
                alpha + beta
            )));
        }
        if let Some(Beam { top_num: 0, .. }) = self.decoder.beam {
            return Err(ModelError::InvalidConfig(
                "beam top_num must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Summary of the count tables, as shown by `pinyintool info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelStats {
    pub order: usize,
    pub mode: SymbolMode,
    pub num_single: u32,
    pub entries: Vec<usize>,
}

impl ModelStats {
    pub fn of(counts: &NGramCounts) -> Self {
        Self {
            order: counts.order(),
            mode: counts.mode(),
            num_single: counts.num_single(),
            entries: counts.sizes(),
        }
    }
}

/// Model file name for a given order and symbol mode.
pub fn model_file_name(order: usize, mode: SymbolMode) -> String {
    format!("{order}-gram-{}.model", mode.name())
}

/// A loaded or freshly trained model.
///
/// Decoding only reads the tables, so one `Model` can serve any number of
/// threads at once.
#[derive(Debug)]
pub struct Model {
    vocab: Vocabulary,
    syllables: SyllableTable,
    counts: NGramCounts,
    config: ModelConfig,
}

impl Model {
    /// Count `text` and prune according to `config`.
    pub fn train(
        text: &str,
        vocab: Vocabulary,
        syllables: SyllableTable,
        oracle: Option<&dyn PhoneticOracle>,
        config: ModelConfig,
    ) -> Result<Self, ModelError> {
        config.validate()?;
        check_mode(&syllables, config.mode)?;
        let counts = train_text(
            text,
            &vocab,
            &syllables,
            oracle,
            config.order,
            config.threshold,
        )?;
        Ok(Self {
            vocab,
            syllables,
            counts,
            config,
        })
    }

    /// Open a model file written by [`Model::save`].
    ///
    /// The file's order replaces `config.order`. A file written in the
    /// other symbol mode is rejected.
    pub fn load(
        path: &Path,
        vocab: Vocabulary,
        syllables: SyllableTable,
        mut config: ModelConfig,
    ) -> Result<Self, ModelError> {
        check_mode(&syllables, config.mode)?;
        let counts = NGramCounts::open(path, config.mode)?;
        config.order = counts.order();
        config.validate()?;
        info!(
            path = %path.display(),
            order = counts.order(),
            num_single = counts.num_single(),
            "model loaded"
        );
        Ok(Self {
            vocab,
            syllables,
            counts,
            config,
        })
    }

    /// Write the tables into `dir`, returning the file path.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, ModelError> {
        let path = dir.join(model_file_name(self.counts.order(), self.counts.mode()));
        self.counts.save(&path)?;
        info!(path = %path.display(), "model saved");
        Ok(path)
    }

    /// Best character sequence for `input`.
    pub fn decode<S: AsRef<str>>(&self, input: &[S]) -> Result<Vec<char>, DecodeError> {
        self.decode_scored(input).map(|c| c.chars)
    }

    /// Best character sequence together with its path probability.
    pub fn decode_scored<S: AsRef<str>>(&self, input: &[S]) -> Result<Conversion, DecodeError> {
        convert(
            &self.counts,
            &self.vocab,
            &self.syllables,
            &self.config.decoder,
            input,
        )
    }

    /// Decode independent lines in parallel. Each line succeeds or fails
    /// on its own.
    pub fn decode_batch<S>(&self, lines: &[Vec<S>]) -> Vec<Result<Conversion, DecodeError>>
    where
        S: AsRef<str> + Sync,
    {
        lines
            .par_iter()
            .map(|line| self.decode_scored(line))
            .collect()
    }

    pub fn stats(&self) -> ModelStats {
        ModelStats::of(&self.counts)
    }

    pub fn counts(&self) -> &NGramCounts {
        &self.counts
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn syllables(&self) -> &SyllableTable {
        &self.syllables
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

fn check_mode(syllables: &SyllableTable, mode: SymbolMode) -> Result<(), ModelError> {
    if syllables.mode() != mode {
        return Err(ModelError::InvalidConfig(format!(
            "syllable table was loaded in {} mode but the model is {}",
            syllables.mode().name(),
            mode.name()
        )));
    }
    Ok(())
}
