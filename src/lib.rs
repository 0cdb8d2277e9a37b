//! Pinyin-to-character conversion with an n-gram character language model.
//!
//! Training counts unigrams, bigrams and optionally trigrams of vocabulary
//! characters (optionally paired with their syllable) over raw text;
//! decoding runs a Viterbi search over the candidate lattice of a syllable
//! sequence using interpolated maximum-likelihood estimates.

pub mod converter;
pub mod dict;
pub mod eval;
pub mod model;
pub mod ngram;
pub mod settings;
pub mod symbol;
pub mod trace_init;
pub mod train;

pub use converter::{convert, Beam, Conversion, DecodeError, DecoderConfig, Interpolation};
pub use dict::{DictError, SyllableTable, Vocabulary};
pub use model::{Model, ModelConfig, ModelError, ModelStats};
pub use ngram::{CodecError, NGramCounts};
pub use symbol::{Symbol, SymbolMode};
pub use train::{PhoneticOracle, PinyinOracle, TrainError};
