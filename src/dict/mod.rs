//! Reference data loaded once per process.
//!
//! `Vocabulary` maps recognised characters to dense indices.
//! `SyllableTable` maps each pinyin syllable to its candidate symbols.

mod syllable;
mod vocabulary;

pub use syllable::SyllableTable;
pub use vocabulary::Vocabulary;

use std::io;

/// Error type for loading the vocabulary and syllable reference files.
#[derive(Debug, thiserror::Error)]
pub enum DictError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("character '{ch}' on line {line} is not in the vocabulary")]
    UnknownCharacter { ch: char, line: usize },

    #[error("vocabulary has {0} characters, more than a u16 index can address")]
    VocabularyTooLarge(usize),

    #[error("syllable table has {0} syllables, more than a u16 index can address")]
    TooManySyllables(usize),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Strip a leading UTF-8 byte-order mark, if present.
pub(crate) fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_bom_only_touches_prefix() {
        assert_eq!(strip_bom("\u{feff}qing 清"), "qing 清");
        assert_eq!(strip_bom("qing\u{feff}"), "qing\u{feff}");
        assert_eq!(strip_bom(""), "");
    }
}
