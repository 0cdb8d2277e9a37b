use tracing::debug;

use super::DecodeError;
use crate::dict::SyllableTable;
use crate::symbol::Symbol;

/// Candidate symbols for each input syllable, in syllable-table order.
///
/// Built per decode call and dropped after backtrace.
#[derive(Debug, Clone)]
pub struct Lattice {
    pub columns: Vec<Vec<Symbol>>,
}

impl Lattice {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Largest number of candidates at any position.
    pub fn width(&self) -> usize {
        self.columns.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Resolve every syllable, failing on the first one that cannot be decoded.
pub fn build_lattice<S: AsRef<str>>(
    table: &SyllableTable,
    syllables: &[S],
) -> Result<Lattice, DecodeError> {
    let mut columns = Vec::with_capacity(syllables.len());
    for syllable in syllables {
        let syllable = syllable.as_ref();
        let candidates = table
            .candidates(syllable)
            .ok_or_else(|| DecodeError::UnknownSyllable(syllable.to_string()))?;
        if candidates.is_empty() {
            return Err(DecodeError::EmptyCandidateSet(syllable.to_string()));
        }
        columns.push(candidates.to_vec());
    }
    let lattice = Lattice { columns };
    debug!(len = lattice.len(), width = lattice.width(), "lattice built");
    Ok(lattice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::Vocabulary;
    use crate::symbol::SymbolMode;

    fn table() -> SyllableTable {
        let vocab = Vocabulary::from_text("清氰华化").unwrap();
        SyllableTable::from_text("qing 清 氰\nhua 华 化\nng\n", &vocab, SymbolMode::Single)
            .unwrap()
    }

    #[test]
    fn columns_follow_input() {
        let lattice = build_lattice(&table(), &["qing", "hua", "qing"]).unwrap();
        assert_eq!(lattice.len(), 3);
        assert_eq!(lattice.width(), 2);
        assert_eq!(lattice.columns[1], vec![Symbol::single(2), Symbol::single(3)]);
    }

    #[test]
    fn unknown_syllable_fails_fast() {
        let err = build_lattice(&table(), &["qing", "zzz", "hua"]).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownSyllable(s) if s == "zzz"));
    }

    #[test]
    fn empty_candidate_set() {
        let err = build_lattice(&table(), &["ng"]).unwrap_err();
        assert!(matches!(err, DecodeError::EmptyCandidateSet(s) if s == "ng"));
    }

    #[test]
    fn empty_input() {
        let lattice = build_lattice::<&str>(&table(), &[]).unwrap();
        assert!(lattice.is_empty());
        assert_eq!(lattice.width(), 0);
    }
}
