//! Accuracy of decoded lines against a reference transcription.

use serde::Serialize;

/// Running totals over compared line pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Accuracy {
    pub sentences: usize,
    pub sentences_correct: usize,
    /// Characters in the reference lines.
    pub chars: usize,
    pub chars_correct: usize,
}

impl Accuracy {
    /// Score one decoded line. Characters are compared position by
    /// position; a short or missing prediction counts the rest as wrong.
    pub fn add(&mut self, predicted: &str, reference: &str) {
        self.sentences += 1;
        if predicted == reference {
            self.sentences_correct += 1;
        }
        let mut predicted = predicted.chars();
        for expected in reference.chars() {
            self.chars += 1;
            if predicted.next() == Some(expected) {
                self.chars_correct += 1;
            }
        }
    }

    pub fn sentence_accuracy(&self) -> f64 {
        ratio(self.sentences_correct, self.sentences)
    }

    pub fn char_accuracy(&self) -> f64 {
        ratio(self.chars_correct, self.chars)
    }
}

fn ratio(hit: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        hit as f64 / total as f64
    }
}

/// Compare line pairs. Extra lines on either side are scored against an
/// empty string.
pub fn score_lines<P, R>(predicted: &[P], reference: &[R]) -> Accuracy
where
    P: AsRef<str>,
    R: AsRef<str>,
{
    let mut acc = Accuracy::default();
    for i in 0..predicted.len().max(reference.len()) {
        let p = predicted.get(i).map_or("", |s| s.as_ref());
        let r = reference.get(i).map_or("", |s| s.as_ref());
        acc.add(p, r);
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_and_partial() {
        let acc = score_lines(&["清华大学", "氰化"], &["清华大学", "清华"]);
        assert_eq!(acc.sentences, 2);
        assert_eq!(acc.sentences_correct, 1);
        assert_eq!(acc.chars, 6);
        assert_eq!(acc.chars_correct, 4);
        assert!((acc.sentence_accuracy() - 0.5).abs() < 1e-12);
        assert!((acc.char_accuracy() - 4.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn short_prediction_counts_missing_chars() {
        let mut acc = Accuracy::default();
        acc.add("清", "清华");
        assert_eq!(acc.chars, 2);
        assert_eq!(acc.chars_correct, 1);
        assert_eq!(acc.sentences_correct, 0);
    }

    #[test]
    fn unequal_line_counts() {
        let acc = score_lines(&["大学"], &["大学", "清华"]);
        assert_eq!(acc.sentences, 2);
        assert_eq!(acc.sentences_correct, 1);
        assert_eq!(acc.chars_correct, 2);
        assert_eq!(acc.chars, 4);
    }

    #[test]
    fn empty_is_zero() {
        let acc = score_lines::<&str, &str>(&[], &[]);
        assert_eq!(acc.sentence_accuracy(), 0.0);
        assert_eq!(acc.char_accuracy(), 0.0);
    }

    #[test]
    fn serializes_to_json() {
        let acc = score_lines(&["清华"], &["清华"]);
        let json = serde_json::to_value(&acc).unwrap();
        assert_eq!(json["sentences_correct"], 1);
        assert_eq!(json["chars"], 2);
    }
}
