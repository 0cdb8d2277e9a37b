use crate::converter::testutil::{exhaustive, Fixture};
use crate::converter::{convert, DecodeError, DecoderConfig};
use crate::dict::{SyllableTable, Vocabulary};
use crate::ngram::NGramCounts;
use crate::symbol::{Symbol, SymbolMode};

#[test]
fn qinghua_prefers_frequent_pair() {
    let fx = Fixture::new(2, &[("清华", 50), ("氰化", 3)]);
    let result = fx.convert(&["qing", "hua"], &exhaustive(0.9, 0.0)).unwrap();
    assert_eq!(result.text(), "清华");
    assert!(result.score > 0.0);
    assert!(!result.is_unmodeled());
}

#[test]
fn bigram_overrides_stronger_unigram() {
    // 氰 alone is twice as frequent as 清, but 清华 is the only observed pair
    let fx = Fixture::new(2, &[("清华", 50), ("氰化", 3), ("氰", 100)]);
    assert_eq!(fx.text(&["qing", "hua"], &exhaustive(0.9, 0.0)), "清华");
    // without the bigram term the unigram winner takes position 0
    assert_eq!(fx.text(&["qing", "hua"], &exhaustive(0.0, 0.0)), "氰华");
}

#[test]
fn single_syllable_picks_best_unigram() {
    let fx = Fixture::new(2, &[("打", 5), ("大", 2)]);
    assert_eq!(fx.text(&["da"], &exhaustive(0.9, 0.0)), "打");
}

#[test]
fn equal_scores_keep_first_candidate() {
    let fx = Fixture::new(2, &[("清", 5), ("氰", 5)]);
    assert_eq!(fx.text(&["qing"], &exhaustive(0.9, 0.0)), "清");
}

#[test]
fn empty_model_falls_back_to_first_candidates() {
    let fx = Fixture::new(2, &[]);
    let result = fx
        .convert(&["qing", "hua", "da"], &exhaustive(0.9, 0.0))
        .unwrap();
    assert_eq!(result.text(), "清华大");
    assert_eq!(result.score, 0.0);
    assert!(result.is_unmodeled());
}

#[test]
fn unseen_last_position_still_backtraces() {
    // 雪/学 never observed: every final score is 0, so the path restarts
    // from candidate 0 at the end and follows its zero-score pointers
    let fx = Fixture::new(2, &[("打", 3)]);
    let result = fx.convert(&["da", "xue"], &exhaustive(0.9, 0.0)).unwrap();
    assert_eq!(result.text(), "大学");
    assert_eq!(result.score, 0.0);
}

#[test]
fn longer_sentence() {
    let fx = Fixture::new(
        2,
        &[("清华大学", 20), ("打雪", 4), ("大话", 6), ("化学", 10)],
    );
    let config = exhaustive(0.9, 0.0);
    assert_eq!(fx.text(&["qing", "hua", "da", "xue"], &config), "清华大学");
    assert_eq!(fx.text(&["hua", "xue"], &config), "化学");
    assert_eq!(fx.text(&["da", "hua"], &config), "大话");
}

#[test]
fn unknown_syllable_is_reported() {
    let fx = Fixture::new(2, &[("清华", 5)]);
    let err = fx
        .convert(&["qing", "zzz"], &DecoderConfig::default())
        .unwrap_err();
    assert_eq!(err, DecodeError::UnknownSyllable("zzz".to_string()));
}

#[test]
fn empty_input_is_empty_output() {
    let fx = Fixture::new(2, &[("清华", 5)]);
    let result = fx.convert(&[], &DecoderConfig::default()).unwrap();
    assert!(result.chars.is_empty());
}

#[test]
fn decoding_is_deterministic() {
    let fx = Fixture::new(2, &[("清华大学", 3), ("青话", 3), ("氰化", 3)]);
    let config = DecoderConfig::default();
    let input = ["qing", "hua", "da", "xue", "qing", "hua"];
    let first = fx.convert(&input, &config).unwrap();
    for _ in 0..10 {
        assert_eq!(fx.convert(&input, &config).unwrap(), first);
    }
}

#[test]
fn dual_mode_keys_do_not_alias() {
    let vocab = Vocabulary::from_text("长常张大打").unwrap();
    let table = SyllableTable::from_text(
        "chang 长 常\nzhang 长 张\nda 大 打\n",
        &vocab,
        SymbolMode::Dual,
    )
    .unwrap();
    let zhang = table.index_of("zhang").unwrap();
    let chang = table.index_of("chang").unwrap();
    let da = table.index_of("da").unwrap();

    let mut counts = NGramCounts::new(2, SymbolMode::Dual);
    for _ in 0..10 {
        counts.count_segment(&[Symbol::new(0, zhang), Symbol::new(3, da)]);
    }
    counts.count_segment(&[Symbol::new(1, chang)]);
    counts.count_segment(&[Symbol::new(1, chang)]);

    let config = exhaustive(0.9, 0.0);
    let decode = |input: &[&str]| {
        convert(&counts, &vocab, &table, &config, input)
            .unwrap()
            .text()
    };
    assert_eq!(decode(&["zhang", "da"]), "长大");
    // 长 read as chang was never observed, so it cannot borrow the
    // zhang reading's counts
    assert_eq!(decode(&["chang", "da"]), "常大");
}
