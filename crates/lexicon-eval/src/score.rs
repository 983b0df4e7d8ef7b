use std::path::Path;

use lexicon_db::Lexicon;
use lexicon_types::{Transcription, Word};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::EvalError;
use crate::align::{EditOps, edit_ops};

/// The selected (reference, prediction) pair for one word.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Alignment<'a> {
    pub reference: &'a Transcription,
    pub predicted: &'a Transcription,
    pub ops: EditOps,
}

impl Alignment<'_> {
    /// Edits relative to the reference length.
    pub fn phone_error_rate(&self) -> f64 {
        self.ops.total() as f64 / self.reference.len() as f64
    }

    // a/|r_a| < b/|r_b| without going through floats.
    fn is_better_than(&self, other: &Alignment<'_>) -> bool {
        self.ops.total() * other.reference.len() < other.ops.total() * self.reference.len()
    }
}

/// Aggregate counts of one lexicon comparison.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Score {
    pub words: usize,
    pub word_errors: usize,
    pub substitutions: usize,
    pub deletions: usize,
    pub insertions: usize,
    pub reference_phones: usize,
}

impl Score {
    /// Word error rate in `[0, 1]`.
    pub fn wer(&self) -> f64 {
        if self.words == 0 {
            return 0.0;
        }
        self.word_errors as f64 / self.words as f64
    }

    /// Phone error rate: all edits over the phones of the selected references.
    pub fn per(&self) -> f64 {
        if self.reference_phones == 0 {
            return 0.0;
        }
        self.edits() as f64 / self.reference_phones as f64
    }

    /// `(WER, PER)`.
    pub fn rates(&self) -> (f64, f64) {
        (self.wer(), self.per())
    }

    pub fn edits(&self) -> usize {
        self.substitutions + self.deletions + self.insertions
    }

    fn add(&mut self, alignment: &Alignment<'_>) {
        self.words += 1;
        if !alignment.ops.is_exact() {
            self.word_errors += 1;
        }
        self.substitutions += alignment.ops.substitutions;
        self.deletions += alignment.ops.deletions;
        self.insertions += alignment.ops.insertions;
        self.reference_phones += alignment.reference.len();
    }
}

/// Pick the pair with the lowest edits per reference phone.
///
/// References are the outer loop and predictions the inner one; a later pair
/// only wins if it is strictly better, so ties keep the earliest pair.
/// Returns `None` if either side is empty.
pub fn best_pair<'a>(
    references: &'a [Transcription],
    predictions: &'a [Transcription],
) -> Option<Alignment<'a>> {
    let mut best: Option<Alignment<'a>> = None;
    for reference in references {
        for predicted in predictions {
            let candidate = Alignment {
                reference,
                predicted,
                ops: edit_ops(reference.phones(), predicted.phones()),
            };
            match &best {
                Some(current) if !candidate.is_better_than(current) => {}
                _ => best = Some(candidate),
            }
        }
    }
    best
}

/// Score `predicted` against `reference`. Both must hold the same words.
pub fn compare_lexicons(reference: &Lexicon, predicted: &Lexicon) -> Result<Score, EvalError> {
    check_same_words(reference, predicted)?;
    if reference.is_empty() {
        return Err(EvalError::EmptyLexicon);
    }

    // Equal key sets iterate in the same sorted order.
    let pairs: Vec<(&Word, &[Transcription], &[Transcription])> = reference
        .iter()
        .zip(predicted.iter())
        .map(|((word, refs), (_, preds))| (word, refs, preds))
        .collect();

    let alignments: Vec<(&Word, Option<Alignment<'_>>)> = pairs
        .par_iter()
        .map(|&(word, refs, preds)| (word, best_pair(refs, preds)))
        .collect();

    let mut score = Score::default();
    for (word, alignment) in alignments {
        // Lexicon entries always hold at least one transcription.
        let Some(alignment) = alignment else {
            continue;
        };
        if !alignment.ops.is_exact() {
            debug!(
                "{}: expected \"{}\", got \"{}\" ({:?})",
                word, alignment.reference, alignment.predicted, alignment.ops
            );
        }
        score.add(&alignment);
    }

    info!(
        "scored {} words: WER {:.2}%, PER {:.2}%",
        score.words,
        score.wer() * 100.0,
        score.per() * 100.0
    );
    Ok(score)
}

/// Load two lexicon files and score the second against the first.
pub fn compare_lexicon_files(
    reference: impl AsRef<Path>,
    predicted: impl AsRef<Path>,
) -> Result<Score, EvalError> {
    let reference = Lexicon::load(reference)?;
    let predicted = Lexicon::load(predicted)?;
    compare_lexicons(&reference, &predicted)
}

fn check_same_words(reference: &Lexicon, predicted: &Lexicon) -> Result<(), EvalError> {
    let missing_in_predicted: Vec<Word> = reference
        .words()
        .filter(|w| !predicted.contains(w.as_str()))
        .cloned()
        .collect();
    let missing_in_reference: Vec<Word> = predicted
        .words()
        .filter(|w| !reference.contains(w.as_str()))
        .cloned()
        .collect();
    if missing_in_predicted.is_empty() && missing_in_reference.is_empty() {
        return Ok(());
    }
    Err(EvalError::LexiconMismatch {
        reference: reference.source().to_string(),
        predicted: predicted.source().to_string(),
        missing_in_reference,
        missing_in_predicted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(text: &str) -> Lexicon {
        text.parse().unwrap()
    }

    fn t(raw: &str) -> Transcription {
        raw.parse().unwrap()
    }

    #[test]
    fn exact_prediction_scores_zero() {
        let score = compare_lexicons(&lex("cat K AE T\n"), &lex("cat K AE T\n")).unwrap();
        assert_eq!(score.rates(), (0.0, 0.0));
        assert_eq!(score.words, 1);
        assert_eq!(score.reference_phones, 3);
    }

    #[test]
    fn single_deletion() {
        let score = compare_lexicons(&lex("cat K AE T\n"), &lex("cat K AE\n")).unwrap();
        assert_eq!(score.wer(), 1.0);
        assert!((score.per() - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(score.deletions, 1);
    }

    #[test]
    fn picks_best_pair_across_variants() {
        let refs = [t("K AE T"), t("K AE DX")];
        let preds = [t("G AE DX"), t("K AE DX")];
        let best = best_pair(&refs, &preds).unwrap();
        assert_eq!(best.reference, &refs[1]);
        assert_eq!(best.predicted, &preds[1]);
        assert!(best.ops.is_exact());
    }

    #[test]
    fn normalizes_by_reference_length() {
        // One edit against four phones beats one edit against two.
        let refs = [t("T UW"), t("T UW TH S")];
        let preds = [t("T UW TH")];
        let best = best_pair(&refs, &preds).unwrap();
        assert_eq!(best.reference, &refs[1]);
        assert_eq!(best.ops.total(), 1);
        assert!((best.phone_error_rate() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn ties_keep_first_pair() {
        let refs = [t("K AE T"), t("K AH T")];
        let preds = [t("K EH T"), t("K IH T")];
        let best = best_pair(&refs, &preds).unwrap();
        assert_eq!(best.reference, &refs[0]);
        assert_eq!(best.predicted, &preds[0]);
    }

    #[test]
    fn per_uses_selected_reference_length() {
        let reference = lex("cat K AE T\ncat(2) K AE T S\ndog D AO G\n");
        let predicted = lex("cat K AE T S IH\ndog D AO G\n");
        let score = compare_lexicons(&reference, &predicted).unwrap();
        assert_eq!(score.words, 2);
        assert_eq!(score.word_errors, 1);
        assert_eq!(score.insertions, 1);
        assert_eq!(score.reference_phones, 4 + 3);
        assert!((score.wer() - 0.5).abs() < 1e-12);
        assert!((score.per() - 1.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn mismatched_words_are_rejected() {
        let reference = lex("cat K AE T\ndog D AO G\n");
        let predicted = lex("cat K AE T\nbird B ER D\n");
        match compare_lexicons(&reference, &predicted).unwrap_err() {
            EvalError::LexiconMismatch {
                missing_in_reference,
                missing_in_predicted,
                ..
            } => {
                assert_eq!(missing_in_reference, vec!["bird".parse::<Word>().unwrap()]);
                assert_eq!(missing_in_predicted, vec!["dog".parse::<Word>().unwrap()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_lexicons_are_rejected() {
        let err = compare_lexicons(&Lexicon::new(), &Lexicon::new()).unwrap_err();
        assert!(matches!(err, EvalError::EmptyLexicon));
    }

    #[test]
    fn score_serializes_counts() {
        let score = compare_lexicons(&lex("cat K AE T\n"), &lex("cat K AE\n")).unwrap();
        let json = serde_json::to_value(score).unwrap();
        assert_eq!(json["word_errors"], 1);
        assert_eq!(json["reference_phones"], 3);
    }
}
