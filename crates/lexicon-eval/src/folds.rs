use std::fmt;

use lexicon_db::Lexicon;
use lexicon_types::{Transcription, Word};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::info;

use crate::EvalError;
use crate::score::Score;

/// One `word\ttranscription` line of a fold file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FoldRecord {
    pub word: Word,
    pub transcription: Transcription,
}

impl fmt::Display for FoldRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.word, self.transcription)
    }
}

/// Training and testing records of one cross-validation round.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Fold {
    index: usize,
    train: Vec<FoldRecord>,
    test: Vec<FoldRecord>,
}

impl Fold {
    /// 0-based position of this fold.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn train(&self) -> &[FoldRecord] {
        &self.train
    }

    pub fn test(&self) -> &[FoldRecord] {
        &self.test
    }

    /// Distinct test words in sorted order, as fed to a decoder.
    pub fn test_words(&self) -> Vec<&Word> {
        distinct_words(&self.test)
    }

    pub fn train_words(&self) -> Vec<&Word> {
        distinct_words(&self.train)
    }

    pub fn train_lexicon(&self) -> Lexicon {
        to_lexicon(&self.train, format!("fold {} train", self.index))
    }

    /// Reference lexicon to score this fold's predictions against.
    pub fn test_lexicon(&self) -> Lexicon {
        to_lexicon(&self.test, format!("fold {} test", self.index))
    }
}

/// Split a lexicon into `k` train/test folds.
///
/// Sorted words are shuffled once with a `StdRng` seeded from `seed`, then cut
/// into `k` blocks of `n / k` words. The last block runs to the end of the
/// list, so it also takes the `n % k` remainder and every word is tested in
/// exactly one fold.
pub fn split(lexicon: &Lexicon, k: usize, seed: u64) -> Result<Vec<Fold>, EvalError> {
    let available = lexicon.len();
    if k == 0 || k > available {
        return Err(EvalError::InvalidFoldCount {
            requested: k,
            available,
        });
    }

    let mut words: Vec<&Word> = lexicon.words().collect();
    let mut rng = StdRng::seed_from_u64(seed);
    words.shuffle(&mut rng);

    let block = available / k;
    let folds: Vec<Fold> = (0..k)
        .map(|index| {
            let start = index * block;
            let end = if index + 1 == k { available } else { start + block };

            let mut test_words = words[start..end].to_vec();
            test_words.sort();
            let mut train_words: Vec<&Word> =
                words[..start].iter().chain(&words[end..]).copied().collect();
            train_words.sort();

            Fold {
                index,
                train: expand(lexicon, &train_words),
                test: expand(lexicon, &test_words),
            }
        })
        .collect();

    info!(
        "split {} words into {} folds (seed {}, {} words per fold, {} left over for the last)",
        available,
        k,
        seed,
        block,
        available % k
    );
    Ok(folds)
}

fn expand(lexicon: &Lexicon, words: &[&Word]) -> Vec<FoldRecord> {
    words
        .iter()
        .flat_map(|word| {
            lexicon
                .get(word.as_str())
                .unwrap_or_default()
                .iter()
                .map(move |transcription| FoldRecord {
                    word: (*word).clone(),
                    transcription: transcription.clone(),
                })
        })
        .collect()
}

fn distinct_words(records: &[FoldRecord]) -> Vec<&Word> {
    let mut words: Vec<&Word> = records.iter().map(|r| &r.word).collect();
    words.dedup();
    words
}

fn to_lexicon(records: &[FoldRecord], source: String) -> Lexicon {
    let mut lexicon = Lexicon::with_source(source);
    for record in records {
        lexicon.insert(record.word.clone(), record.transcription.clone());
    }
    lexicon
}

/// Mean and population standard deviation of per-fold rates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CrossValidation {
    pub folds: usize,
    pub wer_mean: f64,
    pub wer_std: f64,
    pub per_mean: f64,
    pub per_std: f64,
}

impl CrossValidation {
    /// Summarize fold scores; `None` when there are none.
    pub fn summarize(scores: &[Score]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }
        let wers: Vec<f64> = scores.iter().map(Score::wer).collect();
        let pers: Vec<f64> = scores.iter().map(Score::per).collect();
        let (wer_mean, wer_std) = mean_std(&wers);
        let (per_mean, per_std) = mean_std(&pers);
        Some(Self {
            folds: scores.len(),
            wer_mean,
            wer_std,
            per_mean,
            per_std,
        })
    }
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}
