//! Score predicted phonetic lexicons and build cross-validation folds.
//!
//! Scoring follows the usual G2P evaluation: for every word, each reference
//! transcription is aligned against each predicted one with a phone-level
//! Levenshtein distance, and the pair with the lowest error relative to the
//! reference length is kept. Word error rate counts words whose best pair is
//! not an exact match; phone error rate divides all edits by the phones of the
//! selected references.
//!
//! # How it works
//! 1. Check that both lexicons cover exactly the same words.
//! 2. Align every word independently (in parallel) with [`edit_ops`].
//! 3. Keep the first pair with the lowest normalized error ([`best_pair`]).
//! 4. Sum the per-word results into a [`Score`].
//!
//! Folds come from [`split`]: the sorted words are shuffled once with an
//! explicit seed and cut into `k` contiguous blocks, the last of which takes
//! any remainder.
//!
//! # Example
//! ```rust
//! use lexicon_db::Lexicon;
//! use lexicon_eval::compare_lexicons;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let reference: Lexicon = "cat K AE T\n".parse()?;
//! let predicted: Lexicon = "cat K AE\n".parse()?;
//! let score = compare_lexicons(&reference, &predicted)?;
//! assert_eq!(score.wer(), 1.0);
//! assert!((score.per() - 1.0 / 3.0).abs() < 1e-12);
//! # Ok(()) }
//! ```

pub mod align;
pub mod folds;
pub mod score;

use lexicon_db::LexiconError;
use lexicon_types::Word;
use thiserror::Error;

pub use align::{EditOps, edit_ops};
pub use folds::{CrossValidation, Fold, FoldRecord, split};
pub use score::{Alignment, Score, best_pair, compare_lexicon_files, compare_lexicons};

#[derive(Debug, Error)]
pub enum EvalError {
    #[error(
        "file \"{predicted}\" does not correspond to file \"{reference}\": word lists are not equal ({} missing from predictions, {} not in reference)",
        .missing_in_predicted.len(),
        .missing_in_reference.len()
    )]
    LexiconMismatch {
        reference: String,
        predicted: String,
        missing_in_reference: Vec<Word>,
        missing_in_predicted: Vec<Word>,
    },
    #[error("cannot score an empty lexicon")]
    EmptyLexicon,
    #[error("fold count {requested} must be between 1 and the number of words ({available})")]
    InvalidFoldCount { requested: usize, available: usize },
    #[error(transparent)]
    Lexicon(#[from] LexiconError),
}
