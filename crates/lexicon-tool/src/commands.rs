use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use lexicon_db::{
    Format, Lexicon, load_lexicon, load_word_list, write_lexicon, write_records, write_word_list,
};
use lexicon_eval::{CrossValidation, Score, compare_lexicons, split};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::{Cli, Command};

pub const DEFAULT_SEED: u64 = 0;
pub const DEFAULT_PREDICTED_NAME: &str = "predicted.dic";
pub const FOLD_DIR_PREFIX: &str = "fold_";
pub const TRAIN_FILE: &str = "train.tsv";
pub const TEST_FILE: &str = "test.tsv";
pub const WORDS_FILE: &str = "words.txt";

#[derive(Debug, Serialize)]
pub struct CompareReport {
    pub reference: String,
    pub predicted: String,
    pub word_error_rate: f64,
    pub phone_error_rate: f64,
    pub score: Score,
}

#[derive(Debug, Serialize)]
pub struct CvReport {
    pub summary: CrossValidation,
    pub folds: Vec<Score>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    pub words: usize,
    pub added: usize,
    pub without_transcription: Vec<String>,
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Prepare { src, dst, format } => {
            let lexicon = prepare(&src, &dst, format.into())?;
            println!(
                "Wrote {} words ({} transcriptions) to {}",
                lexicon.len(),
                lexicon.transcription_count(),
                dst.display()
            );
        }
        Command::Compare {
            reference,
            predicted,
            json,
        } => {
            let report = compare(&reference, &predicted)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!();
                println!("Word error rate: {}", percent(report.word_error_rate));
                println!("Phone error rate: {}", percent(report.phone_error_rate));
            }
        }
        Command::Folds {
            lexicon,
            cv,
            out,
            seed,
        } => {
            let dirs = write_folds(&lexicon, cv, &out, seed)?;
            println!("Wrote {} folds under {}", dirs.len(), out.display());
        }
        Command::CvScore {
            out,
            predicted_name,
            json,
        } => {
            let report = cv_score(&out, &predicted_name)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let s = &report.summary;
                println!();
                println!(
                    "Word error rate is {} +- {}",
                    percent(s.wer_mean),
                    percent(s.wer_std)
                );
                println!(
                    "Phone error rate is {} +- {}",
                    percent(s.per_mean),
                    percent(s.per_std)
                );
            }
        }
        Command::Merge {
            words,
            predicted,
            train,
            dst,
        } => {
            let summary = merge(&words, &predicted, train.as_deref(), &dst)?;
            println!(
                "Wrote {} words to {} ({} new transcriptions)",
                summary.words,
                dst.display(),
                summary.added
            );
        }
    }
    Ok(())
}

/// Validate `src` and rewrite it to `dst`.
pub fn prepare(src: &Path, dst: &Path, format: Format) -> Result<Lexicon> {
    let lexicon = load_lexicon(src).with_context(|| format!("loading {}", src.display()))?;
    write_lexicon(dst, &lexicon, format).with_context(|| format!("writing {}", dst.display()))?;
    Ok(lexicon)
}

pub fn compare(reference: &Path, predicted: &Path) -> Result<CompareReport> {
    let reference_lex =
        load_lexicon(reference).with_context(|| format!("loading {}", reference.display()))?;
    let predicted_lex =
        load_lexicon(predicted).with_context(|| format!("loading {}", predicted.display()))?;
    let score = compare_lexicons(&reference_lex, &predicted_lex)?;
    Ok(CompareReport {
        reference: reference.display().to_string(),
        predicted: predicted.display().to_string(),
        word_error_rate: score.wer(),
        phone_error_rate: score.per(),
        score,
    })
}

/// Write `fold_<i>/{train.tsv,test.tsv,words.txt}` for every fold.
///
/// Fold directories left under `out` by an earlier run are removed first, so
/// `cv_score` only ever sees the folds of this split.
pub fn write_folds(lexicon: &Path, cv: usize, out: &Path, seed: u64) -> Result<Vec<PathBuf>> {
    let source = load_lexicon(lexicon).with_context(|| format!("loading {}", lexicon.display()))?;
    let folds = split(&source, cv, seed)?;

    if out.is_dir() {
        for stale in fold_dirs(out)? {
            warn!("removing fold directory {} from an earlier run", stale.display());
            fs::remove_dir_all(&stale)
                .with_context(|| format!("removing {}", stale.display()))?;
        }
    }

    let mut dirs = Vec::with_capacity(folds.len());
    for fold in &folds {
        let dir = out.join(format!("{FOLD_DIR_PREFIX}{}", fold.index()));
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        write_records(dir.join(TRAIN_FILE), fold.train())?;
        write_records(dir.join(TEST_FILE), fold.test())?;
        write_word_list(dir.join(WORDS_FILE), fold.test_words())?;
        info!(
            "fold {}: {} training records, {} test words",
            fold.index(),
            fold.train().len(),
            fold.test_words().len()
        );
        dirs.push(dir);
    }
    Ok(dirs)
}

/// Score `<fold>/<predicted_name>` against `<fold>/test.tsv` in every fold directory.
pub fn cv_score(out: &Path, predicted_name: &str) -> Result<CvReport> {
    let dirs = fold_dirs(out)?;
    if dirs.is_empty() {
        bail!("no {FOLD_DIR_PREFIX}* directories under {}", out.display());
    }

    let mut scores = Vec::with_capacity(dirs.len());
    for dir in &dirs {
        let test = dir.join(TEST_FILE);
        let predicted = dir.join(predicted_name);
        let report = compare(&test, &predicted)
            .with_context(|| format!("scoring fold {}", dir.display()))?;
        info!(
            "{}: WER {}, PER {}",
            dir.display(),
            percent(report.word_error_rate),
            percent(report.phone_error_rate)
        );
        scores.push(report.score);
    }

    let summary = CrossValidation::summarize(&scores)
        .with_context(|| format!("no fold scores under {}", out.display()))?;
    Ok(CvReport {
        summary,
        folds: scores,
    })
}

/// Merge predictions into the training lexicon (or an empty one) and write it.
pub fn merge(
    words: &Path,
    predicted: &Path,
    train: Option<&Path>,
    dst: &Path,
) -> Result<MergeSummary> {
    let word_list = load_word_list(words).with_context(|| format!("loading {}", words.display()))?;
    let predicted_lex =
        load_lexicon(predicted).with_context(|| format!("loading {}", predicted.display()))?;
    let mut lexicon = match train {
        Some(path) => load_lexicon(path).with_context(|| format!("loading {}", path.display()))?,
        None => Lexicon::new(),
    };

    let added = lexicon.merge(predicted_lex);
    let without_transcription: Vec<String> = word_list
        .iter()
        .filter(|w| !lexicon.contains(w.as_str()))
        .map(|w| w.to_string())
        .collect();
    for word in &without_transcription {
        warn!("no transcription for \"{word}\", leaving it out");
    }

    write_lexicon(dst, &lexicon, Format::Indexed)
        .with_context(|| format!("writing {}", dst.display()))?;
    Ok(MergeSummary {
        words: lexicon.len(),
        added,
        without_transcription,
    })
}

fn fold_dirs(out: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<(usize, PathBuf)> = Vec::new();
    for entry in fs::read_dir(out).with_context(|| format!("reading {}", out.display()))? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(index) = name
            .to_str()
            .and_then(|n| n.strip_prefix(FOLD_DIR_PREFIX))
            .and_then(|n| n.parse::<usize>().ok())
        else {
            continue;
        };
        if entry.path().is_dir() {
            dirs.push((index, entry.path()));
        }
    }
    dirs.sort();
    Ok(dirs.into_iter().map(|(_, dir)| dir).collect())
}

fn percent(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}
