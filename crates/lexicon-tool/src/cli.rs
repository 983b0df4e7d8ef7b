use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use lexicon_db::Format;

use crate::commands::{DEFAULT_PREDICTED_NAME, DEFAULT_SEED};

#[derive(Parser, Debug)]
#[command(name = "lexicon")]
#[command(about = "Prepare, split, merge and score phonetic lexicons")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a lexicon and write it back in a normalized layout.
    Prepare {
        #[arg(short, long)]
        src: PathBuf,
        #[arg(short, long)]
        dst: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Tabbed)]
        format: OutputFormat,
    },
    /// Compute word and phone error rates of predictions against a reference.
    Compare {
        #[arg(short = 't', long = "true", alias = "reference")]
        reference: PathBuf,
        #[arg(short, long)]
        predicted: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write cross-validation train/test files, one directory per fold.
    Folds {
        #[arg(short, long)]
        lexicon: PathBuf,
        #[arg(long)]
        cv: usize,
        #[arg(short, long)]
        out: PathBuf,
        #[arg(long, env = "LEXICON_SEED", default_value_t = DEFAULT_SEED)]
        seed: u64,
    },
    /// Score every fold directory and report mean and deviation.
    CvScore {
        #[arg(short, long)]
        out: PathBuf,
        #[arg(long, default_value = DEFAULT_PREDICTED_NAME)]
        predicted_name: String,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Union predicted transcriptions into a training lexicon.
    Merge {
        #[arg(short, long)]
        words: PathBuf,
        #[arg(short, long)]
        predicted: PathBuf,
        #[arg(short, long)]
        train: Option<PathBuf>,
        #[arg(short, long)]
        dst: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Indexed,
    Tabbed,
}

impl From<OutputFormat> for Format {
    fn from(value: OutputFormat) -> Self {
        match value {
            OutputFormat::Indexed => Format::Indexed,
            OutputFormat::Tabbed => Format::Tabbed,
        }
    }
}
