pub mod cli;
pub mod commands;

pub use cli::{Cli, Command, OutputFormat};
pub use commands::{CompareReport, CvReport, MergeSummary, run};
