use std::fs;
use std::path::Path;

use clap::Parser;
use lexicon_db::{Format, load_lexicon};
use lexicon_tool::commands::{self, TEST_FILE, TRAIN_FILE, WORDS_FILE};
use lexicon_tool::{Cli, Command, OutputFormat};

const LEXICON: &str = "\
cat K AE T
cat(2) K AE DX
dog D AO G
bird B ER D
house HH AW S
mouse M AW S
";

fn write(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn parses_subcommands() {
    let cli = Cli::try_parse_from([
        "lexicon", "compare", "-t", "ref.dic", "-p", "pred.dic", "--json",
    ])
    .unwrap();
    assert!(matches!(cli.command, Command::Compare { json: true, .. }));

    let cli = Cli::try_parse_from(["lexicon", "folds", "-l", "a.dic", "--cv", "5", "-o", "out"])
        .unwrap();
    match cli.command {
        Command::Folds { cv, seed, .. } => {
            assert_eq!(cv, 5);
            assert_eq!(seed, commands::DEFAULT_SEED);
        }
        other => panic!("unexpected command: {other:?}"),
    }

    let cli = Cli::try_parse_from(["lexicon", "prepare", "-s", "a", "-d", "b"]).unwrap();
    assert!(matches!(
        cli.command,
        Command::Prepare {
            format: OutputFormat::Tabbed,
            ..
        }
    ));
    assert!(Cli::try_parse_from(["lexicon", "folds", "-l", "a.dic"]).is_err());
}

#[test]
fn prepare_rewrites_lexicon() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "src.dic", LEXICON);
    let dst = dir.path().join("dst.tsv");
    let lexicon = commands::prepare(&src, &dst, Format::Tabbed).unwrap();
    assert_eq!(lexicon.len(), 5);
    let text = fs::read_to_string(&dst).unwrap();
    assert!(text.starts_with("bird\tB ER D\ncat\tK AE T\ncat\tK AE DX\n"));
}

#[test]
fn prepare_rejects_malformed_source_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "src.dic", "cat K AE T\ncat(x) K AE DX\n");
    let dst = dir.path().join("dst.tsv");
    let err = commands::prepare(&src, &dst, Format::Tabbed).unwrap_err();
    assert!(format!("{err:#}").contains("line 2"));
    assert!(!dst.exists());
}

#[test]
fn compare_reports_rates() {
    let dir = tempfile::tempdir().unwrap();
    let reference = write(dir.path(), "ref.dic", "cat K AE T\n");
    let predicted = write(dir.path(), "pred.dic", "cat K AE\n");
    let report = commands::compare(&reference, &predicted).unwrap();
    assert_eq!(report.word_error_rate, 1.0);
    assert!((report.phone_error_rate - 1.0 / 3.0).abs() < 1e-12);
    assert_eq!(report.score.deletions, 1);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["score"]["words"], 1);
}

#[test]
fn folds_then_cv_score() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "train.dic", LEXICON);
    let out = dir.path().join("cv");
    let dirs = commands::write_folds(&src, 2, &out, 11).unwrap();
    assert_eq!(dirs.len(), 2);

    let mut tested = 0;
    for fold_dir in &dirs {
        assert!(fold_dir.join(TRAIN_FILE).is_file());
        let test = load_lexicon(fold_dir.join(TEST_FILE)).unwrap();
        let words = fs::read_to_string(fold_dir.join(WORDS_FILE)).unwrap();
        assert_eq!(words.lines().count(), test.len());
        tested += test.len();
        // Pretend the decoder got every test word exactly right.
        test.save(fold_dir.join("predicted.dic"), Format::Indexed)
            .unwrap();
    }
    assert_eq!(tested, 5);

    let report = commands::cv_score(&out, "predicted.dic").unwrap();
    assert_eq!(report.folds.len(), 2);
    assert_eq!(report.summary.wer_mean, 0.0);
    assert_eq!(report.summary.per_mean, 0.0);
}

#[test]
fn rerunning_folds_drops_earlier_folds() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "train.dic", LEXICON);
    let out = dir.path().join("cv");
    commands::write_folds(&src, 5, &out, 3).unwrap();
    fs::write(out.join("fold_4").join("predicted.dic"), "cat K AE T\n").unwrap();
    write(&out, "notes.txt", "kept\n");

    let dirs = commands::write_folds(&src, 3, &out, 3).unwrap();
    assert_eq!(dirs.len(), 3);
    assert!(!out.join("fold_3").exists());
    assert!(!out.join("fold_4").exists());
    assert!(out.join("notes.txt").is_file());

    for fold_dir in &dirs {
        let test = load_lexicon(fold_dir.join(TEST_FILE)).unwrap();
        test.save(fold_dir.join("predicted.dic"), Format::Indexed)
            .unwrap();
    }
    let report = commands::cv_score(&out, "predicted.dic").unwrap();
    assert_eq!(report.folds.len(), 3);
    assert_eq!(report.summary.folds, 3);
}

#[test]
fn cv_score_needs_fold_dirs() {
    let dir = tempfile::tempdir().unwrap();
    assert!(commands::cv_score(dir.path(), "predicted.dic").is_err());
}

#[test]
fn merge_unions_predictions() {
    let dir = tempfile::tempdir().unwrap();
    let words = write(dir.path(), "words.txt", "Cat\nzebra\nyak\n");
    let predicted = write(
        dir.path(),
        "pred.dic",
        "cat K AE T\ncat(2) K AH T\nzebra Z IY B R AH\n",
    );
    let train = write(dir.path(), "train.dic", "cat K AE T\ndog D AO G\n");
    let dst = dir.path().join("out.dic");

    let summary = commands::merge(&words, &predicted, Some(&train), &dst).unwrap();
    assert_eq!(summary.words, 3);
    assert_eq!(summary.added, 2);
    assert_eq!(summary.without_transcription, vec!["yak".to_string()]);

    let text = fs::read_to_string(&dst).unwrap();
    assert_eq!(
        text,
        "cat K AE T\ncat(2) K AH T\ndog D AO G\nzebra Z IY B R AH\n"
    );
}
