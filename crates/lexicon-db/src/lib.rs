//! Load, merge and write phonetic lexicons with strict validation.
//!
//! A lexicon file holds one entry per line: a word form followed by the phones
//! of one transcription, separated by whitespace. Extra transcriptions of the
//! same word are written as `word(2)`, `word(3)`, ... and accumulate in the
//! order they appear. Loading is all-or-nothing: the first malformed line
//! aborts with [`LexiconError::MalformedEntry`] carrying the file and the
//! 1-based line number.
//!
//! # Features
//! - [`Lexicon`] keeps words sorted and transcriptions in insertion order, so
//!   the first transcription is always the primary one.
//! - Two output layouts via [`Format`]: the annotated dictionary layout and
//!   the tab-separated record layout consumed by G2P trainers.
//! - Writes go through a temporary file that is persisted only on success, so
//!   a failed write never leaves a truncated output behind.
//! - [`Lexicon::merge`] unions predictions into an existing lexicon without
//!   ever dropping or duplicating a transcription.
//!
//! # Example
//! ```no_run
//! use lexicon_db::{Format, load_lexicon, write_lexicon};
//!
//! # fn main() -> Result<(), lexicon_db::LexiconError> {
//! let lexicon = load_lexicon("data/train.dic")?;
//! if let Some(prons) = lexicon.get("cat") {
//!     println!("cat has {} transcriptions, primary: {}", prons.len(), prons[0]);
//! }
//! write_lexicon("data/train.tsv", &lexicon, Format::Tabbed)?;
//! # Ok(()) }
//! ```

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::btree_map::Entry;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use lexicon_types::{EntryError, Transcription, Word};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

/// Label used for lexicons that were not read from a file.
pub const MEMORY_SOURCE: &str = "<memory>";

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("{file}: {source}")]
    Io { file: String, source: io::Error },
    #[error("file \"{file}\": line {line} is wrong: {reason}")]
    MalformedEntry {
        file: String,
        line: usize,
        reason: EntryError,
    },
    #[error("file \"{file}\": line {line}: word \"{word}\" is duplicated")]
    DuplicateWord {
        file: String,
        line: usize,
        word: String,
    },
}

impl LexiconError {
    fn io(file: &str, source: io::Error) -> Self {
        LexiconError::Io {
            file: file.to_string(),
            source,
        }
    }
}

/// Output layout for [`Lexicon::write_to`] and [`write_lexicon`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Format {
    /// `word phones` for the primary transcription, `word(N) phones` after it.
    #[default]
    Indexed,
    /// `word\tphones` for every transcription, without annotations.
    Tabbed,
}

/// Words mapped to their transcriptions, primary first.
#[derive(Clone, Debug)]
pub struct Lexicon {
    source: String,
    entries: BTreeMap<Word, Vec<Transcription>>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Lexicon {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for Lexicon {}

impl Lexicon {
    pub fn new() -> Self {
        Self::with_source(MEMORY_SOURCE)
    }

    /// An empty lexicon labelled with where its entries come from.
    pub fn with_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Load and validate a lexicon file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LexiconError> {
        let path = path.as_ref();
        let label = path.display().to_string();
        let file = File::open(path).map_err(|e| LexiconError::io(&label, e))?;
        Self::from_reader(BufReader::new(file), &label)
    }

    /// Parse lexicon lines from any reader. `source` names it in errors.
    pub fn from_reader<R: BufRead>(reader: R, source: &str) -> Result<Self, LexiconError> {
        let mut lexicon = Self::with_source(source);
        for_each_line(reader, source, |lineno, line| {
            let parsed = parse_entry(line).map_err(|reason| LexiconError::MalformedEntry {
                file: source.to_string(),
                line: lineno,
                reason,
            })?;
            if let Some((word, transcription)) = parsed {
                lexicon.insert(word, transcription);
            }
            Ok(())
        })?;
        info!(
            "loaded {} words ({} transcriptions) from {}",
            lexicon.len(),
            lexicon.transcription_count(),
            source
        );
        Ok(lexicon)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Append a transcription to a word, creating the word if needed.
    pub fn insert(&mut self, word: Word, transcription: Transcription) {
        self.entries.entry(word).or_default().push(transcription);
    }

    /// Union `other` into `self`.
    ///
    /// Transcriptions already listed for a word are skipped, new ones are
    /// appended after the existing ones. Returns how many were added.
    pub fn merge(&mut self, other: Lexicon) -> usize {
        let mut added = 0;
        for (word, transcriptions) in other.entries {
            match self.entries.entry(word) {
                Entry::Vacant(slot) => {
                    let mut unique: Vec<Transcription> = Vec::with_capacity(transcriptions.len());
                    for t in transcriptions {
                        if !unique.contains(&t) {
                            unique.push(t);
                        }
                    }
                    added += unique.len();
                    slot.insert(unique);
                }
                Entry::Occupied(mut slot) => {
                    let existing = slot.get_mut();
                    for t in transcriptions {
                        if !existing.contains(&t) {
                            existing.push(t);
                            added += 1;
                        }
                    }
                }
            }
        }
        added
    }

    /// Transcriptions of `word`, primary first.
    pub fn get(&self, word: &str) -> Option<&[Transcription]> {
        self.entries.get(word).map(Vec::as_slice)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(word)
    }

    /// Words in sorted order.
    pub fn words(&self) -> impl Iterator<Item = &Word> + '_ {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Word, &[Transcription])> + '_ {
        self.entries.iter().map(|(w, t)| (w, t.as_slice()))
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of transcriptions across all words.
    pub fn transcription_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Serialize every entry in `format` to a writer.
    pub fn write_to<W: Write>(&self, mut writer: W, format: Format) -> io::Result<()> {
        for (word, transcriptions) in &self.entries {
            for (idx, transcription) in transcriptions.iter().enumerate() {
                match format {
                    Format::Indexed if idx == 0 => writeln!(writer, "{word} {transcription}")?,
                    Format::Indexed => writeln!(writer, "{word}({}) {transcription}", idx + 1)?,
                    Format::Tabbed => writeln!(writer, "{word}\t{transcription}")?,
                }
            }
        }
        Ok(())
    }

    /// Atomically write the lexicon to `path`.
    pub fn save(&self, path: impl AsRef<Path>, format: Format) -> Result<(), LexiconError> {
        let path = path.as_ref();
        write_atomic(path, |w| self.write_to(w, format))?;
        debug!(
            "wrote {} words to {} ({:?})",
            self.len(),
            path.display(),
            format
        );
        Ok(())
    }
}

impl FromStr for Lexicon {
    type Err = LexiconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_reader(s.as_bytes(), MEMORY_SOURCE)
    }
}

impl fmt::Display for Lexicon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        self.write_to(&mut buf, Format::Indexed)
            .map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}

/// Load and validate a lexicon file. See [`Lexicon::load`].
pub fn load_lexicon(path: impl AsRef<Path>) -> Result<Lexicon, LexiconError> {
    Lexicon::load(path)
}

/// Write a lexicon atomically. See [`Lexicon::save`].
pub fn write_lexicon(
    path: impl AsRef<Path>,
    lexicon: &Lexicon,
    format: Format,
) -> Result<(), LexiconError> {
    lexicon.save(path, format)
}

/// Load a word-per-line list. Words are trimmed and lower-cased.
///
/// Every word must be a bare token and appear only once.
pub fn load_word_list(path: impl AsRef<Path>) -> Result<BTreeSet<Word>, LexiconError> {
    let path = path.as_ref();
    let label = path.display().to_string();
    let file = File::open(path).map_err(|e| LexiconError::io(&label, e))?;
    word_list_from_reader(BufReader::new(file), &label)
}

pub fn word_list_from_reader<R: BufRead>(
    reader: R,
    source: &str,
) -> Result<BTreeSet<Word>, LexiconError> {
    let mut words = BTreeSet::new();
    for_each_line(reader, source, |lineno, line| {
        let normalized = line.trim().to_lowercase();
        if normalized.is_empty() {
            return Ok(());
        }
        let word = Word::parse(&normalized).map_err(|reason| LexiconError::MalformedEntry {
            file: source.to_string(),
            line: lineno,
            reason: EntryError::InvalidToken {
                token: normalized.clone(),
                reason,
            },
        })?;
        if words.contains(&word) {
            return Err(LexiconError::DuplicateWord {
                file: source.to_string(),
                line: lineno,
                word: normalized,
            });
        }
        words.insert(word);
        Ok(())
    })?;
    info!("loaded {} words from word list {}", words.len(), source);
    Ok(words)
}

/// Atomically write one line per item, e.g. fold records.
pub fn write_records<T: fmt::Display>(
    path: impl AsRef<Path>,
    records: &[T],
) -> Result<(), LexiconError> {
    write_atomic(path.as_ref(), |w| {
        for record in records {
            writeln!(w, "{record}")?;
        }
        Ok(())
    })
}

/// Atomically write a plain word list, one word per line.
pub fn write_word_list<'a, I>(path: impl AsRef<Path>, words: I) -> Result<(), LexiconError>
where
    I: IntoIterator<Item = &'a Word>,
{
    write_atomic(path.as_ref(), |w| {
        for word in words {
            writeln!(w, "{word}")?;
        }
        Ok(())
    })
}

/// Parse one lexicon line. Blank lines yield `None`.
pub fn parse_entry(line: &str) -> Result<Option<(Word, Transcription)>, EntryError> {
    let mut fields = line.split_whitespace();
    let Some(token) = fields.next() else {
        return Ok(None);
    };
    let (word, _index) = Word::parse_annotated(token).map_err(|reason| EntryError::InvalidToken {
        token: token.to_string(),
        reason,
    })?;
    let transcription = Transcription::from_fields(fields)?;
    Ok(Some((word, transcription)))
}

// Feeds each line to `f` with its 1-based number. Line endings are stripped
// and undecodable lines fail with their position instead of a bare I/O error.
fn for_each_line<R, F>(mut reader: R, source: &str, mut f: F) -> Result<(), LexiconError>
where
    R: BufRead,
    F: FnMut(usize, &str) -> Result<(), LexiconError>,
{
    let mut buf = Vec::new();
    let mut lineno = 0;
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| LexiconError::io(source, e))?;
        if read == 0 {
            return Ok(());
        }
        lineno += 1;
        let bytes = buf
            .strip_suffix(b"\n")
            .map(|rest| rest.strip_suffix(b"\r").unwrap_or(rest))
            .unwrap_or(&buf);
        let line = std::str::from_utf8(bytes).map_err(|_| LexiconError::MalformedEntry {
            file: source.to_string(),
            line: lineno,
            reason: EntryError::InvalidUtf8,
        })?;
        f(lineno, line)?;
    }
}

fn write_atomic<F>(path: &Path, body: F) -> Result<(), LexiconError>
where
    F: FnOnce(&mut BufWriter<&mut NamedTempFile>) -> io::Result<()>,
{
    let label = path.display().to_string();
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(parent).map_err(|e| LexiconError::io(&label, e))?;
    {
        let mut writer = BufWriter::new(&mut temp);
        body(&mut writer).map_err(|e| LexiconError::io(&label, e))?;
        writer.flush().map_err(|e| LexiconError::io(&label, e))?;
    }
    temp.persist(path)
        .map_err(|e| LexiconError::io(&label, e.error))?;
    Ok(())
}
