//! Validated building blocks of a phonetic lexicon.
//!
//! A lexicon maps orthographic words to one or more transcriptions, each a
//! sequence of phone symbols. This crate owns the grammar for both halves:
//!
//! - [`Word`] is a canonical token: hyphen-separated segments of letters,
//!   optionally joined by single apostrophes (`don't`, `some-word`, `ёж`).
//!   Annotated forms such as `word(2)` are split by [`Word::parse_annotated`].
//! - [`Phone`] is an opaque symbol made of ASCII letters and digits that starts
//!   with an uppercase letter (`AE`, `K`, `IY1`).
//! - [`Transcription`] is a non-empty sequence of phones.
//!
//! Values can only be built through the parsers, so anything holding a `Word`
//! or `Transcription` already satisfies the grammar.
//!
//! ```rust
//! use lexicon_types::{Transcription, Word};
//!
//! let (word, index) = Word::parse_annotated("cat(2)").unwrap();
//! assert_eq!(word.as_str(), "cat");
//! assert_eq!(index, Some(2));
//!
//! let t: Transcription = "K AE DX".parse().unwrap();
//! assert_eq!(t.len(), 3);
//! assert!("K 1AE".parse::<Transcription>().is_err());
//! ```

use std::borrow::Borrow;
use std::error::Error;
use std::fmt;
use std::str::FromStr;

/// Canonical orthographic token used as a lexicon key.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Word(String);

impl Word {
    /// Parse a bare token. Index annotations like `word(2)` are rejected.
    pub fn parse(raw: &str) -> Result<Self, TokenError> {
        check_base(raw)?;
        Ok(Self(raw.to_string()))
    }

    /// Parse a token that may carry a trailing `(N)` transcription index.
    ///
    /// Returns the canonical word and the index, if one was present.
    pub fn parse_annotated(raw: &str) -> Result<(Self, Option<u32>), TokenError> {
        let (base, index) = split_index(raw)?;
        check_base(base)?;
        Ok((Self(base.to_string()), index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Word {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for Word {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A single phone symbol, compared as a whole and never by characters.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Phone(String);

impl Phone {
    pub fn parse(raw: &str) -> Result<Self, PhoneError> {
        let first = raw.chars().next().ok_or(PhoneError::Empty)?;
        if first.is_ascii_digit() {
            return Err(PhoneError::LeadingDigit);
        }
        if let Some(bad) = raw.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(PhoneError::InvalidChar(bad));
        }
        if !first.is_ascii_uppercase() {
            return Err(PhoneError::NotUppercase);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One pronunciation: a non-empty, ordered sequence of phones.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Transcription(Vec<Phone>);

impl Transcription {
    /// Build a transcription from already separated phone fields.
    pub fn from_fields<'a, I>(fields: I) -> Result<Self, EntryError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let phones = fields
            .into_iter()
            .map(|field| {
                Phone::parse(field).map_err(|reason| EntryError::InvalidPhone {
                    phone: field.to_string(),
                    reason,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if phones.is_empty() {
            return Err(EntryError::MissingTranscription);
        }
        Ok(Self(phones))
    }

    pub fn phones(&self) -> &[Phone] {
        &self.0
    }

    /// Number of phones.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Transcription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut phones = self.0.iter();
        if let Some(first) = phones.next() {
            f.write_str(first.as_str())?;
        }
        for phone in phones {
            write!(f, " {phone}")?;
        }
        Ok(())
    }
}

impl FromStr for Transcription {
    type Err = EntryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fields(s.split_whitespace())
    }
}

/// Why a raw word form is not a valid token.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TokenError {
    Empty,
    /// Parentheses that are not a single trailing `(N)` suffix.
    MalformedIndex,
    /// A `(N)` suffix whose content is not a positive integer.
    InvalidIndex(String),
    /// A hyphen-separated segment that is not letters joined by apostrophes.
    InvalidSegment(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Empty => f.write_str("token is empty"),
            TokenError::MalformedIndex => f.write_str("parentheses must form a trailing (N) suffix"),
            TokenError::InvalidIndex(raw) => {
                write!(f, "transcription index `{raw}` is not a positive integer")
            }
            TokenError::InvalidSegment(segment) => {
                write!(f, "segment `{segment}` is not alphabetic")
            }
        }
    }
}

impl Error for TokenError {}

/// Why a field is not a valid phone symbol.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PhoneError {
    Empty,
    LeadingDigit,
    NotUppercase,
    InvalidChar(char),
}

impl fmt::Display for PhoneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhoneError::Empty => f.write_str("phone is empty"),
            PhoneError::LeadingDigit => f.write_str("phone starts with a digit"),
            PhoneError::NotUppercase => f.write_str("phone does not start with an uppercase letter"),
            PhoneError::InvalidChar(c) => write!(f, "phone contains invalid character {c:?}"),
        }
    }
}

impl Error for PhoneError {}

/// Why a lexicon line is not a well-formed (word, transcription) pair.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EntryError {
    /// The line is not valid UTF-8.
    InvalidUtf8,
    MissingTranscription,
    InvalidToken { token: String, reason: TokenError },
    InvalidPhone { phone: String, reason: PhoneError },
}

impl fmt::Display for EntryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryError::InvalidUtf8 => f.write_str("line is not valid UTF-8"),
            EntryError::MissingTranscription => f.write_str("entry has no transcription"),
            EntryError::InvalidToken { token, reason } => {
                write!(f, "invalid token `{token}`: {reason}")
            }
            EntryError::InvalidPhone { phone, reason } => {
                write!(f, "invalid phone `{phone}`: {reason}")
            }
        }
    }
}

impl Error for EntryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EntryError::InvalidUtf8 | EntryError::MissingTranscription => None,
            EntryError::InvalidToken { reason, .. } => Some(reason),
            EntryError::InvalidPhone { reason, .. } => Some(reason),
        }
    }
}

/// Check a bare token against the word grammar.
pub fn check_token(raw: &str) -> bool {
    check_base(raw).is_ok()
}

fn split_index(raw: &str) -> Result<(&str, Option<u32>), TokenError> {
    match (raw.find('('), raw.find(')')) {
        (None, None) => Ok((raw, None)),
        (Some(open), Some(close)) if open > 0 && close > open && close + 1 == raw.len() => {
            let digits = &raw[open + 1..close];
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(TokenError::InvalidIndex(digits.to_string()));
            }
            match digits.parse::<u32>() {
                Ok(index) if index > 0 => Ok((&raw[..open], Some(index))),
                _ => Err(TokenError::InvalidIndex(digits.to_string())),
            }
        }
        _ => Err(TokenError::MalformedIndex),
    }
}

fn check_base(base: &str) -> Result<(), TokenError> {
    if base.is_empty() {
        return Err(TokenError::Empty);
    }
    match base.split('-').find(|segment| !is_segment(segment)) {
        Some(segment) => Err(TokenError::InvalidSegment(segment.to_string())),
        None => Ok(()),
    }
}

// Letters only, with single apostrophes strictly between letter runs.
fn is_segment(segment: &str) -> bool {
    segment
        .split('\'')
        .all(|run| !run.is_empty() && run.chars().all(char::is_alphabetic))
}
