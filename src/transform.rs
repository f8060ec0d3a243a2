//! Name transformation rules.
//!
//! A file name is split into a stem and its final extension. The stem goes
//! through the selected [`CaseMode`], then the optional character rules, and
//! finally underscore cleanup. The extension is carried through untouched.
//!
//! # Examples
//!
//! ```
//! use namedrop::transform::{CaseMode, TransformOptions, transform_file_name};
//! use std::path::Path;
//!
//! let options = TransformOptions::default();
//! let name = transform_file_name(Path::new("the_lord_of_the_rings.txt"), None, &options).unwrap();
//! assert_eq!(name, "The Lord of the Rings.txt");
//!
//! let options = TransformOptions { mode: CaseMode::Lower, replace_spaces: true, ..Default::default() };
//! let name = transform_file_name(Path::new("My Holiday.JPG"), None, &options).unwrap();
//! assert_eq!(name, "my_holiday.JPG");
//! ```

use chrono::NaiveDateTime;
use chrono::format::{Item, StrftimeItems};
use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Write};
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

/// Words kept lowercase inside a title-cased name.
pub const DEFAULT_MINOR_WORDS: &[&str] = &[
    "a", "an", "the", "and", "but", "or", "nor", "for", "yet", "so", "as", "at", "by", "from",
    "in", "into", "of", "off", "on", "onto", "out", "over", "to", "up", "via", "with", "vs",
];

/// Printable characters that are reserved on at least one common filesystem.
/// Control characters are added on top of these, see [`with_control_chars`].
pub const DEFAULT_SPECIAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

pub const DEFAULT_DATETIME_FORMAT: &str = "%Y%m%d-%H%M%S";

static NOT_WORDLIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\s\-_]").expect("valid punctuation regex"));

static UNDERSCORE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_+").expect("valid underscore regex"));

/// The primary renaming rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CaseMode {
    /// Title Case with optional minor words.
    #[default]
    Title,
    /// all lower case.
    Lower,
    /// ALL UPPER CASE.
    Upper,
    /// Replace the name with the file's capture or modification time.
    #[value(name = "datetime")]
    DateTime,
}

impl fmt::Display for CaseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaseMode::Title => "title",
            CaseMode::Lower => "lower",
            CaseMode::Upper => "upper",
            CaseMode::DateTime => "datetime",
        };
        f.write_str(name)
    }
}

/// Errors produced while computing a new name for a single file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("file name is not valid UTF-8")]
    NonUtf8Name,

    #[error("path has no file name")]
    MissingFileName,

    #[error("datetime mode needs a file timestamp")]
    MissingTimestamp,

    #[error("invalid datetime format '{0}'")]
    InvalidDateTimeFormat(String),

    #[error("transformed name of '{0}' is empty")]
    EmptyName(String),

    #[error("transformed name '{0}' contains a path separator")]
    PathSeparator(String),
}

/// Everything that decides how a stem is rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOptions {
    pub mode: CaseMode,
    /// Title mode only.
    pub use_minor_words: bool,
    /// Stored lowercase.
    pub minor_words: BTreeSet<String>,
    /// Lower/upper modes only.
    pub replace_spaces: bool,
    /// Lower/upper modes only.
    pub strip_punctuation: bool,
    pub replace_special: bool,
    pub special_chars: BTreeSet<char>,
    pub datetime_format: String,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            mode: CaseMode::Title,
            use_minor_words: true,
            minor_words: normalize_minor_words(DEFAULT_MINOR_WORDS.iter().copied()),
            replace_spaces: false,
            strip_punctuation: false,
            replace_special: false,
            special_chars: with_control_chars(DEFAULT_SPECIAL_CHARS.iter().copied()),
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
        }
    }
}

/// Trims and lowercases minor words, dropping blank entries.
pub fn normalize_minor_words<'a, I>(words: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    words
        .into_iter()
        .map(|word| word.trim().to_lowercase())
        .filter(|word| !word.is_empty())
        .collect()
}

/// Builds a special character set that always contains U+0000..=U+001F.
pub fn with_control_chars<I>(chars: I) -> BTreeSet<char>
where
    I: IntoIterator<Item = char>,
{
    let mut set: BTreeSet<char> = chars.into_iter().collect();
    set.extend((0u8..32).map(char::from));
    set
}

/// Rejects strftime strings chrono cannot format for a naive datetime,
/// including offset and zone items such as `%z` and `%Z`.
pub fn validate_datetime_format(format: &str) -> Result<(), TransformError> {
    if format.trim().is_empty()
        || StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
    {
        return Err(TransformError::InvalidDateTimeFormat(format.to_string()));
    }
    format_datetime(NaiveDateTime::default(), format).map(|_| ())
}

fn format_datetime(datetime: NaiveDateTime, format: &str) -> Result<String, TransformError> {
    let mut out = String::new();
    write!(out, "{}", datetime.format(format))
        .map_err(|_| TransformError::InvalidDateTimeFormat(format.to_string()))?;
    Ok(out)
}

/// Splits a file name into `(stem, extension)`, where the extension keeps
/// its leading dot and may be empty.
pub fn split_file_name(path: &Path) -> Result<(&str, &str), TransformError> {
    let file_name = path.file_name().ok_or(TransformError::MissingFileName)?;
    let file_name = file_name.to_str().ok_or(TransformError::NonUtf8Name)?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            let stem_len = file_name.len() - ext.len() - 1;
            Ok((&file_name[..stem_len], &file_name[stem_len..]))
        }
        None => Ok((file_name, "")),
    }
}

/// Computes the new file name (stem and extension) for `path`.
///
/// `timestamp` is only consulted in [`CaseMode::DateTime`].
pub fn transform_file_name(
    path: &Path,
    timestamp: Option<NaiveDateTime>,
    options: &TransformOptions,
) -> Result<String, TransformError> {
    let (stem, ext) = split_file_name(path)?;
    let new_stem = transform_stem(stem, timestamp, options)?;
    Ok(format!("{}{}", new_stem, ext))
}

/// Applies the full rule pipeline to a bare stem.
pub fn transform_stem(
    stem: &str,
    timestamp: Option<NaiveDateTime>,
    options: &TransformOptions,
) -> Result<String, TransformError> {
    let mut name = match options.mode {
        CaseMode::DateTime => {
            let timestamp = timestamp.ok_or(TransformError::MissingTimestamp)?;
            validate_datetime_format(&options.datetime_format)?;
            format_datetime(timestamp, &options.datetime_format)?
        }
        CaseMode::Lower => stem.to_lowercase(),
        CaseMode::Upper => stem.to_uppercase(),
        CaseMode::Title => title_case(stem, options),
    };

    if matches!(options.mode, CaseMode::Lower | CaseMode::Upper) {
        if options.strip_punctuation {
            name = NOT_WORDLIKE.replace_all(&name, "").into_owned();
        }
        if options.replace_spaces {
            name = name.replace(' ', "_");
        }
    }

    if options.replace_special {
        name = name
            .chars()
            .map(|c| if options.special_chars.contains(&c) { '_' } else { c })
            .collect();
    }

    let name = UNDERSCORE_RUN.replace_all(&name, "_");
    let name = name.trim_matches('_');

    if name.is_empty() {
        return Err(TransformError::EmptyName(stem.to_string()));
    }
    if name.chars().any(std::path::is_separator) {
        return Err(TransformError::PathSeparator(name.to_string()));
    }
    Ok(name.to_string())
}

fn title_case(stem: &str, options: &TransformOptions) -> String {
    let spaced = stem.replace(['_', '-'], " ");
    let words: Vec<&str> = spaced.split_whitespace().collect();
    if words.is_empty() {
        return stem.to_string();
    }

    let last = words.len() - 1;
    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let lower = word.to_lowercase();
            if i != 0 && i != last && options.use_minor_words && options.minor_words.contains(&lower)
            {
                lower
            } else {
                capitalize(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// First character uppercased, the rest lowercased.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
