//! Resolving the moment a file "happened".
//!
//! Photos carry their capture time in EXIF; everything else falls back to the
//! filesystem modification time, interpreted in local time.

use chrono::{DateTime, Local, NaiveDateTime};
use exif::{In, Reader, Tag, Value};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io::{self, BufReader};
use std::path::Path;
use tracing::{debug, trace};

/// Extensions worth probing for EXIF data.
pub const EXIF_EXTENSIONS: &[&str] = &["jpg", "jpeg", "tif", "tiff", "heic", "heif", "png", "webp"];

/// EXIF tags in priority order: capture time first.
const EXIF_DATETIME_TAGS: [Tag; 3] = [Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime];

const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Where a file's timestamp came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampSource {
    Exif,
    Modified,
}

impl fmt::Display for TimestampSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampSource::Exif => f.write_str("EXIF"),
            TimestampSource::Modified => f.write_str("Modified"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTimestamp {
    pub datetime: NaiveDateTime,
    pub source: TimestampSource,
}

/// Returns the EXIF capture time when available, otherwise the modification time.
///
/// # Errors
///
/// Fails only when the modification time itself cannot be read.
pub fn file_timestamp(path: &Path) -> io::Result<FileTimestamp> {
    if may_carry_exif(path)
        && let Some(datetime) = read_exif_datetime(path)
    {
        trace!(path = %path.display(), %datetime, "using EXIF timestamp");
        return Ok(FileTimestamp {
            datetime,
            source: TimestampSource::Exif,
        });
    }

    let modified = fs::metadata(path)?.modified()?;
    let datetime = DateTime::<Local>::from(modified).naive_local();
    trace!(path = %path.display(), %datetime, "using modification time");
    Ok(FileTimestamp {
        datetime,
        source: TimestampSource::Modified,
    })
}

/// True when the extension is a known EXIF container or the content sniffs
/// as JPEG or TIFF.
fn may_carry_exif(path: &Path) -> bool {
    let by_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            EXIF_EXTENSIONS.iter().any(|known| *known == ext)
        })
        .unwrap_or(false);
    if by_extension {
        return true;
    }

    match infer::get_from_path(path) {
        Ok(Some(kind)) => matches!(kind.mime_type(), "image/jpeg" | "image/tiff"),
        _ => false,
    }
}

/// Reads the first parseable EXIF datetime from `path`, if any.
pub fn read_exif_datetime(path: &Path) -> Option<NaiveDateTime> {
    let file = fs::File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let exif = match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no usable EXIF data");
            return None;
        }
    };

    EXIF_DATETIME_TAGS.iter().find_map(|tag| {
        let field = exif.get_field(*tag, In::PRIMARY)?;
        match &field.value {
            Value::Ascii(values) => values.first().and_then(|raw| parse_exif_datetime(raw)),
            _ => None,
        }
    })
}

/// Parses the `YYYY:MM:DD HH:MM:SS` form EXIF uses.
pub fn parse_exif_datetime(raw: &[u8]) -> Option<NaiveDateTime> {
    let text = std::str::from_utf8(raw).ok()?;
    let text = text.trim().trim_matches('\0');
    NaiveDateTime::parse_from_str(text, EXIF_DATETIME_FORMAT).ok()
}
