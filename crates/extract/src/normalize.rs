//! Normalization of raw tag strings into canonical values.
//!
//! Each function handles one field in isolation so that a bad value in one
//! field never affects the others.

use exn::{OptionExt, ResultExt};
use std::num::NonZeroU32;

use crate::consts::{GENRE_REGEX, TRACK_REGEX};
use crate::error::{ErrorKind, Result};
use crate::genre;

/// Trim a raw string value, treating an empty result as absent.
pub fn text(raw: &str) -> Option<&str> {
    Some(raw.trim()).filter(|s| !s.is_empty())
}

/// Resolve numeric genre references such as `(17)` or `(17)Rock` into the
/// genre name.
///
/// Anything else (free-form genres, numbers outside the genre table, numbers
/// too large to parse) is returned unchanged.
pub fn genre(raw: &str) -> &str {
    GENRE_REGEX
        .captures(raw)
        .and_then(|captures| captures[1].parse::<usize>().ok())
        .and_then(genre::by_index)
        .unwrap_or(raw)
}

/// Parse a track number, either bare (`7`) or with a total (`4/12`).
pub fn track_number(raw: &str) -> Result<NonZeroU32> {
    if let Ok(number) = raw.parse::<NonZeroU32>() {
        return Ok(number);
    }
    let captures = TRACK_REGEX.captures(raw).ok_or_raise(|| parse_error("track", raw))?;
    captures[1].parse::<NonZeroU32>().or_raise(|| parse_error("track", raw))
}

/// Parse a disc number. Only bare integers are accepted.
pub fn disc_number(raw: &str) -> Result<NonZeroU32> {
    raw.parse::<NonZeroU32>().or_raise(|| parse_error("disc", raw))
}

fn parse_error(field: &'static str, raw: &str) -> ErrorKind {
    ErrorKind::ParseError { field, value: raw.to_string() }
}
