//! Precompiled byte regexes for string scanning.
//!
//! The printable class is explicit: space through tilde, plus tab. The
//! default minimum length is compiled once; other lengths are compiled on
//! demand.

use once_cell::sync::Lazy;
use regex::bytes::Regex;

/// Default minimum run length.
pub const DEFAULT_MIN_LENGTH: usize = 4;

const PRINTABLE: &str = r"[\t\x20-\x7E]";

pub static RE_ASCII_4: Lazy<Regex> =
    Lazy::new(|| ascii_pattern(DEFAULT_MIN_LENGTH).expect("valid ascii string regex"));

pub static RE_UNICODE_4: Lazy<Regex> =
    Lazy::new(|| unicode_pattern(DEFAULT_MIN_LENGTH).expect("valid unicode string regex"));

/// Runs of at least `min_length` printable bytes.
pub fn ascii_pattern(min_length: usize) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?-u){}{{{},}}", PRINTABLE, min_length.max(1)))
}

/// Runs of at least `min_length` printable bytes each followed by a NUL.
pub fn unicode_pattern(min_length: usize) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?-u)(?:{}\x00){{{},}}", PRINTABLE, min_length.max(1)))
}
