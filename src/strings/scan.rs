//! Lazy scanners for ASCII and naive UTF-16LE runs.

use std::borrow::Cow;
use std::ops::Deref;

use encoding_rs::UTF_16LE;
use regex::bytes::Regex;

use super::patterns::{self, DEFAULT_MIN_LENGTH};
use super::{ExtractedString, StringFlavor};

/// Either the shared default pattern or one compiled for a custom length.
enum Pattern {
    Cached(&'static Regex),
    Owned(Regex),
}

impl Deref for Pattern {
    type Target = Regex;

    fn deref(&self) -> &Regex {
        match self {
            Pattern::Cached(re) => re,
            Pattern::Owned(re) => re,
        }
    }
}

impl Pattern {
    fn for_flavor(flavor: StringFlavor, min_length: usize) -> Option<Self> {
        if min_length == DEFAULT_MIN_LENGTH {
            return Some(match flavor {
                StringFlavor::Ascii => Pattern::Cached(&patterns::RE_ASCII_4),
                StringFlavor::Unicode => Pattern::Cached(&patterns::RE_UNICODE_4),
            });
        }
        let compiled = match flavor {
            StringFlavor::Ascii => patterns::ascii_pattern(min_length),
            StringFlavor::Unicode => patterns::unicode_pattern(min_length),
        };
        match compiled {
            Ok(re) => Some(Pattern::Owned(re)),
            Err(e) => {
                // Only reachable for lengths beyond the regex repetition limit.
                tracing::warn!(min_length, error = %e, "string pattern rejected");
                None
            }
        }
    }
}

/// Left-to-right, non-overlapping scan over a borrowed buffer.
///
/// Restartable: constructing a new scanner over the same input yields the
/// same sequence.
pub struct StringScanner<'a> {
    data: &'a [u8],
    pattern: Option<Pattern>,
    flavor: StringFlavor,
    pos: usize,
}

impl<'a> StringScanner<'a> {
    pub(crate) fn new(data: &'a [u8], min_length: usize, flavor: StringFlavor) -> Self {
        let pattern = if data.is_empty() {
            None
        } else {
            Pattern::for_flavor(flavor, min_length)
        };
        Self {
            data,
            pattern,
            flavor,
            pos: 0,
        }
    }

    /// Decode one matched run; `None` drops the run.
    fn decode(&self, run: &[u8]) -> Option<String> {
        match self.flavor {
            // The pattern only admits printable ASCII, so this cannot fail.
            StringFlavor::Ascii => std::str::from_utf8(run).ok().map(str::to_owned),
            StringFlavor::Unicode => UTF_16LE
                .decode_without_bom_handling_and_without_replacement(run)
                .map(Cow::into_owned),
        }
    }
}

impl Iterator for StringScanner<'_> {
    type Item = ExtractedString;

    fn next(&mut self) -> Option<ExtractedString> {
        loop {
            let pattern = self.pattern.as_ref()?;
            if self.pos >= self.data.len() {
                return None;
            }
            let m = pattern.find_at(self.data, self.pos)?;
            self.pos = m.end().max(self.pos + 1);
            match self.decode(m.as_bytes()) {
                Some(text) => {
                    return Some(ExtractedString {
                        text,
                        offset: m.start() as u64,
                        flavor: self.flavor,
                    })
                }
                None => {
                    tracing::trace!(offset = m.start(), "dropping undecodable utf-16 run");
                }
            }
        }
    }
}
