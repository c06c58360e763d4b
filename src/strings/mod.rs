//! String extraction over the inspected buffer.
//!
//! Two flavors are supported: printable ASCII runs and a naive UTF-16LE
//! heuristic (printable ASCII byte followed by a literal zero byte). Both
//! scanners are lazy and restartable; [`extract_strings`] merges them into
//! one offset-ordered list.

pub mod patterns;
mod scan;

pub use scan::StringScanner;

use serde::{Deserialize, Serialize};

use crate::config::StringsConfig;

/// Encoding tag attached to an extracted string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringFlavor {
    Ascii,
    Unicode,
}

impl StringFlavor {
    /// Short label used in listings.
    pub fn label(&self) -> &'static str {
        match self {
            StringFlavor::Ascii => "ascii",
            StringFlavor::Unicode => "utf16",
        }
    }
}

/// A string found in the buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedString {
    pub text: String,
    /// Offset of the first byte of the run
    pub offset: u64,
    pub flavor: StringFlavor,
}

/// Lazily scan `data` for printable ASCII runs of at least `min_length` bytes.
pub fn extract_ascii(data: &[u8], min_length: usize) -> StringScanner<'_> {
    StringScanner::new(data, min_length, StringFlavor::Ascii)
}

/// Lazily scan `data` for naive UTF-16LE runs of at least `min_length` characters.
pub fn extract_unicode(data: &[u8], min_length: usize) -> StringScanner<'_> {
    StringScanner::new(data, min_length, StringFlavor::Unicode)
}

/// Concatenate both flavors and sort by offset.
///
/// The sort is stable, so at equal offsets ASCII strings precede UTF-16 ones.
pub fn extract_strings(data: &[u8], cfg: &StringsConfig) -> Vec<ExtractedString> {
    let mut out: Vec<ExtractedString> = Vec::new();
    if cfg.ascii {
        out.extend(extract_ascii(data, cfg.min_length));
    }
    if cfg.unicode {
        out.extend(extract_unicode(data, cfg.min_length));
    }
    out.sort_by_key(|s| s.offset);
    tracing::debug!(count = out.len(), bytes = data.len(), "extracted strings");
    out
}

/// The strings that start within `[address, address + length)`.
///
/// `strings` must be sorted by offset.
pub fn strings_in_range(
    strings: &[ExtractedString],
    address: u64,
    length: u64,
) -> &[ExtractedString] {
    let end = address.saturating_add(length);
    let lo = strings.partition_point(|s| s.offset < address);
    let hi = strings.partition_point(|s| s.offset < end);
    &strings[lo..hi.max(lo)]
}
