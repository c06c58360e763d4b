//! Hex/ASCII row layout for arbitrary byte ranges.
//!
//! Row data is aligned to multiples of the row length. A range that starts
//! mid-row is padded on the left, one that ends mid-row is padded on the
//! right. Labels count from the range start in steps of the row length.
//! Rendering 0x1b bytes from address 5:
//!
//! ```text
//! 00000005:                 4D 5A 90 00 03 00 00 00 04 00 00       MZ.........
//! 00000015:  FF FF 00 00 B8 00 00 00 00 00 00 00 40 00 00 00  ............@...
//! ```

use std::fmt;

use crate::error::{MzError, Result};

/// Default bytes per row.
pub const DEFAULT_ROW_LENGTH: usize = 0x10;

/// One hex column cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HexCell {
    Padding,
    /// A zero byte, shown muted
    Zero,
    NonZero(u8),
}

impl HexCell {
    fn from_byte(b: u8) -> Self {
        if b == 0 {
            HexCell::Zero
        } else {
            HexCell::NonZero(b)
        }
    }
}

impl fmt::Display for HexCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HexCell::Padding => f.write_str("  "),
            HexCell::Zero => f.write_str("00"),
            HexCell::NonZero(b) => write!(f, "{:02X}", b),
        }
    }
}

/// One ASCII column cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsciiCell {
    Padding,
    Printable(char),
    NonPrintable,
}

impl AsciiCell {
    fn from_byte(b: u8) -> Self {
        if (0x20..=0x7E).contains(&b) {
            AsciiCell::Printable(b as char)
        } else {
            AsciiCell::NonPrintable
        }
    }

    fn as_char(&self) -> char {
        match self {
            AsciiCell::Padding => ' ',
            AsciiCell::Printable(c) => *c,
            AsciiCell::NonPrintable => '.',
        }
    }
}

/// A single rendered row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexRow<'a> {
    /// Range start plus `index * row_length`; not necessarily the address
    /// of the first data byte
    pub address: u64,
    pub padding_start: usize,
    pub data: &'a [u8],
    pub padding_end: usize,
}

impl<'a> HexRow<'a> {
    pub fn data_length(&self) -> usize {
        self.data.len()
    }

    pub fn row_length(&self) -> usize {
        self.padding_start + self.data.len() + self.padding_end
    }

    /// Label like `00000010:`.
    pub fn address_label(&self) -> String {
        format!("{:08x}:", self.address)
    }

    pub fn hex_cells(&self) -> impl Iterator<Item = HexCell> + 'a {
        let (start, end, data) = (self.padding_start, self.padding_end, self.data);
        std::iter::repeat_n(HexCell::Padding, start)
            .chain(data.iter().map(|&b| HexCell::from_byte(b)))
            .chain(std::iter::repeat_n(HexCell::Padding, end))
    }

    pub fn ascii_cells(&self) -> impl Iterator<Item = AsciiCell> + 'a {
        let (start, end, data) = (self.padding_start, self.padding_end, self.data);
        std::iter::repeat_n(AsciiCell::Padding, start)
            .chain(data.iter().map(|&b| AsciiCell::from_byte(b)))
            .chain(std::iter::repeat_n(AsciiCell::Padding, end))
    }

    /// Space-separated hex column, padding included.
    pub fn hex_text(&self) -> String {
        self.hex_cells()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn ascii_text(&self) -> String {
        self.ascii_cells().map(|c| c.as_char()).collect()
    }
}

impl fmt::Display for HexRow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {}  {}",
            self.address_label(),
            self.hex_text(),
            self.ascii_text()
        )
    }
}

/// Number of rows for `length` bytes starting at `address`.
///
/// When `address % row_length + length % row_length > row_length` the
/// count is one short and the trailing bytes are not shown.
pub fn row_count(address: usize, length: usize, row_length: usize) -> usize {
    let mut rows = length / row_length + 1;
    if address % row_length == 0 && length % row_length == 0 {
        rows -= 1;
    }
    rows
}

/// Lazy, restartable row sequence over a validated range.
#[derive(Debug, Clone)]
pub struct HexRows<'a> {
    data: &'a [u8],
    address: usize,
    length: usize,
    row_length: usize,
    rows: usize,
    index: usize,
}

impl<'a> HexRows<'a> {
    pub fn row_count(&self) -> usize {
        self.rows
    }

    fn row(&self, index: usize) -> HexRow<'a> {
        let base = self.address - self.address % self.row_length;
        let row_start = base + index * self.row_length;
        let end = self.address + self.length;

        let (padding_start, data_start, data_length) = if index == 0 {
            let padding_start = self.address % self.row_length;
            let data_length = (self.row_length - padding_start).min(self.length);
            (padding_start, self.address, data_length)
        } else {
            let data_length = self.row_length.min(end.saturating_sub(row_start));
            (0, row_start, data_length)
        };

        HexRow {
            address: (self.address + index * self.row_length) as u64,
            padding_start,
            data: &self.data[data_start..data_start + data_length],
            padding_end: self.row_length - data_length - padding_start,
        }
    }
}

impl<'a> Iterator for HexRows<'a> {
    type Item = HexRow<'a>;

    fn next(&mut self) -> Option<HexRow<'a>> {
        if self.index >= self.rows {
            return None;
        }
        let row = self.row(self.index);
        self.index += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.rows - self.index;
        (left, Some(left))
    }
}

impl ExactSizeIterator for HexRows<'_> {}

/// Lay out `data[address..address + length]` as hex rows.
///
/// Fails with [`MzError::InvalidRange`] when the range leaves the buffer or
/// `row_length` is zero.
pub fn render(data: &[u8], address: usize, length: usize, row_length: usize) -> Result<HexRows<'_>> {
    if row_length == 0 {
        return Err(MzError::InvalidRange("row_length must be > 0".to_string()));
    }
    if address > data.len() {
        return Err(MzError::InvalidRange(format!(
            "address {:#x} must be <= buffer length {:#x}",
            address,
            data.len()
        )));
    }
    match address.checked_add(length) {
        Some(end) if end <= data.len() => {}
        _ => {
            return Err(MzError::InvalidRange(format!(
                "address {:#x} + length {:#x} must be <= buffer length {:#x}",
                address,
                length,
                data.len()
            )))
        }
    }

    Ok(HexRows {
        data,
        address,
        length,
        row_length,
        rows: row_count(address, length, row_length),
        index: 0,
    })
}
