//! Bounds-checked little-endian reads for directory tables.

pub(crate) trait ReadExt {
    fn read_u16_le_at(&self, offset: usize) -> Option<u16>;
    fn read_u32_le_at(&self, offset: usize) -> Option<u32>;
    fn read_u64_le_at(&self, offset: usize) -> Option<u64>;
    /// Bytes up to the first NUL, at most `max_len` of them
    fn read_cstring_at(&self, offset: usize, max_len: usize) -> Option<&[u8]>;
}

impl ReadExt for [u8] {
    #[inline]
    fn read_u16_le_at(&self, offset: usize) -> Option<u16> {
        self.get(offset..offset.checked_add(2)?)
            .and_then(|b| b.try_into().ok())
            .map(u16::from_le_bytes)
    }

    #[inline]
    fn read_u32_le_at(&self, offset: usize) -> Option<u32> {
        self.get(offset..offset.checked_add(4)?)
            .and_then(|b| b.try_into().ok())
            .map(u32::from_le_bytes)
    }

    #[inline]
    fn read_u64_le_at(&self, offset: usize) -> Option<u64> {
        self.get(offset..offset.checked_add(8)?)
            .and_then(|b| b.try_into().ok())
            .map(u64::from_le_bytes)
    }

    fn read_cstring_at(&self, offset: usize, max_len: usize) -> Option<&[u8]> {
        let end = offset.saturating_add(max_len).min(self.len());
        let slice = self.get(offset..end)?;
        let len = slice.iter().position(|&b| b == 0).unwrap_or(slice.len());
        Some(&slice[..len])
    }
}

/// ASCII text, or `(invalid)` when any byte is outside ASCII.
pub(crate) fn ascii_or_invalid(bytes: &[u8]) -> String {
    if bytes.is_ascii() {
        String::from_utf8_lossy(bytes).into_owned()
    } else {
        "(invalid)".to_string()
    }
}
