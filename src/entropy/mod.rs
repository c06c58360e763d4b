//! Shannon entropy for section summaries.
//!
//! Section data is usually padded with zero bytes up to the file alignment;
//! [`trimmed_entropy`] drops that trailing padding so it does not bias the
//! result toward zero.

/// Shannon entropy of `data` in bits per byte, between 0.0 and 8.0.
pub fn shannon_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut histogram = [0usize; 256];
    for &byte in data {
        histogram[byte as usize] += 1;
    }

    let len = data.len() as f64;
    histogram
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// `data` with trailing zero bytes removed.
pub fn trim_trailing_zeros(data: &[u8]) -> &[u8] {
    let end = data.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &data[..end]
}

/// Entropy of `data` after trimming trailing zero padding.
pub fn trimmed_entropy(data: &[u8]) -> f64 {
    shannon_entropy(trim_trailing_zeros(data))
}
