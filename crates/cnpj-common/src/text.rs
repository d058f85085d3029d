//! Text helpers shared by the loader and its CLI
//!
//! The registry files are published in ISO-8859-1. Every byte of that
//! encoding maps to the Unicode code point with the same value, so decoding
//! never fails.

/// Decode an ISO-8859-1 (Latin-1) byte slice into a `String`.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Format an integer with `,` thousands separators (`1234567` -> `1,234,567`).
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}

/// Format bytes into human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Percentage of `processed` over `total`; an empty total counts as done.
pub fn percent(processed: u64, total: u64) -> f64 {
    if total == 0 {
        100.0
    } else {
        processed as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_latin1_ascii() {
        assert_eq!(decode_latin1(b"EMPRESA LTDA"), "EMPRESA LTDA");
    }

    #[test]
    fn test_decode_latin1_accents() {
        // "SÃO JOÃO" in ISO-8859-1
        let bytes = [0x53, 0xC3, 0x4F, 0x20, 0x4A, 0x4F, 0xC3, 0x4F];
        assert_eq!(decode_latin1(&bytes), "SÃO JOÃO");
        assert_eq!(decode_latin1(&[0xE7, 0xE3, 0x6F]), "ção");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(500_000), "500,000");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1073741824), "1.00 GB");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 0), 100.0);
        assert_eq!(percent(1, 4), 25.0);
        assert_eq!(percent(4, 4), 100.0);
    }
}
