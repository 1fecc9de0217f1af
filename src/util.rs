//! util: хелперы отображения payload для CLI.

use std::fmt::Write as _;

/// Single-line hex of at most `max` bytes; longer payloads end with the
/// count of bytes left out.
pub fn hex_line(bytes: &[u8], max: usize) -> String {
    let shown = &bytes[..bytes.len().min(max)];
    let mut out = String::with_capacity(shown.len() * 3 + 16);
    for (i, b) in shown.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{:02x}", b);
    }
    if bytes.len() > shown.len() {
        let _ = write!(out, " ..(+{} B)", bytes.len() - shown.len());
    }
    out
}

/// UTF-8 text when the payload is valid UTF-8, otherwise a short marker.
pub fn display_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.trim_end_matches('\0').to_string(),
        Err(_) => format!("(binary {} B)", bytes.len()),
    }
}

pub fn is_text(bytes: &[u8]) -> bool {
    std::str::from_utf8(bytes).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_line_stays_on_one_line_and_marks_cut() {
        let b: Vec<u8> = (0u8..18).collect();
        let s = hex_line(&b, 64);
        assert!(!s.contains('\n'));
        assert!(s.starts_with("00 01 02"));
        assert!(s.ends_with("10 11"));

        assert_eq!(hex_line(&b, 2), "00 01 ..(+16 B)");
        assert_eq!(hex_line(&[], 8), "");
    }

    #[test]
    fn display_text_strips_nul_padding() {
        assert_eq!(display_text(b"abc\0\0"), "abc");
        assert_eq!(display_text(&[0xff, 0xfe]), "(binary 2 B)");
        assert!(!is_text(&[0xff]));
    }
}
