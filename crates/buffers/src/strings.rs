//! String payload decoding and hex diagnostics.

/// Decodes a string payload as UTF-8, falling back to a byte-preserving
/// Latin-1 read when the payload is not valid UTF-8.
///
/// The wire format's "modified UTF-8" has encodings (embedded `0xC0 0x80`
/// NULs, surrogate pairs) that strict UTF-8 rejects; a payload that trips on
/// those must still decode rather than abort the stream. The fallback maps
/// every byte to the Unicode code point of the same value, so no input byte
/// is ever lost.
///
/// # Example
///
/// ```
/// use bwn_buffers::utf8_or_latin1;
///
/// assert_eq!(utf8_or_latin1(b"hello"), "hello");
/// assert_eq!(utf8_or_latin1(&[0xE3, 0x81, 0x82]), "あ");
/// assert_eq!(utf8_or_latin1(&[0xC0, 0x80]), "\u{C0}\u{80}");
/// ```
pub fn utf8_or_latin1(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_owned(),
        Err(_) => latin1(bytes),
    }
}

/// Decodes bytes as Latin-1 (one code point per byte).
pub fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Formats a byte slice as a bounded hex string for diagnostics.
///
/// At most `max` bytes are rendered; a trailing note reports how many were
/// left out.
///
/// # Example
///
/// ```
/// use bwn_buffers::hex_preview;
///
/// assert_eq!(hex_preview(&[0x01, 0xAB], 16), "01 ab");
/// assert_eq!(hex_preview(&[0; 20], 4), "00 00 00 00 ... (16 more)");
/// ```
pub fn hex_preview(bytes: &[u8], max: usize) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    for (i, b) in bytes.iter().take(max).enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{b:02x}");
    }
    if bytes.len() > max {
        let _ = write!(out, " ... ({} more)", bytes.len() - max);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_utf8_decodes_as_utf8() {
        assert_eq!(utf8_or_latin1("日本語".as_bytes()), "日本語");
        assert_eq!(utf8_or_latin1(b""), "");
    }

    #[test]
    fn invalid_utf8_preserves_every_byte() {
        let bytes = [0x74, 0xFF, 0x00, 0x80];
        let decoded = utf8_or_latin1(&bytes);
        let round: Vec<u8> = decoded.chars().map(|c| c as u32 as u8).collect();
        assert_eq!(round, bytes);
    }

    #[test]
    fn hex_preview_bounds() {
        assert_eq!(hex_preview(&[], 16), "");
        assert_eq!(hex_preview(&[0xFF], 16), "ff");
        assert_eq!(hex_preview(&[1, 2, 3], 2), "01 02 ... (1 more)");
    }
}
