//! In-place string patching of an already-encoded stream.
//!
//! Pattern-matches short-string records (`0x74`, 2-byte length, UTF-8
//! payload) directly in the byte buffer and splices replacements without
//! ever running the decoder. Heuristic by design: a byte that happens to
//! equal the string tag inside some unrelated payload can produce a false
//! site, so scanning applies a length bound and a UTF-8 validity check, and
//! callers targeting one known string should anchor on a marker with
//! [`find_after`] instead of patching every match blindly.

use bwn_buffers::Reader;

/// Upper bound on plausible string payload lengths during a scan.
pub const DEFAULT_MAX_LEN: usize = 4096;

/// A short-string record found in an encoded buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringSite {
    /// Offset of the string tag byte.
    pub offset: usize,
    /// Payload length in bytes.
    pub length: usize,
    /// Decoded payload.
    pub value: String,
    /// Offset one past the payload.
    pub end: usize,
}

/// Validates a short-string record at `offset` and returns its site.
pub fn site_at(data: &[u8], offset: usize, max_len: usize) -> Option<StringSite> {
    let mut reader = Reader::new(data.get(offset..)?);
    if reader.u8().ok()? != 0x74 {
        return None;
    }
    let length = reader.u16().ok()? as usize;
    if length == 0 || length > max_len {
        return None;
    }
    let payload = reader.bytes(length).ok()?;
    let value = std::str::from_utf8(payload).ok()?.to_owned();
    Some(StringSite {
        offset,
        length,
        value,
        end: offset + 3 + length,
    })
}

/// Scans the whole buffer for plausible short-string records, using
/// [`DEFAULT_MAX_LEN`] as the length bound.
pub fn scan(data: &[u8]) -> Vec<StringSite> {
    scan_bounded(data, DEFAULT_MAX_LEN)
}

/// Scans with an explicit length bound. A hit skips the scan cursor past
/// the matched payload; a miss advances one byte.
pub fn scan_bounded(data: &[u8], max_len: usize) -> Vec<StringSite> {
    let mut sites = Vec::new();
    let mut i = 0;
    while i + 3 < data.len() {
        match site_at(data, i, max_len) {
            Some(site) => {
                i = site.end;
                sites.push(site);
            }
            None => i += 1,
        }
    }
    sites
}

/// Finds the first string record that starts directly after `marker`
/// (typically a key the target string is the value of).
pub fn find_after(data: &[u8], marker: &[u8]) -> Option<StringSite> {
    if marker.is_empty() {
        return None;
    }
    let at = data
        .windows(marker.len())
        .position(|window| window == marker)?;
    site_at(data, at + marker.len(), DEFAULT_MAX_LEN)
}

/// Replaces the payload of the record at `site` with `new_value`, rewriting
/// the 2-byte length prefix and shifting everything after it. Returns
/// `false` when the site no longer matches the buffer or the replacement
/// does not fit a 2-byte length.
pub fn replace_at(data: &mut Vec<u8>, site: &StringSite, new_value: &str) -> bool {
    let new_bytes = new_value.as_bytes();
    if new_bytes.len() > 0xFFFF {
        return false;
    }
    // Revalidate: the buffer may have shifted since the site was found.
    let Some(current) = site_at(data, site.offset, usize::MAX) else {
        return false;
    };
    if current.length != site.length {
        return false;
    }
    let mut patched = Vec::with_capacity(data.len() - site.length + new_bytes.len());
    patched.extend_from_slice(&data[..site.offset + 1]);
    patched.extend_from_slice(&(new_bytes.len() as u16).to_be_bytes());
    patched.extend_from_slice(new_bytes);
    patched.extend_from_slice(&data[current.end..]);
    *data = patched;
    true
}

/// Replaces up to `limit` records whose payload equals `old_value`
/// (`usize::MAX` for all of them). Returns the number replaced.
pub fn replace(data: &mut Vec<u8>, old_value: &str, new_value: &str, limit: usize) -> usize {
    let mut replaced = 0;
    while replaced < limit {
        // Rescan each round: every splice shifts the offsets behind it.
        let Some(site) = scan(data).into_iter().find(|s| s.value == old_value) else {
            break;
        };
        if !replace_at(data, &site, new_value) {
            break;
        }
        replaced += 1;
    }
    replaced
}
