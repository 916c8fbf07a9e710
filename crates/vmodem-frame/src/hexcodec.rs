//! Hex text as it appears in PDU and authentication payloads.

/// Decode hex text into bytes.
///
/// Odd-length input is rejected. A malformed nibble decodes as `0` rather
/// than failing; emulated modems occasionally pad fields with junk and the
/// surrounding grammar has already validated the structure.
pub fn decode(hex: &str) -> Option<Vec<u8>> {
    let bytes = hex.as_bytes();
    if bytes.len() % 2 != 0 {
        tracing::debug!(len = bytes.len(), "odd length hex");
        return None;
    }

    Some(
        bytes
            .chunks_exact(2)
            .map(|pair| (nibble(pair[0]) << 4) | nibble(pair[1]))
            .collect(),
    )
}

/// Encode bytes as upper-case hex text.
pub fn encode(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}

fn nibble(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => 0,
    }
}
