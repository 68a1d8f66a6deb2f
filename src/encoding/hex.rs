//! Lower-case hexadecimal encoding with an optional `0x` prefix.
//!
//! Decoding is lenient in two ways that existing artifacts rely on:
//! upper-case digits are accepted, and an odd-length string is read as
//! if it had a leading `0` nibble (`"abc"` decodes to `[0x0a, 0xbc]`).
//! The second one silently reinterprets truncated input instead of
//! rejecting it; keep it unless every stored artifact is re-encoded.

use crate::errors::{GcmSealError, Result};

/// Prefix accepted (and optionally emitted) in front of hex strings.
pub const HEX_PREFIX: &str = "0x";

/// Encode `bytes` as lower-case hex without separators or prefix.
pub fn encode(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Encode `bytes` as lower-case hex with a leading `0x`.
///
/// Empty input yields just `"0x"`.
pub fn encode_prefixed(bytes: &[u8]) -> String {
    format!("{HEX_PREFIX}{}", hex::encode(bytes))
}

/// Strip a single leading `0x` or `0X`, if present.
pub fn strip_0x(text: &str) -> &str {
    text.strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text)
}

/// Whether `text` is an (optionally prefixed) hex string.
///
/// An empty string, or a bare prefix, counts as hex.
pub fn is_hex(text: &str) -> bool {
    strip_0x(text).chars().all(|c| c.is_ascii_hexdigit())
}

/// Decode an optionally `0x`-prefixed hex string.
///
/// Any non-hex character anywhere fails the whole decode with
/// `InvalidHexEncoding`.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    let digits = strip_0x(text);

    let decoded = if digits.len() % 2 == 1 {
        hex::decode(format!("0{digits}"))
    } else {
        hex::decode(digits)
    };

    decoded.map_err(|_| GcmSealError::InvalidHexEncoding)
}

/// Decode hex into a fixed-size array, checking the decoded length.
pub fn decode_array<const N: usize>(text: &str, what: &'static str) -> Result<[u8; N]> {
    let bytes = decode(text)?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| GcmSealError::InvalidLength {
        what,
        expected: N,
        actual: bytes.len(),
    })
}
