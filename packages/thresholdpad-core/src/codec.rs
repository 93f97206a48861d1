//! # Codec
//!
//! Conversions between the text the user types and the bytes the engine
//! consumes. Two text forms exist:
//!
//! | Form | Used for | Rule |
//! |------|----------|------|
//! | hex | keys, signatures, ciphertexts | two digits per byte, either case in, lowercase out |
//! | single-byte text | messages | one character per byte, U+0000..=U+00FF only |

use crate::error::{Error, Result};

/// Decode hexadecimal text into bytes.
///
/// Fails with [`Error::MalformedHex`] on odd length or a non-hex character.
pub fn hex_decode(text: &str) -> Result<Vec<u8>> {
    Ok(hex::decode(text)?)
}

/// Encode bytes as lowercase hexadecimal text.
pub fn hex_encode(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode hex text that must describe exactly `N` bytes.
///
/// The length is checked before any decoding happens, so a field that is
/// still being typed is reported as [`Error::InvalidInput`] rather than
/// [`Error::MalformedHex`].
pub fn decode_exact<const N: usize>(text: &str, field: &'static str) -> Result<[u8; N]> {
    if text.len() != N * 2 {
        return Err(Error::InvalidInput {
            field,
            reason: format!("expected {} hex characters, got {}", N * 2, text.len()),
        });
    }
    let mut out = [0u8; N];
    hex::decode_to_slice(text, &mut out)?;
    Ok(out)
}

/// Map each character of `text` to its single-byte code point.
pub fn text_decode(text: &str) -> Result<Vec<u8>> {
    text.chars()
        .enumerate()
        .map(|(position, c)| {
            u8::try_from(c).map_err(|_| Error::UnsupportedCharacter {
                position,
                code_point: u32::from(c),
            })
        })
        .collect()
}

/// Map each byte to the character with the same code point.
pub fn text_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
