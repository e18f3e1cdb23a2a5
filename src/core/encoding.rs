//! Input encoding detection and conversion
//!
//! SVG uploaded by users arrives as whatever bytes the client produced.
//! Detects UTF-16 via BOM or the byte pattern of a leading `<`, converts
//! to UTF-8, and strips a UTF-8 BOM when present.

use thiserror::Error;

/// Input bytes could not be converted to UTF-8
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct EncodingError(String);

/// Detected input encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl Encoding {
    /// Detect from a byte order mark or the initial bytes
    pub fn detect(input: &[u8]) -> Self {
        if input.len() < 2 {
            return Encoding::Utf8;
        }

        match (input[0], input[1]) {
            (0xFF, 0xFE) => Encoding::Utf16Le,
            (0xFE, 0xFF) => Encoding::Utf16Be,
            // No BOM: a UTF-16 document still starts with '<' in one of
            // its two bytes
            (0x00, b'<') => Encoding::Utf16Be,
            (b'<', 0x00) => Encoding::Utf16Le,
            _ => Encoding::Utf8,
        }
    }
}

/// Convert input bytes to UTF-8, stripping any BOM
pub fn convert_to_utf8(input: &[u8]) -> Result<Vec<u8>, EncodingError> {
    match Encoding::detect(input) {
        Encoding::Utf8 => {
            let bytes = input.strip_prefix(&[0xEF, 0xBB, 0xBF][..]).unwrap_or(input);
            Ok(bytes.to_vec())
        }
        Encoding::Utf16Le => convert_utf16(input, &[0xFF, 0xFE], u16::from_le_bytes),
        Encoding::Utf16Be => convert_utf16(input, &[0xFE, 0xFF], u16::from_be_bytes),
    }
}

fn convert_utf16(
    input: &[u8],
    bom: &[u8],
    from_bytes: fn([u8; 2]) -> u16,
) -> Result<Vec<u8>, EncodingError> {
    let bytes = input.strip_prefix(bom).unwrap_or(input);

    if bytes.len() % 2 != 0 {
        return Err(EncodingError(
            "invalid UTF-16: odd number of bytes".to_string(),
        ));
    }

    let code_units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| from_bytes([chunk[0], chunk[1]]))
        .collect();

    String::from_utf16(&code_units)
        .map(String::into_bytes)
        .map_err(|e| EncodingError(format!("invalid UTF-16: {e}")))
}
