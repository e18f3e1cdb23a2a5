//! XML entity decoding and output escaping
//!
//! Decoding handles the five built-in entities plus numeric character
//! references, returning `Cow::Borrowed` when the input contains no
//! references at all. Unknown named entities are left literal; SVG is
//! XML, so nothing beyond the built-ins is defined without a DTD, and
//! DTDs are not processed here.

use memchr::memchr;
use std::borrow::Cow;

use super::tokenizer::ParseError;

/// Decode text or attribute-value content.
///
/// `offset` is the absolute position of `input` in the document, used
/// for error reporting. Rejects bare `&` and character references that
/// fall outside the XML 1.0 Char production.
pub fn decode_text(input: &[u8], offset: usize) -> Result<Cow<'_, [u8]>, ParseError> {
    if memchr(b'&', input).is_none() {
        return Ok(Cow::Borrowed(input));
    }
    decode_references(input, offset).map(Cow::Owned)
}

fn decode_references(input: &[u8], offset: usize) -> Result<Vec<u8>, ParseError> {
    let mut result = Vec::with_capacity(input.len());
    let mut pos = 0;

    while pos < input.len() {
        let Some(amp) = memchr(b'&', &input[pos..]) else {
            result.extend_from_slice(&input[pos..]);
            break;
        };
        result.extend_from_slice(&input[pos..pos + amp]);
        pos += amp;

        let semi = memchr(b';', &input[pos..]).ok_or_else(|| {
            ParseError::new("unterminated entity reference", offset + pos)
        })?;
        let entity = &input[pos + 1..pos + semi];

        match decode_entity(entity, offset + pos)? {
            Some(decoded) => {
                result.extend_from_slice(decoded.as_bytes());
            }
            None => {
                // Undeclared named entity: keep the reference literal
                result.extend_from_slice(&input[pos..pos + semi + 1]);
            }
        }
        pos += semi + 1;
    }

    Ok(result)
}

/// Decode a single reference body (between `&` and `;`).
/// `Ok(None)` means an unknown named entity.
fn decode_entity(entity: &[u8], position: usize) -> Result<Option<String>, ParseError> {
    if entity.is_empty() {
        return Err(ParseError::new("empty entity reference", position));
    }

    if entity[0] == b'#' {
        let decoded = decode_char_reference(&entity[1..])
            .ok_or_else(|| ParseError::new("invalid character reference", position))?;
        return Ok(Some(decoded));
    }

    match entity {
        b"lt" => Ok(Some("<".to_string())),
        b"gt" => Ok(Some(">".to_string())),
        b"amp" => Ok(Some("&".to_string())),
        b"quot" => Ok(Some("\"".to_string())),
        b"apos" => Ok(Some("'".to_string())),
        _ => {
            if super::scanner::is_name_start_char(entity[0])
                && entity.iter().all(|&b| super::scanner::is_name_char(b))
            {
                Ok(None)
            } else {
                Err(ParseError::new("bare '&' not allowed in content", position))
            }
        }
    }
}

fn decode_char_reference(body: &[u8]) -> Option<String> {
    if body.is_empty() {
        return None;
    }

    let codepoint = if body[0] == b'x' || body[0] == b'X' {
        let hex = std::str::from_utf8(&body[1..]).ok()?;
        u32::from_str_radix(hex, 16).ok()?
    } else {
        let dec = std::str::from_utf8(body).ok()?;
        dec.parse::<u32>().ok()?
    };

    if !is_valid_xml_char(codepoint) {
        return None;
    }
    char::from_u32(codepoint).map(|c| c.to_string())
}

/// XML 1.0 Char production:
/// #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
#[inline]
pub fn is_valid_xml_char(codepoint: u32) -> bool {
    matches!(codepoint,
        0x9 | 0xA | 0xD |
        0x20..=0xD7FF |
        0xE000..=0xFFFD |
        0x10000..=0x10FFFF
    )
}

/// Reject ASCII control characters not allowed in XML content.
/// Multi-byte sequences are checked at the codepoint level when decoded.
pub fn validate_content_bytes(input: &[u8], offset: usize) -> Result<(), ParseError> {
    for (i, &b) in input.iter().enumerate() {
        if b < 0x20 && b != 0x9 && b != 0xA && b != 0xD {
            return Err(ParseError::new(
                "control character not allowed in content",
                offset + i,
            ));
        }
    }
    Ok(())
}

/// Escape text for XML output
pub fn encode_text(input: &str) -> Cow<'_, str> {
    if !input
        .bytes()
        .any(|b| matches!(b, b'<' | b'>' | b'&' | b'"' | b'\''))
    {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}
