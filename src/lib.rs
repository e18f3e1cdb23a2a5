//! svgscrub - allowlist-based SVG sanitization
//!
//! Takes untrusted SVG/XML markup, parses it into a mutable DOM, removes
//! every element and attribute not present on a strict allowlist, and
//! serializes the surviving tree back to text. Built for rendering
//! user-supplied SVG inline in a browser without script injection or
//! external resource loading.
//!
//! ```
//! let clean = svgscrub::sanitize("<svg onload=\"alert(1)\"><circle r=\"5\"/></svg>").unwrap();
//! assert_eq!(clean, "<svg><circle r=\"5\"/></svg>");
//! ```
//!
//! Layers:
//! - `core`: scanner, tokenizer, entities, attributes, encoding
//! - `reader`: pull events over a byte slice
//! - `dom`: arena document with in-place mutation and serialization
//! - `scrub`: the policy table and the tree-walking filter
//!
//! Malformed input is rejected outright — the scrubber never guesses at
//! hostile markup. Stripped content is silent by design: absent from the
//! output, reported only at debug log level.

pub mod core;
pub mod dom;
pub mod reader;
pub mod scrub;

pub use crate::core::encoding::EncodingError;
pub use crate::core::tokenizer::ParseError;
pub use crate::dom::Document;
pub use crate::scrub::{Policy, Scrubber};

use thiserror::Error;

/// Everything that can go wrong before the scrub pass. The scrub itself
/// is total over a well-formed tree.
#[derive(Debug, Error)]
pub enum Error {
    /// Input is not well-formed XML
    #[error("malformed document: {0}")]
    Parse(#[from] ParseError),
    /// Input bytes could not be converted to UTF-8
    #[error("unsupported encoding: {0}")]
    Encoding(#[from] EncodingError),
}

/// Sanitize SVG/XML text with the built-in SVG allowlist
pub fn sanitize(input: &str) -> Result<String, Error> {
    sanitize_with_policy(input, Policy::svg())
}

/// Sanitize with a caller-provided allowlist
pub fn sanitize_with_policy(input: &str, policy: &Policy) -> Result<String, Error> {
    let mut doc = Document::parse(input.as_bytes())?;
    Scrubber::new(policy).scrub(&mut doc);
    Ok(dom::serialize::to_xml(&doc))
}

/// Sanitize raw bytes with the built-in SVG allowlist, converting from
/// UTF-16 (BOM or byte-pattern detected) when necessary
pub fn sanitize_bytes(input: &[u8]) -> Result<String, Error> {
    let bytes = crate::core::encoding::convert_to_utf8(input)?;
    let mut doc = Document::parse(&bytes)?;
    Scrubber::new(Policy::svg()).scrub(&mut doc);
    Ok(dom::serialize::to_xml(&doc))
}
