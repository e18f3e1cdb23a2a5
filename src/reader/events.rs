//! XML event types
//!
//! Pull-parser events as produced by [`crate::reader::slice::Reader`],
//! one layer above raw tokens: tag tokens gain their parsed attribute
//! lists and prefix-split names.

use crate::core::attributes::{split_name, Attribute};
use std::borrow::Cow;

/// A parsing event
#[derive(Debug, Clone)]
pub enum XmlEvent<'a> {
    /// `<name attrs...>`
    StartElement(StartElement<'a>),
    /// `</name>`
    EndElement(EndElement<'a>),
    /// `<name attrs.../>`
    EmptyElement(StartElement<'a>),
    /// Character data, entities decoded
    Text(Cow<'a, [u8]>),
    /// CDATA section content, verbatim
    CData(Cow<'a, [u8]>),
    /// Comment body
    Comment(Cow<'a, [u8]>),
    /// `<?target data?>`
    ProcessingInstruction {
        target: &'a [u8],
        data: Cow<'a, [u8]>,
    },
    /// `<?xml ...?>`
    XmlDeclaration {
        version: Vec<u8>,
        encoding: Option<Vec<u8>>,
        standalone: Option<bool>,
    },
    /// `<!DOCTYPE ...>`, span content verbatim
    DocType(&'a [u8]),
    /// End of input
    EndDocument,
}

/// Start or empty element event data
#[derive(Debug, Clone)]
pub struct StartElement<'a> {
    /// Full element name (may include prefix)
    pub name: &'a [u8],
    /// Local name (after the colon)
    pub local_name: &'a [u8],
    /// Namespace prefix (before the colon), if any
    pub prefix: Option<&'a [u8]>,
    pub attributes: Vec<Attribute<'a>>,
}

impl<'a> StartElement<'a> {
    pub fn new(name: &'a [u8], attributes: Vec<Attribute<'a>>) -> Self {
        let (prefix, local_name) = split_name(name);
        StartElement {
            name,
            local_name,
            prefix,
            attributes,
        }
    }

    pub fn name_str(&self) -> Option<&str> {
        std::str::from_utf8(self.name).ok()
    }

    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name.as_bytes())
            .and_then(|a| a.value_str())
    }
}

/// End element event data
#[derive(Debug, Clone)]
pub struct EndElement<'a> {
    pub name: &'a [u8],
}

impl<'a> EndElement<'a> {
    pub fn new(name: &'a [u8]) -> Self {
        EndElement { name }
    }

    pub fn name_str(&self) -> Option<&str> {
        std::str::from_utf8(self.name).ok()
    }
}
