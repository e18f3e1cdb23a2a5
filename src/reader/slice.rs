//! Event reader over a byte slice
//!
//! Drives the tokenizer and lifts tokens into [`XmlEvent`]s, parsing
//! attribute lists out of tag spans on the way.

use super::events::{EndElement, StartElement, XmlEvent};
use crate::core::attributes::{parse_attributes, Attribute};
use crate::core::tokenizer::{ParseError, Token, TokenKind, Tokenizer};

/// Pull reader producing events from a complete input slice
pub struct Reader<'a> {
    input: &'a [u8],
    tokenizer: Tokenizer<'a>,
}

impl<'a> Reader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Reader {
            input,
            tokenizer: Tokenizer::new(input),
        }
    }

    /// Current byte offset in the input
    pub fn position(&self) -> usize {
        self.tokenizer.position()
    }

    /// Next event, or `None` once the document has ended
    pub fn next_event(&mut self) -> Result<Option<XmlEvent<'a>>, ParseError> {
        let Some(token) = self.tokenizer.next_token()? else {
            return Ok(None);
        };

        let event = match token.kind {
            TokenKind::Eof => XmlEvent::EndDocument,

            TokenKind::StartTag => {
                let attrs = self.tag_attributes(&token)?;
                let name = token.name.expect("tag token carries a name");
                XmlEvent::StartElement(StartElement::new(name, attrs))
            }

            TokenKind::EmptyTag => {
                let attrs = self.tag_attributes(&token)?;
                let name = token.name.expect("tag token carries a name");
                XmlEvent::EmptyElement(StartElement::new(name, attrs))
            }

            TokenKind::EndTag => {
                let name = token.name.expect("tag token carries a name");
                XmlEvent::EndElement(EndElement::new(name))
            }

            TokenKind::Text => {
                let content = token.content.expect("text token carries content");
                XmlEvent::Text(content)
            }

            TokenKind::CData => {
                let content = token.content.expect("CDATA token carries content");
                XmlEvent::CData(content)
            }

            TokenKind::Comment => {
                let content = token.content.expect("comment token carries content");
                XmlEvent::Comment(content)
            }

            TokenKind::ProcessingInstruction => XmlEvent::ProcessingInstruction {
                target: token.name.expect("PI token carries a target"),
                data: token.content.expect("PI token carries content"),
            },

            TokenKind::XmlDeclaration => self.xml_declaration(&token)?,

            TokenKind::DocType => {
                let (start, end) = token.span;
                XmlEvent::DocType(&self.input[start..end])
            }
        };

        Ok(Some(event))
    }

    /// Parse the attribute list out of a tag token's span
    fn tag_attributes(&self, token: &Token<'a>) -> Result<Vec<Attribute<'a>>, ParseError> {
        let (start, end) = token.span;
        let name_len = token.name.map_or(0, <[u8]>::len);

        // Skip '<' + name; drop the trailing '>' or '/>'
        let attrs_start = start + 1 + name_len;
        let mut attrs_end = end - 1;
        if token.kind == TokenKind::EmptyTag && self.input[attrs_end - 1] == b'/' {
            attrs_end -= 1;
        }

        if attrs_start >= attrs_end {
            return Ok(Vec::new());
        }
        parse_attributes(&self.input[attrs_start..attrs_end], attrs_start)
    }

    fn xml_declaration(&self, token: &Token<'a>) -> Result<XmlEvent<'a>, ParseError> {
        let (start, end) = token.span;
        // Between '<?xml' and '?>'
        let body = &self.input[start + 5..end - 2];
        let attrs = parse_attributes(body, start + 5)?;

        let version = attrs
            .iter()
            .find(|a| a.name == b"version")
            .map(|a| a.value.to_vec())
            .unwrap_or_else(|| b"1.0".to_vec());
        let encoding = attrs
            .iter()
            .find(|a| a.name == b"encoding")
            .map(|a| a.value.to_vec());
        let standalone = attrs
            .iter()
            .find(|a| a.name == b"standalone")
            .map(|a| a.value.as_ref() == b"yes");

        Ok(XmlEvent::XmlDeclaration {
            version,
            encoding,
            standalone,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(input: &[u8]) -> Result<Vec<XmlEvent<'_>>, ParseError> {
        let mut reader = Reader::new(input);
        let mut out = Vec::new();
        while let Some(event) = reader.next_event()? {
            if matches!(event, XmlEvent::EndDocument) {
                break;
            }
            out.push(event);
        }
        Ok(out)
    }

    #[test]
    fn element_with_text() {
        let events = events(b"<desc>hello</desc>").unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], XmlEvent::StartElement(e) if e.name_str() == Some("desc")));
        assert!(matches!(&events[1], XmlEvent::Text(t) if t.as_ref() == b"hello"));
        assert!(matches!(&events[2], XmlEvent::EndElement(e) if e.name_str() == Some("desc")));
    }

    #[test]
    fn empty_element_attributes() {
        let events = events(b"<circle cx=\"1\" cy=\"2\" r=\"5\"/>").unwrap();
        let XmlEvent::EmptyElement(elem) = &events[0] else {
            panic!("expected EmptyElement");
        };
        assert_eq!(elem.attribute_value("cx"), Some("1"));
        assert_eq!(elem.attribute_value("r"), Some("5"));
    }

    #[test]
    fn empty_element_without_attributes() {
        let events = events(b"<defs/>").unwrap();
        let XmlEvent::EmptyElement(elem) = &events[0] else {
            panic!("expected EmptyElement");
        };
        assert!(elem.attributes.is_empty());
    }

    #[test]
    fn cdata_content_verbatim() {
        let events = events(b"<style><![CDATA[a < b]]></style>").unwrap();
        assert!(matches!(&events[1], XmlEvent::CData(c) if c.as_ref() == b"a < b"));
    }

    #[test]
    fn xml_declaration_fields() {
        let events = events(b"<?xml version=\"1.1\" encoding=\"UTF-8\"?><svg/>").unwrap();
        let XmlEvent::XmlDeclaration {
            version,
            encoding,
            standalone,
        } = &events[0]
        else {
            panic!("expected XmlDeclaration");
        };
        assert_eq!(version.as_slice(), b"1.1");
        assert_eq!(encoding.as_deref(), Some(b"UTF-8" as &[u8]));
        assert_eq!(*standalone, None);
    }

    #[test]
    fn malformed_attribute_surfaces_position() {
        let err = events(b"<svg width=100/>").unwrap_err();
        assert_eq!(err.position, 11);
    }
}
