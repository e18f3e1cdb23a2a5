//! Pull-style XML tokenizer
//!
//! Extracts markup tokens from the input one at a time:
//! start/end/empty tags, text, CDATA sections, comments, processing
//! instructions, the XML declaration and DOCTYPE. Well-formedness
//! violations surface as [`ParseError`] with the byte position; there is
//! no recovery mode, since the scrubber refuses malformed input outright.

use super::scanner::Scanner;
use std::borrow::Cow;
use thiserror::Error;

/// Tokenizer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Before the first token
    Init,
    /// Between markup constructs
    Content,
    /// End of input reached
    Done,
}

/// Kind of markup token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `<element ...>`
    StartTag,
    /// `</element>`
    EndTag,
    /// `<element .../>`
    EmptyTag,
    /// Character data between tags
    Text,
    /// `<![CDATA[...]]>`
    CData,
    /// `<!--...-->`
    Comment,
    /// `<?target ...?>`
    ProcessingInstruction,
    /// `<?xml version=...?>`
    XmlDeclaration,
    /// `<!DOCTYPE ...>`
    DocType,
    /// End of input
    Eof,
}

/// A single markup token
#[derive(Debug, Clone)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Raw span in the input (start, end)
    pub span: (usize, usize),
    /// Tag name or PI target
    pub name: Option<&'a [u8]>,
    /// Text/CDATA/comment content, entity-decoded where applicable
    pub content: Option<Cow<'a, [u8]>>,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, span: (usize, usize)) -> Self {
        Token {
            kind,
            span,
            name: None,
            content: None,
        }
    }

    fn with_name(mut self, name: &'a [u8]) -> Self {
        self.name = Some(name);
        self
    }

    fn with_content(mut self, content: Cow<'a, [u8]>) -> Self {
        self.content = Some(content);
        self
    }
}

/// A well-formedness violation at a byte position
#[derive(Debug, Clone, Error)]
#[error("{message} at byte {position}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        ParseError {
            message: message.into(),
            position,
        }
    }
}

/// Pull tokenizer over a byte slice
pub struct Tokenizer<'a> {
    input: &'a [u8],
    scanner: Scanner<'a>,
    state: State,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Tokenizer {
            input,
            scanner: Scanner::new(input),
            state: State::Init,
        }
    }

    /// Current byte offset, for positioning structural errors found
    /// above the token layer
    pub fn position(&self) -> usize {
        self.scanner.position()
    }

    /// Next token, or `None` after [`TokenKind::Eof`] has been returned
    pub fn next_token(&mut self) -> Result<Option<Token<'a>>, ParseError> {
        if self.state == State::Done {
            return Ok(None);
        }

        if self.state == State::Init {
            // The XML declaration, if present, must be the very first
            // bytes of the document.
            self.state = State::Content;
            if self.scanner.starts_with(b"<?xml")
                && !self
                    .scanner
                    .peek_at(5)
                    .is_some_and(super::scanner::is_name_char)
            {
                return self.read_xml_declaration().map(Some);
            }
        }

        if self.scanner.is_eof() {
            self.state = State::Done;
            let pos = self.scanner.position();
            return Ok(Some(Token::new(TokenKind::Eof, (pos, pos))));
        }

        if self.scanner.peek() == Some(b'<') {
            self.read_markup().map(Some)
        } else {
            self.read_text().map(Some)
        }
    }

    fn read_markup(&mut self) -> Result<Token<'a>, ParseError> {
        let start = self.scanner.position();

        if self.scanner.starts_with(b"<!--") {
            return self.read_comment(start);
        }
        if self.scanner.starts_with(b"<![CDATA[") {
            return self.read_cdata(start);
        }
        if self.scanner.starts_with(b"<!DOCTYPE") {
            return self.read_doctype(start);
        }
        if self.scanner.starts_with(b"<!") {
            return Err(ParseError::new("unrecognized markup declaration", start));
        }
        if self.scanner.starts_with(b"<?") {
            return self.read_processing_instruction(start);
        }
        if self.scanner.starts_with(b"</") {
            return self.read_end_tag(start);
        }
        self.read_start_tag(start)
    }

    fn read_start_tag(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(1); // '<'
        let name = self
            .scanner
            .read_name()
            .ok_or_else(|| ParseError::new("invalid element name", start + 1))?;

        let end = self
            .scanner
            .find_tag_end_quoted()
            .ok_or_else(|| ParseError::new("unclosed tag", start))?;
        let span = (start, end + 1);

        let kind = if end > start && self.input[end - 1] == b'/' {
            TokenKind::EmptyTag
        } else {
            TokenKind::StartTag
        };

        self.scanner.advance(end + 1 - self.scanner.position());
        Ok(Token::new(kind, span).with_name(name))
    }

    fn read_end_tag(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(2); // '</'
        let name = self
            .scanner
            .read_name()
            .ok_or_else(|| ParseError::new("invalid element name", start + 2))?;

        self.scanner.skip_whitespace();
        if self.scanner.peek() != Some(b'>') {
            return Err(ParseError::new(
                "malformed end tag",
                self.scanner.position(),
            ));
        }
        self.scanner.advance(1);
        Ok(Token::new(TokenKind::EndTag, (start, self.scanner.position())).with_name(name))
    }

    fn read_comment(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(4); // '<!--'
        let content_start = self.scanner.position();
        let close = self
            .scanner
            .find_sequence(b"-->")
            .ok_or_else(|| ParseError::new("unterminated comment", start))?;

        let content = &self.input[content_start..close];
        // XML 1.0: '--' must not appear inside a comment
        if content.windows(2).any(|w| w == b"--") || content.ends_with(b"-") {
            return Err(ParseError::new("'--' not allowed inside comment", start));
        }

        self.scanner.advance(close + 3 - content_start);
        Ok(Token::new(TokenKind::Comment, (start, close + 3))
            .with_content(Cow::Borrowed(content)))
    }

    fn read_cdata(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(9); // '<![CDATA['
        let content_start = self.scanner.position();
        let close = self
            .scanner
            .find_sequence(b"]]>")
            .ok_or_else(|| ParseError::new("unterminated CDATA section", start))?;

        let content = &self.input[content_start..close];
        super::entities::validate_content_bytes(content, content_start)?;

        self.scanner.advance(close + 3 - content_start);
        Ok(Token::new(TokenKind::CData, (start, close + 3))
            .with_content(Cow::Borrowed(content)))
    }

    fn read_doctype(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(9); // '<!DOCTYPE'

        // The internal subset may contain '>', so balance '[' ']'
        let mut depth = 0usize;
        while let Some(b) = self.scanner.peek() {
            match b {
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b'>' if depth == 0 => {
                    self.scanner.advance(1);
                    let end = self.scanner.position();
                    return Ok(Token::new(TokenKind::DocType, (start, end)));
                }
                _ => {}
            }
            self.scanner.advance(1);
        }
        Err(ParseError::new("unterminated DOCTYPE declaration", start))
    }

    fn read_processing_instruction(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(2); // '<?'
        let target = self
            .scanner
            .read_name()
            .ok_or_else(|| ParseError::new("invalid processing instruction target", start + 2))?;

        if target.eq_ignore_ascii_case(b"xml") {
            // The declaration is only valid at position 0, handled in Init
            return Err(ParseError::new(
                "XML declaration allowed only at document start",
                start,
            ));
        }

        let close = self
            .scanner
            .find_sequence(b"?>")
            .ok_or_else(|| ParseError::new("unterminated processing instruction", start))?;
        let data_start = self.scanner.position();
        let data = &self.input[data_start..close];

        self.scanner.advance(close + 2 - data_start);
        Ok(Token::new(TokenKind::ProcessingInstruction, (start, close + 2))
            .with_name(target)
            .with_content(Cow::Borrowed(trim_xml_whitespace(data))))
    }

    fn read_xml_declaration(&mut self) -> Result<Token<'a>, ParseError> {
        let start = self.scanner.position();
        let close = self
            .scanner
            .find_sequence(b"?>")
            .ok_or_else(|| ParseError::new("unterminated XML declaration", start))?;

        self.scanner.advance(close + 2 - start);
        Ok(Token::new(TokenKind::XmlDeclaration, (start, close + 2)))
    }

    fn read_text(&mut self) -> Result<Token<'a>, ParseError> {
        let start = self.scanner.position();
        let end = self.scanner.find_tag_start().unwrap_or(self.input.len());
        let raw = &self.input[start..end];

        if let Some(at) = find_cdata_close(raw) {
            return Err(ParseError::new("']]>' not allowed in content", start + at));
        }
        super::entities::validate_content_bytes(raw, start)?;
        let content = super::entities::decode_text(raw, start)?;

        self.scanner.advance(end - start);
        Ok(Token::new(TokenKind::Text, (start, end)).with_content(content))
    }
}

fn find_cdata_close(content: &[u8]) -> Option<usize> {
    content.windows(3).position(|w| w == b"]]>")
}

fn trim_xml_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
        .unwrap_or(data.len());
    &data[start..]
}
