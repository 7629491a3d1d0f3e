//! Array literal parsing.
//!
//! Array columns travel as text of the form `{e1,e2,...}`. Elements are bare
//! words, double-quoted strings with backslash escapes, the unquoted word
//! `NULL` in any case, or nested literals.

use std::iter::Peekable;
use std::str::Chars;

use oradapter_core::Error;
use oradapter_core::error::{Result, TypeError};

/// Deepest nesting accepted before a literal is rejected.
pub(crate) const MAX_DEPTH: usize = 128;

/// One parsed element, before the element type's loader sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Element {
    Null,
    Text(String),
    Nested(Vec<Element>),
}

/// Parse a complete literal. Anything after the closing brace but whitespace
/// is an error.
pub(crate) fn parse(literal: &str) -> Result<Vec<Element>> {
    let mut parser = Parser {
        literal,
        chars: literal.chars().peekable(),
        depth: 0,
    };
    parser.skip_whitespace();
    let elements = parser.array()?;
    parser.skip_whitespace();
    if parser.chars.next().is_some() {
        return Err(parser.error());
    }
    Ok(elements)
}

struct Parser<'a> {
    literal: &'a str,
    chars: Peekable<Chars<'a>>,
    depth: usize,
}

impl Parser<'_> {
    fn array(&mut self) -> Result<Vec<Element>> {
        self.expect('{')?;
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error());
        }
        let elements = self.elements()?;
        self.depth -= 1;
        Ok(elements)
    }

    fn elements(&mut self) -> Result<Vec<Element>> {
        let mut elements = Vec::new();

        self.skip_whitespace();
        if self.chars.peek() == Some(&'}') {
            self.chars.next();
            return Ok(elements);
        }

        loop {
            self.skip_whitespace();
            elements.push(self.element()?);
            self.skip_whitespace();
            match self.chars.next() {
                Some(',') => {}
                Some('}') => return Ok(elements),
                _ => return Err(self.error()),
            }
        }
    }

    fn element(&mut self) -> Result<Element> {
        match self.chars.peek() {
            Some('{') => self.array().map(Element::Nested),
            Some('"') => self.quoted().map(Element::Text),
            Some(_) => self.bare(),
            None => Err(self.error()),
        }
    }

    fn quoted(&mut self) -> Result<String> {
        self.expect('"')?;
        let mut out = String::new();
        loop {
            match self.chars.next() {
                Some('"') => return Ok(out),
                Some('\\') => match self.chars.next() {
                    Some(c) => out.push(c),
                    None => return Err(self.error()),
                },
                Some(c) => out.push(c),
                None => return Err(self.error()),
            }
        }
    }

    fn bare(&mut self) -> Result<Element> {
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            match c {
                ',' | '}' => break,
                '{' | '"' | '\\' => return Err(self.error()),
                _ => {
                    out.push(c);
                    self.chars.next();
                }
            }
        }
        let word = out.trim_end();
        if word.is_empty() {
            return Err(self.error());
        }
        if word.eq_ignore_ascii_case("NULL") {
            Ok(Element::Null)
        } else {
            Ok(Element::Text(word.to_string()))
        }
    }

    fn expect(&mut self, want: char) -> Result<()> {
        match self.chars.next() {
            Some(c) if c == want => Ok(()),
            _ => Err(self.error()),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn error(&self) -> Error {
        let mut shown: String = self.literal.chars().take(64).collect();
        if shown.len() < self.literal.len() {
            shown.push_str("...");
        }
        Error::Type(TypeError {
            expected: "array literal",
            actual: format!("invalid value: {shown}"),
            column: None,
        })
    }
}
