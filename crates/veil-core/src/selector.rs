#![forbid(unsafe_code)]

//! Minimal CSS selector support.
//!
//! Supported grammar: one or more compound selectors joined by the
//! descendant combinator (whitespace). A compound is an optional tag name
//! (or `*`) followed by any number of `#id`, `.class`, `[attr]`, and
//! `[attr=value]` parts. Attribute values may be bare or quoted.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Empty input | Blank selector | [`SelectorError::Empty`] |
//! | Stray character | e.g. `div>p`, `a:hover` | [`SelectorError::Unexpected`] |
//! | Open bracket | `[data-role=close` | [`SelectorError::Unterminated`] |
//! | Missing name | `#`, `.`, `[=x]` | [`SelectorError::MissingName`] |

use std::fmt;
use std::str::FromStr;

/// Errors from selector parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unexpected character {ch:?} at offset {offset}")]
    Unexpected { ch: char, offset: usize },
    #[error("unterminated attribute selector starting at offset {offset}")]
    Unterminated { offset: usize },
    #[error("missing name after {sigil:?} at offset {offset}")]
    MissingName { sigil: char, offset: usize },
}

/// Read-only view of an element used for matching.
pub trait Matchable {
    /// Lower-case tag name, or `None` for text nodes.
    fn tag_name(&self) -> Option<&str>;
    /// Attribute value by name.
    fn attribute(&self, name: &str) -> Option<&str>;
    /// Whether the element carries `class`.
    fn has_class(&self, class: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrMatch {
    name: String,
    value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatch>,
}

impl Compound {
    fn matches<N: Matchable + ?Sized>(&self, node: &N) -> bool {
        let Some(tag) = node.tag_name() else {
            return false;
        };
        if let Some(expected) = &self.tag
            && !expected.eq_ignore_ascii_case(tag)
        {
            return false;
        }
        if let Some(id) = &self.id
            && node.attribute("id") != Some(id.as_str())
        {
            return false;
        }
        if !self.classes.iter().all(|c| node.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|attr| match (&attr.value, node.attribute(&attr.name)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(expected), Some(actual)) => expected == actual,
        })
    }
}

/// A parsed selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    /// Compounds from outermost ancestor to the subject.
    chain: Vec<Compound>,
}

impl Selector {
    /// Parse a selector.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut chain = Vec::new();
        let mut parser = Parser {
            src: input,
            pos: 0,
        };
        loop {
            parser.skip_whitespace();
            if parser.at_end() {
                break;
            }
            chain.push(parser.compound()?);
        }
        if chain.is_empty() {
            return Err(SelectorError::Empty);
        }
        Ok(Self {
            source: input.trim().to_owned(),
            chain,
        })
    }

    /// The selector text as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether `node` matches, given its ancestors from nearest to farthest.
    pub fn matches<'a, N, I>(&self, node: &N, ancestors: I) -> bool
    where
        N: Matchable + ?Sized + 'a,
        I: IntoIterator<Item = &'a N>,
    {
        let Some((subject, rest)) = self.chain.split_last() else {
            return false;
        };
        if !subject.matches(node) {
            return false;
        }
        let mut pending = rest.iter().rev().peekable();
        for ancestor in ancestors {
            match pending.peek() {
                None => break,
                Some(compound) if compound.matches(ancestor) => {
                    pending.next();
                }
                Some(_) => {}
            }
        }
        pending.peek().is_none()
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn ident(&mut self) -> &str {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn named(&mut self, sigil: char) -> Result<String, SelectorError> {
        let offset = self.pos;
        let name = self.ident();
        if name.is_empty() {
            return Err(SelectorError::MissingName { sigil, offset });
        }
        Ok(name.to_owned())
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        if self.peek() == Some('*') {
            self.bump();
        } else {
            let tag = self.ident();
            if !tag.is_empty() {
                compound.tag = Some(tag.to_ascii_lowercase());
            }
        }
        loop {
            let offset = self.pos;
            match self.peek() {
                None => break,
                Some(c) if c.is_whitespace() => break,
                Some('#') => {
                    self.bump();
                    compound.id = Some(self.named('#')?);
                }
                Some('.') => {
                    self.bump();
                    let class = self.named('.')?;
                    compound.classes.push(class);
                }
                Some('[') => {
                    self.bump();
                    compound.attrs.push(self.attribute(offset)?);
                }
                Some(ch) => return Err(SelectorError::Unexpected { ch, offset }),
            }
        }
        Ok(compound)
    }

    fn attribute(&mut self, open: usize) -> Result<AttrMatch, SelectorError> {
        self.skip_whitespace();
        let name = self.named('[')?;
        self.skip_whitespace();
        let value = match self.bump() {
            Some(']') => return Ok(AttrMatch { name, value: None }),
            Some('=') => {
                self.skip_whitespace();
                match self.peek() {
                    Some(quote @ ('"' | '\'')) => {
                        self.bump();
                        let start = self.pos;
                        loop {
                            match self.bump() {
                                Some(c) if c == quote => break,
                                Some(_) => {}
                                None => return Err(SelectorError::Unterminated { offset: open }),
                            }
                        }
                        self.src[start..self.pos - quote.len_utf8()].to_owned()
                    }
                    _ => {
                        let start = self.pos;
                        while self.peek().is_some_and(|c| c != ']' && !c.is_whitespace()) {
                            self.bump();
                        }
                        self.src[start..self.pos].to_owned()
                    }
                }
            }
            Some(ch) => {
                return Err(SelectorError::Unexpected {
                    ch,
                    offset: self.pos - ch.len_utf8(),
                });
            }
            None => return Err(SelectorError::Unterminated { offset: open }),
        };
        self.skip_whitespace();
        match self.bump() {
            Some(']') => Ok(AttrMatch {
                name,
                value: Some(value),
            }),
            _ => Err(SelectorError::Unterminated { offset: open }),
        }
    }
}
