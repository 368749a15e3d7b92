//! A CSS selector subset
//!
//! Supports selector lists, descendant and child combinators, type and universal
//! selectors, `#id`, `.class` and attribute selectors with `=`, `^=`, `$=`, `*=`.
//! Matching runs right to left against any [`ElementView`].

use crate::dom::NodeId;
use crate::error::{Error, Result};

/// Read-only element access needed for matching
pub trait ElementView {
    fn tag(&self, node: NodeId) -> Option<&str>;
    fn attr(&self, node: NodeId, name: &str) -> Option<&str>;
    fn has_class(&self, node: NodeId, class: &str) -> bool;
    fn parent_of(&self, node: NodeId) -> Option<NodeId>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

#[derive(Debug, Clone, PartialEq)]
struct Complex {
    /// Compounds left to right; the combinator links a compound to the one before it
    parts: Vec<(Combinator, Compound)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatch>,
}

#[derive(Debug, Clone, PartialEq)]
struct AttrMatch {
    name: String,
    op: AttrOp,
    value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals,
    Prefix,
    Suffix,
    Contains,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self> {
        Parser::new(input).parse()
    }

    pub fn matches(&self, view: &impl ElementView, node: NodeId) -> bool {
        self.alternatives
            .iter()
            .any(|complex| complex.matches_at(view, node, complex.parts.len() - 1))
    }
}

impl Complex {
    fn matches_at(&self, view: &impl ElementView, node: NodeId, idx: usize) -> bool {
        let (combinator, compound) = &self.parts[idx];
        if !compound.matches(view, node) {
            return false;
        }
        if idx == 0 {
            return true;
        }
        match combinator {
            Combinator::Child => view
                .parent_of(node)
                .is_some_and(|parent| self.matches_at(view, parent, idx - 1)),
            Combinator::Descendant => {
                let mut current = view.parent_of(node);
                while let Some(ancestor) = current {
                    if self.matches_at(view, ancestor, idx - 1) {
                        return true;
                    }
                    current = view.parent_of(ancestor);
                }
                false
            }
        }
    }
}

impl Compound {
    fn matches(&self, view: &impl ElementView, node: NodeId) -> bool {
        let Some(tag) = view.tag(node) else {
            return false;
        };
        if let Some(ref expected) = self.tag {
            if !tag.eq_ignore_ascii_case(expected) {
                return false;
            }
        }
        if let Some(ref id) = self.id {
            if view.attr(node, "id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|class| view.has_class(node, class)) {
            return false;
        }
        self.attrs.iter().all(|m| {
            let Some(actual) = view.attr(node, &m.name) else {
                return false;
            };
            match m.op {
                AttrOp::Exists => true,
                AttrOp::Equals => actual == m.value,
                AttrOp::Prefix => !m.value.is_empty() && actual.starts_with(&m.value),
                AttrOp::Suffix => !m.value.is_empty() && actual.ends_with(&m.value),
                AttrOp::Contains => !m.value.is_empty() && actual.contains(&m.value),
            }
        })
    }
}

struct Parser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> Error {
        Error::Selector {
            selector: self.input.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    /// Returns true if any whitespace was consumed
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn parse(mut self) -> Result<Selector> {
        let mut alternatives = Vec::new();
        loop {
            self.skip_ws();
            alternatives.push(self.parse_complex()?);
            match self.bump() {
                None => break,
                Some(',') => continue,
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            }
        }
        Ok(Selector { alternatives })
    }

    fn parse_complex(&mut self) -> Result<Complex> {
        let mut parts = Vec::new();
        let mut combinator = Combinator::Descendant;
        loop {
            let compound = self.parse_compound()?;
            parts.push((combinator, compound));

            let had_ws = self.skip_ws();
            match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_ws();
                    combinator = Combinator::Child;
                }
                Some(_) if had_ws => combinator = Combinator::Descendant,
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            }
        }
        Ok(Complex { parts })
    }

    fn parse_compound(&mut self) -> Result<Compound> {
        let mut compound = Compound::default();
        let mut any = false;

        match self.peek() {
            Some('*') => {
                self.pos += 1;
                any = true;
            }
            Some(c) if is_ident_char(c) => {
                compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
                any = true;
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.id = Some(self.parse_ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.parse_ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.parse_attr()?);
                }
                _ => break,
            }
            any = true;
        }

        if !any {
            return Err(self.error("expected a selector"));
        }
        Ok(compound)
    }

    fn parse_ident(&mut self) -> Result<String> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected an identifier"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_attr(&mut self) -> Result<AttrMatch> {
        self.skip_ws();
        let name = self.parse_ident()?;
        self.skip_ws();

        let op = match self.peek() {
            Some(']') => {
                self.pos += 1;
                return Ok(AttrMatch {
                    name,
                    op: AttrOp::Exists,
                    value: String::new(),
                });
            }
            Some('=') => {
                self.pos += 1;
                AttrOp::Equals
            }
            Some(c @ ('^' | '$' | '*')) => {
                self.pos += 1;
                if self.bump() != Some('=') {
                    return Err(self.error(format!("expected '=' after '{}'", c)));
                }
                match c {
                    '^' => AttrOp::Prefix,
                    '$' => AttrOp::Suffix,
                    _ => AttrOp::Contains,
                }
            }
            _ => return Err(self.error("malformed attribute selector")),
        };

        self.skip_ws();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().is_some_and(|c| c != quote) {
                    self.pos += 1;
                }
                if self.peek().is_none() {
                    return Err(self.error("unterminated string"));
                }
                let value: String = self.chars[start..self.pos].iter().collect();
                self.pos += 1;
                value
            }
            _ => {
                let start = self.pos;
                while self
                    .peek()
                    .is_some_and(|c| c != ']' && !c.is_whitespace())
                {
                    self.pos += 1;
                }
                self.chars[start..self.pos].iter().collect()
            }
        };

        self.skip_ws();
        if self.bump() != Some(']') {
            return Err(self.error("expected ']'"));
        }
        Ok(AttrMatch { name, op, value })
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}
