//! Structured header field parser
//!
//! Parses the compact structured-field encoding (RFC 8941) carried in
//! string-valued response headers such as `expo-server-defined-headers` and
//! `expo-manifest-filters`:
//! - Items: integers, decimals, strings, tokens, byte sequences, booleans
//! - Parameters (`;key=value`) on items and inner lists
//! - Dictionaries (`a=1, b="x", c`) whose members may be inner lists (`(c d)`)

use base64::Engine;
use serde_json::{Map, Number, Value};

/// Structured header parse error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StructuredHeaderError {
    #[error("Unexpected end of input at offset {0}")]
    UnexpectedEnd(usize),

    #[error("Unexpected character '{found}' at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },

    #[error("Invalid {kind} at offset {offset}")]
    Invalid { kind: &'static str, offset: usize },

    #[error("Trailing characters at offset {0}")]
    TrailingCharacters(usize),
}

/// A bare item value
#[derive(Debug, Clone, PartialEq)]
pub enum BareItem {
    Integer(i64),
    Decimal(f64),
    String(String),
    Token(String),
    ByteSequence(Vec<u8>),
    Boolean(bool),
}

impl BareItem {
    /// Convert to a plain JSON value; byte sequences have no JSON form.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            BareItem::Integer(i) => Some(Value::Number((*i).into())),
            BareItem::Decimal(d) => Number::from_f64(*d).map(Value::Number),
            BareItem::String(s) | BareItem::Token(s) => Some(Value::String(s.clone())),
            BareItem::Boolean(b) => Some(Value::Bool(*b)),
            BareItem::ByteSequence(_) => None,
        }
    }
}

pub type Parameters = Vec<(String, BareItem)>;

/// A bare item with its parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub bare: BareItem,
    pub params: Parameters,
}

/// Dictionary value or list element
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Item(Item),
    InnerList { items: Vec<Item>, params: Parameters },
}

/// Ordered dictionary; a repeated key overwrites the earlier value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary(pub Vec<(String, Member)>);

impl Dictionary {
    pub fn get(&self, key: &str) -> Option<&Member> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, m)| m)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flatten into a JSON object, ignoring parameters.
    ///
    /// Only members whose value is a string, token, number or boolean
    /// survive; byte sequences and inner lists are dropped.
    pub fn to_json_map(&self) -> Map<String, Value> {
        let mut out = Map::new();
        for (key, member) in &self.0 {
            let value = match member {
                Member::Item(item) => item.bare.to_json(),
                Member::InnerList { .. } => None,
            };
            match value {
                Some(v) => {
                    out.insert(key.clone(), v);
                }
                None => tracing::debug!(key = %key, "dropping non-scalar structured header member"),
            }
        }
        out
    }

    fn insert(&mut self, key: String, member: Member) {
        if let Some(slot) = self.0.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = member;
        } else {
            self.0.push((key, member));
        }
    }
}

/// Parse a structured header dictionary
pub fn parse_dictionary(input: &str) -> Result<Dictionary, StructuredHeaderError> {
    let mut parser = Parser::new(input);
    parser.skip_sp();
    let dict = parser.dictionary()?;
    parser.finish()?;
    Ok(dict)
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn next(&mut self) -> Result<u8, StructuredHeaderError> {
        let c = self
            .peek()
            .ok_or(StructuredHeaderError::UnexpectedEnd(self.pos))?;
        self.pos += 1;
        Ok(c)
    }

    fn unexpected(&self, c: u8) -> StructuredHeaderError {
        StructuredHeaderError::UnexpectedChar {
            found: c as char,
            offset: self.pos,
        }
    }

    fn skip_sp(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    fn skip_ows(&mut self) {
        while matches!(self.peek(), Some(b' ') | Some(b'\t')) {
            self.pos += 1;
        }
    }

    fn finish(&mut self) -> Result<(), StructuredHeaderError> {
        self.skip_sp();
        if self.pos < self.input.len() {
            return Err(StructuredHeaderError::TrailingCharacters(self.pos));
        }
        Ok(())
    }

    /// Consume the separator between members. Returns false at end of input.
    fn member_separator(&mut self) -> Result<bool, StructuredHeaderError> {
        self.skip_ows();
        let Some(c) = self.peek() else {
            return Ok(false);
        };
        if c != b',' {
            return Err(self.unexpected(c));
        }
        self.pos += 1;
        self.skip_ows();
        if self.peek().is_none() {
            // trailing comma
            return Err(StructuredHeaderError::UnexpectedEnd(self.pos));
        }
        Ok(true)
    }

    fn dictionary(&mut self) -> Result<Dictionary, StructuredHeaderError> {
        let mut dict = Dictionary::default();
        if self.peek().is_none() {
            return Ok(dict);
        }
        loop {
            let key = self.key()?;
            let member = if self.peek() == Some(b'=') {
                self.pos += 1;
                self.member()?
            } else {
                Member::Item(Item {
                    bare: BareItem::Boolean(true),
                    params: self.parameters()?,
                })
            };
            dict.insert(key, member);
            if !self.member_separator()? {
                return Ok(dict);
            }
        }
    }

    fn member(&mut self) -> Result<Member, StructuredHeaderError> {
        if self.peek() == Some(b'(') {
            self.inner_list()
        } else {
            self.item().map(Member::Item)
        }
    }

    fn inner_list(&mut self) -> Result<Member, StructuredHeaderError> {
        self.pos += 1; // '('
        let mut items = Vec::new();
        loop {
            self.skip_sp();
            match self.peek() {
                Some(b')') => {
                    self.pos += 1;
                    let params = self.parameters()?;
                    return Ok(Member::InnerList { items, params });
                }
                Some(_) => {
                    items.push(self.item()?);
                    match self.peek() {
                        Some(b' ') | Some(b')') => {}
                        Some(c) => return Err(self.unexpected(c)),
                        None => return Err(StructuredHeaderError::UnexpectedEnd(self.pos)),
                    }
                }
                None => return Err(StructuredHeaderError::UnexpectedEnd(self.pos)),
            }
        }
    }

    fn item(&mut self) -> Result<Item, StructuredHeaderError> {
        let bare = self.bare_item()?;
        let params = self.parameters()?;
        Ok(Item { bare, params })
    }

    fn parameters(&mut self) -> Result<Parameters, StructuredHeaderError> {
        let mut params: Parameters = Vec::new();
        while self.peek() == Some(b';') {
            self.pos += 1;
            self.skip_sp();
            let key = self.key()?;
            let value = if self.peek() == Some(b'=') {
                self.pos += 1;
                self.bare_item()?
            } else {
                BareItem::Boolean(true)
            };
            if let Some(slot) = params.iter_mut().find(|(k, _)| *k == key) {
                slot.1 = value;
            } else {
                params.push((key, value));
            }
        }
        Ok(params)
    }

    fn key(&mut self) -> Result<String, StructuredHeaderError> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_ascii_lowercase() || c == b'*' => self.pos += 1,
            Some(c) => return Err(self.unexpected(c)),
            None => return Err(StructuredHeaderError::UnexpectedEnd(self.pos)),
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, b'_' | b'-' | b'.' | b'*')
            {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(self.slice(start))
    }

    fn bare_item(&mut self) -> Result<BareItem, StructuredHeaderError> {
        match self.peek() {
            Some(b'-') | Some(b'0'..=b'9') => self.number(),
            Some(b'"') => self.string(),
            Some(b':') => self.byte_sequence(),
            Some(b'?') => self.boolean(),
            Some(c) if c.is_ascii_alphabetic() || c == b'*' => self.token(),
            Some(c) => Err(self.unexpected(c)),
            None => Err(StructuredHeaderError::UnexpectedEnd(self.pos)),
        }
    }

    fn number(&mut self) -> Result<BareItem, StructuredHeaderError> {
        let start = self.pos;
        let negative = self.peek() == Some(b'-');
        if negative {
            self.pos += 1;
        }
        if !matches!(self.peek(), Some(b'0'..=b'9')) {
            return Err(StructuredHeaderError::Invalid {
                kind: "number",
                offset: self.pos,
            });
        }

        let digits_start = self.pos;
        let mut dot: Option<usize> = None;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.pos += 1;
            } else if c == b'.' && dot.is_none() {
                if self.pos - digits_start > 12 {
                    return Err(StructuredHeaderError::Invalid {
                        kind: "decimal",
                        offset: start,
                    });
                }
                dot = Some(self.pos);
                self.pos += 1;
            } else {
                break;
            }
            let len = self.pos - digits_start;
            if (dot.is_none() && len > 15) || (dot.is_some() && len > 16) {
                return Err(StructuredHeaderError::Invalid {
                    kind: "number",
                    offset: start,
                });
            }
        }

        let text = self.slice(start);
        match dot {
            None => text
                .parse::<i64>()
                .map(BareItem::Integer)
                .map_err(|_| StructuredHeaderError::Invalid {
                    kind: "integer",
                    offset: start,
                }),
            Some(dot_pos) => {
                let fraction = self.pos - dot_pos - 1;
                if fraction == 0 || fraction > 3 {
                    return Err(StructuredHeaderError::Invalid {
                        kind: "decimal",
                        offset: start,
                    });
                }
                text.parse::<f64>()
                    .map(BareItem::Decimal)
                    .map_err(|_| StructuredHeaderError::Invalid {
                        kind: "decimal",
                        offset: start,
                    })
            }
        }
    }

    fn string(&mut self) -> Result<BareItem, StructuredHeaderError> {
        self.pos += 1; // opening quote
        let mut out = String::new();
        loop {
            let c = self.next()?;
            match c {
                b'"' => return Ok(BareItem::String(out)),
                b'\\' => {
                    let escaped = self.next()?;
                    if escaped != b'"' && escaped != b'\\' {
                        return Err(StructuredHeaderError::Invalid {
                            kind: "string escape",
                            offset: self.pos - 1,
                        });
                    }
                    out.push(escaped as char);
                }
                0x20..=0x7e => out.push(c as char),
                _ => {
                    return Err(StructuredHeaderError::Invalid {
                        kind: "string character",
                        offset: self.pos - 1,
                    })
                }
            }
        }
    }

    fn token(&mut self) -> Result<BareItem, StructuredHeaderError> {
        let start = self.pos;
        self.pos += 1;
        while let Some(c) = self.peek() {
            if is_tchar(c) || c == b':' || c == b'/' {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(BareItem::Token(self.slice(start)))
    }

    fn byte_sequence(&mut self) -> Result<BareItem, StructuredHeaderError> {
        let start = self.pos;
        self.pos += 1; // opening ':'
        let body_start = self.pos;
        loop {
            match self.next()? {
                b':' => break,
                c if c.is_ascii_alphanumeric() || matches!(c, b'+' | b'/' | b'=') => {}
                _ => {
                    return Err(StructuredHeaderError::Invalid {
                        kind: "byte sequence",
                        offset: self.pos - 1,
                    })
                }
            }
        }
        let body = &self.input[body_start..self.pos - 1];
        base64::engine::general_purpose::STANDARD
            .decode(body)
            .map(BareItem::ByteSequence)
            .map_err(|_| StructuredHeaderError::Invalid {
                kind: "byte sequence",
                offset: start,
            })
    }

    fn boolean(&mut self) -> Result<BareItem, StructuredHeaderError> {
        self.pos += 1; // '?'
        match self.next()? {
            b'1' => Ok(BareItem::Boolean(true)),
            b'0' => Ok(BareItem::Boolean(false)),
            _ => Err(StructuredHeaderError::Invalid {
                kind: "boolean",
                offset: self.pos - 1,
            }),
        }
    }

    // Only ASCII bytes are ever accepted before a slice is taken.
    fn slice(&self, start: usize) -> String {
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }
}

fn is_tchar(c: u8) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            b'!' | b'#'
                | b'$'
                | b'%'
                | b'&'
                | b'\''
                | b'*'
                | b'+'
                | b'-'
                | b'.'
                | b'^'
                | b'_'
                | b'`'
                | b'|'
                | b'~'
        )
}
