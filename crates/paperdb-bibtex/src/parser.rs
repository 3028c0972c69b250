//! BibTeX parser implementation using nom
//!
//! Handles the subset of BibTeX a personal citation store actually contains:
//! - `@string` definitions (plus the standard month macros)
//! - `@preamble` and `@comment` blocks, which are skipped
//! - Entries delimited by braces or parentheses
//! - Braced, quoted, numeric and macro field values joined with `#`
//!
//! A malformed entry is reported as a warning and parsing resumes at the
//! next `@`.

use std::collections::HashMap;

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, digit1, multispace0, one_of},
    combinator::map,
    error::{Error, ErrorKind},
    sequence::preceded,
    IResult,
};

use crate::entry::{BibEntry, EntryType};

/// A recoverable problem found while parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub line: u32,
    pub message: String,
}

/// Result of parsing a BibTeX document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResult {
    pub entries: Vec<BibEntry>,
    /// `@string` macros defined by the document (lower-cased names)
    pub strings: HashMap<String, String>,
    pub warnings: Vec<ParseWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("no BibTeX entry found")]
    NoEntry,
}

const MONTHS: [(&str, &str); 12] = [
    ("jan", "January"),
    ("feb", "February"),
    ("mar", "March"),
    ("apr", "April"),
    ("may", "May"),
    ("jun", "June"),
    ("jul", "July"),
    ("aug", "August"),
    ("sep", "September"),
    ("oct", "October"),
    ("nov", "November"),
    ("dec", "December"),
];

/// Parse a BibTeX document. Never fails; broken entries become warnings.
pub fn parse(input: &str) -> ParseResult {
    let mut parser = Parser::new();
    let mut result = ParseResult::default();
    let mut rest = input;

    while let Some(at) = rest.find('@') {
        let candidate = &rest[at..];
        match parser.item(candidate) {
            Ok((remaining, item)) => {
                if let Item::Entry(entry) = item {
                    result.entries.push(entry);
                }
                rest = remaining;
            }
            Err(_) => {
                let offset = input.len() - candidate.len();
                let line = input[..offset].matches('\n').count() as u32 + 1;
                let head: String = candidate.chars().take(40).collect();
                result.warnings.push(ParseWarning {
                    line,
                    message: format!("skipping malformed entry: {}", head.trim_end()),
                });
                rest = &candidate[1..];
            }
        }
    }

    result.strings = parser.user_strings;
    result
}

/// Parse the first entry of `input`
pub fn parse_entry(input: &str) -> Result<BibEntry, ParseError> {
    parse(input)
        .entries
        .into_iter()
        .next()
        .ok_or(ParseError::NoEntry)
}

enum Item {
    Entry(BibEntry),
    Skipped,
}

struct Parser {
    macros: HashMap<String, String>,
    user_strings: HashMap<String, String>,
}

impl Parser {
    fn new() -> Self {
        let macros = MONTHS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            macros,
            user_strings: HashMap::new(),
        }
    }

    fn item<'a>(&mut self, input: &'a str) -> IResult<&'a str, Item> {
        let (rest, kind) = preceded(char('@'), preceded(multispace0, identifier))(input)?;

        match kind.to_ascii_lowercase().as_str() {
            "comment" => {
                let (rest, _) = comment_body(rest)?;
                Ok((rest, Item::Skipped))
            }
            "preamble" => {
                let (rest, delim) = open(rest)?;
                let (rest, _) = self.value(rest)?;
                let (rest, _) = close(rest, delim)?;
                Ok((rest, Item::Skipped))
            }
            "string" => {
                let (rest, delim) = open(rest)?;
                let (rest, name) = preceded(multispace0, identifier)(rest)?;
                let (rest, _) = preceded(multispace0, char('='))(rest)?;
                let (rest, value) = self.value(rest)?;
                let (rest, _) = close(rest, delim)?;
                let name = name.to_ascii_lowercase();
                self.macros.insert(name.clone(), value.clone());
                self.user_strings.insert(name, value);
                Ok((rest, Item::Skipped))
            }
            _ => {
                let (rest, entry) = self.entry(rest, kind)?;
                Ok((rest, Item::Entry(entry)))
            }
        }
    }

    fn entry<'a>(&self, input: &'a str, kind: &str) -> IResult<&'a str, BibEntry> {
        let (rest, delim) = open(input)?;
        let (mut rest, cite_key) = preceded(
            multispace0,
            take_while(|c: char| !c.is_whitespace() && !",{}()".contains(c)),
        )(rest)?;

        let mut entry = BibEntry::new(cite_key, EntryType::parse(kind));

        loop {
            let (r, _) = multispace0(rest)?;
            if let Ok((r, _)) = close(r, delim) {
                return Ok((r, entry));
            }
            let (r, _) = char(',')(r)?;
            let (r, _) = multispace0(r)?;
            if let Ok((r, _)) = close(r, delim) {
                return Ok((r, entry));
            }
            let (r, key) = identifier(r)?;
            let (r, _) = preceded(multispace0, char('='))(r)?;
            let (r, value) = self.value(r)?;
            entry.set_field(key, value);
            rest = r;
        }
    }

    /// A field value: one or more parts joined with `#`
    fn value<'a>(&self, input: &'a str) -> IResult<&'a str, String> {
        let mut out = String::new();
        let mut rest = input;

        loop {
            let (r, _) = multispace0(rest)?;
            let (r, part) = alt((
                map(braced, String::from),
                map(quoted, String::from),
                map(digit1, String::from),
                map(identifier, |name: &str| self.expand(name)),
            ))(r)?;
            out.push_str(&part);

            let (r, _) = multispace0(r)?;
            match r.strip_prefix('#') {
                Some(next) => rest = next,
                None => return Ok((r, collapse_whitespace(&out))),
            }
        }
    }

    fn expand(&self, name: &str) -> String {
        self.macros
            .get(&name.to_ascii_lowercase())
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || "_-:.+/".contains(c))(input)
}

fn open(input: &str) -> IResult<&str, char> {
    preceded(multispace0, one_of("{("))(input)
}

fn close(input: &str, delim: char) -> IResult<&str, char> {
    let expected = if delim == '(' { ')' } else { '}' };
    preceded(multispace0, char(expected))(input)
}

fn comment_body(input: &str) -> IResult<&str, ()> {
    let (rest, _) = multispace0(input)?;
    if rest.starts_with('{') {
        let (rest, _) = braced(rest)?;
        Ok((rest, ()))
    } else {
        let end = rest.find('\n').unwrap_or(rest.len());
        Ok((&rest[end..], ()))
    }
}

fn fail(input: &str) -> nom::Err<Error<&str>> {
    nom::Err::Error(Error::new(input, ErrorKind::Char))
}

/// `{...}` with nesting; yields the inner text
fn braced(input: &str) -> IResult<&str, &str> {
    if !input.starts_with('{') {
        return Err(fail(input));
    }

    let bytes = input.as_bytes();
    let mut depth = 0usize;
    let mut pos = 0;
    while pos < bytes.len() {
        match bytes[pos] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&input[pos + 1..], &input[1..pos]));
                }
            }
            b'\\' => pos += 1,
            _ => {}
        }
        pos += 1;
    }

    Err(fail(input))
}

/// `"..."`, where quotes inside braces do not terminate the value
fn quoted(input: &str) -> IResult<&str, &str> {
    if !input.starts_with('"') {
        return Err(fail(input));
    }

    let bytes = input.as_bytes();
    let mut depth = 0usize;
    let mut pos = 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'"' if depth == 0 => return Ok((&input[pos + 1..], &input[1..pos])),
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b'\\' => pos += 1,
            _ => {}
        }
        pos += 1;
    }

    Err(fail(input))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
