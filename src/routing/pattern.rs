//! Placeholder pattern compilation.
//!
//! # Syntax
//! ```text
//! /users/:id              one segment, captured as `id`
//! /files/:name(\d+)       custom capture expression
//! /books/:id?             optional segment (matches /books and /books/7)
//! /docs/:path+            one or more segments
//! /docs/:path*            zero or more segments
//! /static/*               unnamed greedy wildcard, not captured
//! /api{/v1}?/status       non-capturing group with modifier
//! ```
//!
//! # Design Decisions
//! - Patterns compile to one anchored regex at registration time
//! - Only named captures are reported as parameters
//! - Captured values are percent-decoded; undecodable values are kept raw

use regex::Regex;
use thiserror::Error;

/// Characters that make a path a pattern rather than an exact string.
const METACHARACTERS: &[char] = &[':', '*', '{', '}', '(', ')', '+', '?'];

/// Regex fragment for a single unnamed-segment parameter.
const SEGMENT: &str = "[^/]+";

/// Error produced when a path pattern cannot be compiled.
#[derive(Debug, Clone, Error)]
pub enum PatternError {
    #[error("pattern `{pattern}`: parameter at offset {offset} has no name")]
    MissingName { pattern: String, offset: usize },

    #[error("pattern `{pattern}`: parameter name `{name}` must not start with a digit")]
    InvalidName { pattern: String, name: String },

    #[error("pattern `{pattern}`: unbalanced `{delimiter}`")]
    Unbalanced { pattern: String, delimiter: char },

    #[error("pattern `{pattern}`: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Returns true if `path` must be compiled into a [`CompiledPattern`].
///
/// The literal wildcard `*` is not a pattern.
pub fn is_pattern(path: &str) -> bool {
    path != "*" && path.contains(METACHARACTERS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    Optional,
    ZeroOrMore,
    OneOrMore,
}

impl Modifier {
    fn parse(c: Option<&char>) -> Option<Self> {
        match c {
            Some('?') => Some(Modifier::Optional),
            Some('*') => Some(Modifier::ZeroOrMore),
            Some('+') => Some(Modifier::OneOrMore),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Modifier::Optional => "?",
            Modifier::ZeroOrMore => "*",
            Modifier::OneOrMore => "+",
        }
    }
}

/// A path pattern compiled into an anchored regex.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Regex,
    names: Vec<String>,
}

impl CompiledPattern {
    /// Compile a pattern string.
    pub fn compile(source: &str) -> Result<Self, PatternError> {
        let chars: Vec<char> = source.chars().collect();
        let mut expr = String::with_capacity(source.len() * 2 + 2);
        let mut names = Vec::new();
        let mut depth = 0usize;
        let mut i = 0;

        expr.push('^');
        while i < chars.len() {
            match chars[i] {
                ':' => {
                    let start = i + 1;
                    let mut end = start;
                    while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_') {
                        end += 1;
                    }
                    if end == start {
                        return Err(PatternError::MissingName {
                            pattern: source.to_string(),
                            offset: i,
                        });
                    }
                    let name: String = chars[start..end].iter().collect();
                    if name.starts_with(|c: char| c.is_ascii_digit()) {
                        return Err(PatternError::InvalidName {
                            pattern: source.to_string(),
                            name,
                        });
                    }
                    i = end;

                    let body = if chars.get(i) == Some(&'(') {
                        let (body, next) = read_group(source, &chars, i)?;
                        i = next;
                        body
                    } else {
                        SEGMENT.to_string()
                    };

                    let modifier = Modifier::parse(chars.get(i));
                    if modifier.is_some() {
                        i += 1;
                    }
                    push_param(&mut expr, &name, &body, modifier);
                    names.push(name);
                }
                '*' => {
                    expr.push_str(".*");
                    i += 1;
                }
                '{' => {
                    depth += 1;
                    expr.push_str("(?:");
                    i += 1;
                }
                '}' => {
                    if depth == 0 {
                        return Err(PatternError::Unbalanced {
                            pattern: source.to_string(),
                            delimiter: '}',
                        });
                    }
                    depth -= 1;
                    expr.push(')');
                    i += 1;
                    if let Some(modifier) = Modifier::parse(chars.get(i)) {
                        expr.push_str(modifier.as_str());
                        i += 1;
                    }
                }
                c => {
                    let mut buf = [0u8; 4];
                    expr.push_str(&regex::escape(c.encode_utf8(&mut buf)));
                    i += 1;
                }
            }
        }
        if depth != 0 {
            return Err(PatternError::Unbalanced {
                pattern: source.to_string(),
                delimiter: '{',
            });
        }
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|source_err| PatternError::Regex {
            pattern: source.to_string(),
            source: source_err,
        })?;

        Ok(Self {
            source: source.to_string(),
            regex,
            names,
        })
    }

    /// The pattern string this matcher was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Match `path` and return the decoded named captures.
    ///
    /// Optional parameters that did not participate in the match are omitted.
    pub fn captures(&self, path: &str) -> Option<Vec<(String, String)>> {
        let caps = self.regex.captures(path)?;
        let params = self
            .names
            .iter()
            .filter_map(|name| {
                caps.name(name)
                    .map(|m| (name.clone(), decode_param(m.as_str())))
            })
            .collect();
        Some(params)
    }

    /// Returns true if `path` matches, without extracting parameters.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

/// Percent-decode a captured value, keeping the raw text when decoding fails.
///
/// A value is undecodable when any `%` is not followed by two hex digits,
/// or when the decoded bytes are not UTF-8.
pub fn decode_param(raw: &str) -> String {
    if !is_well_formed_escapes(raw) {
        return raw.to_string();
    }
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

fn is_well_formed_escapes(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}

/// Read a parenthesized regex group starting at `open`. Returns the inner
/// expression and the index just past the closing parenthesis.
fn read_group(source: &str, chars: &[char], open: usize) -> Result<(String, usize), PatternError> {
    let mut depth = 0usize;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    let body = chars[open + 1..i].iter().collect();
                    return Ok((body, i + 1));
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(PatternError::Unbalanced {
        pattern: source.to_string(),
        delimiter: '(',
    })
}

fn push_param(expr: &mut String, name: &str, body: &str, modifier: Option<Modifier>) {
    let Some(modifier) = modifier else {
        expr.push_str(&format!("(?P<{name}>{body})"));
        return;
    };

    // A modified parameter right after a separator owns that separator.
    let owns_slash = expr.ends_with('/');
    if owns_slash {
        expr.pop();
    }
    let prefix = if owns_slash { "/" } else { "" };

    let group = match modifier {
        Modifier::Optional => format!("(?:{prefix}(?P<{name}>{body}))?"),
        Modifier::OneOrMore => {
            format!("(?:{prefix}(?P<{name}>(?:{body})(?:/(?:{body}))*))")
        }
        Modifier::ZeroOrMore => {
            format!("(?:{prefix}(?P<{name}>(?:{body})(?:/(?:{body}))*))?")
        }
    };
    expr.push_str(&group);
}
