//! Path pattern compilation.
//!
//! Source patterns use the familiar `path-to-regexp` syntax:
//!
//! | Syntax          | Matches                                   |
//! |-----------------|-------------------------------------------|
//! | `/about`        | the literal path                          |
//! | `/users/:id`    | exactly one segment                       |
//! | `/users/:id?`   | zero or one segment                       |
//! | `/docs/:path*`  | zero or more segments                     |
//! | `/docs/:path+`  | one or more segments                      |
//! | `/post/:id(\d+)`| one segment matching the custom pattern   |
//! | `/(api|rpc)/x`  | an unnamed custom group                   |
//!
//! Matching is case-insensitive and tolerates a trailing slash. Custom groups
//! use the `regex` crate syntax, so look-around assertions are rejected.

use regex::Regex;
use std::iter::Peekable;
use std::str::Chars;

/// Pattern of a parameter without a custom group.
const DEFAULT_SEGMENT: &str = "[^/#?]+?";

/// A compiled `source` pattern.
#[derive(Debug, Clone)]
pub struct SourcePattern {
    source: String,
    regex: Regex,
}

impl SourcePattern {
    /// Compiles a source pattern.
    ///
    /// When `locales` is non-empty, an optional leading locale segment is
    /// accepted in front of the pattern.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the pattern is malformed.
    ///
    /// # Example
    ///
    /// ```
    /// use tessera_matcher::SourcePattern;
    ///
    /// let pattern = SourcePattern::compile("/blog/:slug", &["en".to_string()]).unwrap();
    /// assert!(pattern.is_match("/blog/hello"));
    /// assert!(pattern.is_match("/en/blog/hello"));
    /// assert!(!pattern.is_match("/blog"));
    /// ```
    pub fn compile(source: &str, locales: &[String]) -> Result<Self, String> {
        if !source.starts_with('/') {
            return Err("pattern must start with '/'".to_string());
        }

        let trimmed = source.strip_suffix('/').unwrap_or(source);
        let body = translate(trimmed)?;

        let locale_prefix = if locales.is_empty() {
            String::new()
        } else {
            let alternatives: Vec<String> = locales.iter().map(|l| regex::escape(l)).collect();
            format!("(?:/(?:{}))?", alternatives.join("|"))
        };

        let regex = Regex::new(&format!("(?i)^{locale_prefix}{body}/?$"))
            .map_err(|e| e.to_string())?;

        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// Returns `true` if the path matches.
    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Returns the original pattern.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the compiled regular expression.
    #[must_use]
    pub fn as_regex(&self) -> &Regex {
        &self.regex
    }
}

fn translate(source: &str) -> Result<String, String> {
    let mut out = String::with_capacity(source.len() * 2);
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escaped = chars
                    .next()
                    .ok_or_else(|| "trailing escape character".to_string())?;
                push_literal(&mut out, escaped);
            }
            ':' => {
                let mut name = String::new();
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        name.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }

                if name.is_empty() {
                    return Err("missing parameter name after ':'".to_string());
                }

                let pattern = if chars.peek() == Some(&'(') {
                    chars.next();
                    read_group(&mut chars)?
                } else {
                    DEFAULT_SEGMENT.to_string()
                };

                let modifier = read_modifier(&mut chars);
                push_parameter(&mut out, &pattern, modifier);
            }
            '(' => {
                let pattern = read_group(&mut chars)?;
                let modifier = read_modifier(&mut chars);
                push_parameter(&mut out, &pattern, modifier);
            }
            ')' => return Err("unbalanced ')'".to_string()),
            '?' | '*' | '+' => {
                return Err(format!("unexpected modifier '{c}' without a parameter"))
            }
            _ => push_literal(&mut out, c),
        }
    }

    Ok(out)
}

fn push_literal(out: &mut String, c: char) {
    let mut buf = [0u8; 4];
    out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}

fn read_group(chars: &mut Peekable<Chars<'_>>) -> Result<String, String> {
    let mut pattern = String::new();
    let mut depth = 1;

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                pattern.push(c);
                if let Some(escaped) = chars.next() {
                    pattern.push(escaped);
                }
                continue;
            }
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    if pattern.is_empty() {
                        return Err("empty group".to_string());
                    }
                    return Ok(pattern);
                }
            }
            _ => {}
        }
        pattern.push(c);
    }

    Err("unterminated group".to_string())
}

fn read_modifier(chars: &mut Peekable<Chars<'_>>) -> Option<char> {
    match chars.peek() {
        Some(&m @ ('?' | '*' | '+')) => {
            chars.next();
            Some(m)
        }
        _ => None,
    }
}

fn push_parameter(out: &mut String, pattern: &str, modifier: Option<char>) {
    // A preceding slash belongs to the parameter so optional segments can
    // disappear entirely.
    let prefix = if out.ends_with('/') {
        out.pop();
        "/"
    } else {
        ""
    };

    let segment = format!("{prefix}(?:{pattern})");

    match modifier {
        None => out.push_str(&segment),
        Some('?') => out.push_str(&format!("(?:{segment})?")),
        Some('+') => out.push_str(&format!("{segment}(?:{segment})*")),
        Some(_) => out.push_str(&format!("(?:{segment}(?:{segment})*)?")),
    }
}
