//
//  atlas-client
//  archive/glob.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Shell-style glob patterns for archive include and exclude filters.
//!
//! Patterns match a whole `/`-separated relative path. `*` matches any run of
//! characters other than `/`, `?` matches one such character, `[...]` is a
//! character class (`[^...]` or `[!...]` negates it) and `\` escapes the next
//! character. There is no recursive `**`.

use regex::Regex;

use super::ArchiveError;

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct Glob {
    pattern: String,
    regex: Regex,
    /// One anchored regex per `/`-separated segment of the pattern
    segments: Vec<Regex>,
}

impl Glob {
    /// Compiles `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Glob`] for an unterminated or empty character
    /// class, or a trailing escape.
    ///
    /// # Example
    ///
    /// ```rust
    /// use atlas_client::archive::Glob;
    ///
    /// let glob = Glob::new("src/*.rs")?;
    /// assert!(glob.is_match("src/lib.rs"));
    /// assert!(!glob.is_match("src/api/client.rs"));
    /// # Ok::<(), atlas_client::archive::ArchiveError>(())
    /// ```
    pub fn new(pattern: &str) -> Result<Self, ArchiveError> {
        let source = translate(pattern).map_err(|message| ArchiveError::Glob {
            pattern: pattern.to_string(),
            message,
        })?;

        let regex = Regex::new(&source).map_err(|e| ArchiveError::Glob {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        let segments = split_segments(pattern)
            .iter()
            .map(|segment| {
                translate(segment)
                    .and_then(|source| Regex::new(&source).map_err(|e| e.to_string()))
                    .map_err(|message| ArchiveError::Glob {
                        pattern: pattern.to_string(),
                        message,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            segments,
        })
    }

    /// Returns whether `path` matches this pattern in full.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Returns whether some path strictly below directory `dir` could match.
    ///
    /// True when the pattern has more segments than `dir` and its leading
    /// segments match those of `dir`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use atlas_client::archive::Glob;
    ///
    /// let glob = Glob::new("modules/*/main.tf")?;
    /// assert!(glob.may_match_below("modules"));
    /// assert!(glob.may_match_below("modules/vpc"));
    /// assert!(!glob.may_match_below("modules/vpc/main.tf"));
    /// assert!(!glob.may_match_below("docs"));
    /// # Ok::<(), atlas_client::archive::ArchiveError>(())
    /// ```
    pub fn may_match_below(&self, dir: &str) -> bool {
        let parts: Vec<&str> = dir.split('/').collect();
        self.segments.len() > parts.len()
            && self
                .segments
                .iter()
                .zip(&parts)
                .all(|(segment, part)| segment.is_match(part))
    }

    /// Returns the pattern as written.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

/// Compiles every pattern in `patterns`, stopping at the first bad one.
pub(crate) fn compile_all(patterns: &[String]) -> Result<Vec<Glob>, ArchiveError> {
    patterns.iter().map(|p| Glob::new(p)).collect()
}

/// Splits `pattern` on `/`, leaving escaped characters in place.
fn split_segments(pattern: &str) -> Vec<String> {
    let mut segments = vec![String::new()];
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(current) = segments.last_mut() {
                    current.push(c);
                    current.extend(chars.next());
                }
            }
            '/' => segments.push(String::new()),
            other => {
                if let Some(current) = segments.last_mut() {
                    current.push(other);
                }
            }
        }
    }
    segments
}

/// Escapes glob metacharacters so `literal` matches only itself.
///
/// # Example
///
/// ```rust
/// use atlas_client::archive::{escape, Glob};
///
/// let glob = Glob::new(&escape("report[1].txt"))?;
/// assert!(glob.is_match("report[1].txt"));
/// assert!(!glob.is_match("report1.txt"));
/// # Ok::<(), atlas_client::archive::ArchiveError>(())
/// ```
pub fn escape(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for c in literal.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn translate(pattern: &str) -> Result<String, String> {
    let mut out = String::from("^");
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '\\' => match chars.next() {
                Some(next) => out.push_str(&regex::escape(&next.to_string())),
                None => return Err("trailing escape character".to_string()),
            },
            '[' => {
                out.push('[');
                if matches!(chars.peek(), Some('^') | Some('!')) {
                    chars.next();
                    out.push_str("^/");
                }

                let mut items = 0;
                loop {
                    let lo = match chars.next() {
                        None => return Err("unterminated character class".to_string()),
                        Some(']') if items > 0 => break,
                        Some(']') => return Err("empty character class".to_string()),
                        Some('\\') => chars
                            .next()
                            .ok_or_else(|| "trailing escape character".to_string())?,
                        Some(other) => other,
                    };
                    out.push_str(&regex::escape(&lo.to_string()));

                    if chars.peek() == Some(&'-') {
                        chars.next();
                        let hi = match chars.next() {
                            None | Some(']') => {
                                return Err("unterminated character range".to_string())
                            }
                            Some('\\') => chars
                                .next()
                                .ok_or_else(|| "trailing escape character".to_string())?,
                            Some(other) => other,
                        };
                        if hi < lo {
                            return Err(format!("invalid character range {}-{}", lo, hi));
                        }
                        out.push('-');
                        out.push_str(&regex::escape(&hi.to_string()));
                    }
                    items += 1;
                }
                out.push(']');
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }

    out.push('$');
    Ok(out)
}
