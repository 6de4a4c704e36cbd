//! Path pattern compilation.
//!
//! # Responsibilities
//! - Turn a `?`/`*` wildcard pattern into an exact literal or a regex
//! - Keep literal dots literal
//! - Anchor the end unless the pattern ends in `*`
//!
//! # Design Decisions
//! - Dots are escaped before wildcard markers are inserted; the inserted
//!   `.` markers must not be escaped
//! - No start anchor is added; the edge platform matches unanchored
//! - Patterns are validated with the `regex` crate so request-time
//!   evaluation and the generated VCL agree on what compiles

use regex::Regex;

use crate::compiler::types::{CompileError, CompileResult};

const ANY_SEQUENCE: &str = ".*";

/// A compiled path match condition.
#[derive(Debug, Clone)]
pub enum RouteMatch {
    /// Matches only this exact path.
    Exact(String),
    /// Matches paths the regex finds a match in.
    Regex(Regex),
}

impl RouteMatch {
    /// Returns true if the request path satisfies this condition.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            RouteMatch::Exact(literal) => literal == path,
            RouteMatch::Regex(re) => re.is_match(path),
        }
    }

    /// The literal or regex source, as it appears in generated VCL.
    pub fn pattern(&self) -> &str {
        match self {
            RouteMatch::Exact(literal) => literal,
            RouteMatch::Regex(re) => re.as_str(),
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, RouteMatch::Regex(_))
    }
}

impl PartialEq for RouteMatch {
    fn eq(&self, other: &Self) -> bool {
        self.is_regex() == other.is_regex() && self.pattern() == other.pattern()
    }
}

impl Eq for RouteMatch {}

fn has_wildcard(pattern: &str) -> bool {
    pattern.contains(['?', '*'])
}

/// Compile a source path pattern.
pub fn compile_path_pattern(pattern: &str) -> CompileResult<RouteMatch> {
    if pattern.contains('"') {
        return Err(CompileError::InvalidPathPattern {
            pattern: pattern.to_string(),
            reason: "double quotes cannot appear in a VCL string".to_string(),
        });
    }

    if !has_wildcard(pattern) {
        return Ok(RouteMatch::Exact(pattern.to_string()));
    }

    let escaped = pattern.replace('.', r"\.");

    let mut source = String::with_capacity(escaped.len() * 2);
    for ch in escaped.chars() {
        if ch == '?' || ch == '*' {
            source.push('.');
        }
        source.push(ch);
    }

    if source.ends_with(ANY_SEQUENCE) {
        source.truncate(source.len() - ANY_SEQUENCE.len());
    } else {
        source.push('$');
    }

    let re = Regex::new(&source).map_err(|e| CompileError::InvalidPathPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    Ok(RouteMatch::Regex(re))
}
