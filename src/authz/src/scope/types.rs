//! Scope and grant-pattern type definitions
//!
//! A scope is a slash-separated permission string (`orders/42/refund`).
//! A grant pattern is a scope that may contain glob wildcards.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use wildmatch::WildMatch;

/// Result type for scope operations
pub type ScopeResult<T> = Result<T, ScopeError>;

/// Errors that can occur while parsing scopes and grant patterns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// Empty scope string provided
    EmptyScope,
    /// A segment between two slashes is empty
    EmptySegment(String),
    /// A required scope contains a wildcard
    UnexpectedWildcard(String),
    /// A required scope still contains a `{placeholder}`
    UnresolvedPlaceholder(String),
}

impl fmt::Display for ScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyScope => write!(f, "Scope cannot be empty"),
            Self::EmptySegment(scope) => write!(f, "Scope '{}' has an empty segment", scope),
            Self::UnexpectedWildcard(scope) => {
                write!(f, "Required scope '{}' cannot contain wildcards", scope)
            }
            Self::UnresolvedPlaceholder(scope) => {
                write!(f, "Required scope '{}' has an unresolved placeholder", scope)
            }
        }
    }
}

impl std::error::Error for ScopeError {}

/// Splits a scope-like string into segments.
///
/// One leading and one trailing slash are ignored; any other empty segment
/// is an error.
fn split_segments(s: &str) -> ScopeResult<Vec<&str>> {
    let trimmed = s.strip_prefix('/').unwrap_or(s);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

    if trimmed.is_empty() {
        return Err(ScopeError::EmptyScope);
    }

    let segments: Vec<&str> = trimmed.split('/').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(ScopeError::EmptySegment(s.to_string()));
    }

    Ok(segments)
}

/// Characters a request value may not carry into a scope segment
const RESERVED: [char; 6] = ['%', '/', '*', '?', '{', '}'];

/// Escapes a request-supplied value so it forms exactly one literal segment.
///
/// `%`, `/`, `*`, `?`, `{` and `}` are percent-encoded and an empty value
/// becomes `%00`, so the result always parses as a segment of a [`Scope`]
/// and never acts as a wildcard.
///
/// ```
/// use authx_authz::scope::escape_segment;
///
/// assert_eq!(escape_segment("42"), "42");
/// assert_eq!(escape_segment("a/b*"), "a%2Fb%2A");
/// assert_eq!(escape_segment(""), "%00");
/// ```
pub fn escape_segment(value: &str) -> Cow<'_, str> {
    if value.is_empty() {
        return Cow::Borrowed("%00");
    }
    if !value.contains(RESERVED) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        if RESERVED.contains(&c) {
            escaped.push_str(&format!("%{:02X}", c as u32));
        } else {
            escaped.push(c);
        }
    }
    Cow::Owned(escaped)
}

/// A concrete scope required by an operation
///
/// # Examples
///
/// ```
/// use authx_authz::scope::Scope;
///
/// let scope = Scope::new("orders/42/refund").unwrap();
/// assert_eq!(scope.depth(), 3);
/// assert_eq!(scope.last_segment(), "refund");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    /// Normalized scope string (no leading/trailing slash)
    raw: String,
    /// Parsed segments
    segments: Vec<String>,
}

impl Scope {
    /// Parses a required scope.
    ///
    /// Wildcards (`*`, `?`) and placeholder braces (`{`, `}`) are rejected:
    /// those belong to grant patterns and scope templates respectively.
    pub fn new(s: &str) -> ScopeResult<Self> {
        let segments = split_segments(s)?;

        if segments.iter().any(|segment| segment.contains(['*', '?'])) {
            return Err(ScopeError::UnexpectedWildcard(s.to_string()));
        }
        if segments.iter().any(|segment| segment.contains(['{', '}'])) {
            return Err(ScopeError::UnresolvedPlaceholder(s.to_string()));
        }

        Ok(Self {
            raw: segments.join("/"),
            segments: segments.into_iter().map(str::to_string).collect(),
        })
    }

    /// Returns the segments of this scope
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the normalized scope string
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the depth of this scope (number of segments)
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Returns the final segment; handed to the terminal right predicate
    pub fn last_segment(&self) -> &str {
        // Construction guarantees at least one segment.
        self.segments.last().map(String::as_str).unwrap_or_default()
    }
}

impl FromStr for Scope {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// One segment of a grant pattern
#[derive(Debug, Clone)]
enum PatternSegment {
    /// Matches a segment byte-for-byte
    Literal(String),
    /// Contains `*` or `?`; matched within a single segment
    Glob(WildMatch),
    /// `**`: zero or more whole segments
    Recursive,
}

impl PatternSegment {
    fn parse(segment: &str) -> Self {
        if segment == "**" {
            PatternSegment::Recursive
        } else if segment.contains(['*', '?']) {
            PatternSegment::Glob(WildMatch::new(segment))
        } else {
            PatternSegment::Literal(segment.to_string())
        }
    }

    fn matches(&self, segment: &str) -> bool {
        match self {
            PatternSegment::Literal(literal) => literal == segment,
            PatternSegment::Glob(glob) => glob.matches(segment),
            PatternSegment::Recursive => true,
        }
    }
}

/// A scope pattern held in an identity's grant set
///
/// Supports:
/// - Exact segments: `orders/42/read`
/// - In-segment wildcards: `orders/*/read`, `orders/4?/read`, `orders/4*/read`
/// - Recursive wildcard `**` as a whole segment, anywhere: `orders/**`, `**/read`
///
/// `*` and `?` never cross a `/`.
#[derive(Debug, Clone)]
pub struct GrantPattern {
    raw: String,
    segments: Vec<PatternSegment>,
}

impl GrantPattern {
    pub fn new(s: &str) -> ScopeResult<Self> {
        let segments = split_segments(s)?;

        Ok(Self {
            raw: segments.join("/"),
            segments: segments.into_iter().map(PatternSegment::parse).collect(),
        })
    }

    /// Returns the normalized pattern string
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns whether this pattern contains any wildcard
    pub fn has_wildcards(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| !matches!(segment, PatternSegment::Literal(_)))
    }

    /// Checks whether `scope` is covered by this pattern
    pub fn matches(&self, scope: &Scope) -> bool {
        match_segments(&self.segments, scope.segments())
    }
}

fn match_segments(pattern: &[PatternSegment], segments: &[String]) -> bool {
    match pattern.split_first() {
        None => segments.is_empty(),
        Some((PatternSegment::Recursive, rest)) => {
            // `**` absorbs 0..=n leading segments
            (0..=segments.len()).any(|skip| match_segments(rest, &segments[skip..]))
        }
        Some((head, rest)) => match segments.split_first() {
            Some((segment, remaining)) => head.matches(segment) && match_segments(rest, remaining),
            None => false,
        },
    }
}

// Segments are derived from `raw`
impl PartialEq for GrantPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for GrantPattern {}

impl Hash for GrantPattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl FromStr for GrantPattern {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for GrantPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}
