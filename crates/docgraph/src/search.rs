//! Search mini-language: free text mixed with `key:value` filters.
//!
//! ```text
//! hello world score:5 name:"Bob"
//! └── free text ─┘└ filter ┘└ filter ┘
//! ```
//!
//! The input is scanned left to right for a free-text run followed by a
//! `key:value` token. The key is the whitespace-free run ending at its last
//! `:`. A value starting with `"` extends to the next `"` on the same line;
//! otherwise it runs to the next whitespace, which is consumed with it.
//!
//! Only text that precedes a token is kept as free text. Trailing text with no
//! token after it is dropped, and so is text cut off by a line break before
//! the next token.

use crate::query::quote_string;
use std::fmt;

/// Reserved key that filters on the store's own node identifier.
pub const ID_KEY: &str = "_id";

/// Comparison applied by a [`SearchPredicate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// `=`, used for the identifier key
    Equals,
    /// `CONTAINS`, used for every property key
    Contains,
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparator::Equals => write!(f, "="),
            Comparator::Contains => write!(f, "CONTAINS"),
        }
    }
}

/// Left-hand side of a [`SearchPredicate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateTarget {
    /// The store's node identifier, `id(n)`
    NodeId,
    /// A named property, rendered as ``n.`key` ``
    Property(String),
}

impl fmt::Display for PredicateTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateTarget::NodeId => write!(f, "id(n)"),
            PredicateTarget::Property(key) => write!(f, "n.`{key}`"),
        }
    }
}

/// Right-hand side of a [`SearchPredicate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchValue {
    /// Unquoted value that parsed as an integer
    Int(i64),
    /// Any other value; rendered quoted and escaped
    Str(String),
}

impl fmt::Display for SearchValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchValue::Int(i) => write!(f, "{i}"),
            SearchValue::Str(s) => write!(f, "{}", quote_string(s)),
        }
    }
}

/// One parsed `key:value` filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPredicate {
    /// What is compared
    pub target: PredicateTarget,
    /// How it is compared
    pub comparator: Comparator,
    /// What it is compared against
    pub value: SearchValue,
}

impl fmt::Display for SearchPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.target, self.comparator, self.value)
    }
}

/// Parsed search text.
///
/// # Examples
///
/// ```
/// use docgraph::SearchParams;
///
/// let params = SearchParams::parse(r#"hello world score:5 name:"Bob""#);
/// assert_eq!(params.free_text(), "hello world ");
/// assert_eq!(
///     params.to_filter_clause(),
///     "WHERE n.`score` CONTAINS 5 AND n.`name` CONTAINS 'Bob'"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    free_text: String,
    predicates: Vec<SearchPredicate>,
}

impl SearchParams {
    /// Parse search text. Never fails; unrecognized text is free text or dropped.
    pub fn parse(text: &str) -> Self {
        let mut params = Self::default();
        let mut scanner = Scanner::new(text);

        while let Some(token) = scanner.next_token() {
            params.free_text.push_str(token.text);
            params.predicates.push(token.into_predicate());
        }

        params
    }

    /// Free text that preceded the filters.
    pub fn free_text(&self) -> &str {
        &self.free_text
    }

    /// Filters in parse order.
    pub fn predicates(&self) -> &[SearchPredicate] {
        &self.predicates
    }

    /// Whether no filters were found.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// `WHERE p1 AND p2 ...`, or an empty string when there are no filters.
    pub fn to_filter_clause(&self) -> String {
        if self.predicates.is_empty() {
            return String::new();
        }

        let joined: Vec<String> = self.predicates.iter().map(ToString::to_string).collect();
        format!("WHERE {}", joined.join(" AND "))
    }
}

impl fmt::Display for SearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_filter_clause())
    }
}

#[derive(Debug, PartialEq, Eq)]
enum RawValue<'a> {
    Quoted(&'a str),
    Bare(&'a str),
}

#[derive(Debug)]
struct Token<'a> {
    text: &'a str,
    key: &'a str,
    value: RawValue<'a>,
}

impl Token<'_> {
    fn into_predicate(self) -> SearchPredicate {
        let value = match self.value {
            RawValue::Bare(raw) => match raw.parse::<i64>() {
                Ok(i) => SearchValue::Int(i),
                Err(_) => SearchValue::Str(raw.to_string()),
            },
            RawValue::Quoted(raw) => SearchValue::Str(raw.to_string()),
        };

        if self.key == ID_KEY {
            SearchPredicate {
                target: PredicateTarget::NodeId,
                comparator: Comparator::Equals,
                value,
            }
        } else {
            SearchPredicate {
                target: PredicateTarget::Property(self.key.replace('`', "")),
                comparator: Comparator::Contains,
                value,
            }
        }
    }
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn next_token(&mut self) -> Option<Token<'a>> {
        let input = self.input;
        let mut text_start = self.pos;
        let mut cursor = self.pos;

        while let Some(c) = input[cursor..].chars().next() {
            if c.is_whitespace() {
                cursor += c.len_utf8();
                if is_line_terminator(c) {
                    text_start = cursor;
                }
                continue;
            }

            let run_end = input[cursor..]
                .find(char::is_whitespace)
                .map_or(input.len(), |i| cursor + i);

            match input[cursor..run_end].rfind(':') {
                Some(colon) => {
                    let key_end = cursor + colon;
                    let (value, end) = self.scan_value(key_end + 1);
                    self.pos = end;
                    return Some(Token {
                        text: &input[text_start..cursor],
                        key: &input[cursor..key_end],
                        value,
                    });
                }
                None => cursor = run_end,
            }
        }

        self.pos = input.len();
        None
    }

    /// Scan the value starting at byte `start`; returns it and the resume offset.
    fn scan_value(&self, start: usize) -> (RawValue<'a>, usize) {
        let rest = &self.input[start..];

        if let Some(quoted) = rest.strip_prefix('"') {
            if let Some(close) = quoted.find(|c: char| c == '"' || is_line_terminator(c)) {
                if quoted[close..].starts_with('"') {
                    return (RawValue::Quoted(&quoted[..close]), start + 1 + close + 1);
                }
            }
        }

        match rest.char_indices().find(|(_, c)| c.is_whitespace()) {
            Some((i, ws)) => (RawValue::Bare(&rest[..i]), start + i + ws.len_utf8()),
            None => (RawValue::Bare(rest), self.input.len()),
        }
    }
}
