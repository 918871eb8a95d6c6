//! Tokenizer for the statement dialect understood by the memory store.

use crate::error::{GraphError, Result};
use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenType {
    // Keywords
    Merge,
    Match,
    Where,
    Return,
    And,
    Contains,
    True,
    False,
    Null,

    // Symbols
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Colon,
    Semicolon,
    Comma,
    Dot,

    // Relationships
    LeftArrow,
    RightArrow,
    Dash,

    // Operators
    Equals,
    NotEquals,

    // Literals
    String(String),
    Integer(i64),
    Float(f64),

    // Identifiers (backtick-quoted names are never keywords)
    Identifier(String),

    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub token_type: TokenType,
    /// Byte offset of the token's first character
    pub position: usize,
}

pub(crate) struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        tokens.push(Token {
            token_type: TokenType::Eof,
            position: self.input.len(),
        });
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        self.skip_whitespace();

        let Some((position, c)) = self.chars.next() else {
            return Ok(None);
        };

        let token_type = match c {
            '\'' | '"' => self.read_string(c, position)?,
            '`' => self.read_quoted_identifier(position)?,
            c if c.is_ascii_digit() => self.read_number(position)?,
            c if c.is_alphabetic() || c == '_' => self.read_identifier(position),
            '(' => TokenType::LeftParen,
            ')' => TokenType::RightParen,
            '[' => TokenType::LeftBracket,
            ']' => TokenType::RightBracket,
            '{' => TokenType::LeftBrace,
            '}' => TokenType::RightBrace,
            ':' => TokenType::Colon,
            ';' => TokenType::Semicolon,
            ',' => TokenType::Comma,
            '.' => TokenType::Dot,
            '=' => TokenType::Equals,
            '-' => {
                if self.next_if_eq('>') {
                    TokenType::RightArrow
                } else {
                    TokenType::Dash
                }
            }
            '<' => {
                if self.next_if_eq('-') {
                    TokenType::LeftArrow
                } else if self.next_if_eq('>') {
                    TokenType::NotEquals
                } else {
                    return Err(GraphError::statement("unexpected character '<'", position));
                }
            }
            other => {
                return Err(GraphError::statement(
                    format!("unexpected character '{other}'"),
                    position,
                ))
            }
        };

        Ok(Some(Token {
            token_type,
            position,
        }))
    }

    fn next_if_eq(&mut self, expected: char) -> bool {
        self.chars.next_if(|&(_, c)| c == expected).is_some()
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|&(_, c)| c.is_whitespace()).is_some() {}
    }

    /// Read a quoted string; `\` escapes the following character.
    fn read_string(&mut self, quote: char, start: usize) -> Result<TokenType> {
        let mut value = String::new();
        while let Some((_, c)) = self.chars.next() {
            match c {
                '\\' => match self.chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, escaped)) => value.push(escaped),
                    None => break,
                },
                c if c == quote => return Ok(TokenType::String(value)),
                c => value.push(c),
            }
        }
        Err(GraphError::statement("unterminated string literal", start))
    }

    fn read_quoted_identifier(&mut self, start: usize) -> Result<TokenType> {
        let mut name = String::new();
        for (_, c) in self.chars.by_ref() {
            if c == '`' {
                return Ok(TokenType::Identifier(name));
            }
            name.push(c);
        }
        Err(GraphError::statement("unterminated quoted identifier", start))
    }

    fn read_number(&mut self, start: usize) -> Result<TokenType> {
        let mut end = start + 1;
        let mut is_float = false;

        while let Some(&(i, c)) = self.chars.peek() {
            if c.is_ascii_digit() {
                self.chars.next();
                end = i + 1;
            } else if c == '.' && !is_float && self.digit_follows(i + 1) {
                is_float = true;
                self.chars.next();
                end = i + 1;
            } else if (c == 'e' || c == 'E') && self.exponent_follows(i + 1) {
                is_float = true;
                self.chars.next();
                if let Some(&(sign_at, '+' | '-')) = self.chars.peek() {
                    self.chars.next();
                    end = sign_at + 1;
                }
                while let Some(&(j, d)) = self.chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    self.chars.next();
                    end = j + 1;
                }
                break;
            } else {
                break;
            }
        }

        let text = &self.input[start..end];
        if is_float {
            text.parse::<f64>()
                .map(TokenType::Float)
                .map_err(|_| GraphError::statement(format!("invalid number '{text}'"), start))
        } else {
            text.parse::<i64>()
                .map(TokenType::Integer)
                .map_err(|_| GraphError::statement(format!("integer out of range '{text}'"), start))
        }
    }

    fn digit_follows(&self, at: usize) -> bool {
        self.input[at..].starts_with(|c: char| c.is_ascii_digit())
    }

    fn exponent_follows(&self, at: usize) -> bool {
        let rest = &self.input[at..];
        let rest = rest.strip_prefix(['+', '-']).unwrap_or(rest);
        rest.starts_with(|c: char| c.is_ascii_digit())
    }

    fn read_identifier(&mut self, start: usize) -> TokenType {
        let mut end = start;
        while let Some(&(i, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.chars.next();
                end = i;
            } else {
                break;
            }
        }
        let end = end + self.input[end..].chars().next().map_or(0, char::len_utf8);
        let word = &self.input[start..end];

        keyword(word).unwrap_or_else(|| TokenType::Identifier(word.to_string()))
    }
}

fn keyword(word: &str) -> Option<TokenType> {
    let token_type = match word.to_ascii_uppercase().as_str() {
        "MERGE" => TokenType::Merge,
        "MATCH" => TokenType::Match,
        "WHERE" => TokenType::Where,
        "RETURN" => TokenType::Return,
        "AND" => TokenType::And,
        "CONTAINS" => TokenType::Contains,
        "TRUE" => TokenType::True,
        "FALSE" => TokenType::False,
        "NULL" => TokenType::Null,
        _ => return None,
    };
    Some(token_type)
}

/// Whether `word` can appear unquoted as a label, relationship type or key.
pub(crate) fn is_plain_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_');
    starts_well
        && chars.all(|c| c.is_alphanumeric() || c == '_')
        && keyword(word).is_none()
}
