//! Recursive-descent parser over [`Lexer`] tokens.

use super::ast::*;
use super::lexer::{Lexer, Token, TokenType};
use crate::error::{GraphError, Result};
use crate::graph::{Direction, PropertyValue};

/// Parse statement text into queries. `;` separates independent queries.
pub(crate) fn parse(input: &str) -> Result<Vec<Query>> {
    let tokens = Lexer::new(input).tokenize()?;
    let mut parser = TokenParser::new(input, tokens);

    let mut queries = Vec::new();
    while !parser.is_at_end() {
        if parser.match_token(&TokenType::Semicolon) {
            continue;
        }
        queries.push(parser.parse_query()?);
    }
    Ok(queries)
}

struct TokenParser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    position: usize,
}

impl<'a> TokenParser<'a> {
    fn new(input: &'a str, tokens: Vec<Token>) -> Self {
        Self {
            input,
            tokens,
            position: 0,
        }
    }

    fn parse_query(&mut self) -> Result<Query> {
        let mut clauses = Vec::new();
        while !self.is_at_end() && !self.check(&TokenType::Semicolon) {
            clauses.push(self.parse_clause()?);
        }
        Ok(Query { clauses })
    }

    fn parse_clause(&mut self) -> Result<Clause> {
        if self.match_token(&TokenType::Merge) {
            return Ok(Clause::Merge(self.parse_pattern()?));
        }
        if self.match_token(&TokenType::Match) {
            let pattern = self.parse_pattern()?;
            let filter = if self.match_token(&TokenType::Where) {
                self.parse_conjunction()?
            } else {
                Vec::new()
            };
            return Ok(Clause::Match { pattern, filter });
        }
        if self.match_token(&TokenType::Return) {
            return Ok(Clause::Return(self.parse_return_items()?));
        }
        Err(self.error("expected MERGE, MATCH or RETURN"))
    }

    fn parse_pattern(&mut self) -> Result<Pattern> {
        let start = self.parse_node_pattern()?;
        let hop = if self.check(&TokenType::LeftArrow) || self.check(&TokenType::Dash) {
            let relationship = self.parse_relationship_pattern()?;
            let end = self.parse_node_pattern()?;
            Some((relationship, end))
        } else {
            None
        };
        Ok(Pattern { start, hop })
    }

    fn parse_node_pattern(&mut self) -> Result<NodePattern> {
        self.consume(&TokenType::LeftParen, "expected '('")?;

        let variable = self.match_identifier();
        let label = if self.match_token(&TokenType::Colon) {
            Some(self.consume_identifier("expected label after ':'")?)
        } else {
            None
        };
        let properties = if self.check(&TokenType::LeftBrace) {
            self.parse_property_map()?
        } else {
            Vec::new()
        };

        self.consume(&TokenType::RightParen, "expected ')'")?;
        Ok(NodePattern {
            variable,
            label,
            properties,
        })
    }

    fn parse_relationship_pattern(&mut self) -> Result<RelationshipPattern> {
        let incoming = if self.match_token(&TokenType::LeftArrow) {
            true
        } else {
            self.consume(&TokenType::Dash, "expected '-' or '<-'")?;
            false
        };

        let mut variable = None;
        let mut rel_type = None;
        if self.match_token(&TokenType::LeftBracket) {
            variable = self.match_identifier();
            if self.match_token(&TokenType::Colon) {
                rel_type = Some(self.consume_identifier("expected relationship type after ':'")?);
            }
            self.consume(&TokenType::RightBracket, "expected ']'")?;
        }

        let outgoing = if self.match_token(&TokenType::RightArrow) {
            true
        } else {
            self.consume(&TokenType::Dash, "expected '-' or '->'")?;
            false
        };

        let direction = match (incoming, outgoing) {
            (true, false) => Direction::Incoming,
            (false, true) => Direction::Outgoing,
            (false, false) => Direction::Both,
            (true, true) => return Err(self.error("relationship cannot point both ways")),
        };

        Ok(RelationshipPattern {
            variable,
            rel_type,
            direction,
        })
    }

    fn parse_property_map(&mut self) -> Result<Vec<(String, PropertyValue)>> {
        self.consume(&TokenType::LeftBrace, "expected '{'")?;
        let mut properties = Vec::new();

        if !self.check(&TokenType::RightBrace) {
            loop {
                let key = self.consume_identifier("expected property key")?;
                self.consume(&TokenType::Colon, "expected ':' after property key")?;
                let value = self.parse_literal()?;
                properties.push((key, value));

                if !self.match_token(&TokenType::Comma) {
                    break;
                }
            }
        }

        self.consume(&TokenType::RightBrace, "expected '}'")?;
        Ok(properties)
    }

    fn parse_literal(&mut self) -> Result<PropertyValue> {
        let negative = self.match_token(&TokenType::Dash);
        let value = match self.peek().token_type.clone() {
            TokenType::Integer(i) => PropertyValue::Int(if negative { -i } else { i }),
            TokenType::Float(f) => PropertyValue::Float(if negative { -f } else { f }),
            _ if negative => return Err(self.error("expected number after '-'")),
            TokenType::String(s) => PropertyValue::String(s),
            TokenType::True => PropertyValue::Bool(true),
            TokenType::False => PropertyValue::Bool(false),
            TokenType::Null => PropertyValue::Null,
            TokenType::LeftBracket => {
                self.advance();
                let mut items = Vec::new();
                if !self.check(&TokenType::RightBracket) {
                    loop {
                        items.push(self.parse_literal()?);
                        if !self.match_token(&TokenType::Comma) {
                            break;
                        }
                    }
                }
                self.consume(&TokenType::RightBracket, "expected ']'")?;
                return Ok(PropertyValue::List(items));
            }
            _ => return Err(self.error("expected literal")),
        };
        self.advance();
        Ok(value)
    }

    fn parse_conjunction(&mut self) -> Result<Vec<Comparison>> {
        let mut comparisons = vec![self.parse_comparison()?];
        while self.match_token(&TokenType::And) {
            comparisons.push(self.parse_comparison()?);
        }
        Ok(comparisons)
    }

    fn parse_comparison(&mut self) -> Result<Comparison> {
        let left = self.parse_operand()?;
        let op = if self.match_token(&TokenType::Equals) {
            CompareOp::Equals
        } else if self.match_token(&TokenType::NotEquals) {
            CompareOp::NotEquals
        } else if self.match_token(&TokenType::Contains) {
            CompareOp::Contains
        } else {
            return Err(self.error("expected '=', '<>' or CONTAINS"));
        };
        let right = self.parse_operand()?;
        Ok(Comparison { left, op, right })
    }

    fn parse_operand(&mut self) -> Result<Operand> {
        let Some(name) = self.match_identifier() else {
            return self.parse_literal().map(Operand::Literal);
        };

        if self.match_token(&TokenType::Dot) {
            let key = self.consume_identifier("expected property name after '.'")?;
            return Ok(Operand::Property {
                variable: name,
                key,
            });
        }

        let operand = match name.to_ascii_lowercase().as_str() {
            "id" => Operand::Id(self.parse_call_argument()?),
            "labels" => Operand::Labels(self.parse_call_argument()?),
            _ => return Err(self.previous_error("expected property access, id() or labels()")),
        };
        Ok(operand)
    }

    fn parse_return_items(&mut self) -> Result<Vec<ReturnItem>> {
        let mut items = Vec::new();
        loop {
            let start = self.peek().position;
            let projection = if self.check_function("count") {
                self.advance();
                Projection::Count(self.parse_call_argument()?)
            } else {
                Projection::Value(self.parse_operand()?)
            };
            let name = self.input[start..self.peek().position].trim().to_string();
            items.push(ReturnItem { projection, name });

            if !self.match_token(&TokenType::Comma) {
                break;
            }
        }
        Ok(items)
    }

    fn parse_call_argument(&mut self) -> Result<String> {
        self.consume(&TokenType::LeftParen, "expected '('")?;
        let variable = self.consume_identifier("expected variable")?;
        self.consume(&TokenType::RightParen, "expected ')'")?;
        Ok(variable)
    }

    fn check_function(&self, name: &str) -> bool {
        matches!(
            &self.peek().token_type,
            TokenType::Identifier(id) if id.eq_ignore_ascii_case(name)
        )
            && matches!(
                self.tokens.get(self.position + 1).map(|t| &t.token_type),
                Some(TokenType::LeftParen)
            )
    }

    fn match_identifier(&mut self) -> Option<String> {
        if let TokenType::Identifier(name) = &self.peek().token_type {
            let name = name.clone();
            self.advance();
            Some(name)
        } else {
            None
        }
    }

    fn consume_identifier(&mut self, message: &str) -> Result<String> {
        self.match_identifier().ok_or_else(|| self.error(message))
    }

    fn consume(&mut self, token_type: &TokenType, message: &str) -> Result<&Token> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            Err(self.error(message))
        }
    }

    fn match_token(&mut self, token_type: &TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, token_type: &TokenType) -> bool {
        std::mem::discriminant(&self.peek().token_type) == std::mem::discriminant(token_type)
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        &self.tokens[self.position - 1]
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::Eof)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn error(&self, message: &str) -> GraphError {
        GraphError::statement(message, self.peek().position)
    }

    fn previous_error(&self, message: &str) -> GraphError {
        let at = self.position.saturating_sub(1);
        GraphError::statement(message, self.tokens[at].position)
    }
}
