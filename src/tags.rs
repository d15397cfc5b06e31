//! Boolean tag-filter expressions.
//!
//! A tag expression selects scenarios for generation: `@smoke and not
//! (@wip or @flaky)`. Expressions are parsed once per configuration and
//! evaluated against each pickle's tag list before any output is emitted,
//! so filtered scenarios never reach the generated files.
//!
//! ```rust
//! use picklegen::tags::TagExpression;
//!
//! let expr = TagExpression::parse("@smoke and not @wip").expect("parse");
//! assert!(expr.evaluate(&["@smoke".into()]));
//! assert!(!expr.evaluate(&["@smoke".into(), "@wip".into()]));
//! ```

use std::fmt::{self, Display, Formatter};
use thiserror::Error;

/// Errors raised while parsing a tag expression.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TagExpressionError {
    /// The expression contained no tokens.
    #[error("tag expression is empty")]
    Empty,

    /// A token was neither a tag, an operator, nor a parenthesis.
    #[error("unexpected token '{token}' in tag expression")]
    UnexpectedToken {
        /// The offending token.
        token: String,
    },

    /// The expression ended while an operand or `)` was still expected.
    #[error("tag expression ended unexpectedly")]
    UnexpectedEnd,

    /// An opening parenthesis was never closed.
    #[error("unbalanced parenthesis in tag expression")]
    UnbalancedParenthesis,

    /// Input remained after a complete expression was parsed.
    #[error("trailing token '{token}' after tag expression")]
    TrailingToken {
        /// The first leftover token.
        token: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Tag(String),
    Not(Box<Node>),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
}

impl Node {
    fn evaluate(&self, tags: &[String]) -> bool {
        match self {
            Self::Tag(name) => tags.iter().any(|tag| tag == name),
            Self::Not(inner) => !inner.evaluate(tags),
            Self::And(lhs, rhs) => lhs.evaluate(tags) && rhs.evaluate(tags),
            Self::Or(lhs, rhs) => lhs.evaluate(tags) || rhs.evaluate(tags),
        }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(name) => write!(f, "{name}"),
            Self::Not(inner) => write!(f, "not {inner}"),
            Self::And(lhs, rhs) => write!(f, "({lhs} and {rhs})"),
            Self::Or(lhs, rhs) => write!(f, "({lhs} or {rhs})"),
        }
    }
}

/// A parsed boolean filter over scenario tags.
///
/// Grammar, loosest-binding first: `or` < `and` < `not`, with parentheses
/// for grouping. Operands are tags and must start with `@`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagExpression {
    root: Node,
}

impl TagExpression {
    /// Parse an expression such as `@a and not (@b or @c)`.
    ///
    /// # Errors
    ///
    /// Returns a [`TagExpressionError`] describing the first problem found:
    /// empty input, an unexpected or trailing token, or an unbalanced
    /// parenthesis.
    pub fn parse(input: &str) -> Result<Self, TagExpressionError> {
        let tokens = tokenize(input);
        if tokens.is_empty() {
            return Err(TagExpressionError::Empty);
        }
        let mut parser = Parser { tokens, pos: 0 };
        let root = parser.parse_or()?;
        if let Some(token) = parser.peek() {
            return Err(TagExpressionError::TrailingToken {
                token: token.to_owned(),
            });
        }
        Ok(Self { root })
    }

    /// Evaluate the expression against a scenario's tag list.
    #[must_use]
    pub fn evaluate(&self, tags: &[String]) -> bool {
        self.root.evaluate(tags)
    }
}

impl Display for TagExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

/// Split the input into tags, operators, and parentheses.
///
/// Parentheses need no surrounding whitespace; everything else is
/// whitespace-separated.
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in input.chars() {
        match ch {
            '(' | ')' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(ch.to_string());
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

struct Parser {
    tokens: Vec<String>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn advance(&mut self) -> Option<String> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_or(&mut self) -> Result<Node, TagExpressionError> {
        let mut node = self.parse_and()?;
        while self.peek() == Some("or") {
            self.advance();
            let rhs = self.parse_and()?;
            node = Node::Or(Box::new(node), Box::new(rhs));
        }
        Ok(node)
    }

    fn parse_and(&mut self) -> Result<Node, TagExpressionError> {
        let mut node = self.parse_unary()?;
        while self.peek() == Some("and") {
            self.advance();
            let rhs = self.parse_unary()?;
            node = Node::And(Box::new(node), Box::new(rhs));
        }
        Ok(node)
    }

    fn parse_unary(&mut self) -> Result<Node, TagExpressionError> {
        let Some(token) = self.advance() else {
            return Err(TagExpressionError::UnexpectedEnd);
        };
        match token.as_str() {
            "not" => Ok(Node::Not(Box::new(self.parse_unary()?))),
            "(" => {
                let node = self.parse_or()?;
                if self.advance().as_deref() != Some(")") {
                    return Err(TagExpressionError::UnbalancedParenthesis);
                }
                Ok(node)
            }
            tag if tag.starts_with('@') => Ok(Node::Tag(token)),
            _ => Err(TagExpressionError::UnexpectedToken { token }),
        }
    }
}
