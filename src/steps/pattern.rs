//! Step pattern kinds and matching.
//!
//! A step definition's pattern is one of a closed set of kinds — literal
//! text, a regular expression, or a cucumber expression — each exposing
//! [`StepPattern::try_match`]. Matching yields the positional parameters the
//! handler receives, typed according to the pattern's placeholders.

use regex::Regex;
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

/// Errors raised while compiling a step pattern.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The regular expression failed to compile.
    #[error("invalid step pattern regex '{pattern}'")]
    Regex {
        /// Source text of the pattern.
        pattern: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// A cucumber-expression placeholder named an unsupported type.
    #[error("unknown parameter type '{{{name}}}' in '{expression}'")]
    UnknownParameterType {
        /// Placeholder name without braces.
        name: String,
        /// Full expression text.
        expression: String,
    },

    /// A `{` placeholder was never closed.
    #[error("unclosed parameter in '{expression}'")]
    UnclosedParameter {
        /// Full expression text.
        expression: String,
    },
}

/// A positional parameter extracted from a step's text.
#[derive(Debug, Clone, PartialEq)]
pub enum StepParam {
    /// Quoted `{string}` or regex capture content.
    String(String),
    /// `{int}` placeholder value.
    Int(i64),
    /// `{float}` placeholder value.
    Float(f64),
    /// `{word}` placeholder value.
    Word(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamKind {
    Int,
    Float,
    Word,
    String,
}

impl ParamKind {
    fn capture_fragment(self) -> &'static str {
        match self {
            Self::Int => r"(-?\d+)",
            Self::Float => r"(-?\d+(?:\.\d+)?)",
            Self::Word => r"(\S+)",
            Self::String => r#""([^"]*)""#,
        }
    }

    fn into_param(self, raw: &str) -> Option<StepParam> {
        match self {
            Self::Int => raw.parse().ok().map(StepParam::Int),
            Self::Float => raw.parse().ok().map(StepParam::Float),
            Self::Word => Some(StepParam::Word(raw.to_owned())),
            Self::String => Some(StepParam::String(raw.to_owned())),
        }
    }
}

/// Pattern of a registered step definition.
#[derive(Debug, Clone)]
pub enum StepPattern {
    /// Whole-text literal match, no parameters.
    Literal(String),
    /// Regular expression; every capture group becomes a string parameter.
    Regex {
        /// Original pattern text, kept for diagnostics and ordering.
        source: String,
        /// Compiled expression.
        regex: Regex,
    },
    /// Cucumber expression with `{int}`, `{float}`, `{word}`, and
    /// `{string}` placeholders.
    CucumberExpression {
        /// Original expression text.
        source: String,
        /// Compiled anchored regex equivalent.
        regex: Regex,
        /// Placeholder kinds in capture order.
        kinds: Vec<ParamKindSeq>,
    },
}

/// Opaque placeholder-kind sequence element.
///
/// Only constructed by [`StepPattern::cucumber`]; exposed so the enum
/// variant can be matched on without leaking the internal kind set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamKindSeq(ParamKind);

impl StepPattern {
    /// Build a literal pattern matching the exact step text.
    #[must_use]
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    /// Compile a regular-expression pattern.
    ///
    /// The expression is anchored to the whole step text.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::Regex`] when the expression does not compile.
    pub fn regex(pattern: &str) -> Result<Self, PatternError> {
        let anchored = format!("^(?:{pattern})$");
        let regex = Regex::new(&anchored).map_err(|source| PatternError::Regex {
            pattern: pattern.to_owned(),
            source,
        })?;
        Ok(Self::Regex {
            source: pattern.to_owned(),
            regex,
        })
    }

    /// Compile a cucumber expression.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::UnknownParameterType`] for an unsupported
    /// placeholder and [`PatternError::UnclosedParameter`] for an unpaired
    /// `{`.
    pub fn cucumber(expression: &str) -> Result<Self, PatternError> {
        let mut pattern = String::from("^");
        let mut literal = String::new();
        let mut kinds = Vec::new();
        let mut chars = expression.chars();
        while let Some(ch) = chars.next() {
            if ch != '{' {
                literal.push(ch);
                continue;
            }
            let mut name = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(c) => name.push(c),
                    None => {
                        return Err(PatternError::UnclosedParameter {
                            expression: expression.to_owned(),
                        });
                    }
                }
            }
            let kind = match name.as_str() {
                "int" => ParamKind::Int,
                "float" => ParamKind::Float,
                "word" => ParamKind::Word,
                "string" => ParamKind::String,
                _ => {
                    return Err(PatternError::UnknownParameterType {
                        name,
                        expression: expression.to_owned(),
                    });
                }
            };
            // `{string}` supplies its own surrounding quotes, so a quote
            // immediately before the placeholder belongs to the capture.
            if kind == ParamKind::String && literal.ends_with('"') {
                literal.pop();
                if let Some(rest) = chars.as_str().strip_prefix('"') {
                    chars = rest.chars();
                }
            }
            pattern.push_str(&regex::escape(&literal));
            literal.clear();
            pattern.push_str(kind.capture_fragment());
            kinds.push(ParamKindSeq(kind));
        }
        pattern.push_str(&regex::escape(&literal));
        pattern.push('$');
        let regex = Regex::new(&pattern).map_err(|source| PatternError::Regex {
            pattern: expression.to_owned(),
            source,
        })?;
        Ok(Self::CucumberExpression {
            source: expression.to_owned(),
            regex,
            kinds,
        })
    }

    /// Original pattern text, used in diagnostics and duplicate detection.
    #[must_use]
    pub fn source(&self) -> &str {
        match self {
            Self::Literal(text) => text,
            Self::Regex { source, .. } | Self::CucumberExpression { source, .. } => source,
        }
    }

    /// Match step text against this pattern.
    ///
    /// Returns the extracted positional parameters on a match and `None`
    /// otherwise.
    #[must_use]
    pub fn try_match(&self, text: &str) -> Option<Vec<StepParam>> {
        match self {
            Self::Literal(literal) => (literal == text).then(Vec::new),
            Self::Regex { regex, .. } => {
                let captures = regex.captures(text)?;
                Some(
                    captures
                        .iter()
                        .skip(1)
                        .flatten()
                        .map(|group| StepParam::String(group.as_str().to_owned()))
                        .collect(),
                )
            }
            Self::CucumberExpression { regex, kinds, .. } => {
                let captures = regex.captures(text)?;
                let mut params = Vec::with_capacity(kinds.len());
                for (kind, group) in kinds.iter().zip(captures.iter().skip(1)) {
                    let raw = group?.as_str();
                    params.push(kind.0.into_param(raw)?);
                }
                Some(params)
            }
        }
    }
}

impl Display for StepPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "tests validate compilation outcomes")]
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn literal_matches_exact_text_only() {
        let pattern = StepPattern::literal("I click button");
        assert_eq!(pattern.try_match("I click button"), Some(Vec::new()));
        assert_eq!(pattern.try_match("I click button twice"), None);
    }

    #[rstest]
    fn regex_captures_become_string_params() {
        let pattern = StepPattern::regex(r"I have (\d+) cukes").expect("compile");
        assert_eq!(
            pattern.try_match("I have 42 cukes"),
            Some(vec![StepParam::String("42".into())]),
        );
    }

    #[rstest]
    #[case("I have {int} cukes", "I have -3 cukes", vec![StepParam::Int(-3)])]
    #[case("I wait {float} seconds", "I wait 1.5 seconds", vec![StepParam::Float(1.5)])]
    #[case("I open {word}", "I open settings", vec![StepParam::Word("settings".into())])]
    #[case(
        "I see {string} on screen",
        r#"I see "hello there" on screen"#,
        vec![StepParam::String("hello there".into())],
    )]
    fn cucumber_placeholders_extract_typed_params(
        #[case] expression: &str,
        #[case] text: &str,
        #[case] expected: Vec<StepParam>,
    ) {
        let pattern = StepPattern::cucumber(expression).expect("compile");
        assert_eq!(pattern.try_match(text), Some(expected));
    }

    #[rstest]
    fn cucumber_rejects_unknown_placeholder() {
        let err = StepPattern::cucumber("I pick {color}").expect_err("unexpected success");
        assert!(matches!(err, PatternError::UnknownParameterType { .. }));
    }
}
