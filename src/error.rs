//! The error surface of the engine.

use std::error::Error;
use std::fmt;

use thiserror::Error as ThisError;

use crate::grammar::ActionError;
use crate::source::Cursor;

/// A structural defect of a grammar, reported by
/// [`Parser::new`](crate::Parser::new) before any parsing happens.
///
/// Offending nodes are named by their arena identity.
#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum GrammarError {
    /// A pattern handle does not refer to any node of the grammar.
    #[error("invalid grammar: pattern #{0} does not exist")]
    UnknownPattern(usize),

    /// The start or error entry point is not a rule.
    #[error("invalid grammar: pattern #{0} is not a rule")]
    NotARule(usize),

    /// A rule was declared but never defined.
    #[error("invalid grammar: rule #{id} ({designation:?}) is missing a pattern")]
    MissingRuleBody {
        /// Arena identity of the rule.
        id: usize,
        /// The rule's designation.
        designation: String,
    },

    /// A sequence has no elements.
    #[error("invalid grammar: sequence is empty")]
    EmptySequence,

    /// An either-combinator needs at least two options.
    #[error("invalid grammar: either-combinator has {0} option(s)")]
    EitherTooFewOptions(usize),

    /// The same pattern identity appears twice among an either-combinator's
    /// options.
    #[error("invalid grammar: either-combinator has duplicate options (at index {0})")]
    EitherDuplicateOption(usize),

    /// A bounded repetition whose floor exceeds its ceiling.
    #[error("invalid grammar: repeated #{id} min ({min}) greater max ({max})")]
    RepeatedMinGreaterMax {
        /// Arena identity of the repetition.
        id: usize,
        /// The repetition floor.
        min: usize,
        /// The repetition ceiling.
        max: usize,
    },

    /// An exact terminal with an empty expectation.
    #[error("invalid grammar: exact-terminal #{0} is missing an expectation")]
    EmptyExactExpectation(usize),

    /// A negative lookahead directly inside another negative lookahead.
    #[error("invalid grammar: not-combinator is nested")]
    NestedNot,
}

/// A parse failure, positioned in the source.
#[derive(Debug)]
pub enum ParseError<'s> {
    /// The input did not match the grammar.
    UnexpectedToken {
        /// Where the mismatch happened.
        at: Cursor<'s>,
        /// The designation of the pattern that was expected, when known.
        expected: Option<String>,
    },

    /// A rule exceeded the configured recursion cap.
    RecursionLimit {
        /// The designation of the offending rule.
        rule: String,
        /// Where the rule was entered.
        at: Cursor<'s>,
    },

    /// A rule action raised an error, aborting the parse.
    Action {
        /// The begin position of the construct the action received.
        at: Cursor<'s>,
        /// The error the action raised.
        source: ActionError,
    },
}

impl<'s> ParseError<'s> {
    /// Where the failure is anchored in the source.
    pub fn at(&self) -> Cursor<'s> {
        match self {
            ParseError::UnexpectedToken { at, .. }
            | ParseError::RecursionLimit { at, .. }
            | ParseError::Action { at, .. } => *at,
        }
    }
}

impl<'s> fmt::Display for ParseError<'s> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::UnexpectedToken { at, expected } => match expected {
                Some(designation) => {
                    write!(f, "unexpected token, expected {{{}}} at {}", designation, at)
                }
                None => write!(f, "unexpected token at {}", at),
            },
            ParseError::RecursionLimit { rule, at } => {
                write!(f, "max recursion level exceeded at rule {:?} at {}", rule, at)
            }
            ParseError::Action { at, source } => write!(f, "{} at {}", source, at),
        }
    }
}

impl<'s> Error for ParseError<'s> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ParseError::Action { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceFile;
    use pretty_assertions::assert_eq;

    #[test]
    fn unexpected_token_rendering() {
        let file = SourceFile::new("test.txt", "x");
        let at = Cursor::new(&file);
        let with = ParseError::UnexpectedToken {
            at,
            expected: Some("keyword foo".to_string()),
        };
        assert_eq!(
            with.to_string(),
            "unexpected token, expected {keyword foo} at test.txt:1:1"
        );
        let without = ParseError::UnexpectedToken { at, expected: None };
        assert_eq!(without.to_string(), "unexpected token at test.txt:1:1");
    }

    #[test]
    fn recursion_limit_rendering() {
        let file = SourceFile::new("test.txt", "x");
        let err = ParseError::RecursionLimit {
            rule: "A".to_string(),
            at: Cursor::new(&file),
        };
        assert_eq!(
            err.to_string(),
            "max recursion level exceeded at rule \"A\" at test.txt:1:1"
        );
    }

    #[test]
    fn action_errors_wrap_their_source() {
        let file = SourceFile::new("test.txt", "x");
        let err = ParseError::Action {
            at: Cursor::new(&file),
            source: "custom error".into(),
        };
        assert_eq!(err.to_string(), "custom error at test.txt:1:1");
        assert!(err.source().is_some());
    }

    #[test]
    fn grammar_error_messages() {
        assert_eq!(
            GrammarError::EmptySequence.to_string(),
            "invalid grammar: sequence is empty"
        );
        assert_eq!(
            GrammarError::EitherTooFewOptions(1).to_string(),
            "invalid grammar: either-combinator has 1 option(s)"
        );
        assert_eq!(
            GrammarError::MissingRuleBody {
                id: 3,
                designation: "A".to_string()
            }
            .to_string(),
            "invalid grammar: rule #3 (\"A\") is missing a pattern"
        );
    }
}
