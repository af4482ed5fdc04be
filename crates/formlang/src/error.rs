//! Error types for automaton, grammar, regex and parser operations.
//!
//! Every failure carries the offending state/symbol/production so callers can
//! report it without re-deriving context. All errors are fatal to the
//! operation that raised them; no partial results are returned.

use std::error::Error;
use std::fmt;

/// Structural invariant violation in an automaton or a regular grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A transition targets a state that is not part of the automaton.
    UnknownTarget {
        state: String,
        symbol: String,
        target: String,
    },
    /// A (state, symbol) entry is missing after completion.
    MissingEntry { state: String, symbol: String },
    /// A final state is not a known state.
    UnknownFinalState { state: String },
    /// The initial state is set but is not a known state.
    UnknownInitialState { state: String },
    /// A deterministic automaton maps one (state, symbol) pair to several targets.
    NondeterministicEntry {
        state: String,
        symbol: String,
        targets: Vec<String>,
    },
    /// A regular-grammar production violates the length-1/2 shape.
    MalformedRegularProduction {
        non_terminal: String,
        production: Vec<String>,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTarget {
                state,
                symbol,
                target,
            } => write!(
                f,
                "transition ({state}, {symbol}) targets unknown state {target}"
            ),
            Self::MissingEntry { state, symbol } => {
                write!(f, "state {state} has no entry for symbol {symbol}")
            }
            Self::UnknownFinalState { state } => {
                write!(f, "final state {state} is not a known state")
            }
            Self::UnknownInitialState { state } => {
                write!(f, "initial state {state} is not a known state")
            }
            Self::NondeterministicEntry {
                state,
                symbol,
                targets,
            } => write!(
                f,
                "deterministic automaton maps ({state}, {symbol}) to {} targets: {}",
                targets.len(),
                targets.join(", ")
            ),
            Self::MalformedRegularProduction {
                non_terminal,
                production,
            } => write!(
                f,
                "regular grammar production {non_terminal} -> {} is not of the form aB or a",
                production.join(" ")
            ),
        }
    }
}

impl Error for ValidationError {}

/// Malformed regular expression detected during compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    /// Opening and closing parentheses do not match up.
    UnbalancedParentheses,
    /// The pattern ends in the middle of an escape sequence.
    DanglingEscape,
    /// A `?` or `+` has no operand to its left.
    MissingQuantifierOperand,
    /// The postfix sequence did not reduce to a single expression.
    IncompleteExpression,
}

impl fmt::Display for ConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnbalancedParentheses => write!(f, "unbalanced parentheses in pattern"),
            Self::DanglingEscape => write!(f, "pattern ends with a dangling escape"),
            Self::MissingQuantifierOperand => {
                write!(f, "quantifier has no valid operand")
            }
            Self::IncompleteExpression => {
                write!(f, "pattern does not reduce to a single expression")
            }
        }
    }
}

impl Error for ConstructionError {}

/// Two productions claimed the same LL(1) table cell: the grammar is not LL(1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguityError {
    pub non_terminal: String,
    pub terminal: String,
    pub existing: Vec<String>,
    pub incoming: Vec<String>,
}

impl fmt::Display for AmbiguityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LL(1) conflict at [{}, {}]: {} vs {}",
            self.non_terminal,
            self.terminal,
            self.existing.join(" "),
            self.incoming.join(" ")
        )
    }
}

impl Error for AmbiguityError {}

/// Left-factoring did not reach a fixpoint within the retry bound.
///
/// Factoring is a heuristic: hitting the bound means the grammar kept changing
/// on every round, not that non-determinism is provably irremovable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonDeterminismUnresolved {
    pub rounds: usize,
}

impl fmt::Display for NonDeterminismUnresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could not remove non-determinism within {} factoring rounds",
            self.rounds
        )
    }
}

impl Error for NonDeterminismUnresolved {}

/// A table-driven parse cannot continue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The stack expected one terminal but the input held another.
    UnexpectedTerminal { expected: String, found: String },
    /// No table entry for the (non-terminal, lookahead) pair.
    MissingTableEntry {
        non_terminal: String,
        lookahead: String,
    },
    /// A popped symbol is neither a terminal nor a non-terminal of the grammar.
    UnknownSymbol { symbol: String },
    /// The stack emptied before the input was fully consumed.
    LeftoverInput { remaining: Vec<String> },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedTerminal { expected, found } => {
                write!(f, "expected terminal {expected}, found {found}")
            }
            Self::MissingTableEntry {
                non_terminal,
                lookahead,
            } => write!(f, "no table entry for [{non_terminal}, {lookahead}]"),
            Self::UnknownSymbol { symbol } => {
                write!(f, "symbol {symbol} is not part of the grammar")
            }
            Self::LeftoverInput { remaining } => {
                write!(f, "input left after the stack emptied: {}", remaining.join(" "))
            }
        }
    }
}

impl Error for ParseError {}

/// Union of every failure the toolkit can raise, for pipelines that cross
/// component boundaries (e.g. regex compilation, which can fail both while
/// preprocessing the pattern and while validating the constructed automaton).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormalError {
    Validation(ValidationError),
    Construction(ConstructionError),
    Ambiguity(AmbiguityError),
    NonDeterminism(NonDeterminismUnresolved),
    Parse(ParseError),
}

impl fmt::Display for FormalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(e) => e.fmt(f),
            Self::Construction(e) => e.fmt(f),
            Self::Ambiguity(e) => e.fmt(f),
            Self::NonDeterminism(e) => e.fmt(f),
            Self::Parse(e) => e.fmt(f),
        }
    }
}

impl Error for FormalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(e) => Some(e),
            Self::Construction(e) => Some(e),
            Self::Ambiguity(e) => Some(e),
            Self::NonDeterminism(e) => Some(e),
            Self::Parse(e) => Some(e),
        }
    }
}

impl From<ValidationError> for FormalError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<ConstructionError> for FormalError {
    fn from(e: ConstructionError) -> Self {
        Self::Construction(e)
    }
}

impl From<AmbiguityError> for FormalError {
    fn from(e: AmbiguityError) -> Self {
        Self::Ambiguity(e)
    }
}

impl From<NonDeterminismUnresolved> for FormalError {
    fn from(e: NonDeterminismUnresolved) -> Self {
        Self::NonDeterminism(e)
    }
}

impl From<ParseError> for FormalError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_context() {
        let err = ValidationError::UnknownTarget {
            state: "q0".into(),
            symbol: "a".into(),
            target: "q9".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("q0"));
        assert!(msg.contains('a'));
        assert!(msg.contains("q9"));
    }

    #[test]
    fn test_formal_error_wraps_source() {
        let err: FormalError = ConstructionError::UnbalancedParentheses.into();
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "unbalanced parentheses in pattern");
    }
}
