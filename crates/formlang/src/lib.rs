//! Formal-language toolkit: finite automata over a shared transition model,
//! regular and context-free grammars, conversions between the two worlds,
//! direct regex-to-DFA compilation and an LL(1) predictive parser.
//!
//! Everything is a plain in-memory value. Every transform (subset
//! construction, minimization, the product combinators, the grammar
//! rewrites) returns a fresh, completed, validated value and never mutates
//! its inputs.
//!
//! ```
//! use formlang::{Nfa, TransitionLiteral};
//!
//! let literal: TransitionLiteral = &[
//!     ("→q0", &[("a", &["q0", "q1"]), ("b", &["q0"])]),
//!     ("q1", &[("b", &["q2"])]),
//!     ("*q2", &[]),
//! ];
//! let nfa = Nfa::from_transition_literal(literal)?;
//! let dfa = nfa.to_dfa()?.minimize()?;
//! assert!(dfa.recognize_text("aab"));
//! # Ok::<(), formlang::ValidationError>(())
//! ```

pub mod automaton;
pub mod error;
pub mod grammar;
pub mod parser;
pub mod regex;

pub use automaton::{
    Automaton, Dfa, END, EPSILON, FINAL_MARKER, INITIAL_MARKER, Nfa, State, Symbol,
    TransitionLiteral, TransitionModel,
};
pub use error::{
    AmbiguityError, ConstructionError, FormalError, NonDeterminismUnresolved, ParseError,
    ValidationError,
};
pub use grammar::{ContextFreeGrammar, Grammar, NonTerminal, Production, RegularGrammar, Terminal};
pub use parser::Ll1Parser;
