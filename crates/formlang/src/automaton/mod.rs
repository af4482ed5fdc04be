//! Finite automata: a shared transition model, the DFA/NFA variants, subset
//! construction, Myhill-Nerode minimization and product combinators.

mod dfa;
mod nfa;
mod ops;
mod symbol;
mod transitions;

pub use dfa::Dfa;
pub use nfa::Nfa;
pub use symbol::{END, EPSILON, FINAL_MARKER, INITIAL_MARKER, State, Symbol, is_epsilon};
pub use transitions::{Automaton, TransitionLiteral, TransitionModel, canonical_set_name};
