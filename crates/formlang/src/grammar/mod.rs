//! Regular and context-free grammars: FIRST/FOLLOW computation, grammar
//! transformations, and the bridge between automata and regular grammars.

mod context_free;
mod productions;
mod regular;

pub use context_free::ContextFreeGrammar;
pub use productions::{Grammar, NonTerminal, Production, Terminal};
pub use regular::RegularGrammar;

pub(crate) use context_free::first_of_sequence;
