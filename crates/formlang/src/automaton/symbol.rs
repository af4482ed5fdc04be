//! Symbol and state names shared by automata and grammars.

/// A symbol of the alphabet Σ. Symbols are atomic: a single character for
/// automata built from regexes, possibly a longer lexical unit (`id`, `**`)
/// for grammar terminals.
pub type Symbol = String;

/// A state of the set Q, unique within one automaton.
pub type State = String;

/// The empty-string symbol ε.
pub const EPSILON: &str = "&";

/// End-of-input marker appended by the LL(1) driver and seeded into the
/// initial symbol's FOLLOW set.
pub const END: &str = "$";

/// Leading character marking the initial state in a transition literal.
pub const INITIAL_MARKER: char = '→';

/// Leading character marking a final state in a transition literal.
pub const FINAL_MARKER: char = '*';

/// Check whether a symbol is the ε symbol.
#[inline]
pub fn is_epsilon(symbol: &str) -> bool {
    symbol == EPSILON
}
