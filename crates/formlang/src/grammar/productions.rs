//! Shared grammar value: an ordered production map with derived symbol sets.
//!
//! Both grammar variants wrap this type the same way the automaton variants
//! wrap the transition model; the display collaborator renders grammars
//! through its read-only accessors.

use indexmap::IndexMap;
use std::collections::BTreeSet;

/// A terminal symbol.
pub type Terminal = String;

/// A non-terminal symbol.
pub type NonTerminal = String;

/// One right-hand side: an ordered sequence of terminals and non-terminals,
/// possibly the single ε symbol.
pub type Production = Vec<String>;

/// Production map P: N → ordered productions, plus the start symbol.
///
/// Non-terminals are derived as the map's domain; terminals are every other
/// symbol occurring in a right-hand side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    initial_symbol: NonTerminal,
    productions: IndexMap<NonTerminal, Vec<Production>>,
}

impl Grammar {
    pub fn new() -> Self {
        Self {
            initial_symbol: "S".to_string(),
            productions: IndexMap::new(),
        }
    }

    pub fn initial_symbol(&self) -> &str {
        &self.initial_symbol
    }

    pub fn set_initial_symbol(&mut self, symbol: impl Into<NonTerminal>) {
        self.initial_symbol = symbol.into();
    }

    /// Append a production for the non-terminal. Duplicates are ignored, so
    /// repeated grammar-building passes stay idempotent.
    pub fn add_production<S: AsRef<str>>(&mut self, non_terminal: &str, production: &[S]) {
        let production: Production = production
            .iter()
            .map(|symbol| symbol.as_ref().to_string())
            .collect();
        let entry = self.productions.entry(non_terminal.to_string()).or_default();
        if !entry.contains(&production) {
            entry.push(production);
        }
    }

    /// Derived set N: the domain of the production map.
    pub fn non_terminals(&self) -> BTreeSet<NonTerminal> {
        self.productions.keys().cloned().collect()
    }

    /// Derived set Σ: every right-hand-side symbol that is not a non-terminal.
    pub fn terminals(&self) -> BTreeSet<Terminal> {
        let non_terminals = self.non_terminals();
        self.productions
            .values()
            .flatten()
            .flatten()
            .filter(|symbol| !non_terminals.contains(*symbol))
            .cloned()
            .collect()
    }

    pub fn productions(&self) -> &IndexMap<NonTerminal, Vec<Production>> {
        &self.productions
    }

    pub fn productions_of(&self, non_terminal: &str) -> &[Production] {
        self.productions
            .get(non_terminal)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Rename every non-terminal to a fresh short name, the start symbol
    /// first. Useful after the automaton bridge, which leaves composite state
    /// names as non-terminals.
    pub fn canonicalize_symbols(&self) -> Grammar {
        let mut order: Vec<&NonTerminal> = Vec::new();
        if self.productions.contains_key(&self.initial_symbol) {
            order.push(&self.initial_symbol);
        }
        for non_terminal in self.productions.keys() {
            if *non_terminal != self.initial_symbol {
                order.push(non_terminal);
            }
        }

        let terminals = self.terminals();
        let mut names = ('A'..='Z')
            .map(String::from)
            .filter(|name| !terminals.contains(name));
        let mapping: IndexMap<&NonTerminal, String> = order
            .iter()
            .enumerate()
            .map(|(i, nt)| {
                let name = names.next().unwrap_or_else(|| format!("N{i}"));
                (*nt, name)
            })
            .collect();

        let rename = |symbol: &String| -> String {
            mapping.get(symbol).cloned().unwrap_or_else(|| symbol.clone())
        };

        let mut renamed = Grammar::new();
        renamed.set_initial_symbol(rename(&self.initial_symbol));
        for (non_terminal, productions) in &self.productions {
            for production in productions {
                let body: Production = production.iter().map(&rename).collect();
                renamed.add_production(&rename(non_terminal), &body);
            }
        }
        renamed
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

/// Append `'` to `base` until the name collides with nothing in `taken`.
pub(crate) fn fresh_symbol(base: &str, taken: &BTreeSet<String>) -> String {
    let mut name = format!("{base}'");
    while taken.contains(&name) {
        name.push('\'');
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_symbol_sets() {
        let mut grammar = Grammar::new();
        grammar.set_initial_symbol("E");
        grammar.add_production("E", &["T", "+", "E"]);
        grammar.add_production("E", &["T"]);
        grammar.add_production("T", &["id"]);

        assert_eq!(
            grammar.non_terminals(),
            ["E", "T"].iter().map(|s| s.to_string()).collect()
        );
        assert_eq!(
            grammar.terminals(),
            ["+", "id"].iter().map(|s| s.to_string()).collect()
        );
    }

    #[test]
    fn test_duplicate_productions_are_ignored() {
        let mut grammar = Grammar::new();
        grammar.add_production("A", &["a"]);
        grammar.add_production("A", &["a"]);
        assert_eq!(grammar.productions_of("A").len(), 1);
    }

    #[test]
    fn test_canonicalize_renames_composite_non_terminals() {
        let mut grammar = Grammar::new();
        grammar.set_initial_symbol("{q0,q1}");
        grammar.add_production("{q0,q1}", &["a", "{q2}"]);
        grammar.add_production("{q2}", &["b"]);

        let renamed = grammar.canonicalize_symbols();
        assert_eq!(renamed.initial_symbol(), "A");
        assert_eq!(
            renamed.productions_of("A"),
            &[vec!["a".to_string(), "B".to_string()]]
        );
        assert_eq!(renamed.productions_of("B"), &[vec!["b".to_string()]]);
        // Terminals are untouched.
        assert_eq!(
            renamed.terminals(),
            ["a", "b"].iter().map(|s| s.to_string()).collect()
        );
    }

    #[test]
    fn test_fresh_symbol_avoids_collisions() {
        let taken: BTreeSet<String> = ["A", "A'", "A''"].iter().map(|s| s.to_string()).collect();
        assert_eq!(fresh_symbol("A", &taken), "A'''");
        assert_eq!(fresh_symbol("B", &taken), "B'");
    }
}
