//! Regular grammars and the bridge back to automata.

use crate::automaton::{Nfa, TransitionModel};
use crate::error::ValidationError;
use crate::grammar::productions::{Grammar, NonTerminal, Production, Terminal};
use std::collections::BTreeSet;

/// A regular grammar: every production is `A -> a` or `A -> a B`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegularGrammar {
    grammar: Grammar,
}

impl RegularGrammar {
    pub fn new() -> Self {
        Self {
            grammar: Grammar::new(),
        }
    }

    /// Read-only view of the underlying grammar value.
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn initial_symbol(&self) -> &str {
        self.grammar.initial_symbol()
    }

    pub fn set_initial_symbol(&mut self, symbol: impl Into<NonTerminal>) {
        self.grammar.set_initial_symbol(symbol);
    }

    pub fn add_production<S: AsRef<str>>(&mut self, non_terminal: &str, production: &[S]) {
        self.grammar.add_production(non_terminal, production);
    }

    pub fn non_terminals(&self) -> BTreeSet<NonTerminal> {
        self.grammar.non_terminals()
    }

    pub fn terminals(&self) -> BTreeSet<Terminal> {
        self.grammar.terminals()
    }

    pub fn productions_of(&self, non_terminal: &str) -> &[Production] {
        self.grammar.productions_of(non_terminal)
    }

    /// Check the regular shape: length 1 or 2, terminal first, and a
    /// non-terminal second when present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let non_terminals = self.grammar.non_terminals();
        for (non_terminal, productions) in self.grammar.productions() {
            for production in productions {
                let malformed = match production.as_slice() {
                    [first] => non_terminals.contains(first),
                    [first, second] => {
                        non_terminals.contains(first) || !non_terminals.contains(second)
                    }
                    _ => true,
                };
                if malformed {
                    return Err(ValidationError::MalformedRegularProduction {
                        non_terminal: non_terminal.clone(),
                        production: production.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Build the NFA with one state per non-terminal plus a dedicated
    /// accepting state: `N -> a` becomes a transition into the accepting
    /// state, `N -> a M` a transition into M.
    pub fn to_nfa(&self) -> Result<Nfa, ValidationError> {
        let mut model = TransitionModel::new();
        model.set_initial_state(self.grammar.initial_symbol());
        model.add_state(self.grammar.initial_symbol());

        let mut taken = self.grammar.non_terminals();
        taken.extend(self.grammar.terminals());
        let mut accept = String::from("X");
        while taken.contains(&accept) {
            accept.push('\'');
        }

        for (non_terminal, productions) in self.grammar.productions() {
            for production in productions {
                match production.as_slice() {
                    [terminal] => {
                        model.add_transition(
                            non_terminal,
                            terminal,
                            BTreeSet::from([accept.clone()]),
                        );
                    }
                    [terminal, next] => {
                        model.add_transition(
                            non_terminal,
                            terminal,
                            BTreeSet::from([next.clone()]),
                        );
                    }
                    _ => {
                        return Err(ValidationError::MalformedRegularProduction {
                            non_terminal: non_terminal.clone(),
                            production: production.clone(),
                        });
                    }
                }
            }
        }

        model.add_state(&accept);
        model.add_final_state(accept);
        Nfa::from_model(model)
    }

    /// Rename non-terminals to fresh short names; see
    /// [`Grammar::canonicalize_symbols`].
    pub fn canonicalize_symbols(&self) -> RegularGrammar {
        RegularGrammar {
            grammar: self.grammar.canonicalize_symbols(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::{Automaton, Dfa, TransitionLiteral};

    fn sentences(alphabet: &[char], max_len: usize) -> Vec<String> {
        let mut out = vec![String::new()];
        let mut frontier = vec![String::new()];
        for _ in 0..max_len {
            let mut next = Vec::new();
            for sentence in &frontier {
                for c in alphabet {
                    let mut extended = sentence.clone();
                    extended.push(*c);
                    next.push(extended);
                }
            }
            out.extend(next.iter().cloned());
            frontier = next;
        }
        out
    }

    #[test]
    fn test_validate_accepts_regular_shape() {
        let mut grammar = RegularGrammar::new();
        grammar.add_production("S", &["a", "S"]);
        grammar.add_production("S", &["b"]);
        grammar.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_long_productions() {
        let mut grammar = RegularGrammar::new();
        grammar.add_production("S", &["a", "b", "c"]);
        assert!(matches!(
            grammar.validate(),
            Err(ValidationError::MalformedRegularProduction { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_leading_non_terminal() {
        let mut grammar = RegularGrammar::new();
        grammar.add_production("S", &["A", "a"]);
        grammar.add_production("A", &["a"]);
        assert!(matches!(
            grammar.validate(),
            Err(ValidationError::MalformedRegularProduction { .. })
        ));
    }

    #[test]
    fn test_to_nfa_builds_accepting_state() {
        // S -> a S | b : strings of "a"s ending in one "b".
        let mut grammar = RegularGrammar::new();
        grammar.set_initial_symbol("S");
        grammar.add_production("S", &["a", "S"]);
        grammar.add_production("S", &["b"]);

        let nfa = grammar.to_nfa().unwrap();
        assert_eq!(nfa.initial_state(), Some(&"S".to_string()));
        assert_eq!(nfa.final_states(), &BTreeSet::from(["X".to_string()]));
        assert!(nfa.recognize_text("b"));
        assert!(nfa.recognize_text("aab"));
        assert!(!nfa.recognize_text("a"));
        assert!(!nfa.recognize_text("ba"));
    }

    #[test]
    fn test_to_nfa_accept_state_dodges_existing_x() {
        let mut grammar = RegularGrammar::new();
        grammar.set_initial_symbol("X");
        grammar.add_production("X", &["a"]);
        let nfa = grammar.to_nfa().unwrap();
        assert_eq!(nfa.final_states(), &BTreeSet::from(["X'".to_string()]));
        assert!(nfa.recognize_text("a"));
    }

    #[test]
    fn test_round_trip_preserves_the_language() {
        // dfa -> regular grammar -> nfa -> dfa keeps the language intact.
        let literal: TransitionLiteral = &[
            ("→s0", &[("a", &["s0"]), ("b", &["s1"])]),
            ("*s1", &[("a", &["s0"]), ("b", &["s1"])]),
        ];
        let dfa = Dfa::from_transition_literal(literal).unwrap();
        let round_tripped = dfa.to_regular_grammar().to_nfa().unwrap().to_dfa().unwrap();
        for sentence in sentences(&['a', 'b'], 4) {
            assert_eq!(
                dfa.recognize_text(&sentence),
                round_tripped.recognize_text(&sentence),
                "sentence {sentence:?}"
            );
        }
    }
}
