//! Deterministic finite automaton: recognition, Myhill-Nerode minimization,
//! and the bridge to regular grammars.

use crate::automaton::symbol::{State, Symbol};
use crate::automaton::transitions::{Automaton, TransitionLiteral, TransitionModel};
use crate::error::ValidationError;
use crate::grammar::RegularGrammar;
use fixedbitset::FixedBitSet;
use log::{debug, trace};
use petgraph::unionfind::UnionFind;
use std::collections::{BTreeSet, HashMap, VecDeque};

/// A deterministic finite automaton. The transition function is total over
/// the derived alphabet; an empty entry means the word is rejected from there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dfa {
    model: TransitionModel,
}

impl Dfa {
    /// Build a DFA from a transition literal, then complete and validate it.
    pub fn from_transition_literal(literal: TransitionLiteral<'_>) -> Result<Self, ValidationError> {
        Self::from_model(TransitionModel::from_literal(literal))
    }

    /// Wrap an already-assembled model, completing and validating it first.
    /// Also checks determinism, which plain validation does not.
    pub(crate) fn from_model(mut model: TransitionModel) -> Result<Self, ValidationError> {
        model.complete();
        model.validate()?;
        model.validate_deterministic()?;
        Ok(Self { model })
    }

    /// The single successor of (state, symbol), if the entry is non-empty.
    pub fn step(&self, state: &str, symbol: &str) -> Option<State> {
        self.model.move_on(state, symbol).into_iter().next()
    }

    /// Whether the DFA accepts the sentence. A predicate: a symbol outside
    /// the alphabet, a missing initial state or an empty entry all reject.
    pub fn recognize(&self, sentence: &[&str]) -> bool {
        let Some(initial) = self.model.initial_state() else {
            return false;
        };
        let alphabet = self.model.alphabet();
        let mut current = initial.clone();
        for symbol in sentence {
            if !alphabet.contains(*symbol) {
                return false;
            }
            match self.step(&current, symbol) {
                Some(next) => current = next,
                None => return false,
            }
        }
        self.model.final_states().contains(&current)
    }

    /// Convenience for single-character symbols: each char is one symbol.
    pub fn recognize_text(&self, text: &str) -> bool {
        let symbols: Vec<String> = text.chars().map(String::from).collect();
        let borrowed: Vec<&str> = symbols.iter().map(String::as_str).collect();
        self.recognize(&borrowed)
    }

    /// Whether no sentence at all is accepted.
    pub fn is_language_empty(&self) -> bool {
        let finals = self.model.final_states();
        !self.reachable_states().iter().any(|s| finals.contains(s))
    }

    /// Minimize in three phases: drop unreachable states, drop dead states,
    /// then merge language-equivalent states found by table filling.
    /// Returns a fresh automaton; minimizing twice yields the same state count.
    pub fn minimize(&self) -> Result<Dfa, ValidationError> {
        let Some(initial) = self.model.initial_state() else {
            return Dfa::from_model(TransitionModel::new());
        };

        let reachable = self.reachable_states();
        let alive = self.productive_states(&reachable);
        debug!(
            "minimize: {} states, {} reachable, {} productive",
            self.model.states().len(),
            reachable.len(),
            alive.len()
        );

        if !alive.contains(initial) {
            // The language is empty; all that remains is the initial state.
            let mut model = TransitionModel::new();
            model.set_initial_state(initial.clone());
            model.add_state(initial);
            return Dfa::from_model(model);
        }

        let states: Vec<State> = alive.iter().cloned().collect();
        let n = states.len();
        let index: HashMap<&State, usize> =
            states.iter().enumerate().map(|(i, s)| (s, i)).collect();
        let alphabet: Vec<Symbol> = self.model.alphabet().into_iter().collect();

        let mut finals = FixedBitSet::with_capacity(n);
        for (i, state) in states.iter().enumerate() {
            if self.model.final_states().contains(state) {
                finals.insert(i);
            }
        }

        // Successor index per (state, symbol); targets pruned in the first two
        // phases count as undefined.
        let successors: Vec<Vec<Option<usize>>> = states
            .iter()
            .map(|state| {
                alphabet
                    .iter()
                    .map(|symbol| {
                        self.model
                            .move_on(state, symbol)
                            .into_iter()
                            .next()
                            .and_then(|t| index.get(&t).copied())
                    })
                    .collect()
            })
            .collect();

        // Table filling: a pair starts distinguishable iff exactly one side is
        // final, then the marks propagate backwards over the transitions until
        // a full pass changes nothing.
        let mut marked = FixedBitSet::with_capacity(n * n);
        let pair = |i: usize, j: usize| i * n + j;
        for i in 0..n {
            for j in i + 1..n {
                if finals.contains(i) != finals.contains(j) {
                    marked.insert(pair(i, j));
                }
            }
        }

        loop {
            let mut changed = false;
            for i in 0..n {
                for j in i + 1..n {
                    if marked.contains(pair(i, j)) {
                        continue;
                    }
                    for k in 0..alphabet.len() {
                        // After dead-state removal every defined successor can
                        // still accept, so a defined/undefined split is itself
                        // distinguishing.
                        let distinguishable = match (successors[i][k], successors[j][k]) {
                            (None, None) => false,
                            (Some(a), Some(b)) => {
                                a != b && marked.contains(pair(a.min(b), a.max(b)))
                            }
                            _ => true,
                        };
                        if distinguishable {
                            marked.insert(pair(i, j));
                            changed = true;
                            break;
                        }
                    }
                }
            }
            if !changed {
                break;
            }
        }

        // Never-distinguished pairs collapse into equivalence classes.
        let mut classes = UnionFind::<usize>::new(n);
        for i in 0..n {
            for j in i + 1..n {
                if !marked.contains(pair(i, j)) {
                    classes.union(i, j);
                }
            }
        }

        let representative = |i: usize| states[classes.find(i)].clone();

        let mut model = TransitionModel::new();
        model.set_initial_state(representative(index[initial]));
        for i in 0..n {
            let source = representative(i);
            model.add_state(&source);
            if finals.contains(i) {
                model.add_final_state(source.clone());
            }
            for (k, symbol) in alphabet.iter().enumerate() {
                if let Some(target) = successors[i][k] {
                    model.add_transition(&source, symbol, BTreeSet::from([representative(target)]));
                }
            }
        }
        trace!("minimize: quotient has {} states", model.states().len());
        Dfa::from_model(model)
    }

    /// One non-terminal per state: each transition (s, a, t) yields `s -> a t`,
    /// plus `s -> a` whenever t is final. Targets that cannot derive anything
    /// (no outgoing transitions at all) are kept out of the length-2 form so
    /// the resulting grammar stays well-shaped.
    pub fn to_regular_grammar(&self) -> RegularGrammar {
        let mut grammar = RegularGrammar::new();
        let Some(initial) = self.model.initial_state() else {
            return grammar;
        };
        grammar.set_initial_symbol(initial.clone());

        for state in self.states() {
            let Some(row) = self.model.row(&state) else {
                continue;
            };
            for (symbol, targets) in row {
                for target in targets {
                    if self.model.final_states().contains(target) {
                        grammar.add_production(&state, &[symbol]);
                    }
                    if self.has_outgoing(target) {
                        grammar.add_production(&state, &[symbol, target]);
                    }
                }
            }
        }
        grammar
    }

    fn has_outgoing(&self, state: &str) -> bool {
        self.model
            .row(state)
            .is_some_and(|row| row.values().any(|targets| !targets.is_empty()))
    }

    /// Forward BFS from the initial state.
    fn reachable_states(&self) -> BTreeSet<State> {
        let mut reachable = BTreeSet::new();
        let Some(initial) = self.model.initial_state() else {
            return reachable;
        };
        let mut queue = VecDeque::from([initial.clone()]);
        while let Some(state) = queue.pop_front() {
            if !reachable.insert(state.clone()) {
                continue;
            }
            if let Some(row) = self.model.row(&state) {
                for targets in row.values() {
                    for target in targets {
                        if !reachable.contains(target) {
                            queue.push_back(target.clone());
                        }
                    }
                }
            }
        }
        reachable
    }

    /// Backward BFS from the final states along inverted transitions,
    /// restricted to the already-reachable part.
    fn productive_states(&self, reachable: &BTreeSet<State>) -> BTreeSet<State> {
        let mut inverted: HashMap<&State, BTreeSet<&State>> = HashMap::new();
        for (source, _, target) in self.model.transitions() {
            if reachable.contains(source) && reachable.contains(target) {
                inverted.entry(target).or_default().insert(source);
            }
        }

        let mut alive: BTreeSet<State> = BTreeSet::new();
        let mut queue: VecDeque<State> = self
            .model
            .final_states()
            .iter()
            .filter(|state| reachable.contains(*state))
            .cloned()
            .collect();
        while let Some(state) = queue.pop_front() {
            if !alive.insert(state.clone()) {
                continue;
            }
            if let Some(sources) = inverted.get(&state) {
                for source in sources {
                    if !alive.contains(*source) {
                        queue.push_back((*source).clone());
                    }
                }
            }
        }
        alive
    }
}

impl Automaton for Dfa {
    fn transition_model(&self) -> &TransitionModel {
        &self.model
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.model.validate()?;
        self.model.validate_deterministic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Accepts every string over {a, b} ending in "b".
    fn ends_in_b() -> Dfa {
        let literal: TransitionLiteral = &[
            ("→s0", &[("a", &["s0"]), ("b", &["s1"])]),
            ("*s1", &[("a", &["s0"]), ("b", &["s1"])]),
        ];
        Dfa::from_transition_literal(literal).unwrap()
    }

    fn all_sentences(alphabet: &[char], max_len: usize) -> Vec<String> {
        let mut sentences = vec![String::new()];
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
            sentences.extend(next.iter().cloned());
            frontier = next;
        }
        sentences
    }

    #[test]
    fn test_from_literal_rejects_nondeterminism() {
        let literal: TransitionLiteral = &[("→q0", &[("a", &["q0", "q1"])]), ("*q1", &[])];
        assert!(matches!(
            Dfa::from_transition_literal(literal),
            Err(ValidationError::NondeterministicEntry { .. })
        ));
    }

    #[test]
    fn test_recognize() {
        let dfa = ends_in_b();
        assert!(dfa.recognize_text("b"));
        assert!(dfa.recognize_text("aab"));
        assert!(dfa.recognize_text("abab"));
        assert!(!dfa.recognize_text(""));
        assert!(!dfa.recognize_text("ba"));
        assert!(!dfa.recognize_text("bc"));
    }

    #[test]
    fn test_minimize_merges_equivalent_states() {
        // q1/q2 and q3/q4 are pairwise equivalent.
        let literal: TransitionLiteral = &[
            ("→q0", &[("a", &["q1"]), ("b", &["q2"])]),
            ("q1", &[("b", &["q3"])]),
            ("q2", &[("b", &["q4"])]),
            ("*q3", &[]),
            ("*q4", &[]),
        ];
        let dfa = Dfa::from_transition_literal(literal).unwrap();
        let minimized = dfa.minimize().unwrap();

        assert_eq!(minimized.states().len(), 3);
        for sentence in all_sentences(&['a', 'b'], 4) {
            assert_eq!(
                dfa.recognize_text(&sentence),
                minimized.recognize_text(&sentence),
                "sentence {sentence:?}"
            );
        }
    }

    #[test]
    fn test_minimize_is_idempotent() {
        let literal: TransitionLiteral = &[
            ("→q0", &[("a", &["q1"]), ("b", &["q2"])]),
            ("q1", &[("b", &["q3"])]),
            ("q2", &[("b", &["q4"])]),
            ("*q3", &[]),
            ("*q4", &[]),
        ];
        let dfa = Dfa::from_transition_literal(literal).unwrap();
        let once = dfa.minimize().unwrap();
        let twice = once.minimize().unwrap();
        assert_eq!(once.states().len(), twice.states().len());
    }

    #[test]
    fn test_minimize_drops_unreachable_states() {
        let literal: TransitionLiteral = &[
            ("→s0", &[("a", &["s0"]), ("b", &["s1"])]),
            ("*s1", &[("a", &["s0"]), ("b", &["s1"])]),
            ("orphan", &[("a", &["s1"])]),
        ];
        let dfa = Dfa::from_transition_literal(literal).unwrap();
        let minimized = dfa.minimize().unwrap();
        assert!(!minimized.states().contains("orphan"));
        assert!(minimized.recognize_text("ab"));
    }

    #[test]
    fn test_minimize_drops_dead_states() {
        let literal: TransitionLiteral = &[
            ("→q0", &[("a", &["q1"]), ("b", &["trap"])]),
            ("*q1", &[("b", &["trap"])]),
            ("trap", &[("a", &["trap"]), ("b", &["trap"])]),
        ];
        let dfa = Dfa::from_transition_literal(literal).unwrap();
        let minimized = dfa.minimize().unwrap();
        assert_eq!(minimized.states().len(), 2);
        assert!(minimized.recognize_text("a"));
        assert!(!minimized.recognize_text("ab"));
    }

    #[test]
    fn test_minimize_empty_language() {
        let literal: TransitionLiteral = &[
            ("→q0", &[("a", &["q0"])]),
            ("*q9", &[("a", &["q9"])]),
        ];
        let dfa = Dfa::from_transition_literal(literal).unwrap();
        assert!(dfa.is_language_empty());
        let minimized = dfa.minimize().unwrap();
        assert_eq!(minimized.states().len(), 1);
        assert!(minimized.final_states().is_empty());
        assert!(minimized.is_language_empty());
    }

    #[test]
    fn test_is_language_empty() {
        assert!(!ends_in_b().is_language_empty());
        let literal: TransitionLiteral = &[("→q0", &[("a", &["q0"])])];
        let dfa = Dfa::from_transition_literal(literal).unwrap();
        assert!(dfa.is_language_empty());
    }

    #[test]
    fn test_to_regular_grammar_productions() {
        let grammar = ends_in_b().to_regular_grammar();
        assert_eq!(grammar.initial_symbol(), "s0");
        let productions = grammar.productions_of("s0");
        assert!(productions.contains(&vec!["a".to_string(), "s0".to_string()]));
        assert!(productions.contains(&vec!["b".to_string(), "s1".to_string()]));
        assert!(productions.contains(&vec!["b".to_string()]));
    }
}
