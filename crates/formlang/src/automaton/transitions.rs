//! Data-only transition model shared by the DFA and NFA variants.
//!
//! The model is a plain value: the variants (`Dfa`, `Nfa`) wrap it and layer
//! their own operations on top, and every transform in the crate produces a
//! fresh model rather than mutating a shared one.

use crate::automaton::symbol::{FINAL_MARKER, INITIAL_MARKER, State, Symbol};
use crate::error::ValidationError;
use indexmap::IndexMap;
use std::collections::{BTreeSet, VecDeque};
use std::fmt;

/// Hand-written automaton description: marked state names mapped to rows of
/// (symbol, target states). A leading `→` marks the initial state, a leading
/// `*` marks a final state; both may combine in either order.
pub type TransitionLiteral<'a> = &'a [(&'a str, &'a [(&'a str, &'a [&'a str])])];

/// Transition function δ: Q × Σ → P(Q), plus the initial/final designations.
///
/// The state set and the alphabet are derived: states are the keys of the
/// transition map, the alphabet is the union of all symbol keys. Target sets
/// are ordered so canonical composite names are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionModel {
    initial_state: Option<State>,
    final_states: BTreeSet<State>,
    transitions: IndexMap<State, IndexMap<Symbol, BTreeSet<State>>>,
}

impl TransitionModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a transition literal: strip the `→`/`*` markers, record the
    /// initial/final designations and add every listed transition. The result
    /// still needs [`TransitionModel::complete`] and validation; the `Dfa` and
    /// `Nfa` constructors do both.
    pub fn from_literal(literal: TransitionLiteral<'_>) -> Self {
        let mut model = Self::new();
        for (marked, rows) in literal {
            let (name, is_initial, is_final) = strip_markers(marked);
            if is_initial {
                model.initial_state = Some(name.clone());
            }
            if is_final {
                model.final_states.insert(name.clone());
            }
            model.add_state(&name);
            for (symbol, targets) in *rows {
                model.add_transition(
                    &name,
                    symbol,
                    targets.iter().map(|t| (*t).to_string()).collect(),
                );
            }
        }
        model
    }

    /// The start state, if one is designated.
    pub fn initial_state(&self) -> Option<&State> {
        self.initial_state.as_ref()
    }

    pub fn set_initial_state(&mut self, state: impl Into<State>) {
        self.initial_state = Some(state.into());
    }

    /// The accepting states.
    pub fn final_states(&self) -> &BTreeSet<State> {
        &self.final_states
    }

    pub fn add_final_state(&mut self, state: impl Into<State>) {
        self.final_states.insert(state.into());
    }

    /// Swap in a whole new accepting set (used by the complement combinator).
    pub(crate) fn replace_final_states(&mut self, final_states: BTreeSet<State>) {
        self.final_states = final_states;
    }

    /// Register a state without any transitions yet.
    pub fn add_state(&mut self, state: &str) {
        self.transitions.entry(state.to_string()).or_default();
    }

    pub fn contains_state(&self, state: &str) -> bool {
        self.transitions.contains_key(state)
    }

    /// Derived state set Q: the domain of the transition function.
    pub fn states(&self) -> BTreeSet<State> {
        self.transitions.keys().cloned().collect()
    }

    /// Derived alphabet Σ: every symbol appearing as a transition key.
    pub fn alphabet(&self) -> BTreeSet<Symbol> {
        self.transitions
            .values()
            .flat_map(|row| row.keys().cloned())
            .collect()
    }

    /// Union `targets` into the entry for (state, symbol). Idempotent and
    /// monotone: existing targets are never removed.
    pub fn add_transition(&mut self, state: &str, symbol: &str, targets: BTreeSet<State>) {
        self.transitions
            .entry(state.to_string())
            .or_default()
            .entry(symbol.to_string())
            .or_default()
            .extend(targets);
    }

    /// δ(state, symbol), or the empty set when undefined.
    pub fn move_on(&self, state: &str, symbol: &str) -> BTreeSet<State> {
        self.transitions
            .get(state)
            .and_then(|row| row.get(symbol))
            .cloned()
            .unwrap_or_default()
    }

    /// One state's row of the transition function.
    pub fn row(&self, state: &str) -> Option<&IndexMap<Symbol, BTreeSet<State>>> {
        self.transitions.get(state)
    }

    /// All transitions as (source, symbol, target) triples.
    pub fn transitions(&self) -> impl Iterator<Item = (&State, &Symbol, &State)> + '_ {
        self.transitions.iter().flat_map(|(src, row)| {
            row.iter()
                .flat_map(move |(sym, targets)| targets.iter().map(move |t| (src, sym, t)))
        })
    }

    /// Make the transition function total: every known state gets a (possibly
    /// empty) entry for every alphabet symbol, and every state discovered as a
    /// transition target is registered and completed in turn. Worklist-based so
    /// cyclic transition graphs terminate.
    pub fn complete(&mut self) {
        let alphabet = self.alphabet();
        let mut queue: VecDeque<State> = self.transitions.keys().cloned().collect();
        while let Some(state) = queue.pop_front() {
            for symbol in &alphabet {
                let row = self.transitions.entry(state.clone()).or_default();
                let targets: Vec<State> = row.entry(symbol.clone()).or_default().iter().cloned().collect();
                for target in targets {
                    if !self.transitions.contains_key(&target) {
                        self.transitions.insert(target.clone(), IndexMap::new());
                        queue.push_back(target);
                    }
                }
            }
        }
    }

    /// Check the structural invariants: all targets known, the function total
    /// over the derived alphabet, final states known, initial state known.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let alphabet = self.alphabet();
        for (state, row) in &self.transitions {
            for symbol in &alphabet {
                let Some(targets) = row.get(symbol) else {
                    return Err(ValidationError::MissingEntry {
                        state: state.clone(),
                        symbol: symbol.clone(),
                    });
                };
                for target in targets {
                    if !self.transitions.contains_key(target) {
                        return Err(ValidationError::UnknownTarget {
                            state: state.clone(),
                            symbol: symbol.clone(),
                            target: target.clone(),
                        });
                    }
                }
            }
        }
        for state in &self.final_states {
            if !self.transitions.contains_key(state) {
                return Err(ValidationError::UnknownFinalState {
                    state: state.clone(),
                });
            }
        }
        if let Some(state) = &self.initial_state {
            if !self.transitions.contains_key(state) {
                return Err(ValidationError::UnknownInitialState {
                    state: state.clone(),
                });
            }
        }
        Ok(())
    }

    /// Additional determinism check: no (state, symbol) entry may hold more
    /// than one target.
    pub fn validate_deterministic(&self) -> Result<(), ValidationError> {
        for (state, row) in &self.transitions {
            for (symbol, targets) in row {
                if targets.len() > 1 {
                    return Err(ValidationError::NondeterministicEntry {
                        state: state.clone(),
                        symbol: symbol.clone(),
                        targets: targets.iter().cloned().collect(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Shared read-only capability surface of both automaton variants. The display
/// collaborator renders automata through this interface alone.
pub trait Automaton {
    /// The underlying transition model.
    fn transition_model(&self) -> &TransitionModel;

    /// Variant-specific structural validation.
    fn validate(&self) -> Result<(), ValidationError>;

    fn states(&self) -> BTreeSet<State> {
        self.transition_model().states()
    }

    fn alphabet(&self) -> BTreeSet<Symbol> {
        self.transition_model().alphabet()
    }

    fn initial_state(&self) -> Option<&State> {
        self.transition_model().initial_state()
    }

    fn final_states(&self) -> &BTreeSet<State> {
        self.transition_model().final_states()
    }

    fn move_on(&self, state: &str, symbol: &str) -> BTreeSet<State> {
        self.transition_model().move_on(state, symbol)
    }
}

/// Canonical name for a set: elements in sorted order, joined inside braces.
/// Stable and order-independent, so the same set always gets the same name.
pub fn canonical_set_name<T: fmt::Display>(set: &BTreeSet<T>) -> String {
    let mut name = String::from("{");
    for (i, item) in set.iter().enumerate() {
        if i > 0 {
            name.push(',');
        }
        name.push_str(&item.to_string());
    }
    name.push('}');
    name
}

fn strip_markers(marked: &str) -> (State, bool, bool) {
    let mut rest = marked;
    let mut is_initial = false;
    let mut is_final = false;
    loop {
        if let Some(r) = rest.strip_prefix(INITIAL_MARKER) {
            is_initial = true;
            rest = r;
        } else if let Some(r) = rest.strip_prefix(FINAL_MARKER) {
            is_final = true;
            rest = r;
        } else {
            break;
        }
    }
    (rest.to_string(), is_initial, is_final)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_strip_in_any_order() {
        assert_eq!(strip_markers("→q0"), ("q0".to_string(), true, false));
        assert_eq!(strip_markers("*q2"), ("q2".to_string(), false, true));
        assert_eq!(strip_markers("→*q1"), ("q1".to_string(), true, true));
        assert_eq!(strip_markers("*→q1"), ("q1".to_string(), true, true));
        assert_eq!(strip_markers("q3"), ("q3".to_string(), false, false));
    }

    #[test]
    fn test_add_transition_is_monotone() {
        let mut model = TransitionModel::new();
        model.add_transition("q0", "a", BTreeSet::from(["q1".to_string()]));
        model.add_transition("q0", "a", BTreeSet::from(["q2".to_string()]));
        assert_eq!(
            model.move_on("q0", "a"),
            BTreeSet::from(["q1".to_string(), "q2".to_string()])
        );
    }

    #[test]
    fn test_move_on_undefined_is_empty() {
        let model = TransitionModel::new();
        assert!(model.move_on("q0", "a").is_empty());
    }

    #[test]
    fn test_complete_registers_discovered_targets() {
        let literal: TransitionLiteral = &[("→q0", &[("a", &["q0", "q1"]), ("b", &["q0"])])];
        let mut model = TransitionModel::from_literal(literal);
        model.complete();

        // q1 only appeared as a target, but completion registered it and gave
        // it an entry per alphabet symbol.
        assert!(model.contains_state("q1"));
        assert!(model.row("q1").unwrap().contains_key("a"));
        assert!(model.row("q1").unwrap().contains_key("b"));
        assert!(model.move_on("q1", "a").is_empty());
        model.validate().unwrap();
    }

    #[test]
    fn test_complete_tolerates_cycles() {
        let literal: TransitionLiteral = &[
            ("→q0", &[("a", &["q1"])]),
            ("q1", &[("a", &["q0"])]),
        ];
        let mut model = TransitionModel::from_literal(literal);
        model.complete();
        model.validate().unwrap();
        assert_eq!(model.states().len(), 2);
    }

    #[test]
    fn test_validate_rejects_unknown_final_state() {
        let literal: TransitionLiteral = &[("→q0", &[("a", &["q0"])])];
        let mut model = TransitionModel::from_literal(literal);
        model.add_final_state("q9");
        model.complete();
        assert_eq!(
            model.validate(),
            Err(ValidationError::UnknownFinalState {
                state: "q9".to_string()
            })
        );
    }

    #[test]
    fn test_validate_rejects_missing_entry() {
        let mut model = TransitionModel::new();
        model.add_transition("q0", "a", BTreeSet::from(["q0".to_string()]));
        model.add_transition("q1", "b", BTreeSet::from(["q0".to_string()]));
        // Not completed: q0 lacks a "b" entry.
        assert!(matches!(
            model.validate(),
            Err(ValidationError::MissingEntry { .. })
        ));
    }

    #[test]
    fn test_validate_deterministic_rejects_multiple_targets() {
        let literal: TransitionLiteral = &[("→q0", &[("a", &["q0", "q1"])])];
        let mut model = TransitionModel::from_literal(literal);
        model.complete();
        assert!(matches!(
            model.validate_deterministic(),
            Err(ValidationError::NondeterministicEntry { .. })
        ));
    }

    #[test]
    fn test_canonical_set_name_is_order_independent() {
        let a: BTreeSet<String> = ["q2", "q0", "q1"].iter().map(|s| s.to_string()).collect();
        let b: BTreeSet<String> = ["q0", "q1", "q2"].iter().map(|s| s.to_string()).collect();
        assert_eq!(canonical_set_name(&a), "{q0,q1,q2}");
        assert_eq!(canonical_set_name(&a), canonical_set_name(&b));
        assert_eq!(canonical_set_name(&BTreeSet::<String>::new()), "{}");
    }
}
