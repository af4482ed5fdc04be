//! Non-deterministic finite automaton and the subset construction.

use crate::automaton::dfa::Dfa;
use crate::automaton::symbol::{EPSILON, State, is_epsilon};
use crate::automaton::transitions::{
    Automaton, TransitionLiteral, TransitionModel, canonical_set_name,
};
use crate::error::ValidationError;
use log::trace;
use std::collections::{BTreeSet, VecDeque};

/// A non-deterministic finite automaton, possibly with ε-transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nfa {
    model: TransitionModel,
}

impl Nfa {
    /// Build an NFA from a transition literal, then complete and validate it.
    pub fn from_transition_literal(literal: TransitionLiteral<'_>) -> Result<Self, ValidationError> {
        Self::from_model(TransitionModel::from_literal(literal))
    }

    /// Wrap an already-assembled model, completing and validating it first.
    pub(crate) fn from_model(mut model: TransitionModel) -> Result<Self, ValidationError> {
        model.complete();
        model.validate()?;
        Ok(Self { model })
    }

    /// States reachable from `state` through zero or more ε-transitions.
    /// Iterative (stack + visited set) so ε-cycles terminate.
    pub fn epsilon_closure(&self, state: &str) -> BTreeSet<State> {
        let mut closure = BTreeSet::new();
        let mut stack = vec![state.to_string()];
        while let Some(current) = stack.pop() {
            if !closure.insert(current.clone()) {
                continue;
            }
            for next in self.model.move_on(&current, EPSILON) {
                if !closure.contains(&next) {
                    stack.push(next);
                }
            }
        }
        closure
    }

    /// Convert to a DFA with the subset construction. Each DFA state is the
    /// canonical name of a set of NFA states; the empty set becomes the `{}`
    /// sink so the result is total by construction.
    pub fn to_dfa(&self) -> Result<Dfa, ValidationError> {
        let mut model = TransitionModel::new();

        let Some(initial) = self.model.initial_state() else {
            return Dfa::from_model(model);
        };

        let alphabet: Vec<_> = self
            .model
            .alphabet()
            .into_iter()
            .filter(|symbol| !is_epsilon(symbol))
            .collect();
        let finals = self.model.final_states();

        let start_set = self.epsilon_closure(initial);
        let start_name = canonical_set_name(&start_set);
        model.set_initial_state(start_name.clone());

        let mut seen = BTreeSet::from([start_name]);
        let mut worklist = VecDeque::from([start_set]);

        while let Some(current) = worklist.pop_front() {
            let current_name = canonical_set_name(&current);
            model.add_state(&current_name);
            if current.iter().any(|state| finals.contains(state)) {
                model.add_final_state(current_name.clone());
            }

            for symbol in &alphabet {
                let mut next: BTreeSet<State> = BTreeSet::new();
                for state in &current {
                    for target in self.model.move_on(state, symbol) {
                        next.extend(self.epsilon_closure(&target));
                    }
                }

                let next_name = canonical_set_name(&next);
                if seen.insert(next_name.clone()) {
                    trace!("subset construction discovered {next_name}");
                    worklist.push_back(next);
                }
                model.add_transition(&current_name, symbol, BTreeSet::from([next_name]));
            }
        }

        Dfa::from_model(model)
    }

    /// Whether the NFA accepts the sentence. A predicate: malformed input or
    /// an automaton without an initial state rejects instead of failing.
    pub fn recognize(&self, sentence: &[&str]) -> bool {
        match self.to_dfa() {
            Ok(dfa) => dfa.recognize(sentence),
            Err(_) => false,
        }
    }

    /// Convenience for single-character symbols: each char is one symbol.
    pub fn recognize_text(&self, text: &str) -> bool {
        let symbols: Vec<String> = text.chars().map(String::from).collect();
        let borrowed: Vec<&str> = symbols.iter().map(String::as_str).collect();
        self.recognize(&borrowed)
    }
}

impl Automaton for Nfa {
    fn transition_model(&self) -> &TransitionModel {
        &self.model
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.model.validate()
    }
}
