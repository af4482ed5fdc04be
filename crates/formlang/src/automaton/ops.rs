//! Union, intersection and complement of DFAs.
//!
//! Union and intersection are product constructions over the full state cross
//! product; both sides are padded with an implicit dead component so one
//! automaton can keep running after the other falls off its defined path.
//! Every combinator assembles a fresh model and sends it through the same
//! completion/validation tail as every other constructor, so a result never
//! shares structure with its sources.

use crate::automaton::dfa::Dfa;
use crate::automaton::symbol::{State, Symbol};
use crate::automaton::transitions::{Automaton, TransitionModel};
use crate::error::ValidationError;
use std::collections::BTreeSet;

/// Name of the dead component inside product states.
const DEAD: &str = "∅";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProductMode {
    Union,
    Intersection,
}

impl Dfa {
    /// DFA accepting the union of both languages. The alphabet is the union
    /// of the two alphabets.
    pub fn union(&self, other: &Dfa) -> Result<Dfa, ValidationError> {
        product(self, other, ProductMode::Union)
    }

    /// DFA accepting the intersection of both languages. The alphabet is the
    /// intersection of the two alphabets.
    pub fn intersection(&self, other: &Dfa) -> Result<Dfa, ValidationError> {
        product(self, other, ProductMode::Intersection)
    }

    /// DFA accepting exactly the sentences over this automaton's alphabet
    /// that this automaton rejects. Empty entries are first routed to an
    /// explicit sink so that flipping the accepting set flips the language.
    pub fn complement(&self) -> Result<Dfa, ValidationError> {
        let mut model = self.transition_model().clone();
        let alphabet = model.alphabet();
        let states = model.states();

        let has_holes = states
            .iter()
            .any(|state| alphabet.iter().any(|symbol| model.move_on(state, symbol).is_empty()));
        if has_holes && !alphabet.is_empty() {
            let mut sink = String::from(DEAD);
            while model.contains_state(&sink) {
                sink.push('\'');
            }
            for state in &states {
                for symbol in &alphabet {
                    if model.move_on(state, symbol).is_empty() {
                        model.add_transition(state, symbol, BTreeSet::from([sink.clone()]));
                    }
                }
            }
            for symbol in &alphabet {
                model.add_transition(&sink, symbol, BTreeSet::from([sink.clone()]));
            }
        }

        let all = model.states();
        let flipped: BTreeSet<State> = all.difference(model.final_states()).cloned().collect();
        model.replace_final_states(flipped);
        Dfa::from_model(model)
    }
}

fn product(a: &Dfa, b: &Dfa, mode: ProductMode) -> Result<Dfa, ValidationError> {
    let alphabet: BTreeSet<Symbol> = match mode {
        ProductMode::Union => a.alphabet().union(&b.alphabet()).cloned().collect(),
        ProductMode::Intersection => a.alphabet().intersection(&b.alphabet()).cloned().collect(),
    };

    let mut model = TransitionModel::new();
    if let (Some(ia), Some(ib)) = (a.initial_state(), b.initial_state()) {
        model.set_initial_state(pair_name(Some(ia), Some(ib)));
    }

    let components_a: Vec<Option<State>> = component_space(a);
    let components_b: Vec<Option<State>> = component_space(b);

    for pa in &components_a {
        for pb in &components_b {
            let name = pair_name(pa.as_deref(), pb.as_deref());
            model.add_state(&name);

            let a_final = pa.as_ref().is_some_and(|s| a.final_states().contains(s));
            let b_final = pb.as_ref().is_some_and(|s| b.final_states().contains(s));
            let is_final = match mode {
                ProductMode::Union => a_final || b_final,
                ProductMode::Intersection => a_final && b_final,
            };
            if is_final {
                model.add_final_state(name.clone());
            }

            for symbol in &alphabet {
                let next_a = pa.as_deref().and_then(|s| a.step(s, symbol));
                let next_b = pb.as_deref().and_then(|s| b.step(s, symbol));
                let target = pair_name(next_a.as_deref(), next_b.as_deref());
                model.add_transition(&name, symbol, BTreeSet::from([target]));
            }
        }
    }

    Dfa::from_model(model)
}

/// All states of the automaton plus the dead component.
fn component_space(dfa: &Dfa) -> Vec<Option<State>> {
    let mut components: Vec<Option<State>> = dfa.states().into_iter().map(Some).collect();
    components.push(None);
    components
}

fn pair_name(a: Option<&str>, b: Option<&str>) -> State {
    format!("({}|{})", a.unwrap_or(DEAD), b.unwrap_or(DEAD))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::transitions::TransitionLiteral;

    // Accepts every string over {a, b} ending in "b".
    fn ends_in_b() -> Dfa {
        let literal: TransitionLiteral = &[
            ("→s0", &[("a", &["s0"]), ("b", &["s1"])]),
            ("*s1", &[("a", &["s0"]), ("b", &["s1"])]),
        ];
        Dfa::from_transition_literal(literal).unwrap()
    }

    // Accepts every string over {a, b} with an even number of "a"s.
    fn even_a() -> Dfa {
        let literal: TransitionLiteral = &[
            ("→*e", &[("a", &["o"]), ("b", &["e"])]),
            ("o", &[("a", &["e"]), ("b", &["o"])]),
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
    fn test_union_accepts_either_language() {
        let union = ends_in_b().union(&even_a()).unwrap();
        for sentence in all_sentences(&['a', 'b'], 4) {
            let expected =
                ends_in_b().recognize_text(&sentence) || even_a().recognize_text(&sentence);
            assert_eq!(union.recognize_text(&sentence), expected, "sentence {sentence:?}");
        }
    }

    #[test]
    fn test_intersection_accepts_both_languages() {
        let intersection = ends_in_b().intersection(&even_a()).unwrap();
        for sentence in all_sentences(&['a', 'b'], 4) {
            let expected =
                ends_in_b().recognize_text(&sentence) && even_a().recognize_text(&sentence);
            assert_eq!(
                intersection.recognize_text(&sentence),
                expected,
                "sentence {sentence:?}"
            );
        }
    }

    #[test]
    fn test_union_pads_the_shorter_alphabet() {
        // Accepts only "c"; shares no symbol with ends_in_b.
        let literal: TransitionLiteral = &[("→p0", &[("c", &["p1"])]), ("*p1", &[])];
        let only_c = Dfa::from_transition_literal(literal).unwrap();
        let union = ends_in_b().union(&only_c).unwrap();
        assert!(union.recognize_text("c"));
        assert!(union.recognize_text("ab"));
        assert!(!union.recognize_text("ca"));
    }

    #[test]
    fn test_complement_flips_the_language() {
        let complement = ends_in_b().complement().unwrap();
        for sentence in all_sentences(&['a', 'b'], 4) {
            assert_eq!(
                complement.recognize_text(&sentence),
                !ends_in_b().recognize_text(&sentence),
                "sentence {sentence:?}"
            );
        }
    }

    #[test]
    fn test_complement_materializes_the_sink() {
        // "a" leads nowhere from q1, so the complement must accept "aa".
        let literal: TransitionLiteral = &[("→q0", &[("a", &["q1"])]), ("*q1", &[])];
        let dfa = Dfa::from_transition_literal(literal).unwrap();
        let complement = dfa.complement().unwrap();
        assert!(complement.recognize_text(""));
        assert!(!complement.recognize_text("a"));
        assert!(complement.recognize_text("aa"));
        assert!(complement.recognize_text("aaa"));
    }

    #[test]
    fn test_de_morgan_identity() {
        let a = ends_in_b();
        let b = even_a();
        let direct = a.intersection(&b).unwrap();
        let via_union = a
            .complement()
            .unwrap()
            .union(&b.complement().unwrap())
            .unwrap()
            .complement()
            .unwrap();
        for sentence in all_sentences(&['a', 'b'], 4) {
            assert_eq!(
                direct.recognize_text(&sentence),
                via_union.recognize_text(&sentence),
                "sentence {sentence:?}"
            );
        }
    }

    #[test]
    fn test_combinators_leave_sources_untouched() {
        let a = ends_in_b();
        let b = even_a();
        let _union = a.union(&b).unwrap();
        let _intersection = a.intersection(&b).unwrap();
        let _complement = a.complement().unwrap();
        assert_eq!(a, ends_in_b());
        assert_eq!(b, even_a());
    }
}
