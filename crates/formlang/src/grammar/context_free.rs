//! Context-free grammars: FIRST/FOLLOW fixpoints, left-recursion elimination,
//! left-factoring and the classical simplification passes.

use crate::automaton::{END, EPSILON, is_epsilon};
use crate::error::NonDeterminismUnresolved;
use crate::grammar::productions::{Grammar, NonTerminal, Production, Terminal, fresh_symbol};
use indexmap::IndexMap;
use log::debug;
use std::collections::BTreeSet;

/// Outer bound on left-factoring rounds; past it the grammar is reported as
/// unresolved rather than looping forever.
const MAX_FACTORING_ROUNDS: usize = 10;

/// A context-free grammar over the shared production map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextFreeGrammar {
    grammar: Grammar,
}

impl ContextFreeGrammar {
    pub fn new() -> Self {
        Self {
            grammar: Grammar::new(),
        }
    }

    pub fn from_grammar(grammar: Grammar) -> Self {
        Self { grammar }
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

    /// FIRST set of every non-terminal, computed as one bounded fixpoint so
    /// mutually recursive grammars terminate without a recursion guard.
    pub fn firsts(&self) -> IndexMap<NonTerminal, BTreeSet<Terminal>> {
        let non_terminals = self.grammar.non_terminals();
        let mut firsts: IndexMap<NonTerminal, BTreeSet<Terminal>> = self
            .grammar
            .productions()
            .keys()
            .map(|nt| (nt.clone(), BTreeSet::new()))
            .collect();

        loop {
            let mut changed = false;
            for (non_terminal, productions) in self.grammar.productions() {
                for production in productions {
                    let addition = first_of_sequence(production, &firsts, &non_terminals);
                    if let Some(set) = firsts.get_mut(non_terminal) {
                        let before = set.len();
                        set.extend(addition);
                        changed |= set.len() != before;
                    }
                }
            }
            if !changed {
                break;
            }
        }
        firsts
    }

    /// FOLLOW set of every non-terminal. The end marker seeds the start
    /// symbol; the table is rescanned until a full pass leaves every set
    /// unchanged (snapshot equality, not an iteration count).
    pub fn follows(&self) -> IndexMap<NonTerminal, BTreeSet<Terminal>> {
        let firsts = self.firsts();
        let non_terminals = self.grammar.non_terminals();
        let mut follows: IndexMap<NonTerminal, BTreeSet<Terminal>> = self
            .grammar
            .productions()
            .keys()
            .map(|nt| (nt.clone(), BTreeSet::new()))
            .collect();
        if let Some(set) = follows.get_mut(self.grammar.initial_symbol()) {
            set.insert(END.to_string());
        }

        loop {
            let snapshot = follows.clone();
            for (lhs, productions) in self.grammar.productions() {
                for production in productions {
                    for (i, symbol) in production.iter().enumerate() {
                        if !non_terminals.contains(symbol) {
                            continue;
                        }
                        match production.get(i + 1) {
                            None => {
                                let lhs_follow =
                                    follows.get(lhs).cloned().unwrap_or_default();
                                if let Some(set) = follows.get_mut(symbol) {
                                    set.extend(lhs_follow);
                                }
                            }
                            Some(next) => {
                                let next_first = first_of_sequence(
                                    std::slice::from_ref(next),
                                    &firsts,
                                    &non_terminals,
                                );
                                let nullable = next_first.contains(EPSILON);
                                let lhs_follow =
                                    follows.get(lhs).cloned().unwrap_or_default();
                                if let Some(set) = follows.get_mut(symbol) {
                                    set.extend(
                                        next_first.into_iter().filter(|t| !is_epsilon(t)),
                                    );
                                    if nullable {
                                        set.extend(lhs_follow);
                                    }
                                }
                            }
                        }
                    }
                }
            }
            if follows == snapshot {
                break;
            }
        }
        follows
    }

    /// Eliminate left recursion: substitute away indirect recursion in
    /// non-terminal order, then rewrite the directly recursive rules through
    /// fresh primed non-terminals.
    pub fn remove_left_recursion(&self) -> ContextFreeGrammar {
        self.remove_indirect_left_recursion()
            .remove_direct_left_recursion()
    }

    fn remove_indirect_left_recursion(&self) -> ContextFreeGrammar {
        let order: Vec<NonTerminal> = self.grammar.non_terminals().into_iter().collect();
        let mut working: IndexMap<NonTerminal, Vec<Production>> =
            self.grammar.productions().clone();

        for i in 0..order.len() {
            for j in 0..i {
                let expansions = working.get(&order[j]).cloned().unwrap_or_default();
                let current = working.get(&order[i]).cloned().unwrap_or_default();
                let mut rewritten: Vec<Production> = Vec::new();
                for production in current {
                    if production.first() == Some(&order[j]) {
                        for expansion in &expansions {
                            let mut merged = expansion.clone();
                            merged.extend(production[1..].iter().cloned());
                            if !rewritten.contains(&merged) {
                                rewritten.push(merged);
                            }
                        }
                    } else if !rewritten.contains(&production) {
                        rewritten.push(production);
                    }
                }
                working.insert(order[i].clone(), rewritten);
            }
        }

        let mut result = ContextFreeGrammar::new();
        result.set_initial_symbol(self.grammar.initial_symbol());
        for (non_terminal, productions) in &working {
            for production in productions {
                result.add_production(non_terminal, production);
            }
        }
        result
    }

    fn remove_direct_left_recursion(&self) -> ContextFreeGrammar {
        let mut result = ContextFreeGrammar::new();
        result.set_initial_symbol(self.grammar.initial_symbol());
        let mut taken: BTreeSet<String> = self.grammar.non_terminals();
        taken.extend(self.grammar.terminals());

        for (non_terminal, productions) in self.grammar.productions() {
            let recursive = productions
                .iter()
                .any(|production| production.first() == Some(non_terminal));
            if !recursive {
                for production in productions {
                    result.add_production(non_terminal, production);
                }
                continue;
            }

            let fresh = fresh_symbol(non_terminal, &taken);
            taken.insert(fresh.clone());
            for production in productions {
                if production.first() == Some(non_terminal) {
                    let mut tail: Production = production[1..].to_vec();
                    tail.push(fresh.clone());
                    result.add_production(&fresh, &tail);
                } else {
                    let mut body = production.clone();
                    body.push(fresh.clone());
                    result.add_production(non_terminal, &body);
                }
            }
            result.add_production(&fresh, &[EPSILON]);
        }
        result
    }

    /// Whether some non-terminal has two productions sharing a leading
    /// terminal.
    pub fn has_direct_nondeterminism(&self) -> bool {
        let non_terminals = self.grammar.non_terminals();
        self.grammar
            .productions()
            .values()
            .any(|productions| has_conflict(productions, &non_terminals))
    }

    /// Left-factor until no non-terminal has two productions sharing a
    /// leading terminal, inlining leading non-terminals where that exposes a
    /// hidden conflict. Bounded: factoring is a heuristic and some grammars
    /// (left-recursive ones in particular) never converge.
    pub fn remove_non_determinism(
        &self,
    ) -> Result<ContextFreeGrammar, NonDeterminismUnresolved> {
        let mut current = self.clone();
        for round in 0..MAX_FACTORING_ROUNDS {
            let next = current.factoring_round();
            if next.grammar == current.grammar {
                debug!("left factoring converged after {round} rounds");
                return Ok(next);
            }
            current = next;
        }
        Err(NonDeterminismUnresolved {
            rounds: MAX_FACTORING_ROUNDS,
        })
    }

    fn factoring_round(&self) -> ContextFreeGrammar {
        let non_terminals = self.grammar.non_terminals();

        // Inline one level of leading non-terminals, but only keep the
        // expansion where it actually exposes a conflict to factor.
        let mut staged = ContextFreeGrammar::new();
        staged.set_initial_symbol(self.grammar.initial_symbol());
        for (non_terminal, productions) in self.grammar.productions() {
            let inlined = self.inline_leading(productions, &non_terminals);
            let chosen = if has_conflict(&inlined, &non_terminals) {
                &inlined
            } else {
                productions
            };
            for production in chosen {
                staged.add_production(non_terminal, production);
            }
        }
        staged.factor_direct()
    }

    fn inline_leading(
        &self,
        productions: &[Production],
        non_terminals: &BTreeSet<NonTerminal>,
    ) -> Vec<Production> {
        let mut result: Vec<Production> = Vec::new();
        for production in productions {
            match production.first() {
                Some(first) if non_terminals.contains(first) => {
                    for expansion in self.grammar.productions_of(first) {
                        let mut merged = expansion.clone();
                        merged.extend(production[1..].iter().cloned());
                        if !result.contains(&merged) {
                            result.push(merged);
                        }
                    }
                }
                _ => {
                    if !result.contains(production) {
                        result.push(production.clone());
                    }
                }
            }
        }
        result
    }

    fn factor_direct(&self) -> ContextFreeGrammar {
        let non_terminals = self.grammar.non_terminals();
        let mut taken: BTreeSet<String> = non_terminals.clone();
        taken.extend(self.grammar.terminals());

        let mut result = ContextFreeGrammar::new();
        result.set_initial_symbol(self.grammar.initial_symbol());

        for (non_terminal, productions) in self.grammar.productions() {
            let mut groups: IndexMap<Terminal, Vec<&Production>> = IndexMap::new();
            for production in productions {
                if let Some(first) = production.first() {
                    if !non_terminals.contains(first) {
                        groups.entry(first.clone()).or_default().push(production);
                    }
                }
            }

            let mut factored: BTreeSet<Terminal> = BTreeSet::new();
            for production in productions {
                let Some(first) = production.first() else {
                    continue;
                };
                if non_terminals.contains(first) {
                    result.add_production(non_terminal, production);
                    continue;
                }
                let group = &groups[first];
                if group.len() == 1 {
                    result.add_production(non_terminal, production);
                } else if factored.insert(first.clone()) {
                    let fresh = fresh_symbol(non_terminal, &taken);
                    taken.insert(fresh.clone());
                    result.add_production(non_terminal, &[first.clone(), fresh.clone()]);
                    for grouped in group {
                        if grouped.len() == 1 {
                            result.add_production(&fresh, &[EPSILON]);
                        } else {
                            result.add_production(&fresh, &grouped[1..]);
                        }
                    }
                }
            }
        }
        result
    }

    /// Remove ε-productions: every production is re-emitted with each subset
    /// of its nullable occurrences elided. When the start symbol is nullable a
    /// fresh start with an ε-alternative keeps ε in the language.
    pub fn remove_epsilon_productions(&self) -> ContextFreeGrammar {
        let nullable = self.nullable_non_terminals();

        let mut result = ContextFreeGrammar::new();
        result.set_initial_symbol(self.grammar.initial_symbol());
        for (non_terminal, productions) in self.grammar.productions() {
            for production in productions {
                if production.len() == 1 && is_epsilon(&production[0]) {
                    continue;
                }
                let nullable_positions: Vec<usize> = production
                    .iter()
                    .enumerate()
                    .filter(|(_, symbol)| nullable.contains(*symbol))
                    .map(|(i, _)| i)
                    .collect();
                for mask in 0u32..(1 << nullable_positions.len()) {
                    let variant: Production = production
                        .iter()
                        .enumerate()
                        .filter(|(i, symbol)| {
                            if is_epsilon(symbol) {
                                return false;
                            }
                            match nullable_positions.iter().position(|p| p == i) {
                                Some(bit) => mask & (1 << bit) == 0,
                                None => true,
                            }
                        })
                        .map(|(_, symbol)| symbol.clone())
                        .collect();
                    if !variant.is_empty() {
                        result.add_production(non_terminal, &variant);
                    }
                }
            }
        }

        if nullable.contains(self.grammar.initial_symbol()) {
            let mut taken = result.non_terminals();
            taken.extend(result.terminals());
            let fresh = fresh_symbol(self.grammar.initial_symbol(), &taken);
            result.add_production(&fresh, &[self.grammar.initial_symbol()]);
            result.add_production(&fresh, &[EPSILON]);
            result.set_initial_symbol(fresh);
        }
        result
    }

    /// Remove unit productions (`A -> B`) by inlining the unit-reachable
    /// non-terminals' remaining productions.
    pub fn remove_unit_productions(&self) -> ContextFreeGrammar {
        let non_terminals = self.grammar.non_terminals();

        let mut reachable: IndexMap<NonTerminal, BTreeSet<NonTerminal>> = self
            .grammar
            .productions()
            .iter()
            .map(|(nt, productions)| {
                let mut set = BTreeSet::from([nt.clone()]);
                for production in productions {
                    if let [symbol] = production.as_slice() {
                        if non_terminals.contains(symbol) {
                            set.insert(symbol.clone());
                        }
                    }
                }
                (nt.clone(), set)
            })
            .collect();

        loop {
            let mut changed = false;
            let keys: Vec<NonTerminal> = reachable.keys().cloned().collect();
            for key in &keys {
                let closure: BTreeSet<NonTerminal> = reachable[key]
                    .iter()
                    .flat_map(|r| reachable.get(r).cloned().unwrap_or_default())
                    .collect();
                if let Some(set) = reachable.get_mut(key) {
                    let before = set.len();
                    set.extend(closure);
                    changed |= set.len() != before;
                }
            }
            if !changed {
                break;
            }
        }

        let mut result = ContextFreeGrammar::new();
        result.set_initial_symbol(self.grammar.initial_symbol());
        for non_terminal in self.grammar.productions().keys() {
            for source in &reachable[non_terminal] {
                for production in self.grammar.productions_of(source) {
                    let is_unit = matches!(production.as_slice(),
                        [symbol] if non_terminals.contains(symbol));
                    if !is_unit {
                        result.add_production(non_terminal, production);
                    }
                }
            }
        }
        result
    }

    /// Rename non-terminals to fresh short names; see
    /// [`Grammar::canonicalize_symbols`].
    pub fn canonicalize_symbols(&self) -> ContextFreeGrammar {
        ContextFreeGrammar {
            grammar: self.grammar.canonicalize_symbols(),
        }
    }

    fn nullable_non_terminals(&self) -> BTreeSet<NonTerminal> {
        let mut nullable: BTreeSet<NonTerminal> = BTreeSet::new();
        loop {
            let mut changed = false;
            for (non_terminal, productions) in self.grammar.productions() {
                if nullable.contains(non_terminal) {
                    continue;
                }
                let derives_empty = productions.iter().any(|production| {
                    production
                        .iter()
                        .all(|symbol| is_epsilon(symbol) || nullable.contains(symbol))
                });
                if derives_empty {
                    nullable.insert(non_terminal.clone());
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        nullable
    }
}

/// FIRST of a symbol sequence: leading terminal, or the FIRST sets of the
/// leading non-terminals while they are nullable; ε only when every symbol in
/// the sequence is nullable.
pub(crate) fn first_of_sequence(
    symbols: &[String],
    firsts: &IndexMap<NonTerminal, BTreeSet<Terminal>>,
    non_terminals: &BTreeSet<NonTerminal>,
) -> BTreeSet<Terminal> {
    let mut result = BTreeSet::new();
    for symbol in symbols {
        if is_epsilon(symbol) {
            continue;
        }
        if !non_terminals.contains(symbol) {
            result.insert(symbol.clone());
            return result;
        }
        let nt_first = firsts.get(symbol).cloned().unwrap_or_default();
        let nullable = nt_first.contains(EPSILON);
        result.extend(nt_first.into_iter().filter(|t| !is_epsilon(t)));
        if !nullable {
            return result;
        }
    }
    result.insert(EPSILON.to_string());
    result
}

fn has_conflict(productions: &[Production], non_terminals: &BTreeSet<NonTerminal>) -> bool {
    let mut seen: BTreeSet<&String> = BTreeSet::new();
    for production in productions {
        if let Some(first) = production.first() {
            if !non_terminals.contains(first) && !seen.insert(first) {
                return true;
            }
        }
    }
    false
}
