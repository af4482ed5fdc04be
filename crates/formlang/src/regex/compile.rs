//! Direct regex-to-DFA construction: worklist over followpos position sets,
//! no intermediate NFA.

use crate::automaton::{Dfa, TransitionModel, canonical_set_name};
use crate::error::{ConstructionError, FormalError, ValidationError};
use crate::regex::tokens::preprocess;
use crate::regex::tree::{LeafSymbol, Position, SyntaxTree};
use log::trace;
use std::collections::{BTreeSet, VecDeque};

/// Compile a pattern into a DFA. Each DFA state is the canonical name of a
/// set of tree positions; a state accepting means the set holds the
/// end-marker position.
pub fn compile(pattern: &str) -> Result<Dfa, FormalError> {
    let postfix = preprocess(pattern)?;
    let tree = SyntaxTree::from_postfix(&postfix)?;
    let end = tree
        .end_position()
        .ok_or(ConstructionError::IncompleteExpression)?;
    Ok(dfa_from_tree(&tree, end)?)
}

fn dfa_from_tree(tree: &SyntaxTree, end: Position) -> Result<Dfa, ValidationError> {
    let mut model = TransitionModel::new();
    let symbols = tree.input_symbols();

    let start = tree.root_firstpos().clone();
    let start_name = canonical_set_name(&start);
    model.set_initial_state(start_name.clone());
    model.add_state(&start_name);

    let mut seen = BTreeSet::from([start_name]);
    let mut worklist = VecDeque::from([start]);

    while let Some(current) = worklist.pop_front() {
        let current_name = canonical_set_name(&current);
        model.add_state(&current_name);
        if current.contains(&end) {
            model.add_final_state(current_name.clone());
        }

        for &symbol in &symbols {
            let mut next: BTreeSet<Position> = BTreeSet::new();
            for &position in &current {
                if tree.symbol_at(position) == LeafSymbol::Char(symbol) {
                    next.extend(tree.followpos(position).iter().copied());
                }
            }
            if next.is_empty() {
                continue;
            }
            let next_name = canonical_set_name(&next);
            if seen.insert(next_name.clone()) {
                trace!("direct construction discovered {next_name}");
                worklist.push_back(next);
            }
            model.add_transition(&current_name, &symbol.to_string(), BTreeSet::from([next_name]));
        }
    }

    Dfa::from_model(model)
}
