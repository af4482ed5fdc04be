//! LL(1) predictive parser: table construction and the stack-based driver.

use crate::automaton::{END, is_epsilon};
use crate::error::{AmbiguityError, ParseError};
use crate::grammar::{ContextFreeGrammar, NonTerminal, Production, Terminal, first_of_sequence};
use indexmap::IndexMap;
use log::trace;
use std::collections::{BTreeSet, VecDeque};

/// Parse table plus the grammar and sets it was built from.
///
/// Construction fails with [`AmbiguityError`] on the first table cell two
/// productions claim; a collision means the grammar is not LL(1).
#[derive(Debug, Clone)]
pub struct Ll1Parser {
    grammar: ContextFreeGrammar,
    firsts: IndexMap<NonTerminal, BTreeSet<Terminal>>,
    follows: IndexMap<NonTerminal, BTreeSet<Terminal>>,
    table: IndexMap<NonTerminal, IndexMap<Terminal, Production>>,
}

impl Ll1Parser {
    /// Build the table: a production is keyed under FIRST of its body, an
    /// ε-production under FOLLOW of its owner (end marker included).
    pub fn from_grammar(grammar: ContextFreeGrammar) -> Result<Self, AmbiguityError> {
        let firsts = grammar.firsts();
        let follows = grammar.follows();
        let non_terminals = grammar.non_terminals();

        let mut table: IndexMap<NonTerminal, IndexMap<Terminal, Production>> = IndexMap::new();
        for (non_terminal, productions) in grammar.grammar().productions() {
            for production in productions {
                let leads_with_epsilon =
                    production.first().is_some_and(|symbol| is_epsilon(symbol));
                if leads_with_epsilon {
                    let lookaheads = follows.get(non_terminal).cloned().unwrap_or_default();
                    for terminal in &lookaheads {
                        insert_cell(&mut table, non_terminal, terminal, production)?;
                    }
                } else {
                    let lookaheads = first_of_sequence(production, &firsts, &non_terminals);
                    for terminal in lookaheads.iter().filter(|t| !is_epsilon(t)) {
                        insert_cell(&mut table, non_terminal, terminal, production)?;
                    }
                }
            }
        }
        trace!(
            "LL(1) table built: {} non-terminals",
            table.len()
        );

        Ok(Self {
            grammar,
            firsts,
            follows,
            table,
        })
    }

    pub fn grammar(&self) -> &ContextFreeGrammar {
        &self.grammar
    }

    pub fn firsts(&self) -> &IndexMap<NonTerminal, BTreeSet<Terminal>> {
        &self.firsts
    }

    pub fn follows(&self) -> &IndexMap<NonTerminal, BTreeSet<Terminal>> {
        &self.follows
    }

    pub fn table(&self) -> &IndexMap<NonTerminal, IndexMap<Terminal, Production>> {
        &self.table
    }

    /// Drive a leftmost derivation of the sentence. Returns the ordered
    /// (non-terminal, production) pairs applied; the sentence must be fully
    /// consumed, end marker included, when the stack empties.
    pub fn parse(&self, sentence: &[&str]) -> Result<Vec<(NonTerminal, Production)>, ParseError> {
        let terminals = self.grammar.terminals();
        let non_terminals = self.grammar.non_terminals();

        let mut input: VecDeque<String> =
            sentence.iter().map(|symbol| symbol.to_string()).collect();
        input.push_back(END.to_string());
        let mut stack: Vec<String> = vec![self.grammar.initial_symbol().to_string()];
        let mut derivation: Vec<(NonTerminal, Production)> = Vec::new();

        while let Some(symbol) = stack.pop() {
            if non_terminals.contains(&symbol) {
                let lookahead = input.front().cloned().unwrap_or_else(|| END.to_string());
                let Some(production) = self
                    .table
                    .get(&symbol)
                    .and_then(|row| row.get(&lookahead))
                else {
                    return Err(ParseError::MissingTableEntry {
                        non_terminal: symbol,
                        lookahead,
                    });
                };
                derivation.push((symbol, production.clone()));
                let is_epsilon_production =
                    production.first().is_some_and(|s| is_epsilon(s));
                if !is_epsilon_production {
                    for body_symbol in production.iter().rev() {
                        if !is_epsilon(body_symbol) {
                            stack.push(body_symbol.clone());
                        }
                    }
                }
            } else if terminals.contains(&symbol) {
                match input.pop_front() {
                    Some(front) if front == symbol => {}
                    Some(front) => {
                        return Err(ParseError::UnexpectedTerminal {
                            expected: symbol,
                            found: front,
                        });
                    }
                    None => {
                        return Err(ParseError::UnexpectedTerminal {
                            expected: symbol,
                            found: String::new(),
                        });
                    }
                }
            } else {
                return Err(ParseError::UnknownSymbol { symbol });
            }
        }

        let remaining: Vec<String> = input.into();
        if remaining.len() == 1 && remaining[0] == END {
            Ok(derivation)
        } else {
            Err(ParseError::LeftoverInput { remaining })
        }
    }
}

fn insert_cell(
    table: &mut IndexMap<NonTerminal, IndexMap<Terminal, Production>>,
    non_terminal: &str,
    terminal: &str,
    production: &Production,
) -> Result<(), AmbiguityError> {
    let row = table.entry(non_terminal.to_string()).or_default();
    if let Some(existing) = row.get(terminal) {
        if existing != production {
            return Err(AmbiguityError {
                non_terminal: non_terminal.to_string(),
                terminal: terminal.to_string(),
                existing: existing.clone(),
                incoming: production.clone(),
            });
        }
        return Ok(());
    }
    row.insert(terminal.to_string(), production.clone());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // E  -> T E'    E' -> + T E' | ε
    // T  -> F T'    T' -> * F T' | ε
    // F  -> ( E ) | id
    fn expression_grammar() -> ContextFreeGrammar {
        let mut grammar = ContextFreeGrammar::new();
        grammar.set_initial_symbol("E");
        grammar.add_production("E", &["T", "E'"]);
        grammar.add_production("E'", &["+", "T", "E'"]);
        grammar.add_production("E'", &["&"]);
        grammar.add_production("T", &["F", "T'"]);
        grammar.add_production("T'", &["*", "F", "T'"]);
        grammar.add_production("T'", &["&"]);
        grammar.add_production("F", &["(", "E", ")"]);
        grammar.add_production("F", &["id"]);
        grammar
    }

    #[test]
    fn test_expression_grammar_table_has_no_collisions() {
        let parser = Ll1Parser::from_grammar(expression_grammar()).unwrap();
        // Spot-check the canonical cells.
        assert_eq!(
            parser.table()["E"]["id"],
            vec!["T".to_string(), "E'".to_string()]
        );
        assert_eq!(
            parser.table()["E'"]["$"],
            vec!["&".to_string()]
        );
        assert_eq!(
            parser.table()["F"]["("],
            vec!["(".to_string(), "E".to_string(), ")".to_string()]
        );
        assert!(parser.table()["F"].get("+").is_none());
    }

    #[test]
    fn test_parse_expression() {
        let parser = Ll1Parser::from_grammar(expression_grammar()).unwrap();
        let derivation = parser.parse(&["id", "+", "id", "*", "id"]).unwrap();
        assert_eq!(
            derivation[0],
            (
                "E".to_string(),
                vec!["T".to_string(), "E'".to_string()]
            )
        );
        // Leftmost derivation: the first expansion of T happens before any E'.
        assert_eq!(
            derivation[1],
            (
                "T".to_string(),
                vec!["F".to_string(), "T'".to_string()]
            )
        );
        assert!(derivation.len() >= 8);
    }

    #[test]
    fn test_parse_parenthesized_expression() {
        let parser = Ll1Parser::from_grammar(expression_grammar()).unwrap();
        assert!(parser.parse(&["(", "id", "+", "id", ")", "*", "id"]).is_ok());
    }

    #[test]
    fn test_parse_rejects_truncated_input() {
        let parser = Ll1Parser::from_grammar(expression_grammar()).unwrap();
        assert!(matches!(
            parser.parse(&["id", "+"]).unwrap_err(),
            ParseError::MissingTableEntry { .. }
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_lookahead() {
        let parser = Ll1Parser::from_grammar(expression_grammar()).unwrap();
        assert!(matches!(
            parser.parse(&["id", "-", "id"]).unwrap_err(),
            ParseError::MissingTableEntry { .. }
        ));
    }

    #[test]
    fn test_first_first_conflict_is_ambiguous() {
        let mut grammar = ContextFreeGrammar::new();
        grammar.set_initial_symbol("S");
        grammar.add_production("S", &["a", "A"]);
        grammar.add_production("S", &["a", "B"]);
        grammar.add_production("A", &["b"]);
        grammar.add_production("B", &["c"]);

        let err = Ll1Parser::from_grammar(grammar).unwrap_err();
        assert_eq!(err.non_terminal, "S");
        assert_eq!(err.terminal, "a");
    }

    #[test]
    fn test_first_follow_conflict_is_ambiguous() {
        // ε ∈ FIRST(A) and a ∈ FIRST(A) ∩ FOLLOW(A).
        let mut grammar = ContextFreeGrammar::new();
        grammar.set_initial_symbol("S");
        grammar.add_production("S", &["A", "a"]);
        grammar.add_production("A", &["a"]);
        grammar.add_production("A", &["&"]);

        assert!(Ll1Parser::from_grammar(grammar).is_err());
    }
}
