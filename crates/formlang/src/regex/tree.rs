//! Syntax tree over the postfix token sequence, with the position attributes
//! the direct DFA construction reads off.
//!
//! Nodes live in a per-tree arena and are addressed by index; nothing outside
//! the tree ever holds a node. Positions are assigned to leaves in
//! left-to-right order, 1-based, with the reserved end-marker leaf last.

use crate::error::ConstructionError;
use crate::regex::tokens::Tok;
use std::collections::BTreeSet;

/// 1-based leaf position.
pub type Position = usize;

type NodeId = usize;

/// What a positioned leaf stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafSymbol {
    Char(char),
    /// The reserved end marker; the position holding it decides acceptance.
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeKind {
    Leaf { position: Position },
    Epsilon,
    Concat(NodeId, NodeId),
    Union(NodeId, NodeId),
    Star(NodeId),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    nullable: bool,
    firstpos: BTreeSet<Position>,
    lastpos: BTreeSet<Position>,
}

/// Arena-owned syntax tree with computed attributes.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    root: NodeId,
    /// Leaf symbol per position (index = position - 1).
    leaf_symbols: Vec<LeafSymbol>,
    /// followpos per position (index = position - 1).
    followpos: Vec<BTreeSet<Position>>,
}

impl SyntaxTree {
    /// Build the tree from a postfix token sequence: binary operators pop two
    /// operands, `*` pops one, leaves get a fresh position. Attributes are
    /// computed bottom-up during construction, followpos in one pass after.
    pub fn from_postfix(postfix: &[Tok]) -> Result<Self, ConstructionError> {
        let mut nodes: Vec<Node> = Vec::new();
        let mut leaf_symbols: Vec<LeafSymbol> = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();

        for tok in postfix {
            match *tok {
                Tok::Literal(c) => {
                    leaf_symbols.push(LeafSymbol::Char(c));
                    let position = leaf_symbols.len();
                    stack.push(push_leaf(&mut nodes, position));
                }
                Tok::EndMarker => {
                    leaf_symbols.push(LeafSymbol::End);
                    let position = leaf_symbols.len();
                    stack.push(push_leaf(&mut nodes, position));
                }
                Tok::Epsilon => {
                    let id = nodes.len();
                    nodes.push(Node {
                        kind: NodeKind::Epsilon,
                        nullable: true,
                        firstpos: BTreeSet::new(),
                        lastpos: BTreeSet::new(),
                    });
                    stack.push(id);
                }
                Tok::Star => {
                    let child = stack.pop().ok_or(ConstructionError::IncompleteExpression)?;
                    let id = nodes.len();
                    let firstpos = nodes[child].firstpos.clone();
                    let lastpos = nodes[child].lastpos.clone();
                    nodes.push(Node {
                        kind: NodeKind::Star(child),
                        nullable: true,
                        firstpos,
                        lastpos,
                    });
                    stack.push(id);
                }
                Tok::Concat => {
                    let right = stack.pop().ok_or(ConstructionError::IncompleteExpression)?;
                    let left = stack.pop().ok_or(ConstructionError::IncompleteExpression)?;
                    let mut firstpos = nodes[left].firstpos.clone();
                    if nodes[left].nullable {
                        firstpos.extend(nodes[right].firstpos.iter().copied());
                    }
                    let mut lastpos = nodes[right].lastpos.clone();
                    if nodes[right].nullable {
                        lastpos.extend(nodes[left].lastpos.iter().copied());
                    }
                    let nullable = nodes[left].nullable && nodes[right].nullable;
                    let id = nodes.len();
                    nodes.push(Node {
                        kind: NodeKind::Concat(left, right),
                        nullable,
                        firstpos,
                        lastpos,
                    });
                    stack.push(id);
                }
                Tok::Union => {
                    let right = stack.pop().ok_or(ConstructionError::IncompleteExpression)?;
                    let left = stack.pop().ok_or(ConstructionError::IncompleteExpression)?;
                    let firstpos: BTreeSet<Position> = nodes[left]
                        .firstpos
                        .union(&nodes[right].firstpos)
                        .copied()
                        .collect();
                    let lastpos: BTreeSet<Position> = nodes[left]
                        .lastpos
                        .union(&nodes[right].lastpos)
                        .copied()
                        .collect();
                    let nullable = nodes[left].nullable || nodes[right].nullable;
                    let id = nodes.len();
                    nodes.push(Node {
                        kind: NodeKind::Union(left, right),
                        nullable,
                        firstpos,
                        lastpos,
                    });
                    stack.push(id);
                }
                Tok::Question | Tok::Plus | Tok::LParen | Tok::RParen => {
                    return Err(ConstructionError::IncompleteExpression);
                }
            }
        }

        if stack.len() != 1 {
            return Err(ConstructionError::IncompleteExpression);
        }
        let root = stack[0];

        let mut followpos = vec![BTreeSet::new(); leaf_symbols.len()];
        for node in &nodes {
            match node.kind {
                NodeKind::Concat(left, right) => {
                    for &position in &nodes[left].lastpos {
                        followpos[position - 1].extend(nodes[right].firstpos.iter().copied());
                    }
                }
                NodeKind::Star(child) => {
                    for &position in &nodes[child].lastpos {
                        followpos[position - 1].extend(nodes[child].firstpos.iter().copied());
                    }
                }
                _ => {}
            }
        }

        Ok(Self {
            nodes,
            root,
            leaf_symbols,
            followpos,
        })
    }

    /// firstpos of the root: the initial state of the direct construction.
    pub fn root_firstpos(&self) -> &BTreeSet<Position> {
        &self.nodes[self.root].firstpos
    }

    pub fn root_nullable(&self) -> bool {
        self.nodes[self.root].nullable
    }

    pub fn followpos(&self, position: Position) -> &BTreeSet<Position> {
        &self.followpos[position - 1]
    }

    pub fn symbol_at(&self, position: Position) -> LeafSymbol {
        self.leaf_symbols[position - 1]
    }

    /// Position of the reserved end-marker leaf.
    pub fn end_position(&self) -> Option<Position> {
        self.leaf_symbols
            .iter()
            .position(|symbol| *symbol == LeafSymbol::End)
            .map(|index| index + 1)
    }

    /// The distinct input characters over all positioned leaves.
    pub fn input_symbols(&self) -> BTreeSet<char> {
        self.leaf_symbols
            .iter()
            .filter_map(|symbol| match symbol {
                LeafSymbol::Char(c) => Some(*c),
                LeafSymbol::End => None,
            })
            .collect()
    }
}

fn push_leaf(nodes: &mut Vec<Node>, position: Position) -> NodeId {
    let id = nodes.len();
    nodes.push(Node {
        kind: NodeKind::Leaf { position },
        nullable: false,
        firstpos: BTreeSet::from([position]),
        lastpos: BTreeSet::from([position]),
    });
    id
}
