//! Regular-expression compiler: preprocessing pipeline, syntax tree with
//! position attributes, and direct DFA construction without an NFA step.

mod compile;
mod tokens;
mod tree;

pub use compile::compile;
pub use tokens::{Tok, preprocess};
pub use tree::{LeafSymbol, Position, SyntaxTree};
