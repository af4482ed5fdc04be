//! Regex preprocessing: shorthand expansion, quantifier desugaring,
//! explicit concatenation and the infix-to-postfix conversion.
//!
//! Each stage consumes the previous stage's token sequence, so by the time a
//! pattern reaches the syntax tree it only contains literals, ε, the end
//! marker and the three core operators.

use crate::error::ConstructionError;

/// One token of the preprocessed pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tok {
    Literal(char),
    /// The ε expression, written `$` in patterns.
    Epsilon,
    /// Reserved end-of-pattern symbol appended during concatenation insertion.
    EndMarker,
    Union,
    Concat,
    Star,
    Question,
    Plus,
    LParen,
    RParen,
}

/// Run the whole pipeline: pattern text to postfix token sequence.
pub fn preprocess(pattern: &str) -> Result<Vec<Tok>, ConstructionError> {
    let tokens = tokenize(pattern)?;
    let tokens = desugar_quantifiers(tokens)?;
    let tokens = insert_concat(tokens);
    to_postfix(tokens)
}

/// Tokenize the pattern, expanding shorthand classes (`\d`, `\s`, `\w` and
/// the `.` wildcard) into parenthesized alternations of their members. An
/// escape consumes two input characters and yields one literal.
pub fn tokenize(pattern: &str) -> Result<Vec<Tok>, ConstructionError> {
    let mut out = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let Some(next) = chars.next() else {
                    return Err(ConstructionError::DanglingEscape);
                };
                match next {
                    'd' => push_class(&mut out, '0'..='9'),
                    's' => push_class(&mut out, " \t\n\r\x0b\x0c".chars()),
                    'w' => push_class(
                        &mut out,
                        ('a'..='z').chain('A'..='Z').chain('0'..='9').chain(['_']),
                    ),
                    other => out.push(Tok::Literal(other)),
                }
            }
            // Wildcard: every printable ASCII character except the newline.
            '.' => push_class(&mut out, ('\x20'..='\x7e').chain(['\t'])),
            '(' => out.push(Tok::LParen),
            ')' => out.push(Tok::RParen),
            '|' => out.push(Tok::Union),
            '*' => out.push(Tok::Star),
            '?' => out.push(Tok::Question),
            '+' => out.push(Tok::Plus),
            '$' => out.push(Tok::Epsilon),
            other => out.push(Tok::Literal(other)),
        }
    }
    Ok(out)
}

fn push_class(out: &mut Vec<Tok>, members: impl IntoIterator<Item = char>) {
    out.push(Tok::LParen);
    for (i, c) in members.into_iter().enumerate() {
        if i > 0 {
            out.push(Tok::Union);
        }
        out.push(Tok::Literal(c));
    }
    out.push(Tok::RParen);
}

/// Rewrite `E?` into `(E|ε)` and `E+` into `(EE*)` by scanning backward from
/// the quantifier to its parenthesis-balanced operand.
pub fn desugar_quantifiers(tokens: Vec<Tok>) -> Result<Vec<Tok>, ConstructionError> {
    let mut out: Vec<Tok> = Vec::new();
    for tok in tokens {
        match tok {
            Tok::Question | Tok::Plus => {
                let operand = pop_operand(&mut out)?;
                out.push(Tok::LParen);
                out.extend(operand.iter().copied());
                if tok == Tok::Question {
                    out.push(Tok::Union);
                    out.push(Tok::Epsilon);
                } else {
                    out.extend(operand.iter().copied());
                    out.push(Tok::Star);
                }
                out.push(Tok::RParen);
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

fn pop_operand(out: &mut Vec<Tok>) -> Result<Vec<Tok>, ConstructionError> {
    let mut operand = Vec::new();
    let mut depth = 0i32;
    loop {
        let Some(tok) = out.pop() else {
            return Err(ConstructionError::MissingQuantifierOperand);
        };
        match tok {
            Tok::LParen => depth += 1,
            Tok::RParen => depth -= 1,
            _ => {}
        }
        operand.push(tok);
        if depth == 0 {
            break;
        }
    }
    operand.reverse();
    Ok(operand)
}

/// Insert the explicit concatenation operator between adjacent tokens, then
/// augment the expression with a concatenated end marker. No operator goes in
/// when the right token is `*`, `)` or `|`, or the left token is `(` or `|`.
/// The expression is wrapped in parentheses first so the end marker binds to
/// the whole of it, not just the last union branch.
pub fn insert_concat(tokens: Vec<Tok>) -> Vec<Tok> {
    if tokens.is_empty() {
        return vec![Tok::EndMarker];
    }
    let mut out = vec![Tok::LParen];
    for (i, &tok) in tokens.iter().enumerate() {
        if i > 0 {
            let no_concat = matches!(tok, Tok::Star | Tok::RParen | Tok::Union)
                || matches!(tokens[i - 1], Tok::LParen | Tok::Union);
            if !no_concat {
                out.push(Tok::Concat);
            }
        }
        out.push(tok);
    }
    out.push(Tok::RParen);
    out.push(Tok::Concat);
    out.push(Tok::EndMarker);
    out
}

/// Shunting-yard conversion with precedence `*` over concatenation over `|`,
/// left to right for equal precedence.
pub fn to_postfix(tokens: Vec<Tok>) -> Result<Vec<Tok>, ConstructionError> {
    fn precedence(tok: Tok) -> u8 {
        match tok {
            Tok::Star => 3,
            Tok::Concat => 2,
            Tok::Union => 1,
            _ => 0,
        }
    }

    let mut operators: Vec<Tok> = Vec::new();
    let mut out = Vec::new();
    for tok in tokens {
        match tok {
            Tok::Star | Tok::Concat | Tok::Union => {
                while let Some(&top) = operators.last() {
                    if top != Tok::LParen && precedence(top) >= precedence(tok) {
                        out.push(top);
                        operators.pop();
                    } else {
                        break;
                    }
                }
                operators.push(tok);
            }
            Tok::LParen => operators.push(tok),
            Tok::RParen => loop {
                match operators.pop() {
                    Some(Tok::LParen) => break,
                    Some(op) => out.push(op),
                    None => return Err(ConstructionError::UnbalancedParentheses),
                }
            },
            Tok::Literal(_) | Tok::Epsilon | Tok::EndMarker => out.push(tok),
            Tok::Question | Tok::Plus => {
                // Removed by desugaring; seeing one here means a caller skipped
                // that stage.
                return Err(ConstructionError::MissingQuantifierOperand);
            }
        }
    }
    while let Some(op) = operators.pop() {
        if op == Tok::LParen {
            return Err(ConstructionError::UnbalancedParentheses);
        }
        out.push(op);
    }
    Ok(out)
}
