//! Dependency ordering for a track's named formulas.
//!
//! A formula depends on every other formula whose binding name appears as an
//! identifier token in its text. The order is a depth-first topological sort
//! over declaration order; a name seen again while still in progress is a cycle.

use std::collections::{BTreeSet, HashMap};

use super::error::FormulaError;
use super::lexer::Lexer;
use super::token::TokenKind;
use super::{binding_name, FormulaSet, TIME_VAR};

/// Identifiers referenced by `expression`, excluding the time variable and
/// function names.
pub fn references(expression: &str) -> Result<BTreeSet<String>, FormulaError> {
    let tokens = Lexer::new(expression).tokenize()?;
    let mut refs = BTreeSet::new();
    for (i, token) in tokens.iter().enumerate() {
        if let TokenKind::Ident(name) = &token.kind {
            let is_call = tokens
                .get(i + 1)
                .is_some_and(|next| next.kind == TokenKind::LParen);
            if !is_call && name != TIME_VAR {
                refs.insert(name.clone());
            }
        }
    }
    Ok(refs)
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    InProgress,
    Done,
}

/// Order the parameter names of `formulas` so every dependency comes before
/// its dependents.
pub fn resolve_order(formulas: &FormulaSet) -> Result<Vec<String>, FormulaError> {
    let by_binding: HashMap<String, &str> = formulas
        .iter()
        .map(|(name, _)| (binding_name(name), name))
        .collect();

    let mut deps: HashMap<&str, Vec<&str>> = HashMap::new();
    for (name, text) in formulas.iter() {
        let mut names = Vec::new();
        // A formula naming itself becomes its own dependency: a cycle of length one.
        for r in references(text)? {
            if let Some(&dep) = by_binding.get(&r) {
                if !names.contains(&dep) {
                    names.push(dep);
                }
            }
        }
        deps.insert(name, names);
    }

    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut order = Vec::with_capacity(formulas.len());
    for (name, _) in formulas.iter() {
        let mut path = Vec::new();
        visit(name, &deps, &mut marks, &mut path, &mut order)?;
    }
    Ok(order)
}

fn visit<'a>(
    name: &'a str,
    deps: &HashMap<&'a str, Vec<&'a str>>,
    marks: &mut HashMap<&'a str, Mark>,
    path: &mut Vec<&'a str>,
    order: &mut Vec<String>,
) -> Result<(), FormulaError> {
    match marks.get(name) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::InProgress) => {
            let start = path.iter().position(|n| *n == name).unwrap_or(0);
            let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
            cycle.push(name.to_string());
            return Err(FormulaError::cyclic(cycle));
        }
        None => {}
    }

    marks.insert(name, Mark::InProgress);
    path.push(name);
    for &dep in deps.get(name).map(Vec::as_slice).unwrap_or_default() {
        visit(dep, deps, marks, path, order)?;
    }
    path.pop();
    marks.insert(name, Mark::Done);
    order.push(name.to_string());
    Ok(())
}
