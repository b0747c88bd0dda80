// src/rockspec/parser.rs

//! Rockspec evaluation
//!
//! Parses the Lua text and keeps only top-level `name = <literal>`
//! assignments. Later assignments to the same name overwrite earlier ones.

use crate::diagnostics::Warning;
use crate::error::{Error, Result};
use crate::rockspec::value::{Interpreter, Value};
use full_moon::ast::{Ast, Stmt, Var};
use std::collections::BTreeMap;
use tracing::debug;

/// Flat mapping of top-level assigned names to their values
pub type Settings = BTreeMap<String, Value>;

/// Settings produced by [`evaluate`] with the warnings raised on the way
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub settings: Settings,
    pub warnings: Vec<Warning>,
}

/// Parse rockspec text into a Lua syntax tree
pub fn parse_lua(text: &str) -> Result<Ast> {
    full_moon::parse(text).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        Error::ConfigSyntaxError(messages.join("; "))
    })
}

/// Evaluate the simple assignments of a statement sequence
pub fn evaluate<'a>(statements: impl IntoIterator<Item = &'a Stmt>) -> Evaluation {
    let mut interpreter = Interpreter::new();
    let mut settings = Settings::new();

    for statement in statements {
        let Stmt::Assignment(assignment) = statement else {
            continue;
        };

        let variables = assignment.variables();
        let name = match variables.iter().next() {
            Some(Var::Name(name)) if variables.len() == 1 => name.token().to_string(),
            _ => {
                debug!("Skipping assignment without a single plain target");
                continue;
            }
        };

        let Some(initializer) = assignment.expressions().iter().next() else {
            continue;
        };

        let value = interpreter.interpret(initializer);
        settings.insert(name, value);
    }

    Evaluation {
        settings,
        warnings: interpreter.into_warnings(),
    }
}

/// Parse and evaluate rockspec text in one step
pub fn evaluate_source(text: &str) -> Result<Evaluation> {
    let ast = parse_lua(text)?;
    Ok(evaluate(ast.nodes().stmts()))
}
