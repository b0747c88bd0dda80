// src/rockspec/value.rs

//! Structured values and the literal expression interpreter
//!
//! A rockspec is plain Lua, but only its literal data matters here: strings
//! and table constructors. [`Interpreter`] turns one expression into a
//! [`Value`]; anything else becomes [`Value::Absent`] plus a
//! [`Warning::UnsupportedExpression`], never a hard error.

use crate::diagnostics::Warning;
use full_moon::ast::{Expression, Field, TableConstructor};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Result of interpreting one literal expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    List(Vec<Value>),
    Record(BTreeMap<String, Value>),
    Absent,
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Record(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Short name of the variant, used in schema errors
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Record(_) => "record",
            Self::Absent => "nothing",
        }
    }

    /// Coerce to a table key; only non-empty text qualifies
    fn into_key(self) -> Option<String> {
        match self {
            Self::Text(text) if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}

/// Strip Lua string delimiters from a raw literal
///
/// Handles `"..."`, `'...'` and long brackets `[[...]]` / `[==[...]==]`.
/// Escape sequences inside the literal are left untouched.
pub fn strip_delimiters(raw: &str) -> &str {
    if let Some(rest) = raw.strip_prefix('[') {
        let level = rest.len() - rest.trim_start_matches('=').len();
        if let Some(body) = rest[level..].strip_prefix('[') {
            let closing = format!("]{}]", "=".repeat(level));
            return body.strip_suffix(closing.as_str()).unwrap_or(body);
        }
        return raw;
    }

    for quote in ['"', '\''] {
        if let Some(body) = raw.strip_prefix(quote) {
            return body.strip_suffix(quote).unwrap_or(body);
        }
    }

    raw
}

/// Human-readable name of an expression node
pub fn expression_kind(expression: &Expression) -> &'static str {
    match expression {
        Expression::BinaryOperator { .. } => "binary operator",
        Expression::Parentheses { .. } => "parenthesized",
        Expression::UnaryOperator { .. } => "unary operator",
        Expression::Function(_) => "function",
        Expression::FunctionCall(_) => "function call",
        Expression::TableConstructor(_) => "table constructor",
        Expression::Number(_) => "number",
        Expression::String(_) => "string",
        Expression::Symbol(_) => "symbol",
        Expression::Var(_) => "variable",
        _ => "unknown",
    }
}

/// Evaluates literal expressions, collecting warnings as it goes
#[derive(Debug, Default)]
pub struct Interpreter {
    warnings: Vec<Warning>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interpret(&mut self, expression: &Expression) -> Value {
        match expression {
            Expression::String(token) => {
                let raw = token.token().to_string();
                Value::Text(strip_delimiters(&raw).to_string())
            }
            Expression::TableConstructor(table) => self.interpret_table(table),
            Expression::Parentheses { expression, .. } => self.interpret(expression),
            other => {
                let kind = expression_kind(other);
                warn!("Missing interpreter for {} expression", kind);
                self.warnings.push(Warning::UnsupportedExpression {
                    expression: kind.to_string(),
                });
                Value::Absent
            }
        }
    }

    /// A table is a list only if every field is positional; a single keyed
    /// field makes the whole table a record and positional fields are dropped.
    fn interpret_table(&mut self, table: &TableConstructor) -> Value {
        let fields = table.fields();

        if fields.iter().all(|field| matches!(field, Field::NoKey(_))) {
            let items = fields
                .iter()
                .filter_map(|field| match field {
                    Field::NoKey(value) => Some(self.interpret(value)),
                    _ => None,
                })
                .collect();
            return Value::List(items);
        }

        let mut record = BTreeMap::new();
        for field in fields.iter() {
            let (key, value) = match field {
                Field::ExpressionKey { key, value, .. } => {
                    (self.interpret(key).into_key(), self.interpret(value))
                }
                Field::NameKey { key, value, .. } => {
                    (Some(key.token().to_string()), self.interpret(value))
                }
                Field::NoKey(_) => continue,
                _ => (None, Value::Absent),
            };

            match key {
                Some(key) => {
                    record.insert(key, value);
                }
                None => {
                    warn!("Dropping table field whose key is not a non-empty string");
                    self.warnings.push(Warning::DroppedTableKey);
                }
            }
        }

        Value::Record(record)
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use full_moon::ast::Stmt;

    /// Interpret the initializer of `x = <source>`
    fn eval(source: &str) -> (Value, Vec<Warning>) {
        let ast = full_moon::parse(&format!("x = {}", source)).unwrap();
        let stmt = ast.nodes().stmts().next().unwrap();
        let Stmt::Assignment(assignment) = stmt else {
            panic!("expected an assignment");
        };
        let expression = assignment.expressions().iter().next().unwrap();

        let mut interpreter = Interpreter::new();
        let value = interpreter.interpret(expression);
        (value, interpreter.into_warnings())
    }

    #[test]
    fn test_strip_delimiters() {
        assert_eq!(strip_delimiters("\"hello\""), "hello");
        assert_eq!(strip_delimiters("'hello'"), "hello");
        assert_eq!(strip_delimiters("[[hello]]"), "hello");
        assert_eq!(strip_delimiters("[==[a]]b]==]"), "a]]b");
        assert_eq!(strip_delimiters("\"a\\\"b\""), "a\\\"b");
        assert_eq!(strip_delimiters("plain"), "plain");
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(eval("\"hello\"").0, Value::Text("hello".to_string()));
        assert_eq!(eval("'hello'").0, Value::Text("hello".to_string()));
        assert_eq!(eval("[[hello]]").0, Value::Text("hello".to_string()));
        assert_eq!(eval("[=[hello]=]").0, Value::Text("hello".to_string()));
    }

    #[test]
    fn test_parenthesized_literals() {
        let (value, warnings) = eval("(\"hello\")");
        assert_eq!(value, Value::Text("hello".to_string()));
        assert!(warnings.is_empty());

        let (value, _) = eval("({ \"a\" })");
        assert_eq!(value, Value::List(vec![Value::Text("a".to_string())]));

        let (value, warnings) = eval("(f())");
        assert!(value.is_absent());
        assert_eq!(
            warnings,
            vec![Warning::UnsupportedExpression {
                expression: "function call".to_string()
            }]
        );
    }

    #[test]
    fn test_positional_table_is_list() {
        let (value, warnings) = eval(r#"{ "a", "b" }"#);
        assert_eq!(
            value,
            Value::List(vec![Value::Text("a".to_string()), Value::Text("b".to_string())])
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_empty_table_is_list() {
        assert_eq!(eval("{}").0, Value::List(Vec::new()));
    }

    #[test]
    fn test_single_key_forces_record() {
        let (value, _) = eval(r#"{ "a", x = "c", "b" }"#);
        let mut expected = BTreeMap::new();
        expected.insert("x".to_string(), Value::Text("c".to_string()));
        assert_eq!(value, Value::Record(expected));
    }

    #[test]
    fn test_computed_and_named_keys() {
        let (value, warnings) = eval(r#"{ ["socket.core"] = "src/core.lua", name = "x" }"#);
        let record = value.as_record().unwrap();
        assert_eq!(record["socket.core"].as_text(), Some("src/core.lua"));
        assert_eq!(record["name"].as_text(), Some("x"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_unresolvable_key_is_dropped() {
        let (value, warnings) = eval(r#"{ [1] = "a", [""] = "b", ok = "c" }"#);
        let record = value.as_record().unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(record["ok"].as_text(), Some("c"));
        assert_eq!(
            warnings,
            vec![
                Warning::UnsupportedExpression {
                    expression: "number".to_string()
                },
                Warning::DroppedTableKey,
                Warning::DroppedTableKey,
            ]
        );
    }

    #[test]
    fn test_nested_tables() {
        let (value, _) = eval(
            r#"{ type = "builtin", modules = { foo = "foo.lua", ["foo.bar"] = "foo/bar.lua" } }"#,
        );
        let build = value.as_record().unwrap();
        assert_eq!(build["type"].as_text(), Some("builtin"));
        let modules = build["modules"].as_record().unwrap();
        assert_eq!(modules["foo.bar"].as_text(), Some("foo/bar.lua"));
    }

    #[test]
    fn test_unsupported_expressions_degrade_to_absent() {
        for (source, kind) in [
            ("42", "number"),
            ("true", "symbol"),
            ("other", "variable"),
            ("f()", "function call"),
            ("\"a\" .. \"b\"", "binary operator"),
        ] {
            let (value, warnings) = eval(source);
            assert!(value.is_absent(), "{} should be absent", source);
            assert_eq!(
                warnings,
                vec![Warning::UnsupportedExpression {
                    expression: kind.to_string()
                }]
            );
        }
    }

    #[test]
    fn test_absent_serializes_as_null() {
        let mut record = BTreeMap::new();
        record.insert("a".to_string(), Value::Absent);
        record.insert("b".to_string(), Value::List(vec![Value::Text("x".to_string())]));
        let json = serde_json::to_string(&Value::Record(record)).unwrap();
        assert_eq!(json, r#"{"a":null,"b":["x"]}"#);
    }
}
