// src/rockspec/mod.rs

//! Rockspec support
//!
//! A `.rockspec` is a Lua file describing a LuaRocks package:
//!
//! ```lua
//! package = "mypkg"
//! version = "1.0-1"
//! source = { url = "git+https://example.com/mypkg.git", tag = "v1.0" }
//! dependencies = { "lua >= 5.1" }
//! build = {
//!    type = "builtin",
//!    modules = {
//!       mypkg = "init.lua",
//!       ["mypkg.util"] = "src/util.lua",
//!    },
//! }
//! ```
//!
//! [`Rockspec::parse`] evaluates the literal assignments into a flat record.
//! The schema accessors check shape lazily, so a missing field only fails
//! the caller that actually needs it.

pub mod parser;
pub mod value;

pub use parser::{Evaluation, Settings, evaluate, evaluate_source, parse_lua};
pub use value::{Interpreter, Value, strip_delimiters};

use crate::diagnostics::Warning;
use crate::error::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// A required rockspec field is missing or has the wrong shape
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Missing required rockspec field: {0}")]
    MissingField(String),

    #[error("Rockspec field '{field}' must be {expected}, found {found}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// `source` table of a rockspec
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSection {
    pub url: String,
    pub tag: Option<String>,
}

/// `description` table of a rockspec
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DescriptionSection {
    pub summary: Option<String>,
    pub homepage: Option<String>,
    pub license: Option<String>,
}

/// `build` table of a rockspec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSection<'a> {
    pub build_type: &'a str,
    fields: &'a BTreeMap<String, Value>,
}

/// Schema-shaped view over the evaluated top-level assignments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Rockspec {
    fields: Settings,
}

/// A rockspec together with the interpreter warnings raised while reading it
#[derive(Debug, Clone)]
pub struct ParsedRockspec {
    pub rockspec: Rockspec,
    pub warnings: Vec<Warning>,
}

impl Rockspec {
    /// Parse and evaluate rockspec source text
    pub fn parse(text: &str) -> Result<ParsedRockspec> {
        let Evaluation { settings, warnings } = evaluate_source(text)?;
        Ok(ParsedRockspec {
            rockspec: Self::from_settings(settings),
            warnings,
        })
    }

    pub fn from_settings(fields: Settings) -> Self {
        Self { fields }
    }

    /// Raw top-level value, if assigned
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn package(&self) -> std::result::Result<&str, SchemaError> {
        require_text(&self.fields, "", "package")
    }

    pub fn version(&self) -> std::result::Result<&str, SchemaError> {
        require_text(&self.fields, "", "version")
    }

    pub fn rockspec_format(&self) -> Option<&str> {
        self.get("rockspec_format").and_then(Value::as_text)
    }

    pub fn source(&self) -> std::result::Result<SourceSection, SchemaError> {
        let source = require_record(&self.fields, "", "source")?;
        Ok(SourceSection {
            url: require_text(source, "source", "url")?.to_string(),
            tag: optional_text(source, "tag"),
        })
    }

    /// Dependency strings such as `"lua >= 5.1"`
    pub fn dependencies(&self) -> std::result::Result<Vec<&str>, SchemaError> {
        let items = require_list(&self.fields, "", "dependencies")?;
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item.as_text().ok_or_else(|| SchemaError::WrongType {
                    field: format!("dependencies[{}]", index + 1),
                    expected: "text",
                    found: item.kind(),
                })
            })
            .collect()
    }

    pub fn description(&self) -> Option<DescriptionSection> {
        let description = self.get("description")?.as_record()?;
        Some(DescriptionSection {
            summary: optional_text(description, "summary"),
            homepage: optional_text(description, "homepage"),
            license: optional_text(description, "license"),
        })
    }

    /// `build` table; `build.type` is required, `build.modules` is read on demand
    pub fn build(&self) -> std::result::Result<BuildSection<'_>, SchemaError> {
        let fields = require_record(&self.fields, "", "build")?;
        Ok(BuildSection {
            build_type: require_text(fields, "build", "type")?,
            fields,
        })
    }
}

impl<'a> BuildSection<'a> {
    /// `build.modules`: module name to its declared source
    pub fn modules(&self) -> std::result::Result<&'a BTreeMap<String, Value>, SchemaError> {
        require_record(self.fields, "build", "modules")
    }
}

fn field_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn require<'a>(
    record: &'a BTreeMap<String, Value>,
    parent: &str,
    key: &str,
) -> std::result::Result<&'a Value, SchemaError> {
    match record.get(key) {
        None | Some(Value::Absent) => Err(SchemaError::MissingField(field_path(parent, key))),
        Some(value) => Ok(value),
    }
}

fn require_text<'a>(
    record: &'a BTreeMap<String, Value>,
    parent: &str,
    key: &str,
) -> std::result::Result<&'a str, SchemaError> {
    let value = require(record, parent, key)?;
    value.as_text().ok_or_else(|| wrong_type(parent, key, "text", value))
}

fn require_record<'a>(
    record: &'a BTreeMap<String, Value>,
    parent: &str,
    key: &str,
) -> std::result::Result<&'a BTreeMap<String, Value>, SchemaError> {
    let value = require(record, parent, key)?;
    match value {
        Value::Record(fields) => Ok(fields),
        // `{}` has no keyed fields, so it evaluates as an empty list
        Value::List(items) if items.is_empty() => Ok(empty_record()),
        other => Err(wrong_type(parent, key, "record", other)),
    }
}

fn require_list<'a>(
    record: &'a BTreeMap<String, Value>,
    parent: &str,
    key: &str,
) -> std::result::Result<&'a [Value], SchemaError> {
    let value = require(record, parent, key)?;
    value.as_list().ok_or_else(|| wrong_type(parent, key, "list", value))
}

fn optional_text(record: &BTreeMap<String, Value>, key: &str) -> Option<String> {
    record.get(key).and_then(Value::as_text).map(str::to_string)
}

fn wrong_type(parent: &str, key: &str, expected: &'static str, found: &Value) -> SchemaError {
    SchemaError::WrongType {
        field: field_path(parent, key),
        expected,
        found: found.kind(),
    }
}

fn empty_record() -> &'static BTreeMap<String, Value> {
    static EMPTY: BTreeMap<String, Value> = BTreeMap::new();
    &EMPTY
}

#[cfg(test)]
mod tests {
    use super::*;

    const LUASOCKET: &str = r#"
rockspec_format = "3.0"
package = "luasocket"
version = "3.1.0-1"
source = {
   url = "git+https://github.com/lunarmodules/luasocket.git",
   tag = "v3.1.0",
}
description = {
   summary = "Network support for the Lua language",
   homepage = "https://github.com/lunarmodules/luasocket",
   license = "MIT",
}
dependencies = {
   "lua >= 5.1",
}
build = {
   type = "builtin",
   modules = {
      ["socket.core"] = { sources = { "src/luasocket.c" } },
      ["socket.http"] = "src/http.lua",
      socket = "src/socket.lua",
   },
}
"#;

    #[test]
    fn test_full_rockspec() {
        let parsed = Rockspec::parse(LUASOCKET).unwrap();
        let rockspec = parsed.rockspec;

        assert_eq!(rockspec.package(), Ok("luasocket"));
        assert_eq!(rockspec.version(), Ok("3.1.0-1"));
        assert_eq!(rockspec.rockspec_format(), Some("3.0"));
        assert_eq!(
            rockspec.source(),
            Ok(SourceSection {
                url: "git+https://github.com/lunarmodules/luasocket.git".to_string(),
                tag: Some("v3.1.0".to_string()),
            })
        );
        assert_eq!(rockspec.dependencies(), Ok(vec!["lua >= 5.1"]));
        assert_eq!(rockspec.description().unwrap().license.as_deref(), Some("MIT"));
        let build = rockspec.build().unwrap();
        assert_eq!(build.build_type, "builtin");

        let modules = build.modules().unwrap();
        assert_eq!(modules.len(), 3);
        assert_eq!(modules["socket"].as_text(), Some("src/socket.lua"));
        assert!(modules["socket.core"].as_record().is_some());
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_missing_fields_surface_on_access() {
        let parsed = Rockspec::parse("build = { type = \"builtin\", modules = { a = \"a.lua\" } }")
            .unwrap();
        let rockspec = parsed.rockspec;

        assert_eq!(rockspec.build().unwrap().build_type, "builtin");
        assert_eq!(
            rockspec.package(),
            Err(SchemaError::MissingField("package".to_string()))
        );
        assert_eq!(
            rockspec.source(),
            Err(SchemaError::MissingField("source".to_string()))
        );
        assert!(rockspec.description().is_none());
    }

    #[test]
    fn test_wrong_types() {
        let parsed = Rockspec::parse(
            "package = { \"x\" }\nsource = { tag = \"v1\" }\ndependencies = { \"a\", { } }\n",
        )
        .unwrap();
        let rockspec = parsed.rockspec;

        assert_eq!(
            rockspec.package(),
            Err(SchemaError::WrongType {
                field: "package".to_string(),
                expected: "text",
                found: "list",
            })
        );
        assert_eq!(
            rockspec.source(),
            Err(SchemaError::MissingField("source.url".to_string()))
        );
        assert_eq!(
            rockspec.dependencies(),
            Err(SchemaError::WrongType {
                field: "dependencies[2]".to_string(),
                expected: "text",
                found: "list",
            })
        );
    }

    #[test]
    fn test_empty_modules_table_is_empty_record() {
        let parsed = Rockspec::parse("build = { type = \"builtin\", modules = {} }").unwrap();
        assert!(parsed.rockspec.build().unwrap().modules().unwrap().is_empty());
    }

    #[test]
    fn test_build_section_errors() {
        let parsed = Rockspec::parse("build = { modules = {} }").unwrap();
        assert_eq!(
            parsed.rockspec.build(),
            Err(SchemaError::MissingField("build.type".to_string()))
        );

        let parsed = Rockspec::parse("build = { type = \"make\" }").unwrap();
        let build = parsed.rockspec.build().unwrap();
        assert_eq!(build.build_type, "make");
        assert_eq!(
            build.modules(),
            Err(SchemaError::MissingField("build.modules".to_string()))
        );
    }

    #[test]
    fn test_absent_field_counts_as_missing() {
        let parsed = Rockspec::parse("version = some_variable").unwrap();
        assert_eq!(
            parsed.rockspec.version(),
            Err(SchemaError::MissingField("version".to_string()))
        );
        assert_eq!(parsed.warnings.len(), 1);
    }
}
