//! The parsed program handed to semantic analysis.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::stmt::{FuncDecl, Stmt};

/// Ordered collection of parsed modules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub modules: IndexMap<String, Module>,
    /// Module expected to expose `main`.
    pub entry_module: Option<String>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_module(&mut self, module: Module) {
        self.modules.insert(module.name.clone(), module);
    }

    pub fn get(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    pub fn entry(&self) -> Option<&Module> {
        self.entry_module.as_deref().and_then(|n| self.modules.get(n))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Module)> {
        self.modules.iter().map(|(name, m)| (name.as_str(), m))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// One source file's worth of statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub path: String,
    pub stmts: Vec<Stmt>,
}

impl Module {
    pub fn new(name: impl Into<String>, path: impl Into<String>, stmts: Vec<Stmt>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            stmts,
        }
    }

    /// Top-level function lookup, used by entry-point validation.
    pub fn find_function(&self, name: &str) -> Option<&FuncDecl> {
        self.stmts.iter().find_map(|stmt| match stmt {
            Stmt::Func(f) if f.name.text == name => Some(f),
            _ => None,
        })
    }
}
