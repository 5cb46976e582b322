//! Per-compilation symbol table mapping state variable names to slots

use crate::config::compile_time::symbols::MAX_SYMBOL_IDENTIFIER_LENGTH;
use crate::symbols::error::{SymbolError, SymbolResult};
use crate::symbols::types::{SuffixGroup, Symbol, VarType};
use crate::tables;
use crate::log_debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Snapshot of the symbol table and the static resolution tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub symbol_table: Vec<String>,
    pub variables: Vec<String>,
    pub condition_map: Vec<String>,
    pub operator_map: Vec<String>,
    pub functions: Vec<String>,
    pub sections: Vec<String>,
    pub suffix_groups: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: BTreeMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite without any capacity check
    pub fn inject_symbol(&mut self, name: &str, symbol: Symbol) {
        self.symbols.insert(name.to_string(), symbol);
    }

    /// Return the existing symbol for `name` or allocate the lowest free slot
    pub fn declare(&mut self, name: &str, var_type: VarType) -> SymbolResult<Symbol> {
        if name.len() > MAX_SYMBOL_IDENTIFIER_LENGTH {
            return Err(SymbolError::IdentifierTooLong {
                name: name.to_string(),
                limit: MAX_SYMBOL_IDENTIFIER_LENGTH,
            });
        }

        if let Some(existing) = self.symbols.get(name) {
            if existing.var_type == var_type {
                return Ok(*existing);
            }
            return Err(SymbolError::TypeRedeclaration {
                name: name.to_string(),
                existing: existing.var_type.to_string(),
                requested: var_type.to_string(),
            });
        }

        let used: BTreeSet<usize> = self
            .symbols
            .values()
            .filter(|s| s.var_type == var_type)
            .map(|s| s.index)
            .collect();

        let index = (0..var_type.limit())
            .find(|i| !used.contains(i))
            .ok_or_else(|| SymbolError::CapacityExceeded {
                var_type: var_type.to_string(),
                limit: var_type.limit(),
            })?;

        let symbol = Symbol::new(var_type, index);
        self.symbols.insert(name.to_string(), symbol);

        log_debug!("Declared state variable",
            "name" => name,
            "type" => var_type,
            "index" => index
        );

        Ok(symbol)
    }

    pub fn resolve(&self, name: &str) -> SymbolResult<Symbol> {
        self.symbols
            .get(name)
            .copied()
            .ok_or_else(|| SymbolError::resolution(name))
    }

    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.symbols.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Entries in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Symbol)> {
        self.symbols.iter().map(|(name, symbol)| (name.as_str(), *symbol))
    }

    pub fn validate(&self) -> ValidationReport {
        let suffix_groups = SuffixGroup::ALL
            .iter()
            .map(|group| {
                let members = group.sorted_members().into_iter().map(String::from).collect();
                (group.name().to_string(), members)
            })
            .collect();

        ValidationReport {
            symbol_table: self.symbols.keys().cloned().collect(),
            variables: self
                .symbols
                .iter()
                .map(|(name, symbol)| format!("{}: {}", name, symbol.var_type))
                .collect(),
            condition_map: tables::condition_keys(),
            operator_map: tables::operator_keys(),
            functions: tables::function_keys(),
            sections: tables::section_names(),
            suffix_groups,
        }
    }
}
