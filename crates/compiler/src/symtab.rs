//! Symbol table: the function-name table and the scope under construction
//! for the function currently being parsed.
//!
//! The reference compiler additionally keeps a global `symtab_array`
//! indexed by committed function id, used by later passes to look a
//! function's scope back up by id. This rewrite has no need for that
//! indirection: `commit` hands the caller the `Vec<Rc<Symbol>>` directly,
//! and the parser stores it on the `ast::Function` it is building, so every
//! later pass (frame layout, codegen) reaches a function's symbols by
//! walking the AST rather than by a second table keyed on an id.

use std::collections::HashSet;
use std::rc::Rc;

use crate::ast::{Symbol, SymbolKind};

#[derive(Debug, Default)]
pub struct SymbolTable {
    function_names: HashSet<String>,
    current_scope: Vec<Rc<Symbol>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a function name. Returns `false` if the name is already
    /// taken (the reference compiler does not check this return value at
    /// the call site that registers function definitions; this rewrite
    /// does, per §4.2's added duplicate-function check).
    pub fn append_function(&mut self, name: &str) -> bool {
        self.function_names.insert(name.to_string())
    }

    /// Registers a parameter or auto variable in the scope under
    /// construction. Returns `None` if the name already exists in this
    /// scope (parameters and auto variables share one namespace).
    pub fn append_var(&mut self, name: &str, kind: SymbolKind, param_ordinal: u32) -> Option<Rc<Symbol>> {
        if self.current_scope.iter().any(|s| s.name == name) {
            return None;
        }
        let sym = Symbol::new(name, kind, param_ordinal);
        self.current_scope.push(Rc::clone(&sym));
        Some(sym)
    }

    /// Looks an identifier up in the scope under construction.
    pub fn lookup_current(&self, name: &str) -> Option<Rc<Symbol>> {
        self.current_scope.iter().find(|s| s.name == name).cloned()
    }

    /// Snapshots and clears the scope under construction, handing the
    /// caller ownership of the committed symbols (params followed by
    /// autovars, in the order each group was registered).
    pub fn commit(&mut self) -> Vec<Rc<Symbol>> {
        std::mem::take(&mut self.current_scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_function_names_are_rejected() {
        let mut t = SymbolTable::new();
        assert!(t.append_function("main"));
        assert!(!t.append_function("main"));
    }

    #[test]
    fn duplicate_vars_in_one_scope_are_rejected() {
        let mut t = SymbolTable::new();
        assert!(t.append_var("a", SymbolKind::Param, 1).is_some());
        assert!(t.append_var("a", SymbolKind::AutoVar, 0).is_none());
    }

    #[test]
    fn commit_resets_scope() {
        let mut t = SymbolTable::new();
        t.append_var("a", SymbolKind::Param, 1);
        let committed = t.commit();
        assert_eq!(committed.len(), 1);
        assert!(t.lookup_current("a").is_none());
    }
}
