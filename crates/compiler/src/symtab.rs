//! The symbol table (§3.3/§3.4, §4.2): a scoped mapping from name to
//! symbol, constructed once by the analyzer and read-only thereafter —
//! every back-end receives a `&SymbolTable`, never a mutable one, matching
//! the data-not-singleton REDESIGN FLAG honored throughout this crate.

use std::collections::HashMap;
use std::fmt;

use gpt_core::SymbolType;

/// The scope every global declaration lives in.
pub const GLOBAL_SCOPE: &str = "__global__";

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub ty: SymbolType,
    pub scope: String,
    pub line: u32,
    pub is_function: bool,
    /// Ordered parameter types, populated only for function symbols.
    pub parameters: Vec<SymbolType>,
}

impl Symbol {
    pub fn variable(name: impl Into<String>, ty: SymbolType, scope: impl Into<String>, line: u32) -> Self {
        Symbol {
            name: name.into(),
            ty,
            scope: scope.into(),
            line,
            is_function: false,
            parameters: Vec::new(),
        }
    }

    pub fn function(
        name: impl Into<String>,
        return_ty: SymbolType,
        parameters: Vec<SymbolType>,
        line: u32,
    ) -> Self {
        Symbol {
            name: name.into(),
            ty: return_ty,
            scope: GLOBAL_SCOPE.to_string(),
            line,
            is_function: true,
            parameters,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymTabError {
    Duplicate { name: String, scope: String },
    Undefined { name: String, scope: String },
}

impl fmt::Display for SymTabError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymTabError::Duplicate { name, .. } => write!(f, "variável {name} já declarada"),
            SymTabError::Undefined { name, .. } => write!(f, "identificador {name} não declarado"),
        }
    }
}

impl std::error::Error for SymTabError {}

/// Scoped symbol storage keyed by `(scope, name)`. `GLOBAL_SCOPE` holds
/// globals and function signatures; every other key is a function name.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<(String, String), Symbol>,
    current_scope: String,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            symbols: HashMap::new(),
            current_scope: GLOBAL_SCOPE.to_string(),
        }
    }

    pub fn current_scope(&self) -> &str {
        &self.current_scope
    }

    /// Function bodies have exactly one scope, created on first entry and
    /// never deleted — there is no `pop_scope` back to a shadowed scope of
    /// the same name, matching §3.4 ("never deleted").
    pub fn set_current_scope(&mut self, scope: impl Into<String>) {
        self.current_scope = scope.into();
    }

    pub fn enter_global_scope(&mut self) {
        self.current_scope = GLOBAL_SCOPE.to_string();
    }

    pub fn insert(&mut self, symbol: Symbol) -> Result<(), SymTabError> {
        let key = (symbol.scope.clone(), symbol.name.clone());
        if self.symbols.contains_key(&key) {
            return Err(SymTabError::Duplicate {
                name: symbol.name,
                scope: symbol.scope,
            });
        }
        self.symbols.insert(key, symbol);
        Ok(())
    }

    /// Resolves `name` in `scope`, falling back to the global scope when
    /// `allow_global_fallback` is set and `scope` is not itself global —
    /// the fixed, non-transitive resolution order of §4.2.
    pub fn lookup(
        &self,
        scope: &str,
        name: &str,
        allow_global_fallback: bool,
    ) -> Result<&Symbol, SymTabError> {
        if let Some(sym) = self.symbols.get(&(scope.to_string(), name.to_string())) {
            return Ok(sym);
        }
        if allow_global_fallback && scope != GLOBAL_SCOPE {
            if let Some(sym) = self.symbols.get(&(GLOBAL_SCOPE.to_string(), name.to_string())) {
                return Ok(sym);
            }
        }
        Err(SymTabError::Undefined {
            name: name.to_string(),
            scope: scope.to_string(),
        })
    }

    pub fn lookup_current(&self, name: &str) -> Result<&Symbol, SymTabError> {
        self.lookup(&self.current_scope, name, true)
    }

    pub fn lookup_function(&self, name: &str) -> Result<&Symbol, SymTabError> {
        self.lookup(GLOBAL_SCOPE, name, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpt_core::PrimitiveType;

    fn int() -> SymbolType {
        SymbolType::Primitive(PrimitiveType::Inteiro)
    }

    #[test]
    fn duplicate_insert_in_same_scope_fails() {
        let mut table = SymbolTable::new();
        table
            .insert(Symbol::variable("x", int(), GLOBAL_SCOPE, 3))
            .unwrap();
        let err = table
            .insert(Symbol::variable("x", int(), GLOBAL_SCOPE, 3))
            .unwrap_err();
        assert_eq!(
            err,
            SymTabError::Duplicate {
                name: "x".into(),
                scope: GLOBAL_SCOPE.into()
            }
        );
    }

    #[test]
    fn lookup_falls_back_to_global_scope() {
        let mut table = SymbolTable::new();
        table
            .insert(Symbol::variable("g", int(), GLOBAL_SCOPE, 1))
            .unwrap();
        let found = table.lookup("fat", "g", true).unwrap();
        assert_eq!(found.name, "g");
    }

    #[test]
    fn lookup_without_fallback_does_not_see_globals() {
        let mut table = SymbolTable::new();
        table
            .insert(Symbol::variable("g", int(), GLOBAL_SCOPE, 1))
            .unwrap();
        let err = table.lookup("fat", "g", false).unwrap_err();
        assert_eq!(
            err,
            SymTabError::Undefined {
                name: "g".into(),
                scope: "fat".into()
            }
        );
    }

    #[test]
    fn undefined_name_in_neither_scope_errors() {
        let table = SymbolTable::new();
        assert!(table.lookup("fat", "nope", true).is_err());
    }

    #[test]
    fn function_symbols_carry_parameter_types() {
        let mut table = SymbolTable::new();
        table
            .insert(Symbol::function("soma", int(), vec![int(), int()], 1))
            .unwrap();
        let f = table.lookup_function("soma").unwrap();
        assert!(f.is_function);
        assert_eq!(f.parameters.len(), 2);
    }
}
