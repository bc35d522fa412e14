use rustc_hash::FxHashMap;

use crate::value::{TyRef, Value};

/// A `$name` binding: declared type plus current value.
#[derive(Debug, Clone, PartialEq)]
pub struct VarBinding {
    pub ty: TyRef,
    pub value: Value,
}

/// The per-submission variable table.
///
/// Cleared at the start of every parse, so bindings are visible only
/// between statements of the same submitted command line.
#[derive(Debug, Clone, Default)]
pub struct VarTable {
    vars: FxHashMap<String, VarBinding>,
}

impl VarTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every binding. Called once per submission.
    pub fn clear(&mut self) {
        self.vars.clear();
    }

    pub fn get(&self, name: &str) -> Option<&VarBinding> {
        self.vars.get(name)
    }

    /// Bind or rebind a variable. Rebinding replaces the declared type.
    pub fn set(&mut self, name: &str, ty: TyRef, value: Value) {
        self.vars.insert(name.to_string(), VarBinding { ty, value });
    }

    /// Names currently bound, for suggestion enumeration.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::prim;

    #[test]
    fn set_get_clear() {
        let mut table = VarTable::new();
        table.set("a", TyRef::Named(prim::I32), Value::I32(5));
        assert_eq!(table.get("a").unwrap().value, Value::I32(5));
        table.clear();
        assert!(table.get("a").is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn rebinding_replaces_declared_type() {
        let mut table = VarTable::new();
        table.set("a", TyRef::Named(prim::I32), Value::I32(5));
        table.set("a", TyRef::Named(prim::STRING), Value::Str("x".into()));
        assert_eq!(table.get("a").unwrap().ty, TyRef::Named(prim::STRING));
    }
}
