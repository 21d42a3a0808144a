//! The global variable table

use indexmap::IndexMap;

use super::{Origin, Variable};

/// All variables defined so far, keyed by name.
///
/// Iteration follows first-definition order. Redefining a name keeps its
/// position and replaces the variable (last write wins), subject to
/// origin precedence.
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    vars: IndexMap<String, Variable>,
}

impl VariableTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or redefine) a variable.
    ///
    /// Returns `false` and leaves the table unchanged if an existing
    /// variable of that name has a higher-precedence origin. A redefinition
    /// keeps the export mark of the variable it replaces.
    pub fn define(&mut self, mut variable: Variable) -> bool {
        if let Some(existing) = self.vars.get(&variable.name) {
            if variable.origin < existing.origin {
                return false;
            }
            variable.exported |= existing.exported;
        }
        self.vars.insert(variable.name.clone(), variable);
        true
    }

    /// Remove a variable, unless it has a higher-precedence origin.
    ///
    /// Returns `true` if a variable was removed.
    pub fn undefine(&mut self, name: &str, origin: Origin) -> bool {
        match self.vars.get(name) {
            Some(existing) if existing.origin <= origin => {
                self.vars.shift_remove(name);
                true
            }
            _ => false,
        }
    }

    /// Look up a variable by name.
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.vars.get(name)
    }

    /// Look up a variable for in-place changes (export marks).
    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.vars.get_mut(name)
    }

    /// Check if a variable exists.
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Iterate over all variables in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.vars.values()
    }

    /// All variable names in definition order.
    pub fn names(&self) -> Vec<&str> {
        self.vars.keys().map(String::as_str).collect()
    }

    /// Get the number of variables.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
