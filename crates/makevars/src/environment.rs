//! Per-expansion environment: the variable table plus call frames

mod frame;
mod prelude;

pub use frame::ScopeGuard;
pub use prelude::{lookup_builtin, BuiltinFn, BuiltinFnPtr, BUILTINS};

use crate::error::{ExpandError, SourceLocation};
use crate::variable::{Origin, Variable, VariableTable};

/// Frame boundary in the overlay bindings.
#[derive(Debug, Clone, Copy)]
struct Frame {
    /// Index of the first binding belonging to this frame
    start: usize,

    /// Positional parameters visible in this frame, `$(0)` included
    arg_count: usize,
}

/// A recursive variable whose expansion is in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionEntry {
    /// Variable name
    pub name: String,

    /// Definition site of the variable, if known
    pub location: Option<SourceLocation>,
}

/// The environment one top-level expansion runs in.
///
/// Lookups consult the overlay of `call` parameter bindings first, innermost
/// frame outward, then the borrowed variable table. The table itself is
/// never modified. The environment also owns the expansion stack used for
/// cycle detection, so every top-level expansion starts from a clean one.
///
/// # Example
///
/// ```
/// use makevars::{Environment, Variable, VariableTable};
///
/// let mut table = VariableTable::new();
/// table.define(Variable::simple("1", "global"));
///
/// let mut env = Environment::new(&table);
/// assert_eq!(env.get("1").map(Variable::text), Some("global"));
///
/// // Enter a call frame
/// env.push_frame();
/// env.bind_arguments("f", &["x".to_string()]);
/// assert_eq!(env.get("1").map(Variable::text), Some("x"));
///
/// // Exit the frame
/// env.pop_frame();
/// assert_eq!(env.get("1").map(Variable::text), Some("global"));
/// ```
#[derive(Debug, Clone)]
pub struct Environment<'t> {
    /// Base variable table
    table: &'t VariableTable,

    /// All overlay bindings in a flat array (most recent at end)
    bindings: Vec<Variable>,

    /// Frame boundaries; the first entry is the global frame
    frames: Vec<Frame>,

    /// Recursive variables currently being expanded, outermost first
    expanding: Vec<ExpansionEntry>,

    /// Maximum allowed expansion depth
    max_depth: usize,
}

impl<'t> Environment<'t> {
    /// Create an environment over a variable table.
    pub fn new(table: &'t VariableTable) -> Self {
        Self {
            table,
            bindings: Vec::new(),
            frames: vec![Frame {
                start: 0,
                arg_count: 0,
            }],
            expanding: Vec::new(),
            max_depth: 1000,
        }
    }

    /// Set a custom expansion depth limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The underlying variable table.
    pub fn table(&self) -> &'t VariableTable {
        self.table
    }

    // ═══════════════════════════════════════════════════════════════════
    // Frame Management (Call Entry/Exit)
    // ═══════════════════════════════════════════════════════════════════

    /// Enter a new call frame.
    ///
    /// All bindings defined after this call will be removed when
    /// `pop_frame()` is called.
    pub fn push_frame(&mut self) {
        let arg_count = self.current_frame().arg_count;
        self.frames.push(Frame {
            start: self.bindings.len(),
            arg_count,
        });
    }

    /// Exit the current call frame.
    ///
    /// Removes all bindings defined since the matching `push_frame()`.
    /// Does nothing at the global frame.
    pub fn pop_frame(&mut self) {
        // Never pop the global frame
        if self.frames.len() > 1 {
            if let Some(frame) = self.frames.pop() {
                self.bindings.truncate(frame.start);
            }
        }
    }

    /// Get the current frame depth (number of frames).
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Check if no call frame is active.
    pub fn is_global_scope(&self) -> bool {
        self.frames.len() == 1
    }

    fn current_frame(&self) -> Frame {
        self.frames.last().copied().unwrap_or(Frame {
            start: 0,
            arg_count: 0,
        })
    }

    // ═══════════════════════════════════════════════════════════════════
    // Bindings
    // ═══════════════════════════════════════════════════════════════════

    /// Add a binding to the current frame, shadowing any earlier one.
    pub fn define(&mut self, variable: Variable) {
        self.bindings.push(variable);
    }

    /// Bind `call` parameters in the current frame.
    ///
    /// `$(0)` is the function name and `$(1)`..`$(N)` the arguments. Numbered
    /// parameters the enclosing call had beyond N are bound to empty text so
    /// they stay hidden from this frame.
    pub fn bind_arguments(&mut self, function: &str, args: &[String]) {
        let inherited = self.current_frame().arg_count;
        let given = args.len() + 1;

        self.define(automatic("0", function));
        for (i, arg) in args.iter().enumerate() {
            self.define(automatic((i + 1).to_string(), arg.as_str()));
        }
        for i in given..inherited {
            self.define(automatic(i.to_string(), ""));
        }

        if let Some(frame) = self.frames.last_mut() {
            frame.arg_count = given.max(inherited);
        }
    }

    /// Look up a variable by name.
    ///
    /// Returns the most recent overlay binding with the given name, falling
    /// back to the variable table.
    pub fn get(&self, name: &str) -> Option<&Variable> {
        // Search backwards to find the innermost binding
        self.bindings
            .iter()
            .rev()
            .find(|v| v.name == name)
            .or_else(|| self.table.get(name))
    }

    /// Check if a variable is visible.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Get the number of overlay bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if there are no overlay bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Expansion Stack (Cycle Detection)
    // ═══════════════════════════════════════════════════════════════════

    /// Mark a recursive variable as being expanded.
    ///
    /// `location` is the variable's definition site. A recursion error is
    /// reported there, or at the innermost located expansion if it has none.
    ///
    /// # Errors
    ///
    /// - `Recursion` if the variable is already being expanded
    /// - `DepthExceeded` if the nesting limit is reached
    pub fn enter_expansion(
        &mut self,
        name: &str,
        location: Option<SourceLocation>,
    ) -> Result<(), ExpandError> {
        if self.is_expanding(name) {
            return Err(ExpandError::Recursion {
                name: name.to_string(),
                location: location.or_else(|| self.current_location()),
            });
        }
        if self.expanding.len() >= self.max_depth {
            return Err(ExpandError::DepthExceeded {
                max: self.max_depth,
                location: self.current_location(),
            });
        }
        self.expanding.push(ExpansionEntry {
            name: name.to_string(),
            location,
        });
        Ok(())
    }

    /// Finish the innermost expansion.
    pub fn exit_expansion(&mut self) {
        self.expanding.pop();
    }

    /// Check if a variable is currently being expanded.
    pub fn is_expanding(&self, name: &str) -> bool {
        self.expanding.iter().any(|e| e.name == name)
    }

    /// Number of recursive variables currently being expanded.
    pub fn expansion_depth(&self) -> usize {
        self.expanding.len()
    }

    /// The active expansion stack, outermost first.
    pub fn expansion_stack(&self) -> &[ExpansionEntry] {
        &self.expanding
    }

    /// Definition site of the innermost expanding variable that has one.
    ///
    /// Errors raised during expansion are attributed to this location.
    pub fn current_location(&self) -> Option<SourceLocation> {
        self.expanding
            .iter()
            .rev()
            .find_map(|e| e.location.clone())
    }
}

fn automatic(name: impl Into<String>, text: &str) -> Variable {
    Variable::simple(name, text).with_origin(Origin::Automatic)
}
