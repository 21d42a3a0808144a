//! Evaluation context configuration

/// Configuration for expansion.
///
/// This is passed through all expansion calls and controls
/// behavior like nesting limits and diagnostics.
#[derive(Debug, Clone)]
pub struct EvalContext {
    /// Maximum number of recursive variables expanding at once
    pub max_depth: usize,

    /// Emit a warning for every reference to an undefined variable,
    /// like `make --warn-undefined-variables`
    pub warn_undefined: bool,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self {
            max_depth: 1000,
            warn_undefined: false,
        }
    }
}

impl EvalContext {
    /// Create a new context with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom nesting limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enable or disable undefined-variable warnings.
    pub fn with_warn_undefined(mut self, warn: bool) -> Self {
        self.warn_undefined = warn;
        self
    }
}
