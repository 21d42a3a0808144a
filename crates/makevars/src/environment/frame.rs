//! RAII scope guard for automatic frame cleanup

use super::Environment;

/// RAII guard that automatically pops a call frame when dropped.
///
/// Parameter bindings made through the guard disappear with it, whether
/// the expansion inside the frame succeeded or failed.
///
/// # Example
///
/// ```
/// use makevars::{Environment, VariableTable};
///
/// let table = VariableTable::new();
/// let mut env = Environment::new(&table);
///
/// {
///     let mut guard = env.scope_guard();
///     guard.bind_arguments("f", &["a".to_string()]);
///     assert!(guard.contains("1"));
/// }
/// // guard dropped, frame popped, $(1) is gone
/// assert!(!env.contains("1"));
/// ```
pub struct ScopeGuard<'a, 't> {
    env: &'a mut Environment<'t>,
}

impl<'t> Environment<'t> {
    /// Create a scope guard that pushes a frame now and pops it on drop.
    pub fn scope_guard(&mut self) -> ScopeGuard<'_, 't> {
        self.push_frame();
        ScopeGuard { env: self }
    }
}

impl<'a, 't> Drop for ScopeGuard<'a, 't> {
    fn drop(&mut self) {
        self.env.pop_frame();
    }
}

impl<'a, 't> std::ops::Deref for ScopeGuard<'a, 't> {
    type Target = Environment<'t>;

    fn deref(&self) -> &Self::Target {
        self.env
    }
}

impl<'a, 't> std::ops::DerefMut for ScopeGuard<'a, 't> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.env
    }
}
