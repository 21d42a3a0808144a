//! Template expansion

pub mod call;
pub mod pattern;
pub mod reference;

pub use reference::{expand_value, expand_variable};

use crate::template::{Node, Template};
use crate::{Environment, EvalContext, ExpandError};

/// Trait for expanding template nodes to text.
///
/// This is the core abstraction of the tree-walking expander. Output is
/// appended to a shared buffer, the way make builds its variable buffer.
pub trait Expand {
    /// Expand this node, appending the result to `out`.
    fn expand_into(
        &self,
        env: &mut Environment<'_>,
        ctx: &EvalContext,
        out: &mut String,
    ) -> Result<(), ExpandError>;

    /// Expand this node into a fresh string.
    fn expand(&self, env: &mut Environment<'_>, ctx: &EvalContext) -> Result<String, ExpandError> {
        let mut out = String::new();
        self.expand_into(env, ctx, &mut out)?;
        Ok(out)
    }
}

impl Expand for Template {
    fn expand_into(
        &self,
        env: &mut Environment<'_>,
        ctx: &EvalContext,
        out: &mut String,
    ) -> Result<(), ExpandError> {
        for node in &self.nodes {
            node.expand_into(env, ctx, out)?;
        }
        Ok(())
    }
}

impl Expand for Node {
    fn expand_into(
        &self,
        env: &mut Environment<'_>,
        ctx: &EvalContext,
        out: &mut String,
    ) -> Result<(), ExpandError> {
        match self {
            Node::Text(text) => {
                out.push_str(text);
                Ok(())
            }
            Node::Reference(reference) => reference.expand_into(env, ctx, out),
            Node::Function(call) => call.expand_into(env, ctx, out),
            Node::Error(err) => Err(err.clone().into_expand_error(env.current_location())),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Convenience Functions
// ═══════════════════════════════════════════════════════════════════════

/// Expand make text, appending to `out`.
pub fn expand_text_into(
    text: &str,
    env: &mut Environment<'_>,
    ctx: &EvalContext,
    out: &mut String,
) -> Result<(), ExpandError> {
    if !text.contains('$') {
        out.push_str(text);
        return Ok(());
    }
    Template::parse(text).expand_into(env, ctx, out)
}

/// Expand make text.
pub fn expand_text(
    text: &str,
    env: &mut Environment<'_>,
    ctx: &EvalContext,
) -> Result<String, ExpandError> {
    let mut out = String::with_capacity(text.len());
    expand_text_into(text, env, ctx, &mut out)?;
    Ok(out)
}
