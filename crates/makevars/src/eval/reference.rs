//! Variable and substitution reference evaluation

use std::borrow::Cow;

use tracing::{trace, warn};

use super::pattern::substitution_reference;
use super::{expand_text_into, Expand};
use crate::template::Reference;
use crate::{Environment, EvalContext, ExpandError, Value, Variable};

impl Expand for Reference {
    fn expand_into(
        &self,
        env: &mut Environment<'_>,
        ctx: &EvalContext,
        out: &mut String,
    ) -> Result<(), ExpandError> {
        let body = match self {
            Reference::Name(name) => Cow::Borrowed(name.as_str()),
            Reference::Computed(template) => Cow::Owned(template.expand(env, ctx)?),
        };

        match SubstitutionRef::split(&body) {
            Some(subst) => subst.expand_into(env, ctx, out),
            None => expand_variable(&body, env, ctx, out),
        }
    }
}

/// A parsed `$(VAR:PATTERN=REPLACEMENT)` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SubstitutionRef<'a> {
    variable: &'a str,
    pattern: &'a str,
    replacement: &'a str,
}

impl<'a> SubstitutionRef<'a> {
    /// Split on the first `:` and the first `=` after it.
    ///
    /// A body with a colon but no `=` after it is a plain variable name.
    fn split(body: &'a str) -> Option<Self> {
        let colon = body.find(':')?;
        let rest = &body[colon + 1..];
        let eq = rest.find('=')?;
        Some(Self {
            variable: &body[..colon],
            pattern: &rest[..eq],
            replacement: &rest[eq + 1..],
        })
    }

    fn expand_into(
        &self,
        env: &mut Environment<'_>,
        ctx: &EvalContext,
        out: &mut String,
    ) -> Result<(), ExpandError> {
        let Some(variable) = env.get(self.variable).cloned() else {
            warn_undefined(ctx, self.variable);
            return Ok(());
        };
        if variable.value.is_empty() {
            return Ok(());
        }

        let mut value = String::new();
        expand_value(&variable, env, ctx, &mut value)?;
        out.push_str(&substitution_reference(
            &value,
            self.pattern,
            self.replacement,
        ));
        Ok(())
    }
}

/// Expand a reference to the variable `name`, appending to `out`.
///
/// Undefined variables expand to nothing.
pub fn expand_variable(
    name: &str,
    env: &mut Environment<'_>,
    ctx: &EvalContext,
    out: &mut String,
) -> Result<(), ExpandError> {
    match env.get(name).cloned() {
        Some(variable) => expand_value(&variable, env, ctx, out),
        None => {
            warn_undefined(ctx, name);
            Ok(())
        }
    }
}

/// Expand a variable's value, appending to `out`.
///
/// Simple values are copied verbatim. Recursive values are expanded with
/// the variable on the expansion stack, so a reference back to it fails
/// with [`ExpandError::Recursion`].
pub fn expand_value(
    variable: &Variable,
    env: &mut Environment<'_>,
    ctx: &EvalContext,
    out: &mut String,
) -> Result<(), ExpandError> {
    match &variable.value {
        Value::Expanded(text) => {
            out.push_str(text);
            Ok(())
        }
        Value::Raw(text) => {
            env.enter_expansion(&variable.name, variable.location.clone())?;
            trace!(
                variable = %variable.name,
                depth = env.expansion_depth(),
                "expanding recursive variable"
            );

            let result = expand_text_into(text, env, ctx, out);

            // Clean up
            env.exit_expansion();
            result
        }
    }
}

pub(crate) fn warn_undefined(ctx: &EvalContext, name: &str) {
    if ctx.warn_undefined {
        warn!("warning: undefined variable '{}'", name);
    }
}
