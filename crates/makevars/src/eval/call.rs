//! Function call evaluation

use tracing::trace;

use super::reference::{expand_variable, warn_undefined};
use super::Expand;
use crate::environment::{lookup_builtin, BuiltinFn};
use crate::template::FunctionCall;
use crate::{Environment, EvalContext, ExpandError};

impl Expand for FunctionCall {
    fn expand_into(
        &self,
        env: &mut Environment<'_>,
        ctx: &EvalContext,
        out: &mut String,
    ) -> Result<(), ExpandError> {
        check_arity(self.builtin, self.args.len(), env)?;

        // Evaluate arguments
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| arg.expand(env, ctx))
            .collect::<Result<Vec<_>, _>>()?;

        out.push_str(&(self.builtin.func)(&args, env, ctx)?);
        Ok(())
    }
}

fn check_arity(
    builtin: &BuiltinFn,
    got: usize,
    env: &Environment<'_>,
) -> Result<(), ExpandError> {
    if got < builtin.min_args {
        return Err(ExpandError::InsufficientArguments {
            function: builtin.name.to_string(),
            got,
            location: env.current_location(),
        });
    }
    Ok(())
}

/// `$(call NAME,ARG1,ARG2,...)`.
///
/// Expands the variable `NAME` inside a new call frame binding `$(0)` to
/// `NAME` and `$(1)`.. to the arguments. The reference goes through the
/// normal variable path, so a function that calls itself is caught by the
/// expansion stack. If `NAME` is a built-in function it is invoked directly.
pub(crate) fn call_function(
    args: &[String],
    env: &mut Environment<'_>,
    ctx: &EvalContext,
) -> Result<String, ExpandError> {
    let Some((name, rest)) = args.split_first() else {
        return Ok(String::new());
    };
    let name = name.trim_matches(|c: char| c.is_ascii_whitespace());
    if name.is_empty() {
        return Ok(String::new());
    }

    if let Some(builtin) = lookup_builtin(name) {
        check_arity(builtin, rest.len(), env)?;
        return (builtin.func)(rest, env, ctx);
    }

    match env.get(name) {
        None => {
            warn_undefined(ctx, name);
            return Ok(String::new());
        }
        Some(function) if function.value.is_empty() => return Ok(String::new()),
        Some(_) => {}
    }

    trace!(function = name, args = rest.len(), "entering call frame");

    let mut scope = env.scope_guard();
    scope.bind_arguments(name, rest);

    let mut out = String::new();
    expand_variable(name, &mut scope, ctx, &mut out)?;
    Ok(out)
}
