//! Built-in functions recognized inside `$(...)`

use std::fmt;

use super::Environment;
use crate::context::EvalContext;
use crate::error::ExpandError;
use crate::eval::call::call_function;
use crate::eval::pattern::{patsubst, subst};

/// Native implementation of a built-in function.
///
/// Receives the already-expanded arguments.
pub type BuiltinFnPtr =
    for<'t> fn(&[String], &mut Environment<'t>, &EvalContext) -> Result<String, ExpandError>;

/// A built-in function.
#[derive(Clone, Copy)]
pub struct BuiltinFn {
    /// Name as written after `$(`
    pub name: &'static str,

    /// Fewer arguments than this is a fatal error
    pub min_args: usize,

    /// Extra commas beyond this many arguments belong to the last one.
    /// `0` means unlimited.
    pub max_args: usize,

    /// The implementation
    pub func: BuiltinFnPtr,
}

impl fmt::Debug for BuiltinFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinFn")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .finish()
    }
}

/// Every function the expander recognizes.
pub static BUILTINS: &[BuiltinFn] = &[
    BuiltinFn {
        name: "call",
        min_args: 1,
        max_args: 0,
        func: call_function,
    },
    BuiltinFn {
        name: "value",
        min_args: 0,
        max_args: 1,
        func: builtin_value,
    },
    BuiltinFn {
        name: "origin",
        min_args: 0,
        max_args: 1,
        func: builtin_origin,
    },
    BuiltinFn {
        name: "flavor",
        min_args: 0,
        max_args: 1,
        func: builtin_flavor,
    },
    BuiltinFn {
        name: "subst",
        min_args: 3,
        max_args: 3,
        func: builtin_subst,
    },
    BuiltinFn {
        name: "patsubst",
        min_args: 3,
        max_args: 3,
        func: builtin_patsubst,
    },
    BuiltinFn {
        name: "strip",
        min_args: 0,
        max_args: 1,
        func: builtin_strip,
    },
];

/// Find a built-in function by name.
pub fn lookup_builtin(name: &str) -> Option<&'static BuiltinFn> {
    BUILTINS.iter().find(|b| b.name == name)
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Function Implementations
// ═══════════════════════════════════════════════════════════════════════

fn arg(args: &[String], index: usize) -> &str {
    args.get(index).map(String::as_str).unwrap_or("")
}

fn builtin_value(
    args: &[String],
    env: &mut Environment<'_>,
    _ctx: &EvalContext,
) -> Result<String, ExpandError> {
    Ok(env
        .get(arg(args, 0))
        .map(|v| v.text().to_string())
        .unwrap_or_default())
}

fn builtin_origin(
    args: &[String],
    env: &mut Environment<'_>,
    _ctx: &EvalContext,
) -> Result<String, ExpandError> {
    Ok(env
        .get(arg(args, 0))
        .map_or_else(|| "undefined".to_string(), |v| v.origin.to_string()))
}

fn builtin_flavor(
    args: &[String],
    env: &mut Environment<'_>,
    _ctx: &EvalContext,
) -> Result<String, ExpandError> {
    Ok(env
        .get(arg(args, 0))
        .map_or_else(|| "undefined".to_string(), |v| v.flavor().to_string()))
}

fn builtin_subst(
    args: &[String],
    _env: &mut Environment<'_>,
    _ctx: &EvalContext,
) -> Result<String, ExpandError> {
    Ok(subst(arg(args, 0), arg(args, 1), arg(args, 2)))
}

fn builtin_patsubst(
    args: &[String],
    _env: &mut Environment<'_>,
    _ctx: &EvalContext,
) -> Result<String, ExpandError> {
    Ok(patsubst(arg(args, 0), arg(args, 1), arg(args, 2)))
}

fn builtin_strip(
    args: &[String],
    _env: &mut Environment<'_>,
    _ctx: &EvalContext,
) -> Result<String, ExpandError> {
    Ok(arg(args, 0)
        .split_ascii_whitespace()
        .collect::<Vec<_>>()
        .join(" "))
}
