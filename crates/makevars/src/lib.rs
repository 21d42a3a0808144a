//! # makevars
//!
//! A GNU Make compatible variable engine.
//!
//! makevars reads variable assignments from makefile text and expands
//! references to them, producing the same text GNU Make would, including its
//! fatal diagnostics.
//!
//! ## Architecture
//!
//! - **Parser**: reads assignments, `define` blocks and directives into a
//!   [`VariableTable`]
//! - **Templates**: text is parsed into literal runs, references and
//!   function calls
//! - **Expander**: walks templates against an [`Environment`] holding the
//!   `call` frames and the stack of variables being expanded
//!
//! ## Example
//!
//! ```
//! use makevars::ParseContext;
//!
//! let mut parser = ParseContext::new();
//! parser
//!     .parse_str("reverse = $(2) $(1)\nvar = $(call reverse,x,y)\n", "Makefile")
//!     .unwrap();
//! assert_eq!(parser.eval("var").unwrap(), "y x");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod environment;
pub mod error;
pub mod eval;
pub mod parser;
pub mod template;
pub mod variable;

// Re-export main types
pub use context::EvalContext;
pub use environment::{BuiltinFn, BuiltinFnPtr, Environment, ExpansionEntry, ScopeGuard};
pub use error::{render_fatal, Error, ExpandError, ParseError, Result, SourceLocation};
pub use eval::{expand_text, Expand};
pub use parser::{AssignOp, ParseContext};
pub use template::Template;
pub use variable::{Flavor, Origin, Value, Variable, VariableTable};

/// makevars version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
