//! Reading variable definitions from makefile text
//!
//! [`ParseContext`] consumes input one physical line at a time and joins
//! lines across backslash continuations. Outside a `define` block, logical
//! lines are stripped of comments and classified as assignments or
//! directives. Inside a `define` block, they are collected as they are until
//! the matching `endef`.
//!
//! ```
//! use makevars::ParseContext;
//!
//! let mut parser = ParseContext::new();
//! parser
//!     .parse_str("objects = main.o util.o\nsources = $(objects:.o=.c)\n", "Makefile")
//!     .unwrap();
//! assert_eq!(parser.eval("sources").unwrap(), "main.c util.c");
//! ```

mod assignment;
mod line;

pub use assignment::{parse_assignment, AssignOp, Assignment};

use std::io::BufRead;

use tracing::{debug, warn};

use crate::error::{ExpandError, ParseError, SourceLocation};
use crate::eval::{expand_text, expand_value, expand_variable};
use crate::variable::{Origin, Value, Variable, VariableTable};
use crate::{Environment, EvalContext};
use line::{has_continuation, join_continuation, strip_comment};
use line::{DefineBlock, Modifiers, Statement};

/// Label used for definitions given with [`ParseContext::define_command_line`].
pub const COMMAND_LINE: &str = "<command line>";

/// What the parser is doing between lines.
#[derive(Debug, Clone)]
enum ParserState {
    /// Reading statements
    Idle,

    /// Collecting the body of a `define`
    CollectingDefine(DefineBlock),
}

/// A logical line still waiting for its continuation.
#[derive(Debug, Clone)]
struct PendingLine {
    /// Text so far, ending in the continuation backslash
    text: String,

    /// Where the logical line started
    location: SourceLocation,
}

/// Parser state and the variables defined so far.
///
/// One context is created per session and fed incrementally. Evaluation
/// borrows the table immutably, so `eval` and `expand` take `&self`.
#[derive(Debug, Clone)]
pub struct ParseContext {
    variables: VariableTable,
    ctx: EvalContext,
    state: ParserState,
    pending: Option<PendingLine>,
    export_all: bool,
}

impl Default for ParseContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseContext {
    /// Create an empty context with default settings.
    pub fn new() -> Self {
        Self::with_context(EvalContext::default())
    }

    /// Create an empty context with the given expansion settings.
    pub fn with_context(ctx: EvalContext) -> Self {
        Self {
            variables: VariableTable::new(),
            ctx,
            state: ParserState::Idle,
            pending: None,
            export_all: false,
        }
    }

    /// The expansion settings.
    pub fn context(&self) -> &EvalContext {
        &self.ctx
    }

    /// All variables defined so far.
    pub fn variables(&self) -> &VariableTable {
        &self.variables
    }

    // ═══════════════════════════════════════════════════════════════════
    // Input
    // ═══════════════════════════════════════════════════════════════════

    /// Parse a whole stream of makefile text.
    ///
    /// `source_name` labels locations in diagnostics. The first error aborts
    /// the parse. After an `Err` the table holds an unspecified partial state
    /// and must not be used to answer queries.
    pub fn parse_file<R: BufRead>(&mut self, reader: R, source_name: &str) -> Result<(), ParseError> {
        debug!(source = source_name, "parsing");
        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| ParseError::Io {
                source_name: source_name.to_string(),
                source,
            })?;
            self.parse_line(&line, SourceLocation::new(source_name, index + 1))?;
        }
        self.finish()
    }

    /// Parse makefile text held in memory.
    pub fn parse_str(&mut self, text: &str, source_name: &str) -> Result<(), ParseError> {
        self.parse_file(text.as_bytes(), source_name)
    }

    /// Parse one physical line, without its newline.
    ///
    /// Statements may span several calls (continuations, `define` blocks);
    /// call [`finish`](Self::finish) at the end of input.
    pub fn parse_line(&mut self, line: &str, location: SourceLocation) -> Result<(), ParseError> {
        let (text, location) = match self.pending.take() {
            Some(PendingLine { mut text, location }) => {
                join_continuation(&mut text, line);
                (text, location)
            }
            None => (line.to_string(), location),
        };

        if has_continuation(&text) {
            self.pending = Some(PendingLine { text, location });
            return Ok(());
        }
        self.logical_line(&text, location)
    }

    /// Signal end of input.
    ///
    /// Completes a pending continuation and fails if a `define` is still
    /// open. The context is ready for more input afterwards.
    pub fn finish(&mut self) -> Result<(), ParseError> {
        if let Some(PendingLine { mut text, location }) = self.pending.take() {
            text.pop();
            self.logical_line(&text, location)?;
        }

        match std::mem::replace(&mut self.state, ParserState::Idle) {
            ParserState::Idle => Ok(()),
            ParserState::CollectingDefine(block) => Err(ParseError::UnterminatedDefine {
                name: block.name,
                location: block.location,
            }),
        }
    }

    /// Discard a half-read statement (open `define` or continuation).
    pub fn reset(&mut self) {
        self.state = ParserState::Idle;
        self.pending = None;
    }

    /// Whether a `define` body is being collected.
    pub fn in_define(&self) -> bool {
        matches!(self.state, ParserState::CollectingDefine(_))
    }

    /// Whether the previous line ended in a continuation.
    pub fn in_continuation(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether `line` would be consumed as part of a statement rather than
    /// be a line of plain text.
    ///
    /// Lines inside a `define` body or continuing a previous line always
    /// are.
    pub fn is_statement(&self, line: &str) -> bool {
        if self.in_define() || self.in_continuation() || has_continuation(line) {
            return true;
        }
        !matches!(Statement::classify(&strip_comment(line)), Statement::Other(_))
    }

    /// Define a variable as given on the command line (`NAME=VALUE`).
    ///
    /// Any assignment operator is accepted. The variable has origin
    /// [`Origin::CommandLine`], so makefile assignments without `override`
    /// cannot replace it.
    pub fn define_command_line(&mut self, definition: &str) -> Result<(), ParseError> {
        let location = SourceLocation::new(COMMAND_LINE, 0);
        let Some(assignment) = parse_assignment(definition.trim_start()) else {
            return Err(ParseError::MissingSeparator {
                text: definition.to_string(),
                location,
            });
        };
        let name = self.expand_name(assignment.name, &location)?;
        self.assign(
            &name,
            assignment.op,
            assignment.value,
            Origin::CommandLine,
            &location,
            None,
        )
    }

    // ═══════════════════════════════════════════════════════════════════
    // Statements
    // ═══════════════════════════════════════════════════════════════════

    fn logical_line(&mut self, text: &str, location: SourceLocation) -> Result<(), ParseError> {
        if let ParserState::CollectingDefine(block) = &mut self.state {
            if block.accept(text) {
                return self.complete_define();
            }
            return Ok(());
        }
        self.parse_logical_line(text, location)
    }

    fn parse_logical_line(&mut self, text: &str, location: SourceLocation) -> Result<(), ParseError> {
        let text = strip_comment(text);
        match Statement::classify(&text) {
            Statement::Blank => Ok(()),
            Statement::Assignment {
                modifiers,
                assignment,
            } => {
                let name = self.expand_name(assignment.name, &location)?;
                self.assign(
                    &name,
                    assignment.op,
                    assignment.value,
                    modifiers.origin(),
                    &location,
                    Some(&location),
                )?;
                self.apply_export(&name, modifiers);
                Ok(())
            }
            Statement::Define { modifiers, header } => {
                self.begin_define(header, modifiers, location)
            }
            Statement::Undefine { modifiers, names } => self.undefine(names, modifiers, &location),
            Statement::Export { export, names } => self.export(names, export, &location),
            Statement::Endef => Err(ParseError::ExtraneousEndef { location }),
            Statement::Other(text) => Err(ParseError::MissingSeparator {
                text: text.to_string(),
                location,
            }),
        }
    }

    fn begin_define(
        &mut self,
        header: &str,
        modifiers: Modifiers,
        location: SourceLocation,
    ) -> Result<(), ParseError> {
        let (raw_name, op) = match parse_assignment(header) {
            Some(assignment) => {
                if !assignment.value.trim().is_empty() {
                    warn!("{}: extraneous text after 'define' directive", location);
                }
                (assignment.name, assignment.op)
            }
            None => (header, AssignOp::Recursive),
        };
        if op == AssignOp::Shell {
            return Err(ParseError::UnsupportedShellAssignment { location });
        }

        let name = self.expand_name(raw_name, &location)?;
        debug!(variable = %name, op = %op, "collecting define");
        self.state = ParserState::CollectingDefine(DefineBlock::new(name, op, modifiers, location));
        Ok(())
    }

    fn complete_define(&mut self) -> Result<(), ParseError> {
        let ParserState::CollectingDefine(block) =
            std::mem::replace(&mut self.state, ParserState::Idle)
        else {
            return Ok(());
        };

        let body = block.body();
        self.assign(
            &block.name,
            block.op,
            &body,
            block.modifiers.origin(),
            &block.location,
            Some(&block.location),
        )?;
        self.apply_export(&block.name, block.modifiers);
        Ok(())
    }

    fn undefine(
        &mut self,
        names: &str,
        modifiers: Modifiers,
        location: &SourceLocation,
    ) -> Result<(), ParseError> {
        let names = self.expand_at(names, location)?;
        let mut words = names.split_ascii_whitespace().peekable();
        if words.peek().is_none() {
            return Err(ParseError::EmptyVariableName {
                location: location.clone(),
            });
        }

        let origin = modifiers.origin();
        for name in words {
            let removed = self.variables.undefine(name, origin);
            debug!(variable = name, removed, "undefine");
        }
        Ok(())
    }

    fn export(&mut self, names: &str, export: bool, location: &SourceLocation) -> Result<(), ParseError> {
        if names.is_empty() {
            debug!(export, "export all variables");
            self.export_all = export;
            return Ok(());
        }

        let names = self.expand_at(names, location)?;
        for name in names.split_ascii_whitespace() {
            if !self.variables.contains(name) {
                self.variables
                    .define(Variable::simple(name, "").with_location(location.clone()));
            }
            if let Some(variable) = self.variables.get_mut(name) {
                variable.exported = export;
            }
        }
        Ok(())
    }

    fn apply_export(&mut self, name: &str, modifiers: Modifiers) {
        if let Some(export) = modifiers.export {
            if let Some(variable) = self.variables.get_mut(name) {
                variable.exported = export;
            }
        }
    }

    /// Store an assignment in the table.
    ///
    /// `location` is where expansion errors are reported; `defined_at` is
    /// recorded on the variable.
    fn assign(
        &mut self,
        name: &str,
        op: AssignOp,
        text: &str,
        origin: Origin,
        location: &SourceLocation,
        defined_at: Option<&SourceLocation>,
    ) -> Result<(), ParseError> {
        let existing = self.variables.get(name).map(|variable| variable.value.clone());

        let value = match (op, existing) {
            (AssignOp::Shell, _) => {
                return Err(ParseError::UnsupportedShellAssignment {
                    location: location.clone(),
                })
            }
            (AssignOp::Recursive, _) | (AssignOp::Conditional | AssignOp::Append, None) => {
                Value::Raw(text.to_string())
            }
            (AssignOp::Simple, _) => Value::Expanded(self.expand_at(text, location)?),
            (AssignOp::Conditional, Some(_)) => {
                debug!(variable = name, "already defined, ?= ignored");
                return Ok(());
            }
            (AssignOp::Append, Some(Value::Raw(old))) => {
                if text.is_empty() {
                    return Ok(());
                }
                Value::Raw(append(old, text))
            }
            (AssignOp::Append, Some(Value::Expanded(old))) => {
                let text = self.expand_at(text, location)?;
                if text.is_empty() {
                    return Ok(());
                }
                Value::Expanded(append(old, &text))
            }
        };

        let mut variable = Variable::new(name, value).with_origin(origin);
        variable.location = defined_at.cloned();

        let defined = self.variables.define(variable);
        debug!(variable = name, op = %op, origin = %origin, defined, "assignment");
        Ok(())
    }

    /// Expand a variable name, trimmed. An empty result is an error.
    fn expand_name(&self, raw: &str, location: &SourceLocation) -> Result<String, ParseError> {
        let name = if raw.contains('$') {
            self.expand_at(raw, location)?
        } else {
            raw.to_string()
        };

        let name = name.trim();
        if name.is_empty() {
            return Err(ParseError::EmptyVariableName {
                location: location.clone(),
            });
        }
        Ok(name.to_string())
    }

    fn expand_at(&self, text: &str, location: &SourceLocation) -> Result<String, ParseError> {
        self.expand(text).map_err(|source| ParseError::Expansion {
            source,
            location: location.clone(),
        })
    }

    // ═══════════════════════════════════════════════════════════════════
    // Evaluation
    // ═══════════════════════════════════════════════════════════════════

    fn environment(&self) -> Environment<'_> {
        Environment::new(&self.variables).with_max_depth(self.ctx.max_depth)
    }

    /// Expanded value of the variable `name`; empty if it is undefined.
    pub fn eval(&self, name: &str) -> Result<String, ExpandError> {
        let mut env = self.environment();
        let mut out = String::new();
        expand_variable(name, &mut env, &self.ctx, &mut out)?;
        Ok(out)
    }

    /// Expand arbitrary text against the current table.
    pub fn expand(&self, text: &str) -> Result<String, ExpandError> {
        let mut env = self.environment();
        expand_text(text, &mut env, &self.ctx)
    }

    /// Expanded value of a variable that need not be in the table.
    pub fn eval_variable(&self, variable: &Variable) -> Result<String, ExpandError> {
        let mut env = self.environment();
        let mut out = String::new();
        expand_value(variable, &mut env, &self.ctx, &mut out)?;
        Ok(out)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Export
    // ═══════════════════════════════════════════════════════════════════

    /// Whether a bare `export` marked every variable for export.
    pub fn export_all(&self) -> bool {
        self.export_all
    }

    /// Whether the variable `name` is exported.
    pub fn is_exported(&self, name: &str) -> bool {
        self.variables
            .get(name)
            .is_some_and(|variable| variable.exported || self.export_all)
    }

    /// Variables marked for export, in definition order.
    pub fn exported_variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables
            .iter()
            .filter(move |variable| variable.exported || self.export_all)
    }
}

fn append(mut old: String, text: &str) -> String {
    if !old.is_empty() {
        old.push(' ');
    }
    old.push_str(text);
    old
}
