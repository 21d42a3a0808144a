//! Error types for parsing and expansion
//!
//! Every fatal error renders the way GNU Make reports it:
//!
//! ```text
//! Makefile:3: *** Recursive variable 'x' references itself (eventually).  Stop.
//! ```

use std::fmt;
use thiserror::Error;

/// Source code location for error reporting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    /// File name or label
    pub file: String,

    /// Line number (1-indexed)
    pub line: usize,
}

impl SourceLocation {
    /// Create a new source location.
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Format a fatal diagnostic exactly as GNU Make prints it.
///
/// Without a location the message is attributed to `make` itself.
pub fn render_fatal(location: Option<&SourceLocation>, message: &dyn fmt::Display) -> String {
    match location {
        Some(loc) => format!("{}: *** {}.  Stop.\n", loc, message),
        None => format!("make: *** {}.  Stop.\n", message),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Expansion Errors
// ═══════════════════════════════════════════════════════════════════════

/// Errors raised while expanding variable references.
///
/// The `location` of each variant is the definition site of the innermost
/// variable being expanded when the error occurred, if it has one. For
/// recursion it is the re-entered variable's own definition site.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpandError {
    /// A recursive variable re-entered its own expansion
    #[error("Recursive variable '{name}' references itself (eventually)")]
    Recursion {
        /// Name of the variable that was re-entered
        name: String,
        /// Definition site of the re-entered variable
        location: Option<SourceLocation>,
    },

    /// `$(` or `${` without a matching close
    #[error("unterminated variable reference")]
    UnterminatedReference {
        /// Where the reference was defined
        location: Option<SourceLocation>,
    },

    /// A function call without a matching close
    #[error("unterminated call to function '{function}': missing '{close}'")]
    UnterminatedCall {
        /// Function name
        function: String,
        /// The close delimiter that was never found
        close: char,
        /// Where the call was defined
        location: Option<SourceLocation>,
    },

    /// A function called with fewer arguments than it requires
    #[error("insufficient number of arguments ({got}) to function '{function}'")]
    InsufficientArguments {
        /// Function name
        function: String,
        /// Number of arguments supplied
        got: usize,
        /// Where the call was defined
        location: Option<SourceLocation>,
    },

    /// Too many nested recursive variables
    #[error("variable expansion nested deeper than {max} levels")]
    DepthExceeded {
        /// Configured limit
        max: usize,
        /// Where the deepest reference was defined
        location: Option<SourceLocation>,
    },
}

impl ExpandError {
    /// Location the error is attributed to, if known.
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            ExpandError::Recursion { location, .. }
            | ExpandError::UnterminatedReference { location }
            | ExpandError::UnterminatedCall { location, .. }
            | ExpandError::InsufficientArguments { location, .. }
            | ExpandError::DepthExceeded { location, .. } => location.as_ref(),
        }
    }

    /// Name of the self-referencing variable for recursion errors.
    pub fn recursive_variable(&self) -> Option<&str> {
        match self {
            ExpandError::Recursion { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Render as a GNU Make fatal diagnostic.
    ///
    /// `fallback` is used when no variable with a known location was being
    /// expanded, typically the line that requested the expansion.
    pub fn render(&self, fallback: Option<&SourceLocation>) -> String {
        render_fatal(self.location().or(fallback), self)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Parse Errors
// ═══════════════════════════════════════════════════════════════════════

/// Errors raised while reading variable definitions.
///
/// All of these abort the whole parse.
#[derive(Error, Debug)]
pub enum ParseError {
    /// A line that is neither an assignment nor a known directive
    #[error("missing separator")]
    MissingSeparator {
        /// The offending line, after comment removal
        text: String,
        /// Where it was read
        location: SourceLocation,
    },

    /// An assignment or directive whose name expands to nothing
    #[error("empty variable name")]
    EmptyVariableName {
        /// Where it was read
        location: SourceLocation,
    },

    /// End of input inside a `define` body
    #[error("missing 'endef', unterminated 'define'")]
    UnterminatedDefine {
        /// Name given to the `define`
        name: String,
        /// Location of the `define` line
        location: SourceLocation,
    },

    /// `endef` outside any `define` body
    #[error("extraneous 'endef'")]
    ExtraneousEndef {
        /// Location of the `endef` line
        location: SourceLocation,
    },

    /// `!=` needs a shell, which this engine does not run
    #[error("shell assignment '!=' is not supported")]
    UnsupportedShellAssignment {
        /// Where it was read
        location: SourceLocation,
    },

    /// Expanding the right-hand side of an immediate assignment failed
    #[error("{source}")]
    Expansion {
        /// The underlying expansion failure
        source: ExpandError,
        /// The assignment that requested the expansion
        location: SourceLocation,
    },

    /// Reading the source failed
    #[error("{source_name}: {source}")]
    Io {
        /// Label of the source being read
        source_name: String,
        /// The underlying I/O failure
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    /// Location of the statement that failed, if any.
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            ParseError::MissingSeparator { location, .. }
            | ParseError::EmptyVariableName { location }
            | ParseError::UnterminatedDefine { location, .. }
            | ParseError::ExtraneousEndef { location }
            | ParseError::UnsupportedShellAssignment { location }
            | ParseError::Expansion { location, .. } => Some(location),
            ParseError::Io { .. } => None,
        }
    }

    /// Render as a GNU Make fatal diagnostic.
    pub fn render(&self) -> String {
        match self {
            ParseError::Expansion { source, location } => source.render(Some(location)),
            _ => render_fatal(self.location(), self),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Top-level Error
// ═══════════════════════════════════════════════════════════════════════

/// Any failure produced by this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Reading definitions failed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Expanding a variable or text failed
    #[error(transparent)]
    Expand(#[from] ExpandError),
}

impl Error {
    /// Render as a GNU Make fatal diagnostic.
    pub fn render(&self, fallback: Option<&SourceLocation>) -> String {
        match self {
            Error::Parse(err) => err.render(),
            Error::Expand(err) => err.render(fallback),
        }
    }
}

/// Result type alias for makevars operations
pub type Result<T> = std::result::Result<T, Error>;
