//! Variables, their flavors and origins

mod table;

pub use table::VariableTable;

use std::fmt;

use crate::error::SourceLocation;

/// How a variable's value is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// Expanded once, when defined (`:=`)
    Simple,

    /// Stored verbatim and expanded on every reference (`=`)
    Recursive,
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flavor::Simple => write!(f, "simple"),
            Flavor::Recursive => write!(f, "recursive"),
        }
    }
}

/// Where a variable's definition came from.
///
/// Ordered by precedence: a definition may only replace a variable whose
/// origin is not higher than its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Origin {
    /// Built in
    Default,

    /// Imported from the process environment
    Environment,

    /// Defined in a makefile
    File,

    /// Given on the command line
    CommandLine,

    /// Defined in a makefile with `override`
    Override,

    /// Bound by the engine, e.g. `call` parameters
    Automatic,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Origin::Default => "default",
            Origin::Environment => "environment",
            Origin::File => "file",
            Origin::CommandLine => "command line",
            Origin::Override => "override",
            Origin::Automatic => "automatic",
        };
        f.write_str(name)
    }
}

/// A variable's stored text, tagged with how it is evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Already fully expanded (simple flavor)
    Expanded(String),

    /// Unexpanded source text (recursive flavor)
    Raw(String),
}

impl Value {
    /// The stored text, expanded or not.
    pub fn text(&self) -> &str {
        match self {
            Value::Expanded(text) | Value::Raw(text) => text,
        }
    }

    /// The flavor this value implies.
    pub fn flavor(&self) -> Flavor {
        match self {
            Value::Expanded(_) => Flavor::Simple,
            Value::Raw(_) => Flavor::Recursive,
        }
    }

    /// Whether the stored text is empty.
    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }
}

/// A named variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    /// The variable's name
    pub name: String,

    /// The stored value
    pub value: Value,

    /// Where the definition came from
    pub origin: Origin,

    /// Marked with `export`
    pub exported: bool,

    /// Where this variable was defined (for error messages)
    pub location: Option<SourceLocation>,
}

impl Variable {
    /// Create a variable with origin `File` and no location.
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            origin: Origin::File,
            exported: false,
            location: None,
        }
    }

    /// Create a simple variable holding already-expanded text.
    pub fn simple(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, Value::Expanded(text.into()))
    }

    /// Create a recursive variable holding raw text.
    pub fn recursive(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, Value::Raw(text.into()))
    }

    /// Set the origin.
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Set the definition location.
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Set the export flag.
    pub fn with_export(mut self, exported: bool) -> Self {
        self.exported = exported;
        self
    }

    /// The variable's flavor.
    pub fn flavor(&self) -> Flavor {
        self.value.flavor()
    }

    /// The stored text (unexpanded for recursive variables).
    pub fn text(&self) -> &str {
        self.value.text()
    }
}
