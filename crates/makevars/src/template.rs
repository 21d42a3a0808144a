//! Parsing text into an expansion template
//!
//! A template is the AST of a piece of make text: literal runs interleaved
//! with variable references and function calls.
//!
//! ```text
//! "cc $(CFLAGS) -o $@ $(call objs,$(SRC))"
//!    → [Text("cc "), Reference(CFLAGS), Text(" -o "), Reference(@),
//!       Text(" "), Function(call, [objs, $(SRC)])]
//! ```
//!
//! Parsing never fails. Malformed references become [`Node::Error`] nodes
//! that raise their error only when expansion reaches them, so anything to
//! their left is still evaluated first.

use crate::environment::{lookup_builtin, BuiltinFn};
use crate::error::{ExpandError, SourceLocation};

/// Parsed text, ready for expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// Nodes in source order
    pub nodes: Vec<Node>,
}

/// One piece of a template.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text, with `$$` already collapsed to `$`
    Text(String),

    /// `$(...)`, `${...}` or `$X`
    Reference(Reference),

    /// `$(function args...)`
    Function(FunctionCall),

    /// A malformed reference, reported when reached
    Error(TemplateError),
}

/// The body of a variable or substitution reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    /// Body known at parse time
    Name(String),

    /// Body containing references; expanded before it is interpreted
    Computed(Template),
}

/// A call to a built-in function.
#[derive(Debug, Clone)]
pub struct FunctionCall {
    /// The function being called
    pub builtin: &'static BuiltinFn,

    /// Unexpanded arguments
    pub args: Vec<Template>,
}

impl PartialEq for FunctionCall {
    fn eq(&self, other: &Self) -> bool {
        self.builtin.name == other.builtin.name && self.args == other.args
    }
}

/// Structural problems found while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// No close delimiter for a reference
    UnterminatedReference,

    /// No close delimiter for a function call
    UnterminatedCall {
        /// Function name
        function: &'static str,
        /// The missing delimiter
        close: char,
    },
}

impl TemplateError {
    /// Convert to an expansion error attributed to `location`.
    pub fn into_expand_error(self, location: Option<SourceLocation>) -> ExpandError {
        match self {
            TemplateError::UnterminatedReference => ExpandError::UnterminatedReference { location },
            TemplateError::UnterminatedCall { function, close } => ExpandError::UnterminatedCall {
                function: function.to_string(),
                close,
                location,
            },
        }
    }
}

impl Template {
    /// Parse make text.
    pub fn parse(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut nodes = Vec::new();
        let mut literal = String::new();
        let mut pos = 0;

        while let Some(offset) = text[pos..].find('$') {
            let dollar = pos + offset;
            literal.push_str(&text[pos..dollar]);
            let next = dollar + 1;

            match bytes.get(next) {
                // A lone `$` at the end, or `$$`
                None => {
                    literal.push('$');
                    pos = next;
                }
                Some(b'$') => {
                    literal.push('$');
                    pos = next + 1;
                }
                Some(&open @ (b'(' | b'{')) => {
                    flush(&mut literal, &mut nodes);
                    let (node, resume) = scan_reference(text, next + 1, open);
                    nodes.push(node);
                    match resume {
                        Some(p) => pos = p,
                        None => {
                            pos = text.len();
                            break;
                        }
                    }
                }
                Some(_) => {
                    flush(&mut literal, &mut nodes);
                    let name = text[next..].chars().next().unwrap_or_default();
                    nodes.push(Node::Reference(Reference::Name(name.to_string())));
                    pos = next + name.len_utf8();
                }
            }
        }

        literal.push_str(&text[pos..]);
        flush(&mut literal, &mut nodes);
        Self { nodes }
    }

    /// A template that expands to the given text unchanged.
    pub fn literal(text: impl Into<String>) -> Self {
        let text = text.into();
        let nodes = if text.is_empty() {
            Vec::new()
        } else {
            vec![Node::Text(text)]
        };
        Self { nodes }
    }

    /// Whether the template is plain text.
    pub fn is_literal(&self) -> bool {
        self.nodes.iter().all(|n| matches!(n, Node::Text(_)))
    }
}

fn flush(literal: &mut String, nodes: &mut Vec<Node>) {
    if !literal.is_empty() {
        nodes.push(Node::Text(std::mem::take(literal)));
    }
}

/// Scan a reference whose body starts at `beg`, just past `open`.
///
/// Returns the node and the position to resume scanning from; `None` means
/// the rest of the text was consumed.
fn scan_reference(text: &str, beg: usize, open: u8) -> (Node, Option<usize>) {
    let bytes = text.as_bytes();
    let close = if open == b'(' { b')' } else { b'}' };

    if let Some(call) = scan_function(text, beg, open, close) {
        return call;
    }

    let Some(end) = text[beg..].find(close as char).map(|i| beg + i) else {
        return (Node::Error(TemplateError::UnterminatedReference), None);
    };

    if !text[beg..end].contains('$') {
        let name = text[beg..end].to_string();
        return (Node::Reference(Reference::Name(name)), Some(end + 1));
    }

    // The body holds nested references: find the balancing close.
    let mut count = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(beg) {
        if b == open {
            count += 1;
        } else if b == close {
            if count == 0 {
                let body = Template::parse(&text[beg..i]);
                return (Node::Reference(Reference::Computed(body)), Some(i + 1));
            }
            count -= 1;
        }
    }

    // Unbalanced, as in `$($(a)`: make takes the text up to the first close
    // as a plain name and stops scanning.
    let name = text[beg..end].to_string();
    (Node::Reference(Reference::Name(name)), None)
}

/// Recognize `$(name args...)` for a built-in function `name`.
fn scan_function(
    text: &str,
    beg: usize,
    open: u8,
    close: u8,
) -> Option<(Node, Option<usize>)> {
    let bytes = text.as_bytes();
    let name_end = bytes[beg..]
        .iter()
        .position(|&b| !(b.is_ascii_lowercase() || b == b'-'))
        .map_or(bytes.len(), |i| beg + i);

    if name_end == beg {
        return None;
    }
    if !matches!(bytes.get(name_end), None | Some(b' ' | b'\t')) {
        return None;
    }
    let builtin = lookup_builtin(&text[beg..name_end])?;

    let args_beg = bytes[name_end..]
        .iter()
        .position(|&b| b != b' ' && b != b'\t')
        .map_or(bytes.len(), |i| name_end + i);

    let mut count = 0usize;
    let mut end = None;
    for (i, &b) in bytes.iter().enumerate().skip(args_beg) {
        if b == open {
            count += 1;
        } else if b == close {
            if count == 0 {
                end = Some(i);
                break;
            }
            count -= 1;
        }
    }

    let Some(end) = end else {
        let err = TemplateError::UnterminatedCall {
            function: builtin.name,
            close: close as char,
        };
        return Some((Node::Error(err), None));
    };

    let args = split_arguments(&text[args_beg..end], open, close, builtin.max_args)
        .into_iter()
        .map(Template::parse)
        .collect();

    Some((Node::Function(FunctionCall { builtin, args }), Some(end + 1)))
}

/// Split function arguments on commas outside nested delimiters.
///
/// Only delimiters of the kind that opened the call are counted. Once
/// `max_args` arguments exist the remaining text, commas included, is the
/// last argument. There is always at least one argument.
fn split_arguments(text: &str, open: u8, close: u8, max_args: usize) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut args = Vec::new();
    let mut start = 0;

    loop {
        let at_limit = max_args != 0 && args.len() + 1 == max_args;
        let comma = if at_limit {
            None
        } else {
            next_argument(bytes, start, open, close)
        };

        match comma {
            Some(i) => {
                args.push(&text[start..i]);
                start = i + 1;
            }
            None => {
                args.push(&text[start..]);
                return args;
            }
        }
    }
}

fn next_argument(bytes: &[u8], start: usize, open: u8, close: u8) -> Option<usize> {
    let mut count = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if b == open {
            count += 1;
        } else if b == close {
            if count == 0 {
                return None;
            }
            count -= 1;
        } else if b == b',' && count == 0 {
            return Some(i);
        }
    }
    None
}
