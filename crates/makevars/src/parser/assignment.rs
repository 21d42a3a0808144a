//! Recognizing `NAME op VALUE` assignments

use std::fmt;

/// An assignment operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`: store the text verbatim
    Recursive,

    /// `:=` or `::=`: expand the text now
    Simple,

    /// `+=`: append to the existing value
    Append,

    /// `?=`: define only if not yet defined
    Conditional,

    /// `!=`: assign the output of a shell command
    Shell,
}

impl AssignOp {
    /// Match an operator at the start of `bytes`, returning it and its length.
    ///
    /// Any offset is valid, even one inside a multi-byte character.
    fn at_start(bytes: &[u8]) -> Option<(Self, usize)> {
        const OPERATORS: &[(&[u8], AssignOp)] = &[
            (b"::=", AssignOp::Simple),
            (b":=", AssignOp::Simple),
            (b"+=", AssignOp::Append),
            (b"?=", AssignOp::Conditional),
            (b"!=", AssignOp::Shell),
            (b"=", AssignOp::Recursive),
        ];
        OPERATORS
            .iter()
            .find(|(token, _)| bytes.starts_with(token))
            .map(|&(token, op)| (op, token.len()))
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            AssignOp::Recursive => "=",
            AssignOp::Simple => ":=",
            AssignOp::Append => "+=",
            AssignOp::Conditional => "?=",
            AssignOp::Shell => "!=",
        };
        f.write_str(token)
    }
}

/// A variable assignment split into its parts.
///
/// The name is unexpanded and may be empty; the value has leading blanks
/// removed and keeps trailing whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment<'a> {
    /// Text before the operator, trailing blanks removed
    pub name: &'a str,

    /// The operator
    pub op: AssignOp,

    /// Text after the operator
    pub value: &'a str,
}

/// Parse `line` as a variable assignment.
///
/// References in the name are skipped over whole, so `$(a:b=c) = x` assigns
/// to the computed name. Once a blank ends the name, the next non-blank must
/// start an operator. A `:` not starting `:=` or `::=` means the line is a
/// rule, not an assignment.
///
/// ```
/// use makevars::parser::{parse_assignment, AssignOp};
///
/// let assignment = parse_assignment("CFLAGS += -O2 ").unwrap();
/// assert_eq!(assignment.name, "CFLAGS");
/// assert_eq!(assignment.op, AssignOp::Append);
/// assert_eq!(assignment.value, "-O2 ");
///
/// assert!(parse_assignment("all: main.o").is_none());
/// ```
pub fn parse_assignment(line: &str) -> Option<Assignment<'_>> {
    let bytes = line.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'$' => i = skip_reference(bytes, i + 1),
            b' ' | b'\t' => {
                let name_end = i;
                while matches!(bytes.get(i), Some(b' ' | b'\t')) {
                    i += 1;
                }
                let (op, len) = AssignOp::at_start(&bytes[i..])?;
                return Some(Assignment {
                    name: &line[..name_end],
                    op,
                    value: trim_blanks_start(&line[i + len..]),
                });
            }
            c => {
                if let Some((op, len)) = AssignOp::at_start(&bytes[i..]) {
                    return Some(Assignment {
                        name: &line[..i],
                        op,
                        value: trim_blanks_start(&line[i + len..]),
                    });
                }
                if c == b':' {
                    return None;
                }
                i += 1;
            }
        }
    }
    None
}

/// Skip a reference whose `$` precedes `start`, returning the index after it.
///
/// Only the paren kind that opened the reference is counted.
fn skip_reference(bytes: &[u8], start: usize) -> usize {
    let (open, close) = match bytes.get(start) {
        Some(b'(') => (b'(', b')'),
        Some(b'{') => (b'{', b'}'),
        Some(_) => return start + 1,
        None => return start,
    };

    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(start + 1) {
        if b == open {
            depth += 1;
        } else if b == close {
            if depth == 0 {
                return i + 1;
            }
            depth -= 1;
        }
    }
    bytes.len()
}

pub(crate) fn trim_blanks_start(text: &str) -> &str {
    text.trim_start_matches([' ', '\t'])
}
