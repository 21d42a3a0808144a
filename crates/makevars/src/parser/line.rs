//! Logical lines: comments, continuations and statement recognition

use std::borrow::Cow;

use super::assignment::{parse_assignment, trim_blanks_start, AssignOp, Assignment};
use crate::error::SourceLocation;
use crate::variable::Origin;

/// Whether `line` ends in an unescaped backslash.
pub(crate) fn has_continuation(line: &str) -> bool {
    let backslashes = line.bytes().rev().take_while(|&b| b == b'\\').count();
    backslashes % 2 == 1
}

/// Join a continued line onto the text collected so far.
///
/// `text` must end in the continuation backslash. The backslash-newline and
/// the whitespace around it become a single space.
pub(crate) fn join_continuation(text: &mut String, next: &str) {
    text.pop();
    let kept = text.trim_end_matches([' ', '\t']).len();
    text.truncate(kept);
    text.push(' ');
    text.push_str(trim_blanks_start(next));
}

/// Remove a trailing comment.
///
/// A `#` preceded by an odd number of backslashes is literal. Backslashes
/// directly in front of a `#` are halved.
pub(crate) fn strip_comment(line: &str) -> Cow<'_, str> {
    if !line.contains('#') {
        return Cow::Borrowed(line);
    }

    let mut out = String::with_capacity(line.len());
    let mut backslashes = 0usize;
    for c in line.chars() {
        match c {
            '\\' => backslashes += 1,
            '#' => {
                out.extend(std::iter::repeat('\\').take(backslashes / 2));
                if backslashes % 2 == 0 {
                    return Cow::Owned(out);
                }
                out.push('#');
                backslashes = 0;
            }
            _ => {
                out.extend(std::iter::repeat('\\').take(backslashes));
                backslashes = 0;
                out.push(c);
            }
        }
    }
    out.extend(std::iter::repeat('\\').take(backslashes));
    Cow::Owned(out)
}

/// Split off the first blank-delimited word, returning it and the rest with
/// leading blanks removed.
pub(crate) fn first_word(line: &str) -> (&str, &str) {
    let line = trim_blanks_start(line);
    match line.find([' ', '\t']) {
        Some(end) => (&line[..end], trim_blanks_start(&line[end..])),
        None => (line, ""),
    }
}

/// Keywords that may precede an assignment or `define`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Modifiers {
    /// `Some(true)` for `export`, `Some(false)` for `unexport`
    pub export: Option<bool>,

    /// `override` was given
    pub is_override: bool,
}

impl Modifiers {
    /// Origin of definitions carrying these modifiers.
    pub fn origin(&self) -> Origin {
        if self.is_override {
            Origin::Override
        } else {
            Origin::File
        }
    }
}

/// One logical line, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Statement<'a> {
    /// Nothing but whitespace
    Blank,

    /// `[modifiers] NAME op VALUE`
    Assignment {
        modifiers: Modifiers,
        assignment: Assignment<'a>,
    },

    /// `[modifiers] define HEADER`
    Define { modifiers: Modifiers, header: &'a str },

    /// `[modifiers] undefine NAMES`
    Undefine { modifiers: Modifiers, names: &'a str },

    /// `export NAMES` or `unexport NAMES`
    Export { export: bool, names: &'a str },

    /// `endef` with no open `define`
    Endef,

    /// Anything else
    Other(&'a str),
}

impl<'a> Statement<'a> {
    /// Classify a logical line with its comment already removed.
    ///
    /// Assignments are tried before keywords, so `export := 1` assigns to a
    /// variable named `export`.
    pub fn classify(line: &'a str) -> Self {
        let line = line.trim_start();
        let mut rest = line;
        let mut modifiers = Modifiers::default();

        loop {
            if let Some(assignment) = parse_assignment(rest) {
                return Statement::Assignment {
                    modifiers,
                    assignment,
                };
            }

            let (word, after) = first_word(rest);
            match word {
                "export" => modifiers.export = Some(true),
                "unexport" => modifiers.export = Some(false),
                "override" => modifiers.is_override = true,
                "private" => {}
                "define" => {
                    return Statement::Define {
                        modifiers,
                        header: after,
                    }
                }
                "undefine" => {
                    return Statement::Undefine {
                        modifiers,
                        names: after,
                    }
                }
                _ => break,
            }
            if after.is_empty() {
                break;
            }
            rest = after;
        }

        match first_word(line) {
            ("", _) => Statement::Blank,
            ("export", names) => Statement::Export {
                export: true,
                names,
            },
            ("unexport", names) => Statement::Export {
                export: false,
                names,
            },
            ("endef", _) => Statement::Endef,
            _ => Statement::Other(line),
        }
    }
}

/// A `define` block whose body is being collected.
#[derive(Debug, Clone)]
pub(crate) struct DefineBlock {
    /// Expanded variable name
    pub name: String,

    /// Operator from the `define` line
    pub op: AssignOp,

    /// Modifiers in front of `define`
    pub modifiers: Modifiers,

    /// Location of the `define` line
    pub location: SourceLocation,

    /// Open `define`s, this one included
    depth: usize,

    /// Body lines, continuations already joined
    lines: Vec<String>,
}

impl DefineBlock {
    pub fn new(
        name: String,
        op: AssignOp,
        modifiers: Modifiers,
        location: SourceLocation,
    ) -> Self {
        Self {
            name,
            op,
            modifiers,
            location,
            depth: 1,
            lines: Vec::new(),
        }
    }

    /// Take one body line. Returns `true` when it was the closing `endef`.
    ///
    /// Nested `define`/`endef` pairs are kept as body text. Lines starting
    /// with a tab are never directives.
    pub fn accept(&mut self, line: &str) -> bool {
        if !line.starts_with('\t') {
            match first_word(line).0 {
                "define" => self.depth += 1,
                "endef" => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        return true;
                    }
                }
                _ => {}
            }
        }
        self.lines.push(line.to_string());
        false
    }

    /// The body: collected lines separated by newlines.
    pub fn body(&self) -> String {
        self.lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_continuation_detection() {
        assert!(has_continuation("a \\"));
        assert!(!has_continuation("a \\\\"));
        assert!(has_continuation("\\\\\\"));
        assert!(!has_continuation("a"));
    }

    #[test]
    fn test_join_continuation_collapses_whitespace() {
        let mut text = "x = a   \\".to_string();
        join_continuation(&mut text, "    b");
        assert_eq!(text, "x = a b");
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("x = a # note"), "x = a ");
        assert_eq!(strip_comment("x = a\\#b"), "x = a#b");
        assert_eq!(strip_comment("x = a\\\\#b"), "x = a\\");
        assert_eq!(strip_comment("# whole line"), "");
        assert_eq!(strip_comment("x = a\\b"), "x = a\\b");
    }

    #[test]
    fn test_first_word() {
        assert_eq!(first_word("  define  foo ="), ("define", "foo ="));
        assert_eq!(first_word("endef"), ("endef", ""));
        assert_eq!(first_word(""), ("", ""));
    }

    #[test]
    fn test_classify_modifiers() {
        let statement = Statement::classify("override export CC := gcc");
        match statement {
            Statement::Assignment {
                modifiers,
                assignment,
            } => {
                assert!(modifiers.is_override);
                assert_eq!(modifiers.export, Some(true));
                assert_eq!(assignment.name, "CC");
                assert_eq!(assignment.op, AssignOp::Simple);
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_keywords_can_be_variable_names() {
        assert!(matches!(
            Statement::classify("export := 1"),
            Statement::Assignment { assignment, .. } if assignment.name == "export"
        ));
        assert!(matches!(
            Statement::classify("define = 2"),
            Statement::Assignment { assignment, .. } if assignment.name == "define"
        ));
    }

    #[test]
    fn test_classify_directives() {
        assert_eq!(Statement::classify("   "), Statement::Blank);
        assert_eq!(Statement::classify("endef"), Statement::Endef);
        assert_eq!(
            Statement::classify("export A B"),
            Statement::Export {
                export: true,
                names: "A B"
            }
        );
        assert_eq!(
            Statement::classify("unexport"),
            Statement::Export {
                export: false,
                names: ""
            }
        );
        assert_eq!(
            Statement::classify("override define foo ="),
            Statement::Define {
                modifiers: Modifiers {
                    export: None,
                    is_override: true
                },
                header: "foo ="
            }
        );
        assert_eq!(
            Statement::classify("undefine a b"),
            Statement::Undefine {
                modifiers: Modifiers::default(),
                names: "a b"
            }
        );
        assert_eq!(Statement::classify("all: x"), Statement::Other("all: x"));
        assert_eq!(
            Statement::classify("override foo"),
            Statement::Other("override foo")
        );
    }

    #[test]
    fn test_define_block_nesting() {
        let mut block = DefineBlock::new(
            "outer".to_string(),
            AssignOp::Recursive,
            Modifiers::default(),
            SourceLocation::new("Makefile", 1),
        );
        assert!(!block.accept("define inner"));
        assert!(!block.accept("  body"));
        assert!(!block.accept("endef"));
        assert!(!block.accept("\tendef"));
        assert!(block.accept("endef # done"));
        assert_eq!(block.body(), "define inner\n  body\nendef\n\tendef");
    }

    #[test]
    fn test_define_block_blank_lines() {
        let mut block = DefineBlock::new(
            "two".to_string(),
            AssignOp::Recursive,
            Modifiers::default(),
            SourceLocation::new("Makefile", 1),
        );
        block.accept("");
        block.accept("");
        assert!(block.accept("endef"));
        assert_eq!(block.body(), "\n");
    }
}
