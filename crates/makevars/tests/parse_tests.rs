//! Parser tests

use makevars::*;
use pretty_assertions::assert_eq;

fn parse(text: &str) -> ParseContext {
    let mut parser = ParseContext::new();
    parser.parse_str(text, "Makefile").unwrap();
    parser
}

fn parse_err(text: &str) -> ParseError {
    ParseContext::new().parse_str(text, "Makefile").unwrap_err()
}

fn stored(parser: &ParseContext, name: &str) -> Option<Value> {
    parser.variables().get(name).map(|v| v.value.clone())
}

// ═══════════════════════════════════════════════════════════════════════
// Simple and Recursive Assignment
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_simple_assignment_expands_immediately() {
    let parser = parse("x := a\ny := $(x) b\nx := c\n");
    assert_eq!(parser.eval("x").unwrap(), "c");
    assert_eq!(parser.eval("y").unwrap(), "a b");
    assert_eq!(stored(&parser, "y"), Some(Value::Expanded("a b".into())));
}

#[test]
fn test_double_colon_assignment_is_simple() {
    let parser = parse("x ::= 1\ny ::= $(x)2\n");
    assert_eq!(stored(&parser, "y"), Some(Value::Expanded("12".into())));
}

#[test]
fn test_recursive_assignment_is_deferred() {
    let parser = parse("x = $(y)\ny = $(z)\nz = abc\n");
    assert_eq!(stored(&parser, "x"), Some(Value::Raw("$(y)".into())));
    assert_eq!(parser.eval("x").unwrap(), "abc");
}

#[test]
fn test_value_whitespace() {
    let parser = parse("nothing :=\nspace := $(nothing) \nx =   a  b  \n");
    assert_eq!(parser.eval("space").unwrap(), " ");
    assert_eq!(parser.eval("x").unwrap(), "a  b  ");
    assert_eq!(parser.eval("nothing").unwrap(), "");
}

#[test]
fn test_tab_indented_lines_are_statements() {
    let parser = parse("\tx = 1\n");
    assert_eq!(parser.eval("x").unwrap(), "1");
}

#[test]
fn test_definition_order_is_kept() {
    let parser = parse("b = 1\na = 2\nc = 3\nb = 4\n");
    assert_eq!(parser.variables().names(), vec!["b", "a", "c"]);
}

#[test]
fn test_keywords_can_name_variables() {
    let parser = parse("export := 1\ndefine = 2\noverride=3\n");
    assert_eq!(parser.eval("export").unwrap(), "1");
    assert_eq!(parser.eval("define").unwrap(), "2");
    assert_eq!(parser.eval("override").unwrap(), "3");
}

#[test]
fn test_non_ascii_names() {
    let parser = parse("café = 1\nnaïve := $(café) ü\n");
    assert_eq!(parser.eval("café").unwrap(), "1");
    assert_eq!(parser.eval("naïve").unwrap(), "1 ü");
}

#[test]
fn test_non_ascii_line_without_operator() {
    let err = parse_err("x = 1\nhéllo world\n");
    assert!(matches!(err, ParseError::MissingSeparator { .. }));
    assert_eq!(err.location(), Some(&SourceLocation::new("Makefile", 2)));
}

// ═══════════════════════════════════════════════════════════════════════
// Append and Conditional Assignment
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_append_to_recursive_stays_deferred() {
    let parser = parse("x = a\nx += $(y)\ny = b\n");
    assert_eq!(stored(&parser, "x"), Some(Value::Raw("a $(y)".into())));
    assert_eq!(parser.eval("x").unwrap(), "a b");
}

#[test]
fn test_append_to_simple_expands_now() {
    let parser = parse("y = b\nx := a\nx += $(y)\ny = c\n");
    assert_eq!(stored(&parser, "x"), Some(Value::Expanded("a b".into())));
}

#[test]
fn test_append_to_undefined_is_recursive() {
    let parser = parse("x += $(y)\ny = 1\n");
    assert_eq!(stored(&parser, "x"), Some(Value::Raw("$(y)".into())));
    assert_eq!(parser.eval("x").unwrap(), "1");
}

#[test]
fn test_append_separator_only_when_old_value_non_empty() {
    let parser = parse("x :=\nx += a\ny = a\ny +=\n");
    assert_eq!(parser.eval("x").unwrap(), "a");
    assert_eq!(parser.eval("y").unwrap(), "a");
}

#[test]
fn test_conditional_assignment() {
    let parser = parse("x = 1\nx ?= 2\ny ?= $(x)\nempty =\nempty ?= full\n");
    assert_eq!(parser.eval("x").unwrap(), "1");
    assert_eq!(stored(&parser, "y"), Some(Value::Raw("$(x)".into())));
    assert_eq!(parser.eval("empty").unwrap(), "");
}

// ═══════════════════════════════════════════════════════════════════════
// Origins and Override
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_command_line_beats_makefile() {
    let mut parser = ParseContext::new();
    parser.define_command_line("CC=clang").unwrap();
    parser
        .parse_str("CC = gcc\nCC += -g\nCC ?= cc\n", "Makefile")
        .unwrap();
    assert_eq!(parser.eval("CC").unwrap(), "clang");
    assert_eq!(
        parser.variables().get("CC").map(|v| v.origin),
        Some(Origin::CommandLine)
    );
    assert_eq!(parser.variables().get("CC").and_then(|v| v.location.clone()), None);
}

#[test]
fn test_override_beats_command_line() {
    let mut parser = ParseContext::new();
    parser.define_command_line("CFLAGS = -O0").unwrap();
    parser
        .parse_str("override CFLAGS += -g\n", "Makefile")
        .unwrap();
    assert_eq!(parser.eval("CFLAGS").unwrap(), "-O0 -g");
    assert_eq!(
        parser.variables().get("CFLAGS").map(|v| v.origin),
        Some(Origin::Override)
    );
}

#[test]
fn test_command_line_operators() {
    let mut parser = ParseContext::new();
    parser.define_command_line("a=1").unwrap();
    parser.define_command_line("b:=$(a)").unwrap();
    parser.define_command_line("c=$(a)").unwrap();
    parser.define_command_line("a=2").unwrap();
    assert_eq!(parser.eval("b").unwrap(), "1");
    assert_eq!(parser.eval("c").unwrap(), "2");
}

#[test]
fn test_command_line_without_operator() {
    let err = ParseContext::new()
        .define_command_line("nonsense")
        .unwrap_err();
    assert!(matches!(err, ParseError::MissingSeparator { .. }));
    assert_eq!(
        err.location(),
        Some(&SourceLocation::new(parser::COMMAND_LINE, 0))
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Comments and Continuations
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_comments() {
    let parser = parse("# leading comment\nx = a # trailing\ny = a\\#b\n   # indented\n");
    assert_eq!(parser.eval("x").unwrap(), "a ");
    assert_eq!(parser.eval("y").unwrap(), "a#b");
    assert_eq!(parser.variables().len(), 2);
}

#[test]
fn test_continuations_join_with_one_space() {
    let parser = parse("x = one \\\n      two\\\n three\n");
    assert_eq!(parser.eval("x").unwrap(), "one two three");
}

#[test]
fn test_continued_assignment_name() {
    let parser = parse("long_name \\\n  = value\n");
    assert_eq!(parser.eval("long_name").unwrap(), "value");
}

#[test]
fn test_comment_ends_continued_line() {
    let parser = parse("x = a # note \\\n  still comment\ny = b\n");
    assert_eq!(parser.eval("x").unwrap(), "a ");
    assert_eq!(parser.eval("y").unwrap(), "b");
}

// ═══════════════════════════════════════════════════════════════════════
// define / endef
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_define_is_recursive_by_default() {
    let parser = parse("define two-lines\necho $(a)\necho b\nendef\na = 1\n");
    assert_eq!(
        stored(&parser, "two-lines"),
        Some(Value::Raw("echo $(a)\necho b".into()))
    );
    assert_eq!(parser.eval("two-lines").unwrap(), "echo 1\necho b");
}

#[test]
fn test_define_of_two_blank_lines_is_one_newline() {
    let parser = parse("define newline\n\n\nendef\n");
    assert_eq!(parser.eval("newline").unwrap(), "\n");
}

#[test]
fn test_empty_define() {
    let parser = parse("define empty\nendef\n");
    assert_eq!(parser.eval("empty").unwrap(), "");
    assert!(parser.variables().contains("empty"));
}

#[test]
fn test_define_operators() {
    let parser = parse(concat!(
        "v = 1\n",
        "define eq =\n$(v)\nendef\n",
        "define now :=\n$(v)\nendef\n",
        "define eq +=\nmore\nendef\n",
        "define eq ?=\nignored\nendef\n",
        "v = 2\n",
    ));
    assert_eq!(parser.eval("eq").unwrap(), "2 more");
    assert_eq!(parser.eval("now").unwrap(), "1");
}

#[test]
fn test_nested_define_is_body_text() {
    let parser = parse("define outer\ndefine inner\nx\nendef\nendef\n");
    assert_eq!(
        parser.eval("outer").unwrap(),
        "define inner\nx\nendef"
    );
    assert!(!parser.variables().contains("inner"));
}

#[test]
fn test_define_body_keeps_comments_and_joins_continuations() {
    let parser = parse("define raw\n# kept \\\n\tline\nendef\n");
    assert_eq!(parser.eval("raw").unwrap(), "# kept line");

    let parser = parse("define even\na \\\\\nb\nendef\n");
    assert_eq!(parser.eval("even").unwrap(), "a \\\\\nb");
}

#[test]
fn test_continued_line_is_not_endef() {
    let parser = parse("define x\nbody \\\nendef\nendef\n");
    assert_eq!(parser.eval("x").unwrap(), "body endef");
}

#[test]
fn test_define_with_modifiers_and_computed_name() {
    let parser = parse("n = greet\noverride export define $(n)_fn\nhi $(1)\nendef\n");
    let var = parser.variables().get("greet_fn").cloned().unwrap();
    assert_eq!(var.origin, Origin::Override);
    assert!(var.exported);
    assert_eq!(var.location, Some(SourceLocation::new("Makefile", 2)));
}

#[test]
fn test_endef_with_comment_closes_define() {
    let parser = parse("define x\nbody\nendef # done\n");
    assert_eq!(parser.eval("x").unwrap(), "body");
}

// ═══════════════════════════════════════════════════════════════════════
// export / unexport / undefine
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_export_modifier_and_directive() {
    let parser = parse("export A = 1\nB = 2\nexport B C\nunexport A\n");
    assert!(!parser.is_exported("A"));
    assert!(parser.is_exported("B"));
    assert!(parser.is_exported("C"));
    assert_eq!(stored(&parser, "C"), Some(Value::Expanded(String::new())));
    assert!(!parser.export_all());
}

#[test]
fn test_export_directive_expands_names() {
    let parser = parse("names = X Y\nexport $(names)\n");
    assert!(parser.is_exported("X"));
    assert!(parser.is_exported("Y"));
}

#[test]
fn test_export_survives_redefinition() {
    let parser = parse("export PATH = /bin\nPATH = /usr/bin\n");
    assert!(parser.is_exported("PATH"));
}

#[test]
fn test_bare_export_and_unexport() {
    let parser = parse("a = 1\nexport\n");
    assert!(parser.export_all());
    assert!(parser.is_exported("a"));

    let parser = parse("export\nunexport\na = 1\n");
    assert!(!parser.export_all());
    assert!(!parser.is_exported("a"));
}

#[test]
fn test_undefine() {
    let parser = parse("a = 1\nb = 2\nc = 3\nundefine a\nnames = b\nundefine $(names) missing\n");
    assert_eq!(parser.variables().names(), vec!["c", "names"]);
    assert_eq!(parser.eval("a").unwrap(), "");
}

#[test]
fn test_undefine_respects_command_line() {
    let mut parser = ParseContext::new();
    parser.define_command_line("keep=1").unwrap();
    parser.define_command_line("drop=1").unwrap();
    parser
        .parse_str("undefine keep\noverride undefine drop\n", "Makefile")
        .unwrap();
    assert!(parser.variables().contains("keep"));
    assert!(!parser.variables().contains("drop"));
}

// ═══════════════════════════════════════════════════════════════════════
// Computed Names
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_computed_variable_names() {
    let parser = parse("n = foo\n$(n)_x = 1\nprefix$(n) := 2\n${n}  =  3\n");
    assert_eq!(parser.eval("foo_x").unwrap(), "1");
    assert_eq!(parser.eval("prefixfoo").unwrap(), "2");
    assert_eq!(parser.eval("foo").unwrap(), "3");
}

#[test]
fn test_computed_name_is_trimmed() {
    let parser = parse("sp := $(nothing) $(nothing)\n$(sp)x$(sp) = 1\n");
    assert_eq!(parser.eval("x").unwrap(), "1");
}

// ═══════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_missing_separator() {
    let err = parse_err("x = 1\nall: x\n");
    assert!(matches!(err, ParseError::MissingSeparator { ref text, .. } if text == "all: x"));
    assert_eq!(err.location(), Some(&SourceLocation::new("Makefile", 2)));
}

#[test]
fn test_plain_words_are_missing_separator() {
    assert!(matches!(
        parse_err("just some words\n"),
        ParseError::MissingSeparator { .. }
    ));
    assert!(matches!(
        parse_err("override x\n"),
        ParseError::MissingSeparator { .. }
    ));
}

#[test]
fn test_empty_variable_name() {
    assert!(matches!(parse_err("= x\n"), ParseError::EmptyVariableName { .. }));
    assert!(matches!(
        parse_err("$(nothing) := x\n"),
        ParseError::EmptyVariableName { .. }
    ));
    assert!(matches!(parse_err("define\n"), ParseError::EmptyVariableName { .. }));
    assert!(matches!(parse_err("undefine\n"), ParseError::EmptyVariableName { .. }));
}

#[test]
fn test_extraneous_endef() {
    let err = parse_err("x = 1\n\nendef\n");
    assert!(matches!(err, ParseError::ExtraneousEndef { .. }));
    assert_eq!(err.location(), Some(&SourceLocation::new("Makefile", 3)));
}

#[test]
fn test_unterminated_define() {
    let err = parse_err("define x\nline\n");
    match err {
        ParseError::UnterminatedDefine { name, location } => {
            assert_eq!(name, "x");
            assert_eq!(location, SourceLocation::new("Makefile", 1));
        }
        other => panic!("expected UnterminatedDefine, got {:?}", other),
    }
}

#[test]
fn test_shell_assignment_is_rejected() {
    assert!(matches!(
        parse_err("files != ls\n"),
        ParseError::UnsupportedShellAssignment { .. }
    ));
    assert!(matches!(
        parse_err("define files !=\nls\nendef\n"),
        ParseError::UnsupportedShellAssignment { .. }
    ));
}

#[test]
fn test_expansion_failure_in_simple_assignment() {
    let err = parse_err("x = $(x)\ny := $(x)\n");
    match &err {
        ParseError::Expansion { source, location } => {
            assert_eq!(source.recursive_variable(), Some("x"));
            assert_eq!(location, &SourceLocation::new("Makefile", 2));
        }
        other => panic!("expected Expansion, got {:?}", other),
    }
}

#[test]
fn test_error_keeps_earlier_definitions() {
    let mut parser = ParseContext::new();
    assert!(parser.parse_str("a = 1\nbad line\nb = 2\n", "Makefile").is_err());
    assert!(parser.variables().contains("a"));
    assert!(!parser.variables().contains("b"));
}

#[test]
fn test_io_error() {
    let mut parser = ParseContext::new();
    let err = parser.parse_file(&b"x = \xff\n"[..], "bad.mk").unwrap_err();
    assert!(matches!(err, ParseError::Io { ref source_name, .. } if source_name == "bad.mk"));
    assert_eq!(err.location(), None);
}

// ═══════════════════════════════════════════════════════════════════════
// Incremental Parsing
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_parse_line_and_finish() {
    let mut parser = ParseContext::new();
    parser.parse_line("x = a \\", SourceLocation::new("repl", 1)).unwrap();
    assert!(parser.in_continuation());
    parser.parse_line("b", SourceLocation::new("repl", 2)).unwrap();
    assert!(!parser.in_continuation());
    parser.finish().unwrap();
    assert_eq!(parser.eval("x").unwrap(), "a b");
}

#[test]
fn test_multiple_sources_share_a_table() {
    let mut parser = ParseContext::new();
    parser.parse_str("CFLAGS = -O2\n", "config.mk").unwrap();
    parser.parse_str("CFLAGS += -g\n", "Makefile").unwrap();
    assert_eq!(parser.eval("CFLAGS").unwrap(), "-O2 -g");
    assert_eq!(
        parser.variables().get("CFLAGS").and_then(|v| v.location.clone()),
        Some(SourceLocation::new("Makefile", 1))
    );
}
