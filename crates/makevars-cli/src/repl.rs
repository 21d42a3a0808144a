//! Interactive session
//!
//! Assignments, directives and `define` blocks are parsed into the session's
//! table; any other line is expanded and its value printed.

use makevars::{ParseContext, SourceLocation};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Label for locations of lines typed at the prompt
const SOURCE_NAME: &str = "<repl>";

/// A REPL session over one parse context.
struct Session {
    parser: ParseContext,
    line_number: usize,
}

impl Session {
    fn new(parser: ParseContext) -> Self {
        Self {
            parser,
            line_number: 0,
        }
    }

    fn prompt(&self) -> &'static str {
        if self.parser.in_define() || self.parser.in_continuation() {
            "... "
        } else {
            "makevars> "
        }
    }

    /// Process one line of input, returning the text to display, if any.
    ///
    /// This is the testable core of the REPL loop.
    fn process_line(&mut self, line: &str) -> Option<String> {
        self.line_number += 1;
        let location = SourceLocation::new(SOURCE_NAME, self.line_number);

        if self.parser.is_statement(line) {
            return match self.parser.parse_line(line, location) {
                Ok(()) => None,
                Err(err) => {
                    self.parser.reset();
                    Some(err.render())
                }
            };
        }

        match self.parser.expand(line) {
            Ok(value) => Some(format!("{}\n", value)),
            Err(err) => Some(err.render(Some(&location))),
        }
    }

    /// Abandon a half-entered statement.
    fn cancel(&mut self) {
        self.parser.reset();
    }
}

/// Run the REPL until end of input.
pub fn run(parser: ParseContext) -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new()?;
    let mut session = Session::new(parser);

    loop {
        match editor.readline(session.prompt()) {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());
                if let Some(text) = session.process_line(&line) {
                    print!("{}", text);
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C: cancel current input
                session.cancel();
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    if let Err(err) = session.parser.finish() {
        eprint!("{}", err.render());
    }
    Ok(())
}
