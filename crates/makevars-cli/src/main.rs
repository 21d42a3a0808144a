//! makevars command line interface
//!
//! Loads variable definitions from a makefile and prints their values the
//! way GNU Make would expand them.
//!
//! # Usage
//!
//! ```bash
//! # Print every variable, in definition order
//! makevars Makefile
//!
//! # Print selected variables, with a command-line override
//! makevars -D CC=clang Makefile CFLAGS objects
//!
//! # Expand arbitrary text after loading
//! makevars -e '$(patsubst %.c,%.o,$(sources))' Makefile
//!
//! # Explore interactively
//! makevars -i Makefile
//! ```

mod repl;

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use makevars::{EvalContext, ParseContext};

/// GNU Make's exit status for fatal errors
const FATAL_STATUS: u8 = 2;

#[derive(Parser)]
#[command(name = "makevars")]
#[command(version)]
#[command(about = "Evaluate makefile variables the way GNU Make does")]
#[command(long_about = None)]
struct Cli {
    /// Makefile to read (`-` for stdin)
    #[arg(required_unless_present = "interactive")]
    file: Option<PathBuf>,

    /// Variables to print (default: all, in definition order)
    names: Vec<String>,

    /// Define a command-line variable, e.g. `-D CC=clang`
    #[arg(short = 'D', long = "define", value_name = "NAME=VALUE")]
    defines: Vec<String>,

    /// Expand TEXT after loading and print the result
    #[arg(short = 'e', long = "expand", value_name = "TEXT")]
    expand: Vec<String>,

    /// Warn about references to undefined variables
    #[arg(long)]
    warn_undefined_variables: bool,

    /// Maximum number of recursive variables expanding at once
    #[arg(long, value_name = "N", default_value_t = EvalContext::default().max_depth)]
    max_depth: usize,

    /// Start an interactive session after loading
    #[arg(short, long)]
    interactive: bool,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<makevars::Error>() {
                Some(err) => eprint!("{}", err.render(None)),
                None => eprintln!("makevars: {:#}", err),
            }
            ExitCode::from(FATAL_STATUS)
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let ctx = EvalContext::new()
        .with_max_depth(cli.max_depth)
        .with_warn_undefined(cli.warn_undefined_variables);
    let mut parser = ParseContext::with_context(ctx);

    for definition in &cli.defines {
        parser
            .define_command_line(definition)
            .map_err(makevars::Error::from)?;
    }

    if let Some(path) = &cli.file {
        load(&mut parser, path)?;
    }

    if cli.interactive {
        return repl::run(parser);
    }

    print_results(&parser, cli)
}

fn load(parser: &mut ParseContext, path: &Path) -> anyhow::Result<()> {
    tracing::debug!(path = %path.display(), "loading makefile");
    let result = if path.as_os_str() == "-" {
        parser.parse_file(io::stdin().lock(), "<stdin>")
    } else {
        let file = File::open(path).with_context(|| format!("{}: cannot open", path.display()))?;
        parser.parse_file(BufReader::new(file), &path.display().to_string())
    };
    result.map_err(makevars::Error::from)?;
    Ok(())
}

fn print_results(parser: &ParseContext, cli: &Cli) -> anyhow::Result<()> {
    let names: Vec<&str> = if cli.names.is_empty() && cli.expand.is_empty() {
        parser.variables().names()
    } else {
        cli.names.iter().map(String::as_str).collect()
    };

    for name in names {
        let value = parser.eval(name).map_err(makevars::Error::from)?;
        println!("{}=\"{}\"", name, value);
    }

    for text in &cli.expand {
        let value = parser.expand(text).map_err(makevars::Error::from)?;
        println!("{}", value);
    }
    Ok(())
}
