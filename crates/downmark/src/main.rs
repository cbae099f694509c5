//! downmark CLI - convert AsciiDoc documents to Markdown.
//!
//! Reads one AsciiDoc document from a file or stdin and writes the Markdown
//! to stdout or a file next to the input.

mod convert;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use convert::ConvertArgs;
use output::Output;

/// downmark - convert AsciiDoc to Markdown.
#[derive(Parser)]
#[command(name = "downmark", version, about)]
struct Cli {
    #[command(flatten)]
    args: ConvertArgs,
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables DEBUG level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = cli.args.execute() {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
