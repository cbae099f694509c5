//! Document conversion command.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use downmark_config::{AttributeOverride, CliSettings, Config, is_valid_attribute_name};
use downmark_core::{ConvertOptions, convert};

use crate::error::CliError;
use crate::output::Output;

/// Path argument standing for stdin or stdout.
const STDIO: &str = "-";

/// Arguments for converting a document.
#[derive(Args)]
pub(crate) struct ConvertArgs {
    /// AsciiDoc file to convert (default: stdin).
    input: Option<PathBuf>,

    /// Output file, `-` for stdout (default: input path with the configured
    /// extension, or stdout when reading stdin).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Set a document attribute: NAME, NAME=VALUE, or NAME! to unset a
    /// configured one.
    #[arg(short, long = "attribute", value_name = "NAME[=VALUE]")]
    attributes: Vec<String>,

    /// Path to configuration file (default: auto-discover downmark.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

/// Where the AsciiDoc source comes from.
#[derive(Debug, PartialEq, Eq)]
enum Source {
    Stdin,
    File(PathBuf),
}

/// Where the Markdown goes.
#[derive(Debug, PartialEq, Eq)]
enum Destination {
    Stdout,
    File(PathBuf),
}

impl ConvertArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            attributes: self
                .attributes
                .iter()
                .map(|raw| parse_attribute(raw))
                .collect::<Result<_, _>>()?,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            tracing::debug!(path = %path.display(), "Using configuration file");
        }

        let source = match self.input {
            Some(path) if path.as_os_str() != STDIO => Source::File(path),
            _ => Source::Stdin,
        };
        let destination =
            resolve_destination(&source, self.output.as_deref(), &config.output.extension)?;

        let adoc = read_source(&source)?;
        let options = ConvertOptions::new().with_attributes(config.attributes);
        let mut markdown = convert(&adoc, &options);
        markdown.push('\n');

        match destination {
            Destination::Stdout => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(markdown.as_bytes())?;
                stdout.flush()?;
            }
            Destination::File(path) => {
                fs::write(&path, markdown).map_err(|source| CliError::File {
                    path: path.clone(),
                    source,
                })?;
                if let Source::File(input) = &source {
                    Output::new().success(&format!(
                        "Converted {} to {}",
                        input.display(),
                        path.display()
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Parse a `-a` argument.
fn parse_attribute(raw: &str) -> Result<AttributeOverride, CliError> {
    let change = if let Some((name, value)) = raw.split_once('=') {
        AttributeOverride::Set(name.to_owned(), value.to_owned())
    } else if let Some(name) = raw.strip_suffix('!') {
        AttributeOverride::Unset(name.to_owned())
    } else {
        AttributeOverride::Set(raw.to_owned(), String::new())
    };

    let name = match &change {
        AttributeOverride::Set(name, _) | AttributeOverride::Unset(name) => name,
    };
    if is_valid_attribute_name(name) {
        Ok(change)
    } else {
        Err(CliError::InvalidAttribute(raw.to_owned()))
    }
}

fn resolve_destination(
    source: &Source,
    output: Option<&Path>,
    extension: &str,
) -> Result<Destination, CliError> {
    match (output, source) {
        (Some(path), _) if path.as_os_str() == STDIO => Ok(Destination::Stdout),
        (Some(path), _) => Ok(Destination::File(path.to_path_buf())),
        (None, Source::Stdin) => Ok(Destination::Stdout),
        (None, Source::File(input)) => {
            let derived = input.with_extension(extension);
            if derived == *input {
                return Err(CliError::OverwritesInput(derived));
            }
            Ok(Destination::File(derived))
        }
    }
}

fn read_source(source: &Source) -> Result<String, CliError> {
    match source {
        Source::Stdin => {
            let mut adoc = String::new();
            io::stdin().lock().read_to_string(&mut adoc)?;
            Ok(adoc)
        }
        Source::File(path) => fs::read_to_string(path).map_err(|source| CliError::File {
            path: path.clone(),
            source,
        }),
    }
}
