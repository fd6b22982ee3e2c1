//! Command line configuration.

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Command line configuration for lessonmark.
#[derive(Debug, Clone, Parser)]
#[command(name = "lessonmark", version, about, long_about = None)]
pub struct Config {
    /// Markdown file to render, `-` for stdin
    #[arg(default_value = "-")]
    pub input: PathBuf,

    /// Output file, stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Renderer instance id used to namespace code block identifiers
    #[arg(long, default_value = "preview")]
    pub id: String,

    /// Wrap the fragment in a standalone HTML page
    #[arg(long)]
    pub page: bool,

    /// Page title, defaults to the input file name
    #[arg(long)]
    pub title: Option<String>,

    /// Copy the raw source of the code block with this index to the clipboard
    #[arg(long, value_name = "INDEX")]
    pub copy: Option<usize>,

    /// Open the output file in the browser
    #[arg(long)]
    pub open: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Config {
    /// Parses configuration from command line arguments.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Validates configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the input file does not exist, the instance id is
    /// empty or contains whitespace, or `--open` is given without an output
    /// file.
    pub fn validate(&self) -> Result<()> {
        if !self.reads_stdin() && !self.input.exists() {
            bail!("Input file does not exist: {}", self.input.display());
        }

        if self.id.is_empty() || self.id.chars().any(char::is_whitespace) {
            bail!("Instance id must be non-empty and contain no whitespace");
        }

        if self.open && self.output.is_none() {
            bail!("--open requires --output");
        }

        Ok(())
    }

    /// Whether markdown is read from standard input.
    pub fn reads_stdin(&self) -> bool {
        self.input.as_os_str() == "-"
    }

    /// Reads the markdown source.
    ///
    /// # Errors
    ///
    /// Returns error if the input cannot be read or is not UTF8.
    pub fn read_input(&self) -> Result<String> {
        if self.reads_stdin() {
            return std::io::read_to_string(std::io::stdin()).context("Failed to read stdin");
        }

        std::fs::read_to_string(&self.input)
            .with_context(|| format!("Failed to read {}", self.input.display()))
    }

    /// Returns page title from configuration or input file name.
    pub fn page_title(&self) -> String {
        if let Some(title) = &self.title {
            return title.clone();
        }

        if self.reads_stdin() {
            return "Preview".to_string();
        }

        self.input
            .file_stem()
            .and_then(|n| n.to_str())
            .map(String::from)
            .unwrap_or_else(|| "Preview".to_string())
    }

    /// Default tracing filter for the verbosity level.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "lessonmark=warn",
            1 => "lessonmark=debug",
            _ => "lessonmark=trace",
        }
    }
}
