//! Command line arguments.

use std::path::PathBuf;

use anyhow::{bail, Result};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG: &str = "config.json";

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    /// Configuration file path
    pub config: PathBuf,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            config: PathBuf::from(DEFAULT_CONFIG),
        }
    }
}

impl Args {
    /// Parse arguments, excluding the program name.
    ///
    /// Accepts `--config <path>`, `--config=<path>` and `-c <path>`.
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parsed = Self::default();
        let mut args = args.into_iter().map(Into::into);
        while let Some(arg) = args.next() {
            if let Some(path) = arg.strip_prefix("--config=") {
                parsed.config = PathBuf::from(path);
                continue;
            }
            match arg.as_str() {
                "--config" | "-c" => match args.next() {
                    Some(path) => parsed.config = PathBuf::from(path),
                    None => bail!("{} requires a path", arg),
                },
                other => bail!("unknown argument: {}", other),
            }
        }
        Ok(parsed)
    }
}
