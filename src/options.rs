use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use thiserror::Error;

const ABOUT: &str = "Now Pensions Scraper\n\n\
    Automates the process of logging in to the Now Pensions website to retrieve your fund value";

/// Command-line options. Built once in `main` and passed by reference to every stage.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "nowpensions-scraper",
    about = ABOUT,
    disable_help_flag = true
)]
pub struct Options {
    /// The code for your organisation.
    #[arg(short, long, value_name = "code")]
    pub organisation: Option<String>,

    /// Your Now Pensions account username.
    #[arg(short, long, value_name = "username")]
    pub username: Option<String>,

    /// Your Now Pensions account password.
    #[arg(short, long, value_name = "password")]
    pub password: Option<String>,

    /// Google spreadsheet id to append the result to.
    #[arg(short, long, value_name = "spreadsheet id")]
    pub save: Option<String>,

    /// Service account JSON key file, required with --save.
    #[arg(short, long, value_name = "path")]
    pub key: Option<PathBuf>,

    /// Print progress while logging in and scraping.
    #[arg(short, long)]
    pub verbose: bool,

    /// Displays this usage information.
    #[arg(short, long)]
    pub help: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("usage requested")]
    Help,
    #[error("missing required option --{0}")]
    Missing(&'static str),
    #[error("--save requires --key")]
    SaveWithoutKey,
}

/// Where to publish the result, present only when `--save` was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveTarget<'a> {
    pub spreadsheet_id: &'a str,
    pub key_file: &'a std::path::Path,
}

impl Options {
    pub fn validate(&self) -> Result<(), UsageError> {
        if self.help {
            return Err(UsageError::Help);
        }
        if self.organisation.is_none() {
            return Err(UsageError::Missing("organisation"));
        }
        if self.username.is_none() {
            return Err(UsageError::Missing("username"));
        }
        if self.password.is_none() {
            return Err(UsageError::Missing("password"));
        }
        if self.save.is_some() && self.key.is_none() {
            return Err(UsageError::SaveWithoutKey);
        }
        Ok(())
    }

    pub fn usage() -> String {
        Self::command().render_help().to_string()
    }

    // The accessors below are only meaningful after `validate` succeeded.

    pub fn organisation(&self) -> &str {
        self.organisation.as_deref().unwrap_or_default()
    }

    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or_default()
    }

    pub fn password(&self) -> &str {
        self.password.as_deref().unwrap_or_default()
    }

    pub fn save_target(&self) -> Option<SaveTarget<'_>> {
        match (&self.save, &self.key) {
            (Some(spreadsheet_id), Some(key_file)) => Some(SaveTarget {
                spreadsheet_id,
                key_file,
            }),
            _ => None,
        }
    }
}
