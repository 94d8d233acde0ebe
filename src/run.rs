use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use thiserror::Error;
use tracing::{debug, info};

use crate::billing::Totals;
use crate::cli::{Command, Mode, Opts};
use crate::config::{self, Config};
use crate::error::{ConfigError, ExpenseError};
use crate::expenses::{self, Entry};
use crate::input;
use crate::invoices::{self, Invoice};
use crate::output::{self, OutputError};
use crate::template::{Missing, TemplateError};
use crate::templates::Markup;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("IO Error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("Input Error: {source}")]
    Input {
        #[from]
        source: inquire::error::InquireError,
    },

    #[error("Invalid --date '{value}': {source}")]
    Date {
        value: String,
        source: chrono::ParseError,
    },

    #[error("Reading template {}: {source}", path.display())]
    Template { path: PathBuf, source: io::Error },

    #[error("{source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("{source}")]
    Expenses {
        #[from]
        source: ExpenseError,
    },

    #[error("{source}")]
    Render {
        #[from]
        source: TemplateError,
    },

    #[error("{source}")]
    Output {
        #[from]
        source: OutputError,
    },
}

impl From<Mode> for Markup {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Text => Markup::Text,
            Mode::Tex | Mode::Pdf => Markup::Tex,
        }
    }
}

pub fn run(opts: Opts) -> Result<(), RunError> {
    let path = config::config_path(opts.config_dir.as_deref())?;

    match opts.subcommand {
        Some(Command::Setup) => setup(&path),
        Some(Command::ShowConfig) => show_config(&path),
        None => generate(&opts, &path),
    }
}

fn setup(path: &Path) -> Result<(), RunError> {
    let current = match config::load(path) {
        Ok(current) => Some(current),
        Err(ConfigError::NotFound { .. }) => None,
        Err(error) => return Err(error.into()),
    };
    let config = input::config(current.as_ref())?;

    println!("\n{}", serde_json::to_string_pretty(&config).map_err(ConfigError::from)?);
    if input::confirm()? {
        config::save(path, &config)?;
        println!("Saved {}", path.display());
    }
    Ok(())
}

fn show_config(path: &Path) -> Result<(), RunError> {
    let config = config::load(path)?;
    println!("{}\n", path.display());
    println!("{}", serde_json::to_string_pretty(&config).map_err(ConfigError::from)?);
    Ok(())
}

/// Loads the configuration, prompting for one when allowed.
fn load_config(path: &Path, interactive: bool) -> Result<Config, RunError> {
    match config::load(path) {
        Err(ConfigError::NotFound { .. }) if interactive => {
            let config = input::config(None)?;
            config::save(path, &config)?;
            info!(path = %path.display(), "created configuration");
            Ok(config)
        }
        result => Ok(result?),
    }
}

fn load_expenses(path: Option<&Path>) -> Result<Vec<Entry>, ExpenseError> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "reading expenses");
            expenses::from_reader(BufReader::new(File::open(path)?))
        }
        None => {
            debug!("reading expenses from stdin");
            expenses::from_reader(io::stdin().lock())
        }
    }
}

fn invoice_date(date: Option<&str>) -> Result<NaiveDate, RunError> {
    match date {
        Some(value) => value.parse().map_err(|source| RunError::Date {
            value: value.to_string(),
            source,
        }),
        None => Ok(Local::now().date_naive()),
    }
}

fn load_layout(path: Option<&Path>, markup: Markup) -> Result<String, RunError> {
    match path {
        Some(path) => fs::read_to_string(path).map_err(|source| RunError::Template {
            path: path.to_path_buf(),
            source,
        }),
        None => Ok(invoices::layout(markup).to_string()),
    }
}

fn generate(opts: &Opts, path: &Path) -> Result<(), RunError> {
    let date = invoice_date(opts.date.as_deref())?;
    let config = load_config(path, opts.interactive)?;
    let entries = load_expenses(opts.expenses.as_deref())?;
    for (index, entry) in entries.iter().enumerate() {
        debug!(index, kind = %entry.kind(), "parsed expense entry");
    }

    let totals = Totals::calculate(&entries)?;
    debug!(rates = totals.rates.len(), "calculated totals\n{}", totals);

    let recipient = input::unescape_lines(opts.recipient.as_deref().unwrap_or_default());
    let markup = Markup::from(opts.mode);
    let missing = if opts.allow_missing {
        Missing::Empty
    } else {
        Missing::Fail
    };
    let layout = load_layout(opts.template.as_deref(), markup)?;
    let rendered = Invoice::new(&config, &recipient, date, &totals)
        .render(&layout, markup, missing)?;

    match opts.mode {
        Mode::Text | Mode::Tex => output::write(&rendered, opts.output.as_deref())?,
        Mode::Pdf => {
            let number = config.invoice_number();
            let target = opts
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(format!("invoice-{}.pdf", number)));
            let scratch = output::scratch_dir(&number);
            output::typeset(&rendered, &opts.engine, &scratch, &target)?;
        }
    }

    let next = config.next();
    config::save(path, &next)?;
    info!(id = next.id, "next invoice number saved");
    Ok(())
}
