use clap::{Parser, ValueEnum, ValueHint};
use std::path::PathBuf;

/* Argument Stucture
 *
 * invoicer --to <recipient> [--expenses <file>] [--mode text|tex|pdf]
 *          [--output <file>] [--template <file>] [--date <date>]
 * invoicer setup
 * invoicer show-config
 */

#[derive(Parser)]
#[clap(version, about = "Render invoices from billed hours and expenses")]
#[command(subcommand_negates_reqs = true)]
pub struct Opts {
    /// Directory holding config.json
    #[clap(short, long, env = "INVOICER_CONFIG_DIR", global = true,
        value_hint=ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    /// Name and address of the invoice recipient, use \n for line breaks
    #[clap(short = 't', long = "to", required = true)]
    pub recipient: Option<String>,

    /// JSON array of expense entries, read from stdin when omitted
    #[clap(short, long, value_hint=ValueHint::FilePath)]
    pub expenses: Option<PathBuf>,

    /// Where to write the invoice, stdout for text and tex when omitted
    #[clap(short, long, value_hint=ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Output format
    #[clap(short, long, value_enum, default_value_t = Mode::Text)]
    pub mode: Mode,

    /// Layout template to use instead of the built-in one
    #[clap(long, value_hint=ValueHint::FilePath)]
    pub template: Option<PathBuf>,

    /// Invoice date (YYYY-MM-DD), defaults to today
    #[clap(long)]
    pub date: Option<String>,

    /// TeX engine used for pdf output
    #[clap(long, default_value = "pdflatex",
        value_hint=ValueHint::CommandName)]
    pub engine: String,

    /// Substitute unknown template placeholders with nothing
    #[clap(long)]
    pub allow_missing: bool,

    /// Prompt for the configuration if none exists
    #[clap(short, long)]
    pub interactive: bool,

    /// Log progress to stderr
    #[clap(short, long, global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub subcommand: Option<Command>,
}

#[derive(Parser)]
pub enum Command {
    /// Create or replace the configuration interactively
    Setup,

    /// Show where the configuration lives and what it holds
    ShowConfig,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum Mode {
    /// Plain text summary table
    Text,
    /// LaTeX source
    Tex,
    /// PDF typeset by an external TeX engine
    Pdf,
}
