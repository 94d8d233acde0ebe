/*
 * Render an invoice from billed hours and expenses
 *
 * Requirements:
 * Keep the operator's details in a config file
 * - name, address, email, currency
 * - the next invoice number, bumped after every invoice
 * Generate an invoice
 * - read expense entries (hours at a rate, itemized expenses, flat fees)
 * - total hours, rates and amount
 * - fill in a text or LaTeX layout, built-in or supplied
 * - optionally typeset the LaTeX into a PDF
 */

mod billing;
mod cli;
mod config;
mod error;
mod expenses;
mod input;
mod invoices;
mod output;
mod run;
mod template;
mod templates;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Opts;

fn init_logging(verbose: bool) {
    let default = if verbose { "invoicer=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let opts = Opts::parse();
    init_logging(opts.verbose);

    match run::run(opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", error);
            ExitCode::FAILURE
        }
    }
}
