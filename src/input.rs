use inquire::{error::InquireError, Confirm, CustomType, Text};

use crate::config::Config;

type InputResult<T> = Result<T, InquireError>;

/// Turns literal `\n` sequences into line breaks.
pub fn unescape_lines(s: &str) -> String {
    s.replace("\\n", "\n")
}

fn address() -> InputResult<String> {
    let mut count = 0;
    let mut addr_lines: Vec<String> = Vec::new();
    loop {
        count += 1;

        let line = Text::new(&format!("Address Line {}:", count))
            .with_help_message("Hit <enter> on an empty line to stop input, \\n also breaks lines")
            .prompt()?;
        if line.is_empty() {
            break;
        }
        addr_lines.push(unescape_lines(&line));
    }

    Ok(addr_lines.join("\n").trim().to_string())
}

pub fn config(current: Option<&Config>) -> InputResult<Config> {
    println!("Gathering configuration options.");

    let mut name = Text::new("Name:");
    if let Some(current) = current {
        name = name.with_default(&current.name);
    }
    let name = unescape_lines(&name.prompt()?);
    let address = address()?;
    let email = Text::new("Email:")
        .with_default(current.map(|c| c.email.as_str()).unwrap_or(""))
        .prompt()?;
    let currency = Text::new("Currency:")
        .with_default(current.map(|c| c.currency.as_str()).unwrap_or("$"))
        .with_help_message("Symbol or code printed before amounts")
        .prompt()?;
    let id: u64 = CustomType::new("Next invoice number:")
        .with_default(current.map(|c| c.id).unwrap_or(1))
        .with_error_message("Please type a valid number")
        .prompt()?;

    Ok(Config {
        id,
        ..Config::new(name, address, email, currency)
    })
}

pub fn confirm() -> InputResult<bool> {
    Confirm::new("Confirm").with_default(true).prompt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaped_line_breaks() {
        assert_eq!(unescape_lines(r"1 Main St\nSpringfield"), "1 Main St\nSpringfield");
        assert_eq!(unescape_lines("no breaks"), "no breaks");
    }
}
