use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

const APP_DIR: &str = "invoicer";
const CONFIG_FILE: &str = "config.json";

/// The operator's details and the next invoice number.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct Config {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "first_id")]
    pub id: u64,
}

fn default_currency() -> String {
    "$".to_string()
}

fn first_id() -> u64 {
    1
}

impl Config {
    pub fn new(name: String, address: String, email: String, currency: String) -> Self {
        Self {
            name,
            address,
            email,
            currency,
            id: first_id(),
        }
    }

    /// The invoice number for this configuration, five digits zero-padded.
    pub fn invoice_number(&self) -> String {
        format!("{:05}", self.id)
    }

    /// The configuration to persist once this invoice has been issued.
    pub fn next(&self) -> Self {
        Self {
            id: self.id + 1,
            ..self.clone()
        }
    }
}

/// Directory holding the configuration: the override if given, else the
/// platform configuration directory.
pub fn config_dir(dir: Option<&Path>) -> Result<PathBuf, ConfigError> {
    match dir {
        Some(dir) => Ok(dir.to_path_buf()),
        None => BaseDirs::new()
            .map(|dirs| dirs.config_dir().join(APP_DIR))
            .ok_or(ConfigError::NoConfigDir),
    }
}

pub fn config_path(dir: Option<&Path>) -> Result<PathBuf, ConfigError> {
    Ok(config_dir(dir)?.join(CONFIG_FILE))
}

pub fn load(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    debug!(path = %path.display(), "loading configuration");
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Writes the configuration next to `path` and renames it into place.
pub fn save(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let updated_path = path.with_extension("updated");
    let mut writer = BufWriter::new(File::create(&updated_path)?);
    serde_json::to_writer_pretty(&mut writer, config)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    drop(writer);

    fs::rename(&updated_path, path)?;
    debug!(path = %path.display(), id = config.id, "saved configuration");
    Ok(())
}
