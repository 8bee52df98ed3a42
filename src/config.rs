//! Parses config file
use std::{
    collections::HashMap,
    env,
    fs::OpenOptions,
    io::Read,
    path::{Path, PathBuf},
};

use palfx::PalFxDef;
use serde::Deserialize;
use sff::EXPIRY_LIMIT;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Character mode for archive loads
    pub character: bool,
    /// Reap cycles a cached archive survives without being loaded again
    pub expiry_limit: u32,
    /// Named effects for `extract --fx`
    pub palfx: HashMap<String, PalFxDef>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            character: false,
            expiry_limit: EXPIRY_LIMIT,
            palfx: HashMap::new(),
        }
    }
}

pub static CONFIG_FILE_NAME: &str = "config.toml";

/// Parse `config.toml` in the same folder as the binary. No file means defaults.
pub fn parse_config() -> eyre::Result<Config> {
    let path = match env::current_exe() {
        Ok(path) => path
            .parent()
            .map(|parent| parent.join(CONFIG_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME)),
        Err(_) => PathBuf::from(CONFIG_FILE_NAME),
    };

    if !path.exists() {
        log::debug!("No {} found, using defaults", path.display());
        return Ok(Config::default());
    }

    parse_config_from_file(path.as_path())
}

pub fn parse_config_from_file(path: &Path) -> eyre::Result<Config> {
    let mut file = OpenOptions::new().read(true).open(path.as_os_str())?;
    let mut buffer = String::new();

    file.read_to_string(&mut buffer)?;

    parse_config_from_str(&buffer)
}

pub fn parse_config_from_str(s: &str) -> eyre::Result<Config> {
    let config: Config = toml::from_str(s)?;

    Ok(config)
}
