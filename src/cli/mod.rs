use std::path::Path;

use sff::{CachedSff, SffCache};

use crate::config::{parse_config, parse_config_from_file, Config};

use self::{extract::Extract, info::Info};

mod extract;
mod info;

pub enum CliRes {
    Ok,
    Err,
    NoCli,
}

pub trait Cli {
    fn name(&self) -> &'static str;
    /// Each module has to handle the arguments by itself.
    fn cli(&self) -> CliRes;
    fn cli_help(&self);
}

// Add new modules here.
const MODULES: &[&dyn Cli] = &[&Info, &Extract];

pub fn help() {
    println!(
        "\
sffkit

Available modules:"
    );

    for module in MODULES {
        println!();
        println!("{}", module.name());
        module.cli_help();
    }
}

/// Runs command-line options
pub fn cli() -> CliRes {
    let mut args = std::env::args().skip(1);

    let Some(command) = args.next() else {
        return CliRes::NoCli;
    };

    for module in MODULES {
        if command == module.name() {
            return module.cli();
        }
    }

    CliRes::NoCli
}

/// `--config` if given, otherwise `config.toml` next to the binary.
fn load_config(path: Option<&Path>) -> Option<Config> {
    let res = match path {
        Some(path) => parse_config_from_file(path),
        None => parse_config(),
    };

    match res {
        Ok(config) => Some(config),
        Err(err) => {
            println!("Error parsing config.toml: {}", err);
            None
        }
    }
}

fn load_sff(cache: &SffCache, path: &Path, config: &Config) -> Option<CachedSff> {
    match cache.load(path, config.character) {
        Ok(sff) => Some(sff),
        Err(err) => {
            println!("Cannot load {}: {}", path.display(), err);
            None
        }
    }
}
