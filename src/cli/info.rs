use super::*;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::modules::info::sff_summary;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct InfoCliStruct {
    // This is just dummy command because we are already in the command
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Info {
        /// Path to the .sff file
        file: PathBuf,
        /// Config file to use instead of the one next to the binary
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

pub struct Info;
impl Cli for Info {
    fn name(&self) -> &'static str {
        "info"
    }

    fn cli(&self) -> CliRes {
        let cli = InfoCliStruct::parse();

        let Commands::Info { file, config } = cli.command;

        let Some(config) = load_config(config.as_deref()) else {
            return CliRes::Err;
        };

        let cache = SffCache::with_expiry_limit(config.expiry_limit);
        let Some(sff) = load_sff(&cache, &file, &config) else {
            return CliRes::Err;
        };

        match sff_summary(&sff) {
            Ok(summary) => print!("{}", summary),
            Err(err) => {
                println!("{:?}", err);
                return CliRes::Err;
            }
        }

        CliRes::Ok
    }

    fn cli_help(&self) {
        println!(
            "\
Prints the header and sprite table of an archive

<.sff>"
        )
    }
}
