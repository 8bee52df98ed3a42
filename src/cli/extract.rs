use super::*;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::modules::extract::{sprite_to_rgba, ExtractOptions};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct ExtractCliStruct {
    // This is just dummy command because we are already in the command
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Extract {
        /// Path to the .sff file
        file: PathBuf,
        /// Sprite group
        #[arg(allow_negative_numbers = true)]
        group: i16,
        /// Sprite number
        #[arg(allow_negative_numbers = true)]
        number: i16,
        /// Output .png
        out: PathBuf,
        /// Draws the sprite with palette 1,N
        #[arg(short, long)]
        palette: Option<i16>,
        /// Applies a named effect from the config
        #[arg(long)]
        fx: Option<String>,
        /// Ticks the effect runs before the frame is taken
        #[arg(long, default_value_t = 0)]
        ticks: u32,
        /// Config file to use instead of the one next to the binary
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

pub struct Extract;
impl Cli for Extract {
    fn name(&self) -> &'static str {
        "extract"
    }

    fn cli(&self) -> CliRes {
        let cli = ExtractCliStruct::parse();

        let Commands::Extract {
            file,
            group,
            number,
            out,
            palette,
            fx,
            ticks,
            config,
        } = cli.command;

        let Some(config) = load_config(config.as_deref()) else {
            return CliRes::Err;
        };

        let fx = match fx {
            Some(name) => match config.palfx.get(&name) {
                Some(def) => Some(def.clone()),
                None => {
                    println!("No effect named \"{}\" in config", name);
                    return CliRes::Err;
                }
            },
            None => None,
        };

        let cache = SffCache::with_expiry_limit(config.expiry_limit);
        let Some(sff) = load_sff(&cache, &file, &config) else {
            return CliRes::Err;
        };

        let options = ExtractOptions { palette, fx, ticks };

        let img = match sprite_to_rgba(&sff, group, number, &options) {
            Ok(img) => img,
            Err(err) => {
                println!("{:?}", err);
                return CliRes::Err;
            }
        };

        if let Err(err) = img.save(&out) {
            println!("Cannot write {}: {}", out.display(), err);
            return CliRes::Err;
        }

        log::info!("Wrote {},{} to {}", group, number, out.display());

        CliRes::Ok
    }

    fn cli_help(&self) {
        println!(
            "\
Writes one sprite to a .png

<.sff> <group> <number> <out .png> [--palette N] [--fx NAME] [--ticks T]"
        )
    }
}
