//! Engine settings command.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use timbral_config::EngineConfig;

use super::common::{GlobalOpts, load_config};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Write a settings file with every default filled in
    Init {
        /// Destination file
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective settings as TOML
    Show,
}

pub fn run(args: ConfigArgs, global: &GlobalOpts) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Init { path, force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            let mut config = EngineConfig::default();
            if let Some(rate) = global.sample_rate {
                config.sample_rate = rate;
            }
            config.validate()?;
            config.save(&path)?;
            println!("Wrote settings to {}", path.display());
        }
        ConfigCommand::Show => {
            let config = load_config(global)?;
            print!("{}", config.to_toml()?);
        }
    }
    Ok(())
}
