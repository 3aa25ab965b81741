//! Timbral CLI - play, render and analyze from the command line.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::common::GlobalOpts;

#[derive(Parser)]
#[command(name = "timbral")]
#[command(author, version, about = "Timbral synthesizer and spectrum analyzer", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the synth, guitar or drums from line commands on stdin
    Play(commands::play::PlayArgs),

    /// Play a score file in real time
    Score(commands::score::ScoreArgs),

    /// Render a score offline to a WAV file
    Render(commands::render::RenderArgs),

    /// Show the spectrum and dominant frequency of live or recorded audio
    Analyze(commands::analyze::AnalyzeArgs),

    /// List audio devices
    Devices(commands::devices::DevicesArgs),

    /// Create or show engine settings
    Config(commands::config::ConfigArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    match cli.command {
        Commands::Play(args) => commands::play::run(args, &cli.global),
        Commands::Score(args) => commands::score::run(args, &cli.global),
        Commands::Render(args) => commands::render::run(args, &cli.global),
        Commands::Analyze(args) => commands::analyze::run(args, &cli.global),
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Config(args) => commands::config::run(args, &cli.global),
    }
}
