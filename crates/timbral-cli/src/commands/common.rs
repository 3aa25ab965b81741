//! Shared CLI helpers used across multiple commands.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Args;
use timbral_config::EngineConfig;

/// Options accepted by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Engine settings file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Sample rate in Hz, overriding the settings file
    #[arg(long, global = true)]
    pub sample_rate: Option<u32>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Load settings from `--config` (or defaults) and apply flag overrides.
pub fn load_config(global: &GlobalOpts) -> anyhow::Result<EngineConfig> {
    let mut config = match &global.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(rate) = global.sample_rate {
        config.sample_rate = rate;
    }
    config.validate()?;
    Ok(config)
}

/// A running flag cleared by Ctrl+C.
pub fn stop_on_ctrlc() -> anyhow::Result<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        eprintln!("\nStopping...");
        r.store(false, Ordering::Release);
    })?;
    Ok(running)
}
