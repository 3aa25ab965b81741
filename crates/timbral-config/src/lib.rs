//! Engine settings and score files for timbral.
//!
//! - [`EngineConfig`]: TOML settings for the synth, guitar, mixer and
//!   analyzer, with defaults for every field
//! - [`Score`] / [`ScorePlayer`]: the `NOTE,durationMs` score format and its
//!   playback as control events
//!
//! # Example
//!
//! ```rust
//! use timbral_config::{EngineConfig, Score, ScorePlayer};
//!
//! let config = EngineConfig::from_toml("[synth]\nwaveform = \"triangle\"")?;
//! let mut engine = config.build_engine()?;
//!
//! let score = Score::parse("A4,250\nREST,100\nE5,250");
//! let events = ScorePlayer::new(&score).timed_events(engine.sample_rate());
//! assert_eq!(events.len(), 4);
//! # engine.reset();
//! # Ok::<(), timbral_config::ConfigError>(())
//! ```

mod engine_config;
mod error;
mod score;

pub use engine_config::{AnalyzerConfig, EngineConfig, GuitarConfig, MixerConfig, SynthConfig};
pub use error::ConfigError;
pub use score::{MAX_DURATION_MS, SCORE_KEY, Score, ScoreEvent, ScorePlayer};
