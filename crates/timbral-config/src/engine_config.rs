//! Engine settings file.

use serde::{Deserialize, Serialize};
use std::path::Path;

use timbral_synth::{ControlEvent, Engine, MAX_CAPO, Param, Tuning, Waveform};

use crate::error::ConfigError;

/// Engine settings, stored as TOML.
///
/// Every field has a default, so a file only needs the values it changes.
///
/// # TOML Format
///
/// ```toml
/// sample_rate = 96000
/// block_size = 512
///
/// [synth]
/// waveform = "sawtooth"
/// attack = 0.01
/// release = 0.3
/// cutoff = 0.6
///
/// [guitar]
/// tuning = "drop_d"
/// capo = 2
///
/// [mixer]
/// master_gain = 0.5
///
/// [analyzer]
/// fft_size = 1024
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Samples per rendered block.
    pub block_size: usize,
    /// Synth voice settings.
    pub synth: SynthConfig,
    /// Guitar settings.
    pub guitar: GuitarConfig,
    /// Master bus settings.
    pub mixer: MixerConfig,
    /// Spectrum analyzer settings.
    pub analyzer: AnalyzerConfig,
}

/// `[synth]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Waveform name: sine, square, triangle or sawtooth.
    pub waveform: String,
    /// Attack time in seconds.
    pub attack: f32,
    /// Decay time in seconds.
    pub decay: f32,
    /// Sustain level, 0 to 1.
    pub sustain: f32,
    /// Release time in seconds.
    pub release: f32,
    /// Normalized filter cutoff, 0 to 1.
    pub cutoff: f32,
    /// Filter resonance, 0 to 1.
    pub resonance: f32,
    /// Transposition in semitones, −12 to 12.
    pub pitch_offset: f32,
}

/// `[guitar]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuitarConfig {
    /// Tuning preset: standard, drop_d or open_g.
    pub tuning: String,
    /// Capo fret, 0 to 12.
    pub capo: u8,
    /// Master drive amount, 0 to 1.
    pub distortion: f32,
}

/// `[mixer]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerConfig {
    /// Gain applied before the final clip, 0 to 1.
    pub master_gain: f32,
}

/// `[analyzer]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Frame length, a power of two.
    pub fft_size: usize,
    /// Weight of the previous smoothed spectrum, 0 to 1.
    pub smoothing: f64,
    /// Display refresh rate in Hz.
    pub refresh_hz: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 96000,
            block_size: 512,
            synth: SynthConfig::default(),
            guitar: GuitarConfig::default(),
            mixer: MixerConfig::default(),
            analyzer: AnalyzerConfig::default(),
        }
    }
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine.name().to_string(),
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.3,
            cutoff: 1.0,
            resonance: 0.2,
            pitch_offset: 0.0,
        }
    }
}

impl Default for GuitarConfig {
    fn default() -> Self {
        Self {
            tuning: Tuning::Standard.name().to_string(),
            capo: 0,
            distortion: 0.0,
        }
    }
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self { master_gain: 0.5 }
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_size: 1024,
            smoothing: 0.8,
            refresh_hz: 30.0,
        }
    }
}

fn check_range(field: &str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("{} is outside {}..={}", value, min, max),
        ))
    }
}

impl EngineConfig {
    /// Load and validate settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "engine config loaded");
        Ok(config)
    }

    /// Parse and validate settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Save settings to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::write_file(parent, e))?;
        }
        std::fs::write(path, self.to_toml()?).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Serialize settings as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every setting against its accepted range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(8000..=192_000).contains(&self.sample_rate) {
            return Err(ConfigError::invalid(
                "sample_rate",
                format!("{} Hz is outside 8000..=192000", self.sample_rate),
            ));
        }
        if !(1..=16384).contains(&self.block_size) {
            return Err(ConfigError::invalid(
                "block_size",
                format!("{} is outside 1..=16384", self.block_size),
            ));
        }

        self.waveform()?;
        let s = &self.synth;
        check_range("synth.attack", s.attack, 0.0, 10.0)?;
        check_range("synth.decay", s.decay, 0.0, 10.0)?;
        check_range("synth.sustain", s.sustain, 0.0, 1.0)?;
        check_range("synth.release", s.release, 0.0, 10.0)?;
        check_range("synth.cutoff", s.cutoff, 0.0, 1.0)?;
        check_range("synth.resonance", s.resonance, 0.0, 1.0)?;
        check_range("synth.pitch_offset", s.pitch_offset, -12.0, 12.0)?;

        self.tuning()?;
        if self.guitar.capo > MAX_CAPO {
            return Err(ConfigError::invalid(
                "guitar.capo",
                format!("{} is above fret {}", self.guitar.capo, MAX_CAPO),
            ));
        }
        check_range("guitar.distortion", self.guitar.distortion, 0.0, 1.0)?;
        check_range("mixer.master_gain", self.mixer.master_gain, 0.0, 1.0)?;

        let a = &self.analyzer;
        if !a.fft_size.is_power_of_two() || !(8..=65536).contains(&a.fft_size) {
            return Err(ConfigError::invalid(
                "analyzer.fft_size",
                format!("{} must be a power of two in 8..=65536", a.fft_size),
            ));
        }
        check_range("analyzer.smoothing", a.smoothing as f32, 0.0, 0.999)?;
        check_range("analyzer.refresh_hz", a.refresh_hz, 0.1, 240.0)?;
        Ok(())
    }

    /// The configured waveform.
    pub fn waveform(&self) -> Result<Waveform, ConfigError> {
        Waveform::from_name(&self.synth.waveform).ok_or_else(|| {
            ConfigError::invalid(
                "synth.waveform",
                format!("unknown waveform '{}'", self.synth.waveform),
            )
        })
    }

    /// The configured tuning preset.
    pub fn tuning(&self) -> Result<Tuning, ConfigError> {
        Tuning::from_name(&self.guitar.tuning).ok_or_else(|| {
            ConfigError::invalid(
                "guitar.tuning",
                format!("unknown tuning '{}'", self.guitar.tuning),
            )
        })
    }

    /// Control events that bring an engine to these settings.
    pub fn events(&self) -> Result<Vec<ControlEvent>, ConfigError> {
        let s = &self.synth;
        let params = [
            (Param::Attack, s.attack),
            (Param::Decay, s.decay),
            (Param::Sustain, s.sustain),
            (Param::Release, s.release),
            (Param::Cutoff, s.cutoff),
            (Param::Resonance, s.resonance),
            (Param::PitchOffset, s.pitch_offset),
            (Param::Distortion, self.guitar.distortion),
            (Param::MasterGain, self.mixer.master_gain),
        ];

        let mut events = vec![ControlEvent::SetWaveform(self.waveform()?)];
        events.extend(
            params
                .into_iter()
                .map(|(param, value)| ControlEvent::SetParam { param, value }),
        );
        events.push(ControlEvent::SetTuning(self.tuning()?.frequencies()));
        events.push(ControlEvent::SetCapo(self.guitar.capo));
        Ok(events)
    }

    /// Apply these settings to an existing engine.
    pub fn apply(&self, engine: &mut Engine) -> Result<(), ConfigError> {
        for event in self.events()? {
            engine.apply(event);
        }
        Ok(())
    }

    /// Create an engine at the configured sample rate with these settings.
    pub fn build_engine(&self) -> Result<Engine, ConfigError> {
        self.validate()?;
        let mut engine = Engine::new(self.sample_rate as f32);
        self.apply(&mut engine)?;
        tracing::info!(
            sample_rate = self.sample_rate,
            waveform = %self.synth.waveform,
            tuning = %self.guitar.tuning,
            "engine configured"
        );
        Ok(engine)
    }
}
