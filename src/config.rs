use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    pub encoder: EncoderConfig,
    pub probe: ProbeConfig,
    pub install: InstallConfig,
    pub budget: BudgetConfig,
}

/// Fixed quality parameters passed to every encode attempt
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EncoderConfig {
    pub binary: String,
    pub video_codec: String,
    pub preset: String,
    pub crf: u32,
    pub audio_codec: String,
    pub audio_bitrate: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ProbeConfig {
    pub binary: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct InstallConfig {
    pub package_manager: String,
    pub package: String,
}

/// Size limit and the descending resolution factors tried to meet it
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BudgetConfig {
    pub max_size_bytes: u64,
    pub scale_factors: Vec<f64>,
}

pub const DEFAULT_MAX_SIZE_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_SCALE_FACTORS: [f64; 4] = [0.8, 0.6, 0.4, 0.2];

/// Package manager used when the encoder is missing
pub fn default_package_manager() -> &'static str {
    if cfg!(target_os = "macos") {
        "brew"
    } else if cfg!(target_os = "windows") {
        "choco"
    } else {
        "apt-get"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            encoder: EncoderConfig {
                binary: "ffmpeg".to_string(),
                video_codec: "libx264".to_string(),
                preset: "medium".to_string(),
                crf: 23,
                audio_codec: "aac".to_string(),
                audio_bitrate: "128k".to_string(),
            },
            probe: ProbeConfig {
                binary: "ffprobe".to_string(),
            },
            install: InstallConfig {
                package_manager: default_package_manager().to_string(),
                package: "ffmpeg".to_string(),
            },
            budget: BudgetConfig {
                max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
                scale_factors: DEFAULT_SCALE_FACTORS.to_vec(),
            },
        }
    }
}

impl AppConfig {
    /// Load defaults, then an optional config file, then `MOV_TO_MP4__*` env overrides.
    ///
    /// Without an explicit path, `mov-to-mp4.{toml,json,yaml}` in the working
    /// directory is used if present.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("encoder.binary", "ffmpeg")?
            .set_default("encoder.video_codec", "libx264")?
            .set_default("encoder.preset", "medium")?
            .set_default("encoder.crf", 23)?
            .set_default("encoder.audio_codec", "aac")?
            .set_default("encoder.audio_bitrate", "128k")?
            .set_default("probe.binary", "ffprobe")?
            .set_default("install.package_manager", default_package_manager())?
            .set_default("install.package", "ffmpeg")?
            .set_default("budget.max_size_bytes", DEFAULT_MAX_SIZE_BYTES as i64)?
            .set_default("budget.scale_factors", DEFAULT_SCALE_FACTORS.to_vec())?;

        builder = match path {
            Some(path) => builder.add_source(config::File::from(path.to_path_buf())),
            None => builder.add_source(config::File::with_name("mov-to-mp4").required(false)),
        };

        // e.g. MOV_TO_MP4__ENCODER__BINARY=/opt/ffmpeg/bin/ffmpeg
        let config: AppConfig = builder
            .add_source(config::Environment::with_prefix("MOV_TO_MP4").separator("__"))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the retry loop cannot work with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.encoder.binary.trim().is_empty() {
            anyhow::bail!("encoder.binary cannot be empty");
        }

        if self.probe.binary.trim().is_empty() {
            anyhow::bail!("probe.binary cannot be empty");
        }

        if self.budget.max_size_bytes == 0 {
            anyhow::bail!("budget.max_size_bytes must be greater than 0");
        }

        for factor in &self.budget.scale_factors {
            if !factor.is_finite() || *factor <= 0.0 || *factor >= 1.0 {
                anyhow::bail!(
                    "budget.scale_factors entries must be between 0 and 1, got {}",
                    factor
                );
            }
        }

        if self
            .budget
            .scale_factors
            .windows(2)
            .any(|pair| pair[1] >= pair[0])
        {
            anyhow::bail!(
                "budget.scale_factors must be strictly descending, got {:?}",
                self.budget.scale_factors
            );
        }

        Ok(())
    }
}
