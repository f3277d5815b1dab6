use crate::config::AppConfig;
use crate::ffmpeg::{self, EncodeJob, VideoEncoder};
use crate::paths;
use crate::shrink::{self, FitOutcome};
use anyhow::Result;
use std::path::Path;

/// Convert `input` to an MP4 next to it that fits the configured size budget
pub fn convert(config: &AppConfig, input: &Path) -> Result<FitOutcome> {
    let output = paths::output_path_for(input);
    if paths::overwrites_input(input, &output) {
        anyhow::bail!(
            "Output path {} is the same as the input; rename the input first",
            output.display()
        );
    }

    ffmpeg::ensure_encoder(&config.encoder, &config.install)?;

    println!("🎥 Converting {} to {}...", input.display(), output.display());

    let duration = ffmpeg::probe_duration(&config.probe.binary, input);
    if duration <= 0.0 {
        println!("ℹ️  Couldn't determine video duration. Processing without percentage...");
    }

    let encoder = VideoEncoder::new(config.encoder.clone());
    let mut job = EncodeJob::new(&encoder, input, &output, duration);
    let outcome = shrink::fit_to_budget(&mut job, &config.budget)?;

    tracing::info!(
        output = %output.display(),
        size = outcome.size(),
        attempts = outcome.attempts(),
        "conversion finished"
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refuses_to_overwrite_input() {
        let mut config = AppConfig::default();
        // Never reached; the path check comes first
        config.encoder.binary = "/nonexistent/ffmpeg".to_string();

        let err = convert(&config, Path::new("/videos/clip.mp4")).unwrap_err();
        assert!(err.to_string().contains("same as the input"));
    }

    #[test]
    fn test_refuses_upper_case_mp4_input() {
        let mut config = AppConfig::default();
        config.encoder.binary = "/nonexistent/ffmpeg".to_string();
        config.install.package_manager = "/nonexistent/package-manager".to_string();

        let err = convert(&config, Path::new("/videos/IMG_0001.MP4")).unwrap_err();
        assert!(err.to_string().contains("same as the input"));
    }
}
