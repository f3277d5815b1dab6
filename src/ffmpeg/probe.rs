use std::path::Path;
use std::process::{Command, Stdio};

/// Container duration in seconds via ffprobe.
///
/// Returns 0.0 when the duration cannot be determined; callers treat that as
/// "unknown" and show progress without a percentage.
pub fn probe_duration(prober: &str, input: &Path) -> f64 {
    let output = Command::new(prober)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(input)
        .stdin(Stdio::null())
        .output();

    let output = match output {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!("failed to run {}: {}", prober, e);
            return 0.0;
        }
    };

    if !output.status.success() {
        tracing::debug!("{} exited with {}", prober, output.status);
        return 0.0;
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    let duration = parse_duration(&raw).unwrap_or(0.0);
    tracing::debug!(input = %input.display(), duration, "probed duration");
    duration
}

/// Parse ffprobe's bare decimal output. Non-positive values count as unknown.
pub fn parse_duration(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d > 0.0)
}
