use regex::Regex;
use std::io::{self, BufRead, Write};
use std::sync::OnceLock;

/// ffmpeg's periodic stats line, capturing the encoded timestamp
const PROGRESS_PATTERN: &str = r"frame=.* time=(\d+:\d+:\d+\.\d+)";

fn progress_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PROGRESS_PATTERN).expect("progress pattern is a valid regex"))
}

/// Extract the `time=HH:MM:SS.ff` value from a stats line
pub fn extract_timestamp(line: &str) -> Option<&str> {
    progress_regex()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Convert `HH:MM:SS.ff` to seconds.
///
/// The part after the dot is a decimal fraction of a second, so `00:00:01.5`
/// and `00:00:01.50` are both 1.5s.
pub fn timestamp_to_seconds(timestamp: &str) -> Option<f64> {
    let mut parts = timestamp.split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;

    if parts.next().is_some() {
        return None;
    }

    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Completion percentage, clamped to 100. `None` when the duration is unknown.
pub fn percent_complete(elapsed: f64, duration: f64) -> Option<f64> {
    if duration <= 0.0 {
        return None;
    }
    Some((elapsed / duration * 100.0).min(100.0))
}

/// Human label for the active resolution: "original" or e.g. "80%"
pub fn resolution_label(scale: Option<f64>) -> String {
    match scale {
        Some(factor) => format!("{}%", scale_percent(factor)),
        None => "original".to_string(),
    }
}

/// Scale factor as a whole percentage (0.8 -> 80)
pub fn scale_percent(factor: f64) -> u32 {
    (factor * 100.0).round() as u32
}

/// Feed each line of `reader` to `on_line`, splitting on `\r` as well as `\n`.
///
/// ffmpeg rewrites its stats line in place with `\r`, so plain `lines()` would
/// only yield it once the encode finishes. Lines are handed over as soon as
/// either terminator arrives.
pub fn for_each_line<R, F>(mut reader: R, mut on_line: F) -> io::Result<()>
where
    R: BufRead,
    F: FnMut(&str) -> io::Result<()>,
{
    let mut line = Vec::new();
    loop {
        let (used, complete) = {
            let available = match reader.fill_buf() {
                Ok(available) => available,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                break;
            }

            match available.iter().position(|&b| b == b'\r' || b == b'\n') {
                Some(end) => {
                    line.extend_from_slice(&available[..end]);
                    (end + 1, true)
                }
                None => {
                    line.extend_from_slice(available);
                    (available.len(), false)
                }
            }
        };
        reader.consume(used);

        if complete {
            emit_line(&line, &mut on_line)?;
            line.clear();
        }
    }

    emit_line(&line, &mut on_line)
}

fn emit_line<F>(line: &[u8], on_line: &mut F) -> io::Result<()>
where
    F: FnMut(&str) -> io::Result<()>,
{
    let line = String::from_utf8_lossy(line);
    if line.trim().is_empty() {
        return Ok(());
    }
    on_line(&line)
}

/// Single-line progress display, rewritten in place for every update
pub struct ProgressReporter<W: Write> {
    out: W,
    duration: f64,
    label: String,
    updates: usize,
}

impl<W: Write> ProgressReporter<W> {
    /// `duration` of 0 disables the percentage display
    pub fn new(out: W, duration: f64, scale: Option<f64>) -> Self {
        Self {
            out,
            duration,
            label: resolution_label(scale),
            updates: 0,
        }
    }

    /// Render one progress marker
    pub fn update(&mut self, timestamp: &str) -> io::Result<()> {
        let percent = timestamp_to_seconds(timestamp)
            .and_then(|elapsed| percent_complete(elapsed, self.duration));

        match percent {
            Some(percent) => write!(
                self.out,
                "\rProcessing: {} ({:.1}%) [{} resolution]",
                timestamp, percent, self.label
            )?,
            None => write!(self.out, "\rProcessing: {}", timestamp)?,
        }

        self.updates += 1;
        self.out.flush()
    }

    /// Number of markers rendered so far
    pub fn updates(&self) -> usize {
        self.updates
    }

    /// End the progress line
    pub fn finish(mut self) -> io::Result<W> {
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(self.out)
    }
}
