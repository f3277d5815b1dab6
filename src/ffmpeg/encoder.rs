use crate::config::EncoderConfig;
use crate::ffmpeg::progress::{self, ProgressReporter};
use crate::paths;
use crate::shrink::Transcode;
use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::ffi::OsString;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};

/// Encoder diagnostics kept for the error message of a failed run
const DIAGNOSTIC_TAIL_LINES: usize = 5;

/// Handles video encoding using an external FFmpeg process
pub struct VideoEncoder {
    settings: EncoderConfig,
}

impl VideoEncoder {
    pub fn new(settings: EncoderConfig) -> Self {
        Self { settings }
    }

    pub fn binary(&self) -> &str {
        &self.settings.binary
    }

    /// Scale filter for a resolution factor, rounding both sides down to even pixels
    pub fn scale_filter(factor: f64) -> String {
        format!(
            "scale=trunc(iw*{f}/2)*2:trunc(ih*{f}/2)*2",
            f = factor
        )
    }

    /// Full argument list for one encode attempt
    pub fn build_args(&self, input: &Path, output: &Path, scale: Option<f64>) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-i".into(),
            input.into(),
            "-c:v".into(),
            self.settings.video_codec.clone().into(),
            "-preset".into(),
            self.settings.preset.clone().into(),
            "-crf".into(),
            self.settings.crf.to_string().into(),
            "-c:a".into(),
            self.settings.audio_codec.clone().into(),
            "-b:a".into(),
            self.settings.audio_bitrate.clone().into(),
        ];

        if let Some(factor) = scale {
            args.push("-vf".into());
            args.push(Self::scale_filter(factor).into());
        }

        // Overwrite output
        args.push("-y".into());
        args.push(output.into());
        args
    }

    /// Encode `input` into `output`, printing progress from ffmpeg's stderr.
    ///
    /// # Arguments
    /// * `scale` - Resolution factor, `None` keeps the original resolution
    /// * `duration` - Input duration in seconds, 0 if unknown
    pub fn encode(
        &self,
        input: &Path,
        output: &Path,
        scale: Option<f64>,
        duration: f64,
    ) -> Result<()> {
        let stdout = io::stdout();
        self.encode_with_progress(input, output, scale, duration, stdout.lock())?;
        println!("✓ Conversion complete!");
        Ok(())
    }

    /// Same as [`VideoEncoder::encode`] with the progress line written to `out`.
    ///
    /// If the progress stream fails the encoder is killed and reaped before
    /// the error is returned.
    pub fn encode_with_progress<W: Write>(
        &self,
        input: &Path,
        output: &Path,
        scale: Option<f64>,
        duration: f64,
        out: W,
    ) -> Result<()> {
        let args = self.build_args(input, output, scale);
        tracing::debug!("running {} {:?}", self.settings.binary, args);

        let mut child = Command::new(&self.settings.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Error starting {}", self.settings.binary))?;

        let Some(stderr) = child.stderr.take() else {
            stop(&mut child);
            anyhow::bail!("Error creating stderr pipe");
        };

        let mut tail: VecDeque<String> = VecDeque::with_capacity(DIAGNOSTIC_TAIL_LINES);
        if let Err(e) = stream_progress(stderr, out, duration, scale, &mut tail) {
            stop(&mut child);
            return Err(e)
                .with_context(|| format!("Failed to read {} output", self.settings.binary));
        }

        let status = child
            .wait()
            .with_context(|| format!("Failed to wait for {}", self.settings.binary))?;

        if !status.success() {
            let diagnostics: Vec<String> = tail.into_iter().collect();
            anyhow::bail!(
                "Conversion failed: {} exited with {}\n{}",
                self.settings.binary,
                status,
                diagnostics.join("\n")
            );
        }

        Ok(())
    }
}

/// Render progress markers from the encoder's stderr, keeping the last other lines in `tail`
fn stream_progress<R: Read, W: Write>(
    stderr: R,
    out: W,
    duration: f64,
    scale: Option<f64>,
    tail: &mut VecDeque<String>,
) -> io::Result<()> {
    let mut reporter = ProgressReporter::new(out, duration, scale);

    progress::for_each_line(BufReader::new(stderr), |line| {
        match progress::extract_timestamp(line) {
            Some(timestamp) => reporter.update(timestamp),
            None => {
                if tail.len() == DIAGNOSTIC_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line.trim_end().to_string());
                Ok(())
            }
        }
    })?;

    reporter.finish()?;
    Ok(())
}

fn stop(child: &mut Child) {
    if let Err(e) = child.kill() {
        tracing::debug!("failed to kill encoder: {}", e);
    }
    if let Err(e) = child.wait() {
        tracing::debug!("failed to reap encoder: {}", e);
    }
}

/// One input/output pair driven through the encoder by the retry loop
pub struct EncodeJob<'a> {
    encoder: &'a VideoEncoder,
    input: &'a Path,
    output: &'a Path,
    duration: f64,
}

impl<'a> EncodeJob<'a> {
    pub fn new(encoder: &'a VideoEncoder, input: &'a Path, output: &'a Path, duration: f64) -> Self {
        Self {
            encoder,
            input,
            output,
            duration,
        }
    }
}

impl Transcode for EncodeJob<'_> {
    fn transcode(&mut self, scale: Option<f64>) -> Result<()> {
        self.encoder
            .encode(self.input, self.output, scale, self.duration)
    }

    fn output_size(&self) -> u64 {
        paths::file_size(self.output)
    }
}
