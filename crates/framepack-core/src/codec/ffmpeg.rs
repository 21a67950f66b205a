//! ffmpeg backend.
//!
//! Runs the `ffmpeg` binary as a subprocess. Every invocation is awaited to
//! completion and bounded by the configured timeout; on timeout the child is
//! killed when its handle drops.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

use super::provider::{EncodeRequest, VideoCodec};
use crate::config::{EncoderConfig, EncoderProfile};
use crate::error::CodecError;
use crate::pipeline::metadata::ARTIFACT_MIME_TYPE;

/// Lines of stderr kept in failure messages.
const STDERR_TAIL_LINES: usize = 8;

/// Timeout for the `-version` availability probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Codec backend driving the ffmpeg command-line tool.
#[derive(Debug, Clone)]
pub struct FfmpegCodec {
    binary: String,
    profile: EncoderProfile,
    crf: u32,
    qp: u32,
    preset: String,
    timeout: Duration,
}

impl FfmpegCodec {
    pub fn from_config(config: &EncoderConfig) -> Self {
        Self {
            binary: config.ffmpeg_path.clone(),
            profile: config.profile,
            crf: config.crf,
            qp: config.qp,
            preset: config.preset.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Full argument list for an encode.
    pub fn encode_args(&self, request: &EncodeRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = quiet_args();
        args.extend(os(["-r", &request.frame_rate.to_string()]));
        args.extend(os(["-f", "concat", "-safe", "0"]));
        if self.profile == EncoderProfile::Software {
            args.extend(os(["-hwaccel", "auto"]));
        }
        args.push("-i".into());
        args.push(request.manifest.clone().into());
        args.extend(os(["-s", &request.canvas.to_string()]));

        match self.profile {
            EncoderProfile::Software => {
                args.extend(os(["-c:v", "libx264"]));
                args.extend(self.rate_control_args());
                args.extend(os(["-tune", "stillimage"]));
            }
            EncoderProfile::Hardware => {
                args.extend(os(["-c:v", "h264_nvenc"]));
                args.extend(self.rate_control_args());
            }
            EncoderProfile::Ffv1 => {
                args.extend(os([
                    "-c:v", "ffv1", "-level", "3", "-coder", "1", "-context", "1", "-slicecrc",
                    "1", "-pix_fmt", "bgra",
                ]));
            }
        }

        args.push("-attach".into());
        args.push(request.metadata.clone().into());
        args.extend(os([
            "-metadata:s:t",
            &format!("mimetype={ARTIFACT_MIME_TYPE}"),
        ]));
        args.push(request.output.clone().into());
        args
    }

    /// Argument list that dumps the container's attachment to `dest`.
    ///
    /// No output file is given, so ffmpeg exits non-zero once the dump is
    /// done.
    pub fn attachment_args(container: &Path, dest: &Path) -> Vec<OsString> {
        let mut args = quiet_args();
        args.push("-dump_attachment:t".into());
        args.push(dest.into());
        args.push("-i".into());
        args.push(container.into());
        args
    }

    /// Argument list that decodes every stored frame into `out_dir/%05d.png`.
    ///
    /// Timestamps are passed through untouched, so no frame is dropped or
    /// duplicated whatever rate the container was written at.
    pub fn frame_args(container: &Path, out_dir: &Path) -> Vec<OsString> {
        let mut args = quiet_args();
        args.push("-i".into());
        args.push(container.into());
        args.extend(os(["-fps_mode", "passthrough"]));
        args.push(out_dir.join("%05d.png").into());
        args
    }

    fn rate_control_args(&self) -> Vec<OsString> {
        os([
            "-preset",
            &self.preset,
            "-crf",
            &self.crf.to_string(),
            "-qp",
            &self.qp.to_string(),
        ])
    }

    /// Run ffmpeg with `args` and return its exit status and stderr tail.
    async fn run(
        &self,
        operation: &str,
        args: Vec<OsString>,
        timeout: Duration,
    ) -> Result<(std::process::ExitStatus, String), CodecError> {
        let start = Instant::now();
        tracing::debug!("{} {}: {:?}", self.binary, operation, args);

        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CodecError::Spawn {
                tool: self.binary.clone(),
                source,
            })?;

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| CodecError::Spawn {
                tool: self.binary.clone(),
                source,
            })?,
            Err(_) => {
                tracing::error!("{} {} timed out after {:?}", self.binary, operation, timeout);
                return Err(CodecError::Timeout {
                    tool: self.binary.clone(),
                    operation: operation.to_string(),
                    timeout_secs: timeout.as_secs(),
                });
            }
        };

        tracing::debug!(
            "{} {} finished with {} in {:?}",
            self.binary,
            operation,
            output.status,
            start.elapsed()
        );
        Ok((output.status, stderr_tail(&output.stderr)))
    }

    /// Run and treat a non-zero exit as failure.
    async fn run_checked(&self, operation: &str, args: Vec<OsString>) -> Result<(), CodecError> {
        let (status, stderr_tail) = self.run(operation, args, self.timeout).await?;
        if status.success() {
            Ok(())
        } else {
            Err(CodecError::Failed {
                tool: self.binary.clone(),
                operation: operation.to_string(),
                status,
                stderr_tail,
            })
        }
    }
}

#[async_trait]
impl VideoCodec for FfmpegCodec {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn is_available(&self) -> bool {
        let args = vec![OsString::from("-version")];
        match self.run("probe", args, PROBE_TIMEOUT).await {
            Ok((status, _)) => status.success(),
            Err(e) => {
                tracing::debug!("ffmpeg probe failed: {e}");
                false
            }
        }
    }

    async fn encode(&self, request: &EncodeRequest) -> Result<(), CodecError> {
        tracing::info!(
            "Encoding {} at {} fps with profile {}",
            request.canvas,
            request.frame_rate,
            self.profile
        );
        self.run_checked("encode", self.encode_args(request)).await
    }

    async fn extract_attachment(&self, container: &Path, dest: &Path) -> Result<(), CodecError> {
        let (status, tail) = self
            .run("dump attachment", Self::attachment_args(container, dest), self.timeout)
            .await?;
        if !status.success() {
            tracing::trace!("Attachment dump exited with {status}: {tail}");
        }
        Ok(())
    }

    async fn extract_frames(&self, container: &Path, out_dir: &Path) -> Result<(), CodecError> {
        self.run_checked("extract frames", Self::frame_args(container, out_dir))
            .await
    }
}

fn quiet_args() -> Vec<OsString> {
    os(["-hide_banner", "-loglevel", "error", "-y"])
}

fn os<const N: usize>(args: [&str; N]) -> Vec<OsString> {
    args.iter().map(|arg| OsString::from(*arg)).collect()
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        return "<no ffmpeg stderr>".to_string();
    }
    lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join(" | ")
}
