use std::{
    io::Read as _,
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    core::{Canvas, FrameRGBA, Fps},
    error::{MixreelError, MixreelResult},
};

/// Concatenated-audio input muxed alongside the streamed frames.
#[derive(Clone, Debug)]
pub struct AudioInput {
    /// Raw interleaved little-endian f32 PCM file.
    pub path: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Options for streaming MP4 encoding via the system `ffmpeg` binary.
#[derive(Clone, Debug)]
pub struct EncodeConfig {
    pub canvas: Canvas,
    pub fps: Fps,
    /// Canonical output path; only occupied after a fully successful encode.
    pub out_path: PathBuf,
    pub audio: Option<AudioInput>,
}

impl EncodeConfig {
    pub fn validate(&self) -> MixreelResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(MixreelError::validation(
                "encode width/height must be non-zero",
            ));
        }
        if !self.canvas.width.is_multiple_of(2) || !self.canvas.height.is_multiple_of(2) {
            return Err(MixreelError::validation(
                "encode width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if let Some(audio) = &self.audio {
            if audio.sample_rate == 0 {
                return Err(MixreelError::validation(
                    "audio sample_rate must be non-zero when audio is enabled",
                ));
            }
            if audio.channels == 0 {
                return Err(MixreelError::validation(
                    "audio channels must be non-zero when audio is enabled",
                ));
            }
        }
        Ok(())
    }
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> MixreelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Streaming encoder: premultiplied RGBA8 frames in, muxed MP4 out.
///
/// Encodes into a `.part` sibling of the canonical path and renames on
/// success, so a failed export never leaves a file at the success path.
pub struct FfmpegEncoder {
    cfg: EncodeConfig,
    part_path: PathBuf,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    scratch: Vec<u8>,
}

impl FfmpegEncoder {
    pub fn new(cfg: EncodeConfig) -> MixreelResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !is_ffmpeg_on_path() {
            return Err(MixreelError::media(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let part_path = part_path_for(&cfg.out_path);

        // ffmpeg does not understand premultiplied alpha; frames are
        // flattened over black in push_frame before hitting stdin.
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.canvas.width, cfg.canvas.height),
            "-r",
            &format!("{}/{}", cfg.fps.num, cfg.fps.den),
            "-i",
            "pipe:0",
        ]);

        if let Some(audio) = cfg.audio.as_ref() {
            cmd.args([
                "-f",
                "f32le",
                "-ar",
                &audio.sample_rate.to_string(),
                "-ac",
                &audio.channels.to_string(),
                "-i",
            ])
            .arg(&audio.path)
            .args([
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-c:a",
                "aac",
                "-shortest",
                "-movflags",
                "+faststart",
            ]);
        } else {
            cmd.args([
                "-an",
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "+faststart",
            ]);
        }
        cmd.arg(&part_path);

        let mut child = cmd.spawn().map_err(|e| {
            MixreelError::media(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| MixreelError::media("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| MixreelError::media("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        Ok(Self {
            scratch: vec![0u8; cfg.canvas.pixel_bytes()],
            cfg,
            part_path,
            child: Some(child),
            stdin: Some(stdin),
            stderr_drain: Some(stderr_drain),
        })
    }

    pub fn push_frame(&mut self, frame: &FrameRGBA) -> MixreelResult<()> {
        if frame.width != self.cfg.canvas.width || frame.height != self.cfg.canvas.height {
            return Err(MixreelError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.cfg.canvas.width, self.cfg.canvas.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(MixreelError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }
        if !frame.premultiplied {
            return Err(MixreelError::validation(
                "encoder expects premultiplied RGBA8 frames",
            ));
        }

        flatten_premul_over_black_to_opaque_rgba8(&mut self.scratch, &frame.data)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(MixreelError::media("ffmpeg encoder is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            MixreelError::media(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    /// Close stdin, wait for ffmpeg, and publish the canonical output.
    pub fn finish(mut self) -> MixreelResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| MixreelError::media("ffmpeg encoder not started"))?;

        let status = child
            .wait()
            .map_err(|e| MixreelError::media(format!("failed to wait for ffmpeg to finish: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| MixreelError::media("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| MixreelError::media(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let _ = std::fs::remove_file(&self.part_path);
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(MixreelError::media(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        std::fs::rename(&self.part_path, &self.cfg.out_path).map_err(|e| {
            MixreelError::media(format!(
                "failed to publish '{}': {e}",
                self.cfg.out_path.display()
            ))
        })?;
        Ok(())
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        // Abandoned mid-export (error path): reap the child and discard the
        // partial file so nothing lands at the canonical path.
        if let Some(mut child) = self.child.take() {
            drop(self.stdin.take());
            let _ = child.kill();
            let _ = child.wait();
            if let Some(handle) = self.stderr_drain.take() {
                let _ = handle.join();
            }
            let _ = std::fs::remove_file(&self.part_path);
        }
    }
}

fn part_path_for(out_path: &Path) -> PathBuf {
    let mut name = out_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out.mp4".to_string());
    name.push_str(".part");
    out_path.with_file_name(name)
}

fn flatten_premul_over_black_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
) -> MixreelResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(MixreelError::validation(
            "flatten_premul_over_black expects equal-length rgba8 buffers",
        ));
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        // Premultiplied color over black is the color itself; only alpha
        // needs forcing to opaque.
        d[0] = s[0];
        d[1] = s[1];
        d[2] = s[2];
        d[3] = 255;
    }

    Ok(())
}
