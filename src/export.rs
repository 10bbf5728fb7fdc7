use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    audio::ConcatAudio,
    background::BackgroundLayer,
    compose::over_in_place,
    core::{Canvas, FrameIndex, FrameRGBA, Fps},
    encode_ffmpeg::{AudioInput, EncodeConfig, FfmpegEncoder},
    error::{MixreelError, MixreelResult},
    timecode::format_timestamp,
    timeline::Timeline,
};

/// The final bundle handed to the encoder: one shared canvas, one shared
/// duration, two output paths. Constructed once, consumed exactly once.
#[derive(Clone, Debug)]
pub struct ExportRequest {
    pub canvas: Canvas,
    pub fps: Fps,
    pub video_path: PathBuf,
    pub sidecar_path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct ExportArtifacts {
    pub video_path: PathBuf,
    pub sidecar_path: PathBuf,
}

/// Composite background + overlay, stream the frames to ffmpeg muxed with
/// the concatenated audio, then write the sidecar timestamp listing.
///
/// The timeline's total duration is authoritative: the frame count covers it
/// (`ceil`), and `-shortest` trims the container back to the audio.
pub fn export(
    req: &ExportRequest,
    background: &mut BackgroundLayer,
    overlay: &FrameRGBA,
    audio: &ConcatAudio,
    timeline: &Timeline,
) -> MixreelResult<ExportArtifacts> {
    if overlay.width != req.canvas.width || overlay.height != req.canvas.height {
        return Err(MixreelError::validation(format!(
            "overlay canvas {}x{} does not match export canvas {}x{}",
            overlay.width, overlay.height, req.canvas.width, req.canvas.height
        )));
    }
    if !overlay.premultiplied {
        return Err(MixreelError::validation(
            "overlay layer must be premultiplied RGBA8",
        ));
    }

    let total_duration_sec = timeline.total_duration_sec();
    let total_frames = req.fps.secs_to_frames_ceil(total_duration_sec).max(1);

    tracing::info!(
        frames = total_frames,
        duration_sec = total_duration_sec,
        out = %req.video_path.display(),
        "starting export"
    );

    let mut encoder = FfmpegEncoder::new(EncodeConfig {
        canvas: req.canvas,
        fps: req.fps,
        out_path: req.video_path.clone(),
        audio: Some(AudioInput {
            path: audio.path().to_path_buf(),
            sample_rate: audio.sample_rate(),
            channels: audio.channels(),
        }),
    })?;

    let mut frame = FrameRGBA {
        width: req.canvas.width,
        height: req.canvas.height,
        data: vec![0u8; req.canvas.pixel_bytes()],
        premultiplied: true,
    };

    if background.is_still() {
        // Static background + static overlay: composite once, hold the frame.
        let bg = background.frame_at(FrameIndex(0), req.fps)?;
        frame.data.copy_from_slice(&bg);
        over_in_place(&mut frame.data, &overlay.data)?;
        for _ in 0..total_frames {
            encoder.push_frame(&frame)?;
        }
    } else {
        for idx in 0..total_frames {
            let bg = background.frame_at(FrameIndex(idx), req.fps)?;
            frame.data.copy_from_slice(&bg);
            over_in_place(&mut frame.data, &overlay.data)?;
            encoder.push_frame(&frame)?;

            if idx > 0 && idx.is_multiple_of(240) {
                tracing::debug!(frame = idx, total = total_frames, "export progress");
            }
        }
    }

    encoder.finish()?;

    write_timestamp_sidecar(timeline, &req.sidecar_path)?;

    tracing::info!(
        video = %req.video_path.display(),
        sidecar = %req.sidecar_path.display(),
        "export complete"
    );

    Ok(ExportArtifacts {
        video_path: req.video_path.clone(),
        sidecar_path: req.sidecar_path.clone(),
    })
}

/// Write the plain-text listing: one `HH:MM:SS - name` line per entry, in
/// timeline order, UTF-8.
pub fn write_timestamp_sidecar(timeline: &Timeline, path: &Path) -> MixreelResult<()> {
    let mut out = String::new();
    for entry in timeline.entries() {
        out.push_str(&format_timestamp(entry.start_sec));
        out.push_str(" - ");
        out.push_str(&entry.track.name);
        out.push('\n');
    }
    std::fs::write(path, out)
        .with_context(|| format!("write timestamp sidecar '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::Track;

    #[test]
    fn sidecar_lists_every_track_in_timeline_order() {
        let timeline = Timeline::build(vec![
            Track::new("Intro", 60.0),
            Track::new("Drop", 120.0),
            Track::new("Outro", 30.0),
        ]);

        let dir = PathBuf::from("target").join("export_tests");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("timestamps_{}.txt", std::process::id()));

        write_timestamp_sidecar(&timeline, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "00:00:00 - Intro\n00:01:00 - Drop\n00:03:00 - Outro\n"
        );
        assert_eq!(content.lines().count(), timeline.len());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn sidecar_for_empty_timeline_is_empty() {
        let timeline = Timeline::build(Vec::new());
        let dir = PathBuf::from("target").join("export_tests");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("timestamps_empty_{}.txt", std::process::id()));

        write_timestamp_sidecar(&timeline, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");

        std::fs::remove_file(&path).ok();
    }
}
