use std::{
    io::Write as _,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::{
    error::MixreelResult,
    media::{self, MIX_CHANNELS, MIX_SAMPLE_RATE},
    timeline::Track,
};

/// The concatenated audio timeline, staged as a raw `.f32le` file.
///
/// Tracks are appended strictly in input order with no cross-fade and no
/// gain adjustment, so the file's duration equals the sum of the per-track
/// durations exactly. The staging file is removed when this value drops.
#[derive(Debug)]
pub struct ConcatAudio {
    path: PathBuf,
    sample_rate: u32,
    channels: u16,
    tracks: Vec<Track>,
    _guard: TempFileGuard,
}

impl ConcatAudio {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Tracks in concatenation order, with durations taken from the decode.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn into_tracks(self) -> Vec<Track> {
        self.tracks
    }
}

/// Decode every audio file and append its PCM to one staging file.
///
/// Each track is decoded, written, and dropped before the next is opened, so
/// at most one track's PCM is resident at a time. Track names are the file
/// stems; durations come from the decoded sample counts.
pub fn concat_tracks(files: &[PathBuf]) -> MixreelResult<ConcatAudio> {
    let path = std::env::temp_dir().join(format!(
        "mixreel_audio_{}_{}.f32le",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
    ));
    let guard = TempFileGuard(Some(path.clone()));

    let file = std::fs::File::create(&path)
        .with_context(|| format!("create audio staging file '{}'", path.display()))?;
    let mut writer = std::io::BufWriter::new(file);

    let mut tracks = Vec::with_capacity(files.len());
    for file_path in files {
        let pcm = media::decode_audio_f32_stereo(file_path, MIX_SAMPLE_RATE)?;
        for &sample in &pcm.interleaved_f32 {
            writer
                .write_all(&sample.to_le_bytes())
                .with_context(|| format!("append track PCM to '{}'", path.display()))?;
        }

        let name = file_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let duration_sec = pcm.duration_sec();
        tracing::debug!(track = %name, duration_sec, "decoded and appended track");
        tracks.push(Track::new(name, duration_sec));
    }

    writer
        .flush()
        .with_context(|| format!("flush audio staging file '{}'", path.display()))?;

    Ok(ConcatAudio {
        path,
        sample_rate: MIX_SAMPLE_RATE,
        channels: MIX_CHANNELS,
        tracks,
        _guard: guard,
    })
}

#[derive(Debug)]
struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_guard_removes_file_on_drop() {
        let path = std::env::temp_dir().join(format!(
            "mixreel_guard_test_{}.f32le",
            std::process::id()
        ));
        std::fs::write(&path, b"x").unwrap();
        assert!(path.exists());

        drop(TempFileGuard(Some(path.clone())));
        assert!(!path.exists());
    }
}
