use std::{
    collections::{HashMap, VecDeque},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;

use crate::{
    core::{Canvas, FrameIndex, Fps},
    error::{MixreelError, MixreelResult},
    media::{self, VideoSourceInfo},
};

/// What kind of visual the chosen background asset is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackgroundKind {
    Still,
    Video,
}

/// The chosen background asset, classified by file extension.
#[derive(Clone, Debug)]
pub struct BackgroundSpec {
    pub path: PathBuf,
    pub kind: BackgroundKind,
}

impl BackgroundSpec {
    /// Classify a background file by extension (case-insensitive).
    pub fn from_path(path: impl Into<PathBuf>) -> MixreelResult<Self> {
        let path = path.into();
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let kind = match ext.as_str() {
            "jpg" | "jpeg" | "png" => BackgroundKind::Still,
            "mp4" => BackgroundKind::Video,
            _ => {
                return Err(MixreelError::validation(format!(
                    "unsupported background file '{}' (expected .jpg/.jpeg/.png/.mp4)",
                    path.display()
                )));
            }
        };
        Ok(Self { path, kind })
    }
}

/// Background visual layer adapted to the target canvas and duration.
///
/// A still is decoded and stretched once and the single frame is held for
/// the whole export; a video is decoded forward on demand, stretched frame
/// by frame, and wraps to its start whenever the export outlasts it.
pub enum BackgroundLayer {
    Still { frame: Arc<Vec<u8>> },
    Video(LoopingVideoDecoder),
}

impl BackgroundLayer {
    pub fn prepare(spec: &BackgroundSpec, canvas: Canvas) -> MixreelResult<Self> {
        match spec.kind {
            BackgroundKind::Still => {
                let frame = decode_still_stretched(&spec.path, canvas)?;
                Ok(Self::Still {
                    frame: Arc::new(frame),
                })
            }
            BackgroundKind::Video => {
                let info = media::probe_video(&spec.path)?;
                if info.duration_sec <= 0.0 {
                    return Err(MixreelError::media(format!(
                        "background video '{}' has no usable duration",
                        spec.path.display()
                    )));
                }
                Ok(Self::Video(LoopingVideoDecoder::new(info, canvas)))
            }
        }
    }

    pub fn is_still(&self) -> bool {
        matches!(self, Self::Still { .. })
    }

    /// Premultiplied RGBA8 frame for output frame `idx`, exactly canvas-sized.
    pub fn frame_at(&mut self, idx: FrameIndex, fps: Fps) -> MixreelResult<Arc<Vec<u8>>> {
        match self {
            Self::Still { frame } => Ok(frame.clone()),
            Self::Video(decoder) => decoder.frame_at(fps.frames_to_secs(idx.0)),
        }
    }
}

/// Decode a still image and stretch it to exactly `canvas`.
///
/// Stretching ignores the source aspect ratio (fill, never letterbox).
/// Lanczos3 favors smoothness over speed.
fn decode_still_stretched(path: &Path, canvas: Canvas) -> MixreelResult<Vec<u8>> {
    let dyn_img = image::open(path)
        .with_context(|| format!("decode background image '{}'", path.display()))?;
    let rgba = dyn_img.to_rgba8();

    let rgba = if rgba.dimensions() == (canvas.width, canvas.height) {
        rgba
    } else {
        image::imageops::resize(
            &rgba,
            canvas.width,
            canvas.height,
            image::imageops::FilterType::Lanczos3,
        )
    };

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);
    Ok(rgba8_premul)
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 255 {
            continue;
        }
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

/// Forward-looping video frame source at the target canvas size.
///
/// Export consumes frames strictly forward, so frames are batch-prefetched
/// in decode windows and kept in a small LRU.
pub struct LoopingVideoDecoder {
    info: VideoSourceInfo,
    canvas: Canvas,
    frame_cache: HashMap<u64, Arc<Vec<u8>>>,
    lru: VecDeque<u64>,
    capacity: usize,
    prefetch_frames: u32,
}

const FRAME_CACHE_CAPACITY: usize = 32;
const PREFETCH_FRAMES: u32 = 12;

impl LoopingVideoDecoder {
    fn new(info: VideoSourceInfo, canvas: Canvas) -> Self {
        Self {
            info,
            canvas,
            frame_cache: HashMap::new(),
            lru: VecDeque::new(),
            capacity: FRAME_CACHE_CAPACITY,
            prefetch_frames: PREFETCH_FRAMES,
        }
    }

    fn frame_at(&mut self, timeline_sec: f64) -> MixreelResult<Arc<Vec<u8>>> {
        let source_time_s = wrap_source_time(timeline_sec, self.info.duration_sec);
        self.decode_at(source_time_s)
    }

    fn decode_at(&mut self, source_time_s: f64) -> MixreelResult<Arc<Vec<u8>>> {
        let key = self.key_for_time(source_time_s);
        if let Some(frame) = self.frame_cache.get(&key).cloned() {
            self.touch(key);
            return Ok(frame);
        }

        if self.prefetch_for_key(key).is_ok()
            && let Some(frame) = self.frame_cache.get(&key).cloned()
        {
            self.touch(key);
            return Ok(frame);
        }

        // Sparse request the batch window missed; decode the single frame.
        let mut frames =
            media::decode_video_frames_scaled_rgba8(&self.info, source_time_s, 1, self.canvas)?;
        let frame = Arc::new(frames.pop().ok_or_else(|| {
            MixreelError::media(format!(
                "ffmpeg returned no video frames for '{}'",
                self.info.source_path.display()
            ))
        })?);
        self.insert_frame(key, frame.clone());
        Ok(frame)
    }

    fn key_for_time(&self, source_time_s: f64) -> u64 {
        ((source_time_s.max(0.0)) * 1000.0).round() as u64
    }

    fn prefetch_for_key(&mut self, key_ms: u64) -> MixreelResult<()> {
        let source_fps = self.info.source_fps();
        let step_ms = if source_fps.is_finite() && source_fps > 0.0 {
            1000.0 / source_fps
        } else {
            1.0
        };
        let window_ms = (step_ms * f64::from(self.prefetch_frames)).max(step_ms);
        let bucket = ((key_ms as f64) / window_ms).floor();
        let start_key_ms = (bucket * window_ms).round().max(0.0) as u64;
        let start_time_s = (start_key_ms as f64) / 1000.0;
        let frames = media::decode_video_frames_scaled_rgba8(
            &self.info,
            start_time_s,
            self.prefetch_frames,
            self.canvas,
        )?;

        for (offset, rgba) in frames.into_iter().enumerate() {
            let key = ((start_key_ms as f64) + ((offset as f64) * step_ms)).round() as u64;
            if self.frame_cache.contains_key(&key) {
                self.touch(key);
                continue;
            }
            self.insert_frame(key, Arc::new(rgba));
        }
        Ok(())
    }

    fn insert_frame(&mut self, key: u64, frame: Arc<Vec<u8>>) {
        self.frame_cache.insert(key, frame);
        self.touch(key);
        while self.lru.len() > self.capacity {
            if let Some(old) = self.lru.pop_front() {
                self.frame_cache.remove(&old);
            }
        }
    }

    fn touch(&mut self, key: u64) {
        if let Some(pos) = self.lru.iter().position(|x| *x == key) {
            self.lru.remove(pos);
        }
        self.lru.push_back(key);
    }
}

/// Map a timeline instant into the looping source, wrapping at the natural
/// duration. The result stays strictly inside the source so a decode at the
/// loop boundary never reads past the last frame.
fn wrap_source_time(timeline_sec: f64, natural_sec: f64) -> f64 {
    if natural_sec <= 0.0 {
        return 0.0;
    }
    let wrapped = timeline_sec % natural_sec;
    wrapped.min(natural_sec - 1e-3).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_extensions_case_insensitively() {
        assert_eq!(
            BackgroundSpec::from_path("bg/scene.JPG").unwrap().kind,
            BackgroundKind::Still
        );
        assert_eq!(
            BackgroundSpec::from_path("bg/scene.jpeg").unwrap().kind,
            BackgroundKind::Still
        );
        assert_eq!(
            BackgroundSpec::from_path("bg/scene.png").unwrap().kind,
            BackgroundKind::Still
        );
        assert_eq!(
            BackgroundSpec::from_path("bg/loop.Mp4").unwrap().kind,
            BackgroundKind::Video
        );
        assert!(BackgroundSpec::from_path("bg/scene.gif").is_err());
        assert!(BackgroundSpec::from_path("bg/noext").is_err());
    }

    #[test]
    fn still_stretches_to_exact_canvas_regardless_of_aspect() {
        let dir = std::env::temp_dir().join(format!("mixreel_bg_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("wide.png");

        // 8x2 source, 4x4 target: aspect ratios differ wildly.
        let img = image::RgbaImage::from_pixel(8, 2, image::Rgba([10, 200, 30, 255]));
        img.save(&path).unwrap();

        let canvas = Canvas {
            width: 4,
            height: 4,
        };
        let frame = decode_still_stretched(&path, canvas).unwrap();
        assert_eq!(frame.len(), canvas.pixel_bytes());
        // Every pixel is filled (stretch, not letterbox).
        assert!(frame.chunks_exact(4).all(|px| px[3] == 255));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn premultiply_scales_color_by_alpha() {
        let mut px = [100u8, 50, 200, 128, 10, 20, 30, 0, 7, 7, 7, 255];
        premultiply_rgba8_in_place(&mut px);
        assert_eq!(px[0], ((100u16 * 128 + 127) / 255) as u8);
        assert_eq!(&px[4..8], &[0, 0, 0, 0]);
        assert_eq!(&px[8..12], &[7, 7, 7, 255]);
    }

    #[test]
    fn wrap_covers_target_without_gaps() {
        let natural = 2.0;
        // Sample a 5 second target at 24 fps; every mapped time lands inside
        // the source.
        for f in 0..120 {
            let t = (f as f64) / 24.0;
            let s = wrap_source_time(t, natural);
            assert!((0.0..natural).contains(&s), "t={t} mapped to {s}");
        }
        // Wrap is seamless: the frame after the loop point maps near zero.
        let just_after = wrap_source_time(2.0 + 1.0 / 24.0, natural);
        assert!(just_after < 0.1);
    }

    #[test]
    fn wrap_degenerate_duration_pins_to_zero() {
        assert_eq!(wrap_source_time(5.0, 0.0), 0.0);
        assert_eq!(wrap_source_time(5.0, -1.0), 0.0);
    }
}
