use std::path::PathBuf;

use crate::{
    core::{Canvas, Fps},
    error::MixreelResult,
    fonts::FontConfig,
};

/// Output canvas every run renders at.
pub const DEFAULT_CANVAS: Canvas = Canvas {
    width: 1920,
    height: 1080,
};
/// Output frame rate.
pub const DEFAULT_FPS_NUM: u32 = 24;

/// Explicit run configuration; components read nothing from ambient process
/// state.
#[derive(Clone, Debug)]
pub struct MixConfig {
    pub canvas: Canvas,
    pub fps: Fps,
    /// Directory whose subdirectories are offered as music folders.
    pub search_root: PathBuf,
    /// Music folder; when unset the prompt chooses among `search_root` dirs.
    pub music_dir: Option<PathBuf>,
    /// Background asset; when unset the prompt chooses from `backgrounds_dir`.
    pub background: Option<PathBuf>,
    pub backgrounds_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Overlay heading.
    pub title: String,
    pub fonts: FontConfig,
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            canvas: DEFAULT_CANVAS,
            fps: Fps {
                num: DEFAULT_FPS_NUM,
                den: 1,
            },
            search_root: PathBuf::from("."),
            music_dir: None,
            background: None,
            backgrounds_dir: PathBuf::from("backgrounds"),
            output_dir: PathBuf::from("output"),
            title: "SONG LIST".to_string(),
            fonts: FontConfig::default(),
        }
    }
}

impl MixConfig {
    pub fn validate(&self) -> MixreelResult<()> {
        Fps::new(self.fps.num, self.fps.den)?;
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(crate::error::MixreelError::validation(
                "canvas width/height must be non-zero",
            ));
        }
        Ok(())
    }
}
