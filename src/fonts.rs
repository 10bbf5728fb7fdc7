use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::error::{MixreelError, MixreelResult};

/// RGBA8 brush color carried through Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

/// Overlay text role a font is resolved for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontRole {
    Title,
    Body,
}

/// Explicit font configuration; unset paths fall back to system candidates.
#[derive(Clone, Debug, Default)]
pub struct FontConfig {
    pub title_font: Option<PathBuf>,
    pub body_font: Option<PathBuf>,
}

/// Well-known font files probed when no explicit path is configured.
///
/// First readable file wins. Bold faces for the title, regular for the body.
const TITLE_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

const BODY_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

struct ResolvedFont {
    family: String,
    font_data: vello_cpu::peniko::FontData,
}

/// Font resolution plus Parley shaping/layout state for the overlay.
///
/// Resolution is a two-tier policy: an explicitly configured file path is
/// tried first; on failure (logged, non-fatal) the first readable well-known
/// system font file is substituted. Only when neither tier yields a font does
/// construction fail.
pub struct FontProvider {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    title: ResolvedFont,
    body: ResolvedFont,
}

impl FontProvider {
    pub fn new(cfg: &FontConfig) -> MixreelResult<Self> {
        let title_bytes = resolve_font_bytes(cfg.title_font.as_deref(), TITLE_FONT_CANDIDATES)?;
        let body_bytes = resolve_font_bytes(cfg.body_font.as_deref(), BODY_FONT_CANDIDATES)?;

        let mut font_ctx = parley::FontContext::default();
        let title = register_font(&mut font_ctx, title_bytes)?;
        let body = register_font(&mut font_ctx, body_bytes)?;

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            title,
            body,
        })
    }

    /// Return `true` when the fallback tier alone can produce both fonts.
    pub fn system_fonts_available() -> bool {
        resolve_font_bytes(None, TITLE_FONT_CANDIDATES).is_ok()
            && resolve_font_bytes(None, BODY_FONT_CANDIDATES).is_ok()
    }

    /// Shape and lay out a single line of text for the given role.
    pub(crate) fn layout(
        &mut self,
        text: &str,
        role: FontRole,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> MixreelResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(MixreelError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let family = match role {
            FontRole::Title => self.title.family.clone(),
            FontRole::Body => self.body.family.clone(),
        };

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        // Overlay lines never wrap; overlong lines clip at the canvas edge.
        layout.break_all_lines(None);
        Ok(layout)
    }

    pub(crate) fn font_data(&self, role: FontRole) -> vello_cpu::peniko::FontData {
        match role {
            FontRole::Title => self.title.font_data.clone(),
            FontRole::Body => self.body.font_data.clone(),
        }
    }
}

fn resolve_font_bytes(
    explicit: Option<&Path>,
    candidates: &[&str],
) -> MixreelResult<Arc<Vec<u8>>> {
    if let Some(path) = explicit {
        match std::fs::read(path) {
            Ok(bytes) => return Ok(Arc::new(bytes)),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "configured font failed to load, substituting a system font"
                );
            }
        }
    }

    for candidate in candidates {
        if let Ok(bytes) = std::fs::read(candidate) {
            return Ok(Arc::new(bytes));
        }
    }

    Err(MixreelError::validation(
        "no usable font found (no configured font and no known system font file present)",
    ))
}

fn register_font(
    font_ctx: &mut parley::FontContext,
    bytes: Arc<Vec<u8>>,
) -> MixreelResult<ResolvedFont> {
    let families = font_ctx
        .collection
        .register_fonts(parley::fontique::Blob::from(bytes.as_ref().clone()), None);
    let family_id = families
        .first()
        .map(|(id, _)| *id)
        .ok_or_else(|| MixreelError::validation("no font families registered from font bytes"))?;

    let family = font_ctx
        .collection
        .family_name(family_id)
        .ok_or_else(|| MixreelError::validation("registered font family has no name"))?
        .to_string();

    let font_data = vello_cpu::peniko::FontData::new(
        vello_cpu::peniko::Blob::from(bytes.as_ref().clone()),
        0,
    );

    Ok(ResolvedFont { family, font_data })
}
