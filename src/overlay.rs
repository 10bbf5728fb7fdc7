use crate::{
    core::{Canvas, FrameRGBA},
    error::{MixreelError, MixreelResult},
    fonts::{FontProvider, FontRole, TextBrushRgba8},
    timecode::format_timestamp,
    timeline::Timeline,
};

const WHITE: [u8; 4] = [255, 255, 255, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];

/// Layout configuration for the song-list text layer.
///
/// The canvas must equal the background layer's and the final export's
/// canvas; the exporter enforces the shared frame size.
#[derive(Clone, Debug)]
pub struct OverlaySpec {
    pub canvas: Canvas,
    /// Heading drawn centered at the top of the canvas.
    pub title: String,
    pub padding_left: u32,
    pub padding_right: u32,
    pub padding_top: u32,
    /// Vertical distance between consecutive song lines.
    pub line_height: u32,
    /// Vertical space reserved for the title above the first song line.
    pub title_block_height: u32,
    pub title_size_px: f32,
    pub body_size_px: f32,
    /// Magnitude of the black offset copies behind the title.
    pub title_stroke_px: u32,
}

impl OverlaySpec {
    pub fn new(canvas: Canvas, title: impl Into<String>) -> Self {
        Self {
            canvas,
            title: title.into(),
            padding_left: 40,
            padding_right: 40,
            padding_top: 30,
            line_height: 35,
            title_block_height: 60,
            title_size_px: 40.0,
            body_size_px: 28.0,
            title_stroke_px: 3,
        }
    }

    pub fn validate(&self) -> MixreelResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(MixreelError::validation(
                "overlay canvas width/height must be non-zero",
            ));
        }
        if u16::try_from(self.canvas.width).is_err() || u16::try_from(self.canvas.height).is_err() {
            return Err(MixreelError::validation("overlay canvas exceeds u16 range"));
        }
        if !self.title_size_px.is_finite() || self.title_size_px <= 0.0 {
            return Err(MixreelError::validation("title font size must be > 0"));
        }
        if !self.body_size_px.is_finite() || self.body_size_px <= 0.0 {
            return Err(MixreelError::validation("body font size must be > 0"));
        }
        if self.line_height == 0 {
            return Err(MixreelError::validation("line height must be > 0"));
        }
        Ok(())
    }
}

/// Render one song line: 1-based index, start timestamp, uppercased name.
pub fn line_text(position: usize, start_sec: f64, name: &str) -> String {
    format!(
        "{position:02}. {} → {}",
        format_timestamp(start_sec),
        name.to_uppercase()
    )
}

/// Render the song-list overlay onto a transparent canvas.
///
/// Pure function of its inputs: identical timeline, spec and resolved fonts
/// produce pixel-identical output. Lines below the canvas bottom clip; no
/// wrapping or overflow correction is attempted.
pub fn render_overlay(
    timeline: &Timeline,
    spec: &OverlaySpec,
    fonts: &mut FontProvider,
) -> MixreelResult<FrameRGBA> {
    spec.validate()?;

    let width_u16 = spec.canvas.width as u16;
    let height_u16 = spec.canvas.height as u16;
    let mut ctx = vello_cpu::RenderContext::new(width_u16, height_u16);

    let white_brush = TextBrushRgba8 {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };

    // Title: centered horizontally, black stroke copies under a white fill so
    // it stays legible over any background.
    let title_layout = fonts.layout(&spec.title, FontRole::Title, spec.title_size_px, white_brush)?;
    let title_font = fonts.font_data(FontRole::Title);
    let title_x =
        ((f64::from(spec.canvas.width) - f64::from(title_layout.width())) / 2.0).max(0.0);
    let title_y = f64::from(spec.padding_top);
    for (dx, dy) in diagonal_offsets(f64::from(spec.title_stroke_px)) {
        draw_layout(
            &mut ctx,
            &title_font,
            &title_layout,
            title_x + dx,
            title_y + dy,
            BLACK,
        );
    }
    draw_layout(&mut ctx, &title_font, &title_layout, title_x, title_y, WHITE);

    // Song lines, strictly in timeline order. Each line is drawn twice: four
    // black copies at the diagonal ±1 offsets, then the white copy on top.
    let body_font = fonts.font_data(FontRole::Body);
    let body_top = f64::from(spec.padding_top + spec.title_block_height);
    for (i, entry) in timeline.entries().iter().enumerate() {
        let text = line_text(i + 1, entry.start_sec, &entry.track.name);
        let layout = fonts.layout(&text, FontRole::Body, spec.body_size_px, white_brush)?;

        let x = f64::from(spec.padding_left);
        let y = body_top + (i as f64) * f64::from(spec.line_height);
        for (dx, dy) in diagonal_offsets(1.0) {
            draw_layout(&mut ctx, &body_font, &layout, x + dx, y + dy, BLACK);
        }
        draw_layout(&mut ctx, &body_font, &layout, x, y, WHITE);
    }

    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(width_u16, height_u16);
    ctx.render_to_pixmap(&mut pixmap);

    Ok(FrameRGBA {
        width: spec.canvas.width,
        height: spec.canvas.height,
        data: pixmap.data_as_u8_slice().to_vec(),
        premultiplied: true,
    })
}

fn diagonal_offsets(magnitude: f64) -> [(f64, f64); 4] {
    [
        (-magnitude, -magnitude),
        (-magnitude, magnitude),
        (magnitude, -magnitude),
        (magnitude, magnitude),
    ]
}

fn draw_layout(
    ctx: &mut vello_cpu::RenderContext,
    font: &vello_cpu::peniko::FontData,
    layout: &parley::Layout<TextBrushRgba8>,
    x: f64,
    y: f64,
    rgba: [u8; 4],
) {
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(affine_to_cpu(kurbo::Affine::translate((x, y))));
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        rgba[0], rgba[1], rgba[2], rgba[3],
    ));

    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

fn affine_to_cpu(a: kurbo::Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fonts::FontConfig, timeline::Track};

    fn three_track_timeline() -> Timeline {
        Timeline::build(vec![
            Track::new("Intro", 60.0),
            Track::new("Drop", 120.0),
            Track::new("Outro", 30.0),
        ])
    }

    #[test]
    fn line_text_matches_contract() {
        let timeline = three_track_timeline();
        let lines: Vec<String> = timeline
            .entries()
            .iter()
            .enumerate()
            .map(|(i, e)| line_text(i + 1, e.start_sec, &e.track.name))
            .collect();

        assert_eq!(
            lines,
            vec![
                "01. 00:00:00 → INTRO",
                "02. 00:01:00 → DROP",
                "03. 00:03:00 → OUTRO",
            ]
        );
    }

    #[test]
    fn validate_rejects_degenerate_spec() {
        let mut spec = OverlaySpec::new(
            Canvas {
                width: 0,
                height: 1080,
            },
            "SONG LIST",
        );
        assert!(spec.validate().is_err());

        spec.canvas = Canvas {
            width: 640,
            height: 360,
        };
        spec.body_size_px = 0.0;
        assert!(spec.validate().is_err());
    }

    #[test]
    fn render_is_canvas_sized_transparent_elsewhere_and_idempotent() {
        if !FontProvider::system_fonts_available() {
            return;
        }

        let canvas = Canvas {
            width: 640,
            height: 360,
        };
        let spec = OverlaySpec::new(canvas, "SONG LIST");
        let timeline = three_track_timeline();

        let mut fonts = FontProvider::new(&FontConfig::default()).unwrap();
        let a = render_overlay(&timeline, &spec, &mut fonts).unwrap();
        let b = render_overlay(&timeline, &spec, &mut fonts).unwrap();

        assert_eq!(a.width, canvas.width);
        assert_eq!(a.height, canvas.height);
        assert_eq!(a.data.len(), canvas.pixel_bytes());
        assert!(a.premultiplied);

        // Bottom-right corner is far from any drawn text.
        let corner =
            ((canvas.height as usize - 1) * canvas.width as usize + canvas.width as usize - 1) * 4;
        assert_eq!(a.data[corner + 3], 0);

        // Some glyph coverage exists.
        assert!(a.data.chunks_exact(4).any(|px| px[3] != 0));

        // Pure function: identical inputs render pixel-identical output.
        assert_eq!(a.data, b.data);
    }
}
