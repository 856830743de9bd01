//! Static error panel drawn straight onto the 2D canvas.

use crate::config::FallbackConfig;
use crate::scene::Rgba;
use crate::surface::{Canvas2d, Font, Rect, TextAlign};

const HEADLINE_FONT: Font = Font::bold(20.0);
const SECONDARY_FONT: Font = Font::regular(16.0);
const DETAIL_FONT: Font = Font::regular(14.0);

/// Draw the fallback panel: background fill, headline, the configured
/// secondary line, then `detail`, all centered.
///
/// Needs nothing from the 3D pipeline, so it works before any scene,
/// camera or renderer exists.
pub fn render_fallback(canvas: &mut dyn Canvas2d, headline: &str, detail: &str, config: &FallbackConfig) {
    let size = canvas.size();
    let (w, h) = (size.width as f32, size.height as f32);

    let background = Rgba::from_hex(&config.background).unwrap_or(Rgba::BLACK);
    let text = Rgba::from_hex(&config.text_color).unwrap_or(Rgba::WHITE);

    canvas.fill_rect(
        Rect {
            x: 0.0,
            y: 0.0,
            width: w,
            height: h,
        },
        background,
    );

    let cx = w / 2.0;
    let cy = h / 2.0;
    canvas.fill_text(headline, cx, cy - 40.0, HEADLINE_FONT, TextAlign::Center, text);
    canvas.fill_text(&config.secondary, cx, cy, SECONDARY_FONT, TextAlign::Center, text);
    canvas.fill_text(detail, cx, cy + 30.0, DETAIL_FONT, TextAlign::Center, text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::headless::{CanvasOp, RecordingCanvas};
    use crate::surface::SurfaceSize;

    #[test]
    fn test_panel_layout() {
        let mut canvas = RecordingCanvas::new(SurfaceSize::new(800, 600));
        let config = FallbackConfig::default();
        render_fallback(&mut canvas, "VRM Avatar", "network error: refused", &config);

        let ops = canvas.ops();
        assert_eq!(ops.len(), 4);
        match &ops[0] {
            CanvasOp::Rect { rect, color } => {
                assert_eq!((rect.width, rect.height), (800.0, 600.0));
                assert_eq!(Some(*color), Rgba::from_hex("#667eea"));
            }
            other => panic!("expected background fill, got {other:?}"),
        }

        let texts: Vec<_> = ops
            .iter()
            .filter_map(|op| match op {
                CanvasOp::Text { text, x, y, font, align, .. } => Some((text.as_str(), *x, *y, *font, *align)),
                _ => None,
            })
            .collect();
        assert_eq!(texts[0], ("VRM Avatar", 400.0, 260.0, Font::bold(20.0), TextAlign::Center));
        assert_eq!(texts[1], ("An error occurred", 400.0, 300.0, Font::regular(16.0), TextAlign::Center));
        assert_eq!(texts[2], ("network error: refused", 400.0, 330.0, Font::regular(14.0), TextAlign::Center));
    }

    #[test]
    fn test_bad_colors_still_draw() {
        let mut canvas = RecordingCanvas::new(SurfaceSize::new(10, 10));
        let config = FallbackConfig {
            background: "nope".to_string(),
            ..FallbackConfig::default()
        };
        render_fallback(&mut canvas, "h", "d", &config);
        assert_eq!(canvas.ops().len(), 4);
        assert!(canvas.contains_text("d"));
    }
}
