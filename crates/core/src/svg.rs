//! SVG renderer: converts `RenderCommand` lists into standalone SVG strings.

use std::fmt::Write as _;
use std::sync::Arc;

use flamechart_protocol::{RenderCommand, ThemeToken};

use crate::chart::FlamechartView;
use crate::config::ChartConfig;
use crate::flamechart::Flamechart;
use crate::render::{MonospaceMeasurer, SoftwareRasterizer};
use crate::view::Surface;

/// Render a list of commands as an SVG document string.
///
/// `width` and `height` define the SVG viewBox dimensions. All commands are
/// taken to share one coordinate space, so overlay commands must have been
/// produced at a device pixel ratio of 1. `dark` selects the palette for
/// themed colors.
pub fn render_svg(commands: &[RenderCommand], width: f64, height: f64, dark: bool) -> String {
    let mut svg = String::with_capacity(commands.len() * 120);
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}" style="font-family:ui-monospace,Menlo,Consolas,monospace">"#,
    );

    let bg = resolve_color(ThemeToken::Background, dark);
    let _ = write!(svg, r#"<rect width="{width}" height="{height}" fill="{bg}"/>"#);

    for cmd in commands {
        match cmd {
            RenderCommand::DrawRect { rect, color } => {
                let _ = write!(
                    svg,
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
                    rect.left(),
                    rect.top(),
                    rect.width(),
                    rect.height(),
                    color.to_hex(),
                );
            }
            RenderCommand::FillText {
                position,
                text,
                color,
                font_size,
            } => {
                let _ = write!(
                    svg,
                    r#"<text x="{}" y="{}" fill="{}" font-size="{font_size}" dominant-baseline="hanging">{}</text>"#,
                    position.x,
                    position.y,
                    resolve_color(*color, dark),
                    escape_xml(text),
                );
            }
            // Nothing underneath to clear in a static document.
            RenderCommand::ClearRect { .. } => {}
        }
    }

    svg.push_str("</svg>");
    svg
}

/// Lay out the whole chart at `width` pixels, one `frame_height` row per
/// layer, and render both passes to SVG.
pub fn chart_to_svg(chart: Arc<Flamechart>, config: ChartConfig, width: f64, dark: bool) -> String {
    let height = (chart.layer_count() as f64 * config.frame_height).max(config.frame_height);
    let surface = Surface::new(width, height, 1.0);
    let mut raster = SoftwareRasterizer::new(surface);
    let mut view = FlamechartView::new(chart, config);

    if let Err(never) = view.attach(surface, &mut raster) {
        match never {}
    }
    let overlay = view.render(&mut raster, &mut MonospaceMeasurer::default());

    let mut commands = raster.take_commands();
    commands.extend(overlay);
    render_svg(&commands, width, height, dark)
}

fn resolve_color(token: ThemeToken, dark: bool) -> &'static str {
    if dark {
        match token {
            // Frame colors stay light in both palettes.
            ThemeToken::LabelText => "#1a1a2e",
            ThemeToken::TextPrimary => "#ececec",
            ThemeToken::TextMuted => "#9e9e9e",
            ThemeToken::Background => "#181818",
            ThemeToken::Surface => "#202020",
            ThemeToken::Border => "#303030",
        }
    } else {
        match token {
            ThemeToken::LabelText => "#1a1a2e",
            ThemeToken::TextPrimary => "#1a1a2e",
            ThemeToken::TextMuted => "#666677",
            ThemeToken::Background => "#ffffff",
            ThemeToken::Surface => "#f8f9fa",
            ThemeToken::Border => "#dee2e6",
        }
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
