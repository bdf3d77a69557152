use std::io::stdout;
use std::ops::Range;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use flamechart_core::FlamechartView;
use flamechart_core::render::{MonospaceMeasurer, SoftwareRasterizer};
use flamechart_core::view::{InteractionEvent, Surface};
use flamechart_protocol::{RenderCommand, ThemeToken, Vec2};
use ratatui::{
    Frame, Terminal,
    backend::Backend,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Paragraph},
};

/// Wheel delta of one ctrl+scroll notch: a 10% zoom step.
const ZOOM_NOTCH: f64 = 10.0;
/// Columns moved by one horizontal scroll notch.
const SCROLL_COLUMNS: f64 = 4.0;

fn theme_to_color(token: ThemeToken) -> Color {
    match token {
        ThemeToken::LabelText => Color::Rgb(0x1e, 0x1e, 0x2e),
        ThemeToken::TextPrimary => Color::White,
        ThemeToken::TextMuted => Color::Gray,
        ThemeToken::Background | ThemeToken::Surface => Color::Black,
        ThemeToken::Border => Color::DarkGray,
    }
}

fn cell_color(color: &flamechart_protocol::Color) -> Color {
    let [r, g, b, _] = color.to_rgba8();
    Color::Rgb(r, g, b)
}

/// Cells covered by the view-space span `[lo, hi)`, clipped to `[0, limit)`.
fn cell_span(lo: f64, hi: f64, limit: u16) -> Range<u16> {
    let clip = |v: f64| v.round().clamp(0.0, f64::from(limit)) as u16;
    clip(lo)..clip(hi)
}

/// Paint rectangle and label commands (view space, one unit per cell) into
/// `area`. Rectangles fill cell backgrounds; labels then write characters
/// over them.
pub fn paint(buf: &mut Buffer, area: Rect, rects: &[RenderCommand], overlay: &[RenderCommand]) {
    for cmd in rects.iter().chain(overlay) {
        match cmd {
            RenderCommand::DrawRect { rect, color } => {
                let bg = cell_color(color);
                for y in cell_span(rect.top(), rect.bottom(), area.height) {
                    for x in cell_span(rect.left(), rect.right(), area.width) {
                        buf[(area.x + x, area.y + y)].set_char(' ').set_bg(bg);
                    }
                }
            }
            RenderCommand::FillText {
                position,
                text,
                color,
                ..
            } => {
                let row = position.y.round();
                if row < 0.0 || row >= f64::from(area.height) {
                    continue;
                }
                let fg = theme_to_color(*color);
                let start = position.x.round();
                for (i, ch) in text.chars().enumerate() {
                    let col = start + i as f64;
                    if col < 0.0 {
                        continue;
                    }
                    if col >= f64::from(area.width) {
                        break;
                    }
                    buf[(area.x + col as u16, area.y + row as u16)]
                        .set_char(ch)
                        .set_fg(fg);
                }
            }
            RenderCommand::ClearRect { .. } => {}
        }
    }
}

/// Map a terminal mouse wheel event over `content` to a chart interaction.
/// Ctrl turns vertical scrolling into zoom around the pointer.
pub fn mouse_interaction(mouse: &MouseEvent, content: Rect) -> Option<InteractionEvent> {
    if !content.contains((mouse.column, mouse.row).into()) {
        return None;
    }
    let zoom = mouse.modifiers.contains(KeyModifiers::CONTROL);
    let step = if zoom { ZOOM_NOTCH } else { 1.0 };
    let delta = match mouse.kind {
        MouseEventKind::ScrollUp => Vec2::new(0.0, -step),
        MouseEventKind::ScrollDown => Vec2::new(0.0, step),
        MouseEventKind::ScrollLeft => Vec2::new(-SCROLL_COLUMNS, 0.0),
        MouseEventKind::ScrollRight => Vec2::new(SCROLL_COLUMNS, 0.0),
        _ => return None,
    };
    let offset = Vec2::new(
        f64::from(mouse.column - content.x),
        f64::from(mouse.row - content.y),
    );
    Some(InteractionEvent::wheel(offset, delta, zoom))
}

/// Header, chart and status rows.
fn split(area: Rect) -> (Rect, Rect, Rect) {
    let header = Rect::new(area.x, area.y, area.width, area.height.min(1));
    let content_height = area.height.saturating_sub(2);
    let content = Rect::new(area.x, area.y + header.height, area.width, content_height);
    let status = Rect::new(
        area.x,
        content.bottom(),
        area.width,
        area.height.saturating_sub(header.height + content_height),
    );
    (header, content, status)
}

fn format_weight(weight: f64) -> String {
    if weight.abs() < 1000.0 {
        format!("{weight:.1}")
    } else if weight.abs() < 1_000_000.0 {
        format!("{:.2}k", weight / 1000.0)
    } else {
        format!("{:.2}M", weight / 1_000_000.0)
    }
}

/// Interactive terminal flamechart: one cell per view-space unit, one row
/// per stack layer.
pub struct Viewer {
    view: FlamechartView,
    raster: SoftwareRasterizer,
    measurer: MonospaceMeasurer,
    title: String,
    content: Rect,
    hover: Option<(u16, u16)>,
    drag_from: Option<(u16, u16)>,
}

impl Viewer {
    pub fn new(view: FlamechartView, title: impl Into<String>) -> Self {
        Self {
            view,
            raster: SoftwareRasterizer::new(Surface::new(1.0, 1.0, 1.0)),
            measurer: MonospaceMeasurer::new(1.0),
            title: title.into(),
            content: Rect::default(),
            hover: None,
            drag_from: None,
        }
    }

    pub fn view(&self) -> &FlamechartView {
        &self.view
    }

    /// Attach to (or resize onto) the chart area of the terminal.
    fn sync_surface(&mut self, content: Rect) {
        self.content = content;
        let surface = Surface::new(f64::from(content.width), f64::from(content.height), 1.0);
        self.raster.set_surface(surface);
        if self.view.is_attached() {
            self.view.resize(surface);
        } else if let Err(e) = self.view.attach(surface, &mut self.raster) {
            tracing::warn!(error = %e, "software upload failed");
        }
    }

    pub fn draw(&mut self, frame: &mut Frame<'_>) {
        let (header_area, content, status_area) = split(frame.area());
        self.sync_surface(content);

        let chart = self.view.chart();
        let zoom = match (self.view.viewport(), self.view.surface()) {
            (Some(viewport), Some(surface)) => 100.0 * surface.width / viewport.width(),
            _ => 100.0,
        };
        let header = Paragraph::new(format!(
            " flamechart: {} | {} layers | {} frames | zoom {zoom:.0}% ",
            self.title,
            chart.layer_count(),
            chart.interval_count(),
        ))
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));
        frame.render_widget(header, header_area);

        frame.render_widget(
            Block::default().style(Style::default().bg(theme_to_color(ThemeToken::Background))),
            content,
        );
        let overlay = self.view.render(&mut self.raster, &mut self.measurer);
        paint(frame.buffer_mut(), content, self.raster.commands(), &overlay);

        let status = Paragraph::new(self.status_text())
            .style(Style::default().fg(theme_to_color(ThemeToken::TextMuted)));
        frame.render_widget(status, status_area);
    }

    fn status_text(&self) -> String {
        let hovered = self
            .hover
            .filter(|&(col, row)| self.content.contains((col, row).into()))
            .and_then(|(col, row)| {
            let offset = Vec2::new(
                f64::from(col.checked_sub(self.content.x)?) + 0.5,
                f64::from(row.checked_sub(self.content.y)?) + 0.5,
            );
            self.view.frame_at(offset)
        });
        match hovered {
            Some(frame) => {
                let total = self.view.chart().duration().max(f64::MIN_POSITIVE);
                let file = frame
                    .frame
                    .file
                    .as_ref()
                    .map(|f| format!(" ({f})"))
                    .unwrap_or_default();
                format!(
                    " {}{file} | {} | {:.1}%",
                    frame.frame.name,
                    format_weight(frame.duration()),
                    100.0 * frame.duration() / total,
                )
            }
            None => " ←→ pan | ↑↓ scroll | +/- zoom | ctrl+wheel zoom | 0 reset | q quit".into(),
        }
    }

    /// Returns `true` when the key asks to quit.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        let width = f64::from(self.content.width);
        let center = Vec2::new(width / 2.0, f64::from(self.content.height) / 2.0);
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Left | KeyCode::Char('h' | 'a') => {
                self.view.pan(Vec2::new(-width * 0.1, 0.0));
            }
            KeyCode::Right | KeyCode::Char('l' | 'd') => {
                self.view.pan(Vec2::new(width * 0.1, 0.0));
            }
            KeyCode::Up | KeyCode::Char('k' | 'w') => {
                self.view.pan(Vec2::new(0.0, -1.0));
            }
            KeyCode::Down | KeyCode::Char('j' | 's') => {
                self.view.pan(Vec2::new(0.0, 1.0));
            }
            KeyCode::Char('+' | '=') => {
                self.view.zoom(center, 0.5);
            }
            KeyCode::Char('-') => {
                self.view.zoom(center, 2.0);
            }
            KeyCode::Char('0') => self.view.reset_zoom(),
            _ => {}
        }
        false
    }

    pub fn handle_mouse(&mut self, mouse: &MouseEvent) {
        let position = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Moved => self.hover = Some(position),
            MouseEventKind::Down(MouseButton::Left) => self.drag_from = Some(position),
            MouseEventKind::Up(MouseButton::Left) => self.drag_from = None,
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some((col, row)) = self.drag_from.replace(position) {
                    self.view.pan(Vec2::new(
                        f64::from(col) - f64::from(mouse.column),
                        f64::from(row) - f64::from(mouse.row),
                    ));
                }
                self.hover = Some(position);
            }
            _ => {
                if let Some(interaction) = mouse_interaction(mouse, self.content) {
                    self.view.handle_interaction(&interaction);
                }
            }
        }
    }
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, viewer: &mut Viewer) -> Result<()> {
    loop {
        terminal.draw(|frame| viewer.draw(frame))?;

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if viewer.handle_key(&key) {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => viewer.handle_mouse(&mouse),
                _ => {}
            }
        }
    }
}

pub fn render_tui(viewer: &mut Viewer) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Restore the terminal even when the loop fails.
    let result = event_loop(&mut terminal, viewer);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use flamechart_core::{ChartConfig, Flamechart, ProfileBuilder};
    use ratatui::backend::TestBackend;

    fn viewer() -> Viewer {
        let mut b = ProfileBuilder::new();
        b.push_named_sample(&["main", "parse"], 25.0);
        b.push_named_sample(&["main", "render", "layout"], 75.0);
        let config = ChartConfig {
            frame_height: 1.0,
            label_font_size: 1.0,
            label_padding: 0.0,
            ..ChartConfig::default().with_color_seed(1)
        };
        let chart = Flamechart::from_profile(&b.build(), config.color_seed);
        Viewer::new(FlamechartView::new(chart, config), "test")
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect()
    }

    #[test]
    fn rects_fill_cells_and_labels_overwrite_them() {
        let area = Rect::new(0, 0, 10, 3);
        let mut buf = Buffer::empty(area);
        let red = flamechart_protocol::Color::rgb(1.0, 0.0, 0.0);
        let rects = [RenderCommand::DrawRect {
            rect: flamechart_protocol::Rect::from_xywh(2.0, 1.0, 6.0, 1.0),
            color: red,
        }];
        let overlay = [RenderCommand::FillText {
            position: Vec2::new(3.0, 1.0),
            text: "draw".into(),
            color: ThemeToken::LabelText,
            font_size: 1.0,
        }];
        paint(&mut buf, area, &rects, &overlay);

        assert_eq!(row_text(&buf, 1), "   draw   ");
        assert_eq!(buf[(2, 1)].bg, Color::Rgb(255, 0, 0));
        assert_eq!(buf[(7, 1)].bg, Color::Rgb(255, 0, 0));
        assert_eq!(buf[(8, 1)].bg, Color::Reset);
        assert_eq!(buf[(2, 0)].bg, Color::Reset);
    }

    #[test]
    fn text_is_clipped_at_the_right_edge() {
        let area = Rect::new(0, 0, 5, 1);
        let mut buf = Buffer::empty(area);
        let overlay = [RenderCommand::FillText {
            position: Vec2::new(2.0, 0.0),
            text: "layout".into(),
            color: ThemeToken::LabelText,
            font_size: 1.0,
        }];
        paint(&mut buf, area, &[], &overlay);
        assert_eq!(row_text(&buf, 0), "  lay");
    }

    #[test]
    fn ctrl_scroll_zooms_at_the_pointer() {
        let content = Rect::new(0, 1, 80, 20);
        let mouse = MouseEvent {
            kind: MouseEventKind::ScrollUp,
            column: 40,
            row: 6,
            modifiers: KeyModifiers::CONTROL,
        };
        let interaction = mouse_interaction(&mouse, content).expect("inside the chart");
        assert_eq!(
            interaction.gesture(),
            Some(flamechart_core::view::Gesture::Zoom {
                focus: Vec2::new(40.0, 5.0),
                multiplier: 0.9,
            })
        );

        let header = MouseEvent { row: 0, ..mouse };
        assert!(mouse_interaction(&header, content).is_none());
    }

    #[test]
    fn draws_layers_with_labels() {
        let mut terminal = Terminal::new(TestBackend::new(40, 6)).expect("test backend");
        let mut viewer = viewer();
        terminal
            .draw(|frame| viewer.draw(frame))
            .expect("draw");

        let buf = terminal.backend().buffer();
        // Row 1 is layer 0 (main across the full width).
        assert!(row_text(buf, 1).starts_with("main"));
        // Layer 1: parse (10 cols) then render (30 cols).
        let layer1 = row_text(buf, 2);
        assert!(layer1.starts_with("parse"), "{layer1:?}");
        assert_eq!(&layer1[10..16], "render");
        assert!(row_text(buf, 0).contains("3 layers"));
    }

    #[test]
    fn keys_zoom_and_reset() {
        let mut terminal = Terminal::new(TestBackend::new(40, 6)).expect("test backend");
        let mut viewer = viewer();
        terminal.draw(|frame| viewer.draw(frame)).expect("draw");

        let plus = KeyEvent::from(KeyCode::Char('+'));
        assert!(!viewer.handle_key(&plus));
        let zoomed = viewer.view().viewport().expect("attached");
        assert!((zoomed.width() - 20.0).abs() < 1e-9);

        viewer.handle_key(&KeyEvent::from(KeyCode::Char('0')));
        let reset = viewer.view().viewport().expect("attached");
        assert!((reset.width() - 40.0).abs() < 1e-9);

        assert!(viewer.handle_key(&KeyEvent::from(KeyCode::Char('q'))));
    }
}
