use std::borrow::Cow;
use std::collections::HashMap;

use flamechart_protocol::{Rect, RenderCommand, ThemeToken};

use crate::flamechart::{Flamechart, config_space_bounds};
use crate::model::Frame;
use crate::view::{SpaceTransforms, Surface};

const ELLIPSIS: char = '…';
const MIN_LABEL_SAMPLE: &str = "X…X";

/// Measures rendered text width in overlay pixels.
pub trait TextMeasurer {
    fn measure(&mut self, text: &str, font_size: f64) -> f64;
}

/// Every character advances by `font_size * advance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasurer {
    pub advance: f64,
}

impl MonospaceMeasurer {
    pub fn new(advance: f64) -> Self {
        Self { advance }
    }
}

impl Default for MonospaceMeasurer {
    fn default() -> Self {
        Self { advance: 0.6 }
    }
}

impl TextMeasurer for MonospaceMeasurer {
    fn measure(&mut self, text: &str, font_size: f64) -> f64 {
        text.chars().count() as f64 * font_size * self.advance
    }
}

/// Memoized text widths keyed by font size, then by the exact string.
/// Never evicted; it lives as long as the view that owns it. The device
/// pixel ratio can change under a view, so one view may measure at several
/// font sizes.
#[derive(Debug, Default)]
pub struct TextWidthCache {
    widths: HashMap<u64, HashMap<String, f64>>,
}

impl TextWidthCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(&mut self, text: &str, font_size: f64, measurer: &mut dyn TextMeasurer) -> f64 {
        let sized = self.widths.entry(font_size.to_bits()).or_default();
        if let Some(&w) = sized.get(text) {
            return w;
        }
        let w = measurer.measure(text, font_size);
        sized.insert(text.to_owned(), w);
        w
    }

    /// Cached entries across all font sizes.
    pub fn len(&self) -> usize {
        self.widths.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `n` characters of `chars` around an ellipsis: the first `⌈n/2⌉` and the
/// last `⌊n/2⌋`.
fn elide(chars: &[char], n: usize) -> String {
    let head = n.div_ceil(2);
    let tail = n / 2;
    let mut out = String::with_capacity(n + ELLIPSIS.len_utf8());
    out.extend(&chars[..head]);
    out.push(ELLIPSIS);
    out.extend(&chars[chars.len() - tail..]);
    out
}

/// Fit `text` into `max_width`, eliding its middle when necessary.
///
/// Returns the text unchanged if it fits, otherwise the longest elided form
/// that does, or an empty string when not even the ellipsis fits.
pub fn trim_text_to_fit<'a>(
    text: &'a str,
    max_width: f64,
    font_size: f64,
    cache: &mut TextWidthCache,
    measurer: &mut dyn TextMeasurer,
) -> Cow<'a, str> {
    if cache.width(text, font_size, measurer) <= max_width {
        return Cow::Borrowed(text);
    }
    let chars: Vec<char> = text.chars().collect();
    let mut fits = |candidate: &str| cache.width(candidate, font_size, measurer) <= max_width;

    let shortest = elide(&chars, 0);
    if chars.is_empty() || !fits(&shortest) {
        return Cow::Owned(String::new());
    }

    // Largest n in [0, len) whose elided form fits; n = 0 is known to fit.
    let (mut lo, mut hi) = (0, chars.len() - 1);
    while lo < hi {
        let mid = (lo + hi).div_ceil(2);
        if fits(&elide(&chars, mid)) {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    Cow::Owned(elide(&chars, lo))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub config_space_bounds: Rect,
    pub frame: Frame,
}

/// Overlay pass: one label per interval, clipped to its rectangle.
#[derive(Debug)]
pub struct LabelRenderer {
    labels: Vec<Label>,
    cache: TextWidthCache,
    font_size: f64,
    padding: f64,
}

impl LabelRenderer {
    /// `font_size` and `padding` are in view pixels.
    pub fn new(font_size: f64, padding: f64) -> Self {
        Self {
            labels: Vec::new(),
            cache: TextWidthCache::new(),
            font_size,
            padding,
        }
    }

    pub fn prepare(&mut self, chart: &Flamechart) {
        self.labels = chart
            .intervals()
            .map(|(depth, interval)| Label {
                config_space_bounds: config_space_bounds(depth, interval),
                frame: interval.frame.clone(),
            })
            .collect();
        tracing::debug!(labels = self.labels.len(), "prepared labels");
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn cache(&self) -> &TextWidthCache {
        &self.cache
    }

    pub fn clear(&mut self) {
        self.labels.clear();
    }

    pub fn render(
        &mut self,
        transforms: &SpaceTransforms,
        surface: &Surface,
        measurer: &mut dyn TextMeasurer,
    ) -> Vec<RenderCommand> {
        let overlay = surface.overlay_rect();
        let dpr = surface.device_pixel_ratio;
        let font_size = self.font_size * dpr;
        let padding = self.padding * dpr;
        let to_overlay = transforms.config_space_to_overlay_space();
        let min_width = self.cache.width(MIN_LABEL_SAMPLE, font_size, measurer);

        let mut commands = vec![RenderCommand::ClearRect { rect: overlay }];
        for label in &self.labels {
            let bounds = to_overlay
                .transform_rect(&label.config_space_bounds)
                .shrink(padding);
            if bounds.width() < min_width || !bounds.has_intersection_with(&overlay) {
                continue;
            }
            let text = match trim_text_to_fit(
                &label.frame.name,
                bounds.width(),
                font_size,
                &mut self.cache,
                measurer,
            ) {
                Cow::Borrowed(_) => label.frame.name.clone(),
                Cow::Owned(s) if s.is_empty() => continue,
                Cow::Owned(s) => s.into(),
            };
            commands.push(RenderCommand::FillText {
                position: bounds.origin,
                text,
                color: ThemeToken::LabelText,
                font_size,
            });
        }
        commands
    }
}
