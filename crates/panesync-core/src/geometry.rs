//! Pane-local geometry for diff overlays.
//!
//! Nothing here paints. These are the shapes a renderer fills: word
//! highlight rectangles, the band a hunk covers in a pane, the connector
//! between two panes with its merge button, and overview strip markers.

use crate::document::TextBuffer;
use crate::hunk::{Hunk, Side, Tone};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Half-open hit test
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }
}

/// Presentation metrics of a pane. Changing them invalidates every cached
/// word path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewMetrics {
    pub line_height: f64,
    pub char_width: f64,
}

impl Default for ViewMetrics {
    fn default() -> Self {
        Self {
            line_height: 16.0,
            char_width: 8.0,
        }
    }
}

impl ViewMetrics {
    pub fn line_to_y(&self, line: usize) -> f64 {
        line as f64 * self.line_height
    }

    /// Text-area coordinates of the top-left corner of the character at
    /// `offset`, assuming a monospace grid.
    pub fn point_at(&self, buffer: &dyn TextBuffer, offset: usize) -> Point {
        let line = buffer.line_at_offset(offset);
        let column = buffer
            .line(line)
            .map(|span| {
                buffer
                    .text_between(span.offset..offset.max(span.offset))
                    .chars()
                    .count()
            })
            .unwrap_or(0);
        Point {
            x: column as f64 * self.char_width,
            y: self.line_to_y(line),
        }
    }

    /// Rectangle from the start point of `start` to the start point of `end`,
    /// one line high
    pub fn span_rect(&self, buffer: &dyn TextBuffer, start: usize, end: usize) -> Rect {
        let from = self.point_at(buffer, start);
        let to = self.point_at(buffer, end);
        Rect::new(from.x, from.y, to.x - from.x, self.line_height)
    }
}

/// Word-highlight shape for one side of a hunk
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiffPath {
    rects: Vec<Rect>,
}

impl DiffPath {
    pub fn new(rects: Vec<Rect>) -> Self {
        Self { rects }
    }

    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

/// Vertical extent of a hunk in one pane, in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub top: f64,
    pub bottom: f64,
}

impl Band {
    /// Band of `hunk` on `side`, given the pane's vertical scroll value.
    /// Insertion points get a one pixel band so they stay visible.
    pub fn of(hunk: &Hunk, side: Side, metrics: &ViewMetrics, scroll: f64) -> Self {
        let range = hunk.lines(side);
        let top = metrics.line_to_y(range.start) - scroll;
        let mut bottom = metrics.line_to_y(range.end) - scroll;
        if top == bottom {
            bottom = top + 1.0;
        }
        Self { top, bottom }
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Glyph drawn on a merge button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonGlyph {
    /// Replace the target block with the source block
    Arrow,
    /// Drop or restore a block that exists on one side only
    Cross,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeButton {
    pub rect: Rect,
    pub glyph: ButtonGlyph,
}

/// Middle-area layout of one relation: where the controls sit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlLayout {
    pub width: f64,
    pub button_size: f64,
    pub line_width: f64,
    /// True when the source pane is left of the middle area
    pub source_on_left: bool,
}

impl ControlLayout {
    /// Button position for a hunk. The button sits next to the side that
    /// has removed lines, or next to the target when nothing was removed.
    pub fn button(&self, hunk: &Hunk, source: Band, target: Band) -> MergeButton {
        if hunk.removed > 0 {
            let x = if self.source_on_left {
                self.line_width
            } else {
                self.width - self.button_size
            };
            MergeButton {
                rect: Rect::new(x, source.top, self.button_size, source.height()),
                glyph: if hunk.inserted > 0 {
                    ButtonGlyph::Arrow
                } else {
                    ButtonGlyph::Cross
                },
            }
        } else {
            let x = if self.source_on_left {
                self.width - self.button_size
            } else {
                self.line_width
            };
            MergeButton {
                rect: Rect::new(
                    x,
                    target.top,
                    self.button_size - self.line_width,
                    target.height(),
                ),
                glyph: ButtonGlyph::Cross,
            }
        }
    }

    /// Horizontal extent of the connector curve, leaving room for the
    /// button gutter when controls are shown
    pub fn connector_span(&self, hunk: &Hunk, show_buttons: bool) -> (f64, f64) {
        let mut x1 = 0.0;
        let mut x2 = self.width;
        if show_buttons {
            if self.source_on_left == (hunk.removed > 0) {
                x1 += self.button_size;
            } else {
                x2 -= self.button_size;
            }
        }
        (x1, x2)
    }
}

/// Shape joining a hunk's band in the source pane to its band in the target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connector {
    pub hunk: Hunk,
    pub source: Band,
    pub target: Band,
    pub x1: f64,
    pub x2: f64,
    pub button: Option<MergeButton>,
    pub selected: bool,
}

impl Connector {
    /// X coordinate of both bezier control points
    pub fn control_x(&self) -> f64 {
        (self.x2 - self.x1) / 2.0
    }

    pub fn tone(&self, side: Side) -> Tone {
        self.hunk.tone(side)
    }
}

/// Mark on the overview strip, as fractions of the strip height
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverviewMarker {
    pub start: f64,
    pub height: f64,
    pub tone: Tone,
}

impl OverviewMarker {
    /// Pixel rectangle `(y, height)` on a strip of `strip_height`, never
    /// thinner than `min_height`
    pub fn to_pixels(&self, strip_height: f64, min_height: f64) -> (f64, f64) {
        (
            self.start * strip_height,
            (self.height * strip_height).max(min_height),
        )
    }
}

/// Overview markers for every hunk on one side of a pane with `line_count`
/// lines
pub fn overview_markers(
    hunks: impl Iterator<Item = Hunk>,
    side: Side,
    line_count: usize,
) -> Vec<OverviewMarker> {
    let lines = line_count.max(1) as f64;
    hunks
        .map(|hunk| OverviewMarker {
            start: hunk.start(side) as f64 / lines,
            height: hunk.count(side) as f64 / lines,
            tone: hunk.tone(side),
        })
        .collect()
}
