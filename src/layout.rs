//! Geometry utilities shared by the widget generators.
//!
//! [`LayoutExtent`] is an explicit value threaded through draw calls and
//! folded by the caller — generators track every rendered point and text
//! anchor, then size the viewBox from the final extent so nothing clips.

use crate::widget::AxisSpec;

/// Accumulated bounding box of rendered content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutExtent {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl LayoutExtent {
    /// An empty extent; including the first point makes it finite.
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    pub fn include(self, x: f64, y: f64) -> Self {
        Self {
            min_x: self.min_x.min(x),
            max_x: self.max_x.max(x),
            min_y: self.min_y.min(y),
            max_y: self.max_y.max(y),
        }
    }

    /// Include a text run's horizontal span, estimated from character count.
    /// `anchor` matches the SVG `text-anchor` the text is drawn with.
    pub fn include_text(self, x: f64, y: f64, text: &str, font_size: f64, anchor: &str) -> Self {
        let width = estimate_text_width(text, font_size);
        let (left, right) = match anchor {
            "start" => (x, x + width),
            "end" => (x - width, x),
            _ => (x - width / 2.0, x + width / 2.0),
        };
        self.include(left, y - font_size)
            .include(right, y + font_size * 0.3)
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_y: self.min_y.min(other.min_y),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Grow by a fixed padding on every side.
    pub fn padded(self, pad: f64) -> Self {
        Self {
            min_x: self.min_x - pad,
            max_x: self.max_x + pad,
            min_y: self.min_y - pad,
            max_y: self.max_y + pad,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }
}

/// Character-count width estimate for sans-serif text.
pub fn estimate_text_width(text: &str, font_size: f64) -> f64 {
    text.chars().count() as f64 * font_size * 0.6
}

/// One fixed affine map from data space to pixel space.
///
/// Pixel ranges may be inverted (`px_max < px_min`) for y axes, where data
/// grows upward but screen coordinates grow downward.
#[derive(Debug, Clone, Copy)]
pub struct AxisTransform {
    data_min: f64,
    data_max: f64,
    px_min: f64,
    px_max: f64,
}

impl AxisTransform {
    pub fn new(axis: &AxisSpec, px_min: f64, px_max: f64) -> Self {
        Self {
            data_min: axis.min,
            data_max: axis.max,
            px_min,
            px_max,
        }
    }

    pub fn to_px(&self, v: f64) -> f64 {
        let t = (v - self.data_min) / (self.data_max - self.data_min);
        self.px_min + t * (self.px_max - self.px_min)
    }
}

/// Tick positions of an axis spec, inclusive of both ends.
pub fn tick_values(axis: &AxisSpec) -> Vec<f64> {
    let mut ticks = Vec::new();
    let mut v = axis.min;
    let mut i = 0u32;
    while v <= axis.max + axis.tick * 1e-9 {
        ticks.push(v);
        i += 1;
        v = axis.min + axis.tick * f64::from(i);
    }
    ticks
}

/// Least-squares line over the points. `None` for fewer than two points or a
/// vertical line (zero x-variance).
pub fn linear_regression(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (x, y) in points {
        sxx += (x - mean_x) * (x - mean_x);
        sxy += (x - mean_x) * (y - mean_y);
    }
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some((slope, mean_y - slope * mean_x))
}
