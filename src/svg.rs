//! Shared SVG string building.
//!
//! Generators push shapes in draw order (the z-order is the statement order),
//! then close with the viewBox computed from their layout extent — the root
//! element is written last so dynamic sizing never clips content.

/// Decimal precision for emitted coordinates.
pub const DEFAULT_PRECISION: usize = 2;

/// Escape XML special characters in free text.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Incremental SVG fragment builder.
pub struct SvgBuilder {
    body: String,
    precision: usize,
}

impl SvgBuilder {
    pub fn new(precision: usize) -> Self {
        Self {
            body: String::new(),
            precision,
        }
    }

    fn fmt(&self, v: f64) -> String {
        format!("{:.p$}", v, p = self.precision)
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str, width: f64) {
        self.body.push_str(&format!(
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>",
            self.fmt(x1),
            self.fmt(y1),
            self.fmt(x2),
            self.fmt(y2),
            stroke,
            self.fmt(width),
        ));
    }

    pub fn dashed_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str, width: f64) {
        self.body.push_str(&format!(
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"{}\" stroke-dasharray=\"5 4\"/>",
            self.fmt(x1),
            self.fmt(y1),
            self.fmt(x2),
            self.fmt(y2),
            stroke,
            self.fmt(width),
        ));
    }

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &str, stroke: Option<&str>) {
        let stroke_attrs = match stroke {
            Some(s) => format!(" stroke=\"{s}\" stroke-width=\"1\""),
            None => String::new(),
        };
        self.body.push_str(&format!(
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"{}/>",
            self.fmt(x),
            self.fmt(y),
            self.fmt(w),
            self.fmt(h),
            fill,
            stroke_attrs,
        ));
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, fill: &str) {
        self.body.push_str(&format!(
            "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\"/>",
            self.fmt(cx),
            self.fmt(cy),
            self.fmt(r),
            fill,
        ));
    }

    pub fn polygon(&mut self, points: &[(f64, f64)], fill: &str, stroke: Option<&str>) {
        let pts: Vec<String> = points
            .iter()
            .map(|(x, y)| format!("{},{}", self.fmt(*x), self.fmt(*y)))
            .collect();
        let stroke_attrs = match stroke {
            Some(s) => format!(" stroke=\"{s}\" stroke-width=\"1\""),
            None => String::new(),
        };
        self.body.push_str(&format!(
            "<polygon points=\"{}\" fill=\"{}\"{}/>",
            pts.join(" "),
            fill,
            stroke_attrs,
        ));
    }

    pub fn polyline(&mut self, points: &[(f64, f64)], stroke: &str, width: f64) {
        let pts: Vec<String> = points
            .iter()
            .map(|(x, y)| format!("{},{}", self.fmt(*x), self.fmt(*y)))
            .collect();
        self.body.push_str(&format!(
            "<polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"/>",
            pts.join(" "),
            stroke,
            self.fmt(width),
        ));
    }

    /// Anchored text. `anchor` is an SVG `text-anchor` value.
    pub fn text(&mut self, x: f64, y: f64, content: &str, size: f64, anchor: &str) {
        self.body.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" font-size=\"{}\" font-family=\"sans-serif\" text-anchor=\"{}\">{}</text>",
            self.fmt(x),
            self.fmt(y),
            self.fmt(size),
            anchor,
            escape_xml(content),
        ));
    }

    /// Text over a white halo stroke, for legibility over crossing lines.
    pub fn text_with_halo(&mut self, x: f64, y: f64, content: &str, size: f64, anchor: &str) {
        self.body.push_str(&format!(
            "<text x=\"{x}\" y=\"{y}\" font-size=\"{s}\" font-family=\"sans-serif\" text-anchor=\"{anchor}\" stroke=\"#ffffff\" stroke-width=\"3\" stroke-linejoin=\"round\">{c}</text>",
            x = self.fmt(x),
            y = self.fmt(y),
            s = self.fmt(size),
            anchor = anchor,
            c = escape_xml(content),
        ));
        self.text(x, y, content, size, anchor);
    }

    /// Wrap the accumulated body in an `<svg>` root with the given viewBox.
    pub fn finish(self, min_x: f64, min_y: f64, width: f64, height: f64) -> String {
        let p = self.precision;
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w:.p$}\" height=\"{h:.p$}\" viewBox=\"{x:.p$} {y:.p$} {w:.p$} {h:.p$}\">{body}</svg>",
            x = min_x,
            y = min_y,
            w = width,
            h = height,
            body = self.body,
            p = p,
        )
    }
}
