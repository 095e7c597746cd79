//! Number line renderer.
//!
//! The tick range comes from the widget spec; marks are drawn as filled dots
//! on the line. Overall width grows with the number of ticks — the viewBox
//! comes from the layout extent, so long ranges and wide labels never clip.

use crate::error::{GeometryError, GeometryErrorDetail};
use crate::layout::{AxisTransform, LayoutExtent, tick_values};
use crate::svg::SvgBuilder;
use crate::widget::{AxisSpec, NumberLineWidget};
use crate::widgets::fmt_value;

/// Horizontal pixels between adjacent ticks.
const TICK_SPACING: f64 = 36.0;
const LEFT: f64 = 20.0;
const BASE_Y: f64 = 36.0;
const TICK_HALF: f64 = 6.0;
const PAD: f64 = 12.0;

const LINE_COLOR: &str = "#333333";
const MARK_COLOR: &str = "#2e7d32";
const FONT_SIZE: f64 = 12.0;

pub fn render(
    widget: &NumberLineWidget,
    slot: &str,
    precision: usize,
) -> Result<String, GeometryError> {
    if !(widget.max > widget.min) || !(widget.tick > 0.0) {
        return Err(GeometryError {
            widget: slot.to_string(),
            detail: GeometryErrorDetail::DegenerateAxis { axis: "x" },
        });
    }

    let axis = AxisSpec {
        min: widget.min,
        max: widget.max,
        label: None,
        tick: widget.tick,
        gridlines: false,
    };
    let ticks = tick_values(&axis);
    let right = LEFT + (ticks.len().saturating_sub(1)) as f64 * TICK_SPACING;
    let t = AxisTransform::new(&axis, LEFT, right);

    let mut svg = SvgBuilder::new(precision);
    let mut ext = LayoutExtent::empty()
        .include(LEFT, BASE_Y)
        .include(right, BASE_Y);

    svg.line(LEFT - 8.0, BASE_Y, right + 8.0, BASE_Y, LINE_COLOR, 1.5);
    ext = ext.include(LEFT - 8.0, BASE_Y).include(right + 8.0, BASE_Y);

    for &v in &ticks {
        let x = t.to_px(v);
        svg.line(x, BASE_Y - TICK_HALF, x, BASE_Y + TICK_HALF, LINE_COLOR, 1.0);
        let label = fmt_value(v);
        let ly = BASE_Y + TICK_HALF + FONT_SIZE;
        svg.text(x, ly, &label, FONT_SIZE, "middle");
        ext = ext
            .include(x, BASE_Y - TICK_HALF)
            .include_text(x, ly, &label, FONT_SIZE, "middle");
    }

    for &mark in &widget.marks {
        let x = t.to_px(mark);
        svg.circle(x, BASE_Y, 5.0, MARK_COLOR);
        ext = ext.include(x - 5.0, BASE_Y - 5.0).include(x + 5.0, BASE_Y + 5.0);
    }

    let ext = ext.padded(PAD);
    Ok(svg.finish(ext.min_x, ext.min_y, ext.width(), ext.height()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_grows_with_range() {
        let narrow = render(
            &NumberLineWidget {
                min: 0.0,
                max: 4.0,
                tick: 1.0,
                marks: vec![],
            },
            "widget_1",
            2,
        )
        .unwrap();
        let wide = render(
            &NumberLineWidget {
                min: 0.0,
                max: 12.0,
                tick: 1.0,
                marks: vec![],
            },
            "widget_1",
            2,
        )
        .unwrap();

        let width = |svg: &str| {
            let start = svg.find("width=\"").unwrap() + "width=\"".len();
            let end = svg[start..].find('"').unwrap();
            svg[start..start + end].parse::<f64>().unwrap()
        };
        assert!(width(&wide) > width(&narrow));
    }

    #[test]
    fn test_marks_drawn_as_dots() {
        let svg = render(
            &NumberLineWidget {
                min: 0.0,
                max: 10.0,
                tick: 2.0,
                marks: vec![4.0, 8.0],
            },
            "widget_1",
            2,
        )
        .unwrap();
        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(svg.contains(MARK_COLOR));
    }

    #[test]
    fn test_zero_tick_rejected() {
        let err = render(
            &NumberLineWidget {
                min: 0.0,
                max: 5.0,
                tick: 0.0,
                marks: vec![],
            },
            "widget_1",
            2,
        )
        .unwrap_err();
        assert!(matches!(
            err.detail,
            GeometryErrorDetail::DegenerateAxis { .. }
        ));
    }
}
