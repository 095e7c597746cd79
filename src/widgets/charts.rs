//! Axis-driven chart generators: scatter, line, bar, conceptual graph, and
//! the empty coordinate grid.
//!
//! All scaled charts share one layout: a fixed plot area, one affine
//! transform per axis, and a fixed z-order — gridlines, axes and ticks,
//! trend line, data, labels. Tick and gridline counts come from the axis
//! spec, never from the data.

use crate::error::{GeometryError, GeometryErrorDetail};
use crate::layout::{AxisTransform, LayoutExtent, linear_regression, tick_values};
use crate::svg::SvgBuilder;
use crate::widget::{
    AxisSpec, BarWidget, ConceptualGraphWidget, CoordinateGridWidget, LineGraphWidget,
    ScatterWidget, Trend,
};
use crate::widgets::fmt_value;

const PLOT_LEFT: f64 = 48.0;
const PLOT_TOP: f64 = 16.0;
const PLOT_WIDTH: f64 = 300.0;
const PLOT_HEIGHT: f64 = 220.0;
const PAD: f64 = 10.0;

const GRID_COLOR: &str = "#d0d0d0";
const AXIS_COLOR: &str = "#333333";
const POINT_COLOR: &str = "#2266aa";
const TREND_COLOR: &str = "#c0392b";
const BAR_FILL: &str = "#5a9bd4";
const FONT_SIZE: f64 = 11.0;
const TICK_LEN: f64 = 4.0;

fn check_axis(axis: &AxisSpec, name: &'static str, slot: &str) -> Result<(), GeometryError> {
    if !(axis.max > axis.min) || !(axis.tick > 0.0) {
        return Err(GeometryError {
            widget: slot.to_string(),
            detail: GeometryErrorDetail::DegenerateAxis { axis: name },
        });
    }
    Ok(())
}

fn plot_bottom() -> f64 {
    PLOT_TOP + PLOT_HEIGHT
}

fn plot_right() -> f64 {
    PLOT_LEFT + PLOT_WIDTH
}

/// Gridlines, axes, tick marks and tick labels for a scaled x/y chart.
/// Returns the extent covering everything drawn.
fn draw_frame(
    svg: &mut SvgBuilder,
    x_axis: &AxisSpec,
    y_axis: &AxisSpec,
    tx: &AxisTransform,
    ty: &AxisTransform,
) -> LayoutExtent {
    let mut ext = LayoutExtent::empty()
        .include(PLOT_LEFT, PLOT_TOP)
        .include(plot_right(), plot_bottom());

    // Gridlines first; everything else layers above them.
    if x_axis.gridlines {
        for v in tick_values(x_axis) {
            let x = tx.to_px(v);
            svg.line(x, PLOT_TOP, x, plot_bottom(), GRID_COLOR, 1.0);
        }
    }
    if y_axis.gridlines {
        for v in tick_values(y_axis) {
            let y = ty.to_px(v);
            svg.line(PLOT_LEFT, y, plot_right(), y, GRID_COLOR, 1.0);
        }
    }

    svg.line(PLOT_LEFT, plot_bottom(), plot_right(), plot_bottom(), AXIS_COLOR, 1.5);
    svg.line(PLOT_LEFT, PLOT_TOP, PLOT_LEFT, plot_bottom(), AXIS_COLOR, 1.5);

    for v in tick_values(x_axis) {
        let x = tx.to_px(v);
        svg.line(x, plot_bottom(), x, plot_bottom() + TICK_LEN, AXIS_COLOR, 1.0);
        let label = fmt_value(v);
        let ly = plot_bottom() + TICK_LEN + FONT_SIZE;
        svg.text(x, ly, &label, FONT_SIZE, "middle");
        ext = ext.include_text(x, ly, &label, FONT_SIZE, "middle");
    }
    for v in tick_values(y_axis) {
        let y = ty.to_px(v);
        svg.line(PLOT_LEFT - TICK_LEN, y, PLOT_LEFT, y, AXIS_COLOR, 1.0);
        let label = fmt_value(v);
        let lx = PLOT_LEFT - TICK_LEN - 4.0;
        svg.text(lx, y + FONT_SIZE * 0.35, &label, FONT_SIZE, "end");
        ext = ext.include_text(lx, y + FONT_SIZE * 0.35, &label, FONT_SIZE, "end");
    }

    if let Some(label) = &x_axis.label {
        let lx = PLOT_LEFT + PLOT_WIDTH / 2.0;
        let ly = plot_bottom() + TICK_LEN + FONT_SIZE * 2.6;
        svg.text(lx, ly, label, FONT_SIZE, "middle");
        ext = ext.include_text(lx, ly, label, FONT_SIZE, "middle");
    }
    if let Some(label) = &y_axis.label {
        // Drawn horizontally above the axis; rotation would complicate the
        // extent tracking for no visual gain at these sizes.
        let ly = PLOT_TOP - 6.0;
        svg.text(PLOT_LEFT, ly, label, FONT_SIZE, "start");
        ext = ext.include_text(PLOT_LEFT, ly, label, FONT_SIZE, "start");
    }

    ext
}

pub fn render_scatter(
    widget: &ScatterWidget,
    slot: &str,
    precision: usize,
) -> Result<String, GeometryError> {
    check_axis(&widget.x_axis, "x", slot)?;
    check_axis(&widget.y_axis, "y", slot)?;
    if widget.points.is_empty() {
        return Err(GeometryError {
            widget: slot.to_string(),
            detail: GeometryErrorDetail::EmptyData,
        });
    }

    let tx = AxisTransform::new(&widget.x_axis, PLOT_LEFT, plot_right());
    let ty = AxisTransform::new(&widget.y_axis, plot_bottom(), PLOT_TOP);

    let mut svg = SvgBuilder::new(precision);
    let mut ext = draw_frame(&mut svg, &widget.x_axis, &widget.y_axis, &tx, &ty);

    if let Some(trend) = &widget.trend {
        let segment = match trend {
            Trend::Fitted => linear_regression(&widget.points).map(|(slope, intercept)| {
                let x1 = widget.x_axis.min;
                let x2 = widget.x_axis.max;
                ((x1, slope * x1 + intercept), (x2, slope * x2 + intercept))
            }),
            Trend::Literal { from, to } => Some((*from, *to)),
        };
        if let Some(((x1, y1), (x2, y2))) = segment {
            let (px1, py1) = (tx.to_px(x1), ty.to_px(y1));
            let (px2, py2) = (tx.to_px(x2), ty.to_px(y2));
            svg.line(px1, py1, px2, py2, TREND_COLOR, 1.5);
            ext = ext.include(px1, py1).include(px2, py2);
        }
    }

    for &(x, y) in &widget.points {
        let (px, py) = (tx.to_px(x), ty.to_px(y));
        svg.circle(px, py, 3.0, POINT_COLOR);
        ext = ext.include(px - 3.0, py - 3.0).include(px + 3.0, py + 3.0);
    }

    let ext = ext.padded(PAD);
    Ok(svg.finish(ext.min_x, ext.min_y, ext.width(), ext.height()))
}

pub fn render_line_graph(
    widget: &LineGraphWidget,
    slot: &str,
    precision: usize,
) -> Result<String, GeometryError> {
    check_axis(&widget.x_axis, "x", slot)?;
    check_axis(&widget.y_axis, "y", slot)?;
    if widget.points.len() < 2 {
        return Err(GeometryError {
            widget: slot.to_string(),
            detail: GeometryErrorDetail::EmptyData,
        });
    }

    let tx = AxisTransform::new(&widget.x_axis, PLOT_LEFT, plot_right());
    let ty = AxisTransform::new(&widget.y_axis, plot_bottom(), PLOT_TOP);

    let mut svg = SvgBuilder::new(precision);
    let mut ext = draw_frame(&mut svg, &widget.x_axis, &widget.y_axis, &tx, &ty);

    let px_points: Vec<(f64, f64)> = widget
        .points
        .iter()
        .map(|&(x, y)| (tx.to_px(x), ty.to_px(y)))
        .collect();
    svg.polyline(&px_points, POINT_COLOR, 2.0);
    for &(px, py) in &px_points {
        svg.circle(px, py, 2.5, POINT_COLOR);
        ext = ext.include(px - 2.5, py - 2.5).include(px + 2.5, py + 2.5);
    }

    let ext = ext.padded(PAD);
    Ok(svg.finish(ext.min_x, ext.min_y, ext.width(), ext.height()))
}

pub fn render_bar(
    widget: &BarWidget,
    slot: &str,
    precision: usize,
) -> Result<String, GeometryError> {
    check_axis(&widget.value_axis, "value", slot)?;
    if widget.categories.is_empty() {
        return Err(GeometryError {
            widget: slot.to_string(),
            detail: GeometryErrorDetail::EmptyData,
        });
    }

    let ty = AxisTransform::new(&widget.value_axis, plot_bottom(), PLOT_TOP);
    let n = widget.categories.len() as f64;
    let band = PLOT_WIDTH / n;
    let bar_width = band * 0.6;

    let mut svg = SvgBuilder::new(precision);
    let mut ext = LayoutExtent::empty()
        .include(PLOT_LEFT, PLOT_TOP)
        .include(plot_right(), plot_bottom());

    if widget.value_axis.gridlines {
        for v in tick_values(&widget.value_axis) {
            let y = ty.to_px(v);
            svg.line(PLOT_LEFT, y, plot_right(), y, GRID_COLOR, 1.0);
        }
    }

    svg.line(PLOT_LEFT, plot_bottom(), plot_right(), plot_bottom(), AXIS_COLOR, 1.5);
    svg.line(PLOT_LEFT, PLOT_TOP, PLOT_LEFT, plot_bottom(), AXIS_COLOR, 1.5);

    for v in tick_values(&widget.value_axis) {
        let y = ty.to_px(v);
        svg.line(PLOT_LEFT - TICK_LEN, y, PLOT_LEFT, y, AXIS_COLOR, 1.0);
        let label = fmt_value(v);
        let lx = PLOT_LEFT - TICK_LEN - 4.0;
        svg.text(lx, y + FONT_SIZE * 0.35, &label, FONT_SIZE, "end");
        ext = ext.include_text(lx, y + FONT_SIZE * 0.35, &label, FONT_SIZE, "end");
    }

    let baseline = ty.to_px(widget.value_axis.min.max(0.0));
    for (i, (label, value)) in widget.categories.iter().enumerate() {
        let x = PLOT_LEFT + band * i as f64 + (band - bar_width) / 2.0;
        let top = ty.to_px(*value);
        let (y, h) = if top <= baseline {
            (top, baseline - top)
        } else {
            (baseline, top - baseline)
        };
        svg.rect(x, y, bar_width, h, BAR_FILL, Some(AXIS_COLOR));

        let lx = x + bar_width / 2.0;
        let ly = plot_bottom() + TICK_LEN + FONT_SIZE;
        svg.text(lx, ly, label, FONT_SIZE, "middle");
        ext = ext.include_text(lx, ly, label, FONT_SIZE, "middle");
    }

    if let Some(label) = &widget.value_axis.label {
        let ly = PLOT_TOP - 6.0;
        svg.text(PLOT_LEFT, ly, label, FONT_SIZE, "start");
        ext = ext.include_text(PLOT_LEFT, ly, label, FONT_SIZE, "start");
    }

    let ext = ext.padded(PAD);
    Ok(svg.finish(ext.min_x, ext.min_y, ext.width(), ext.height()))
}

/// Unscaled qualitative curve: arrow axes, no ticks, data normalized to the
/// canvas.
pub fn render_conceptual(
    widget: &ConceptualGraphWidget,
    slot: &str,
    precision: usize,
) -> Result<String, GeometryError> {
    if widget.points.len() < 2 {
        return Err(GeometryError {
            widget: slot.to_string(),
            detail: GeometryErrorDetail::EmptyData,
        });
    }

    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in &widget.points {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    let span_x = if max_x > min_x { max_x - min_x } else { 1.0 };
    let span_y = if max_y > min_y { max_y - min_y } else { 1.0 };

    let inner_left = PLOT_LEFT + 12.0;
    let inner_right = plot_right() - 24.0;
    let inner_top = PLOT_TOP + 24.0;
    let inner_bottom = plot_bottom() - 12.0;

    let mut svg = SvgBuilder::new(precision);
    let mut ext = LayoutExtent::empty()
        .include(PLOT_LEFT, PLOT_TOP)
        .include(plot_right(), plot_bottom());

    // Axis arrows.
    svg.line(PLOT_LEFT, plot_bottom(), plot_right(), plot_bottom(), AXIS_COLOR, 1.5);
    svg.polygon(
        &[
            (plot_right(), plot_bottom() - 4.0),
            (plot_right() + 8.0, plot_bottom()),
            (plot_right(), plot_bottom() + 4.0),
        ],
        AXIS_COLOR,
        None,
    );
    svg.line(PLOT_LEFT, plot_bottom(), PLOT_LEFT, PLOT_TOP, AXIS_COLOR, 1.5);
    svg.polygon(
        &[
            (PLOT_LEFT - 4.0, PLOT_TOP),
            (PLOT_LEFT, PLOT_TOP - 8.0),
            (PLOT_LEFT + 4.0, PLOT_TOP),
        ],
        AXIS_COLOR,
        None,
    );
    ext = ext
        .include(plot_right() + 8.0, plot_bottom())
        .include(PLOT_LEFT, PLOT_TOP - 8.0);

    let px_points: Vec<(f64, f64)> = widget
        .points
        .iter()
        .map(|&(x, y)| {
            (
                inner_left + (x - min_x) / span_x * (inner_right - inner_left),
                inner_bottom - (y - min_y) / span_y * (inner_bottom - inner_top),
            )
        })
        .collect();
    svg.polyline(&px_points, POINT_COLOR, 2.0);

    if let Some(label) = &widget.x_label {
        let lx = plot_right() + 10.0;
        let ly = plot_bottom() + FONT_SIZE * 1.2;
        svg.text(lx, ly, label, FONT_SIZE, "end");
        ext = ext.include_text(lx, ly, label, FONT_SIZE, "end");
    }
    if let Some(label) = &widget.y_label {
        let ly = PLOT_TOP - 12.0;
        svg.text(PLOT_LEFT, ly, label, FONT_SIZE, "start");
        ext = ext.include_text(PLOT_LEFT, ly, label, FONT_SIZE, "start");
    }

    let ext = ext.padded(PAD);
    Ok(svg.finish(ext.min_x, ext.min_y, ext.width(), ext.height()))
}

pub fn render_grid(
    widget: &CoordinateGridWidget,
    slot: &str,
    precision: usize,
) -> Result<String, GeometryError> {
    check_axis(&widget.x_axis, "x", slot)?;
    check_axis(&widget.y_axis, "y", slot)?;

    let tx = AxisTransform::new(&widget.x_axis, PLOT_LEFT, plot_right());
    let ty = AxisTransform::new(&widget.y_axis, plot_bottom(), PLOT_TOP);

    let mut svg = SvgBuilder::new(precision);
    let ext = draw_frame(&mut svg, &widget.x_axis, &widget.y_axis, &tx, &ty).padded(PAD);
    Ok(svg.finish(ext.min_x, ext.min_y, ext.width(), ext.height()))
}
