//! Widget generators.
//!
//! One pure function per widget kind: a validated widget value object in, an
//! XML fragment out (SVG for drawings, an XHTML table for tabular data).
//! Generators share no state; each computes its own layout extent and sizes
//! its viewBox from it.

mod charts;
mod numberline;
mod polyhedron;
mod table;

use crate::error::GeometryError;
use crate::widget::Widget;

pub use polyhedron::vertex_count;

/// Render one widget to its XML fragment.
///
/// `slot` names the widget in geometry errors.
pub fn render_widget(widget: &Widget, slot: &str, precision: usize) -> Result<String, GeometryError> {
    match widget {
        Widget::Polyhedron(w) => polyhedron::render(w, slot, precision),
        Widget::Scatter(w) => charts::render_scatter(w, slot, precision),
        Widget::LineGraph(w) => charts::render_line_graph(w, slot, precision),
        Widget::Bar(w) => charts::render_bar(w, slot, precision),
        Widget::ConceptualGraph(w) => charts::render_conceptual(w, slot, precision),
        Widget::CoordinateGrid(w) => charts::render_grid(w, slot, precision),
        Widget::NumberLine(w) => numberline::render(w, slot, precision),
        Widget::DataTable(w) => Ok(table::render(w)),
    }
}

/// Numeric label text: integers without a decimal point.
pub(crate) fn fmt_value(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{}", v.round() as i64)
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_value() {
        assert_eq!(fmt_value(4.0), "4");
        assert_eq!(fmt_value(-2.0), "-2");
        assert_eq!(fmt_value(2.5), "2.5");
    }
}
