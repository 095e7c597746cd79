//! The closed widget vocabulary and realized widget value objects.
//!
//! `WidgetKind` enumerates every renderer this crate ships; the mapping phase
//! assigns each widget slot exactly one kind or the explicit
//! [`MappedKind::NotFound`] sentinel — there is no open-ended fallback bag.
//! A [`Widget`] carries only the geometric/semantic parameters its generator
//! needs, is constructed once during realization, and is consumed exactly
//! once by its generator.

use std::collections::BTreeMap;

pub use crate::content::{SolidDimensions, SolidShape};

/// The fixed, closed set of widget-type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    PolyhedronDiagram,
    ScatterPlot,
    LineGraph,
    BarChart,
    ConceptualGraph,
    NumberLine,
    CoordinateGrid,
    DataTable,
}

impl WidgetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WidgetKind::PolyhedronDiagram => "polyhedronDiagram",
            WidgetKind::ScatterPlot => "scatterPlot",
            WidgetKind::LineGraph => "lineGraph",
            WidgetKind::BarChart => "barChart",
            WidgetKind::ConceptualGraph => "conceptualGraph",
            WidgetKind::NumberLine => "numberLine",
            WidgetKind::CoordinateGrid => "coordinateGrid",
            WidgetKind::DataTable => "dataTable",
        }
    }
}

/// Mapping outcome for one widget slot. `NotFound` is a first-class expected
/// result ("no available renderer fits this content"), reported downstream as
/// a skip — never a crash, never a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappedKind {
    Kind(WidgetKind),
    NotFound,
}

/// Slot name → mapping outcome. Total over the widget slot set.
pub type WidgetMapping = BTreeMap<String, MappedKind>;

// ============================================================================
// Realized widgets
// ============================================================================

/// A fully realized widget, keyed by slot in the compiled item.
#[derive(Debug, Clone)]
pub enum Widget {
    Polyhedron(PolyhedronWidget),
    Scatter(ScatterWidget),
    LineGraph(LineGraphWidget),
    Bar(BarWidget),
    ConceptualGraph(ConceptualGraphWidget),
    NumberLine(NumberLineWidget),
    CoordinateGrid(CoordinateGridWidget),
    DataTable(DataTableWidget),
}

impl Widget {
    pub fn kind(&self) -> WidgetKind {
        match self {
            Widget::Polyhedron(_) => WidgetKind::PolyhedronDiagram,
            Widget::Scatter(_) => WidgetKind::ScatterPlot,
            Widget::LineGraph(_) => WidgetKind::LineGraph,
            Widget::Bar(_) => WidgetKind::BarChart,
            Widget::ConceptualGraph(_) => WidgetKind::ConceptualGraph,
            Widget::NumberLine(_) => WidgetKind::NumberLine,
            Widget::CoordinateGrid(_) => WidgetKind::CoordinateGrid,
            Widget::DataTable(_) => WidgetKind::DataTable,
        }
    }
}

/// An isometric solid diagram.
///
/// Vertex indices in `labels` and `diagonals` follow the fixed per-shape
/// numbering scheme documented in the polyhedron renderer — the scheme is
/// part of the public contract, independent of input array order.
#[derive(Debug, Clone)]
pub struct PolyhedronWidget {
    pub shape: SolidShape,
    pub dimensions: SolidDimensions,
    pub labels: Vec<VertexLabel>,
    pub diagonals: Vec<Diagonal>,
    /// Face index into the shape's face list; that face is filled.
    pub shaded_face: Option<usize>,
    /// Back-facing edges are drawn dashed when set, omitted otherwise.
    pub show_hidden_edges: bool,
}

#[derive(Debug, Clone)]
pub struct VertexLabel {
    pub vertex: usize,
    pub text: String,
}

/// A segment between two scheme-indexed vertices.
#[derive(Debug, Clone)]
pub struct Diagonal {
    pub from: usize,
    pub to: usize,
    pub label: Option<String>,
}

/// Axis specification; tick, gridline and label counts are driven by this
/// spec, never inferred from data.
#[derive(Debug, Clone)]
pub struct AxisSpec {
    pub min: f64,
    pub max: f64,
    pub label: Option<String>,
    pub tick: f64,
    pub gridlines: bool,
}

#[derive(Debug, Clone)]
pub struct ScatterWidget {
    pub x_axis: AxisSpec,
    pub y_axis: AxisSpec,
    pub points: Vec<(f64, f64)>,
    pub trend: Option<Trend>,
}

/// A trend line: fitted by least squares over the data, or drawn between
/// literal data-space endpoints.
#[derive(Debug, Clone)]
pub enum Trend {
    Fitted,
    Literal { from: (f64, f64), to: (f64, f64) },
}

/// Connected quantitative curve over scaled axes.
#[derive(Debug, Clone)]
pub struct LineGraphWidget {
    pub x_axis: AxisSpec,
    pub y_axis: AxisSpec,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone)]
pub struct BarWidget {
    pub value_axis: AxisSpec,
    pub categories: Vec<(String, f64)>,
}

/// Qualitative curve over unscaled, arrow-style axes.
#[derive(Debug, Clone)]
pub struct ConceptualGraphWidget {
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    /// Sampled curve in abstract data space; normalized to the canvas.
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone)]
pub struct NumberLineWidget {
    pub min: f64,
    pub max: f64,
    pub tick: f64,
    /// Values drawn as filled dots above the line.
    pub marks: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct CoordinateGridWidget {
    pub x_axis: AxisSpec,
    pub y_axis: AxisSpec,
}

/// Tabular data; renders to an XHTML table fragment rather than SVG.
#[derive(Debug, Clone)]
pub struct DataTableWidget {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}
