//! Source content tree — the input model.
//!
//! Callers hand the compiler an already-structured tree (produced externally
//! from a question-authoring format); this crate never parses that format
//! itself. Figures carry structured payloads the widget mapping inspects;
//! response areas carry the authored options and a separately authored
//! scoring record that the merge phase cross-checks.

use serde::Deserialize;

use crate::math::MathNode;

/// A single source question to compile.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceItem {
    /// Stable source question id — all emitted identifiers derive from it.
    pub id: String,
    #[serde(default)]
    pub exercise_id: Option<String>,
    #[serde(default)]
    pub exercise_title: Option<String>,
    pub blocks: Vec<SourceBlock>,
}

/// A block of source content.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SourceBlock {
    /// Running text with embedded math.
    Paragraph { children: Vec<SourceInline> },
    /// A visual element; becomes a widget slot.
    Figure {
        data: FigureData,
        #[serde(default)]
        caption: Option<String>,
    },
    /// A student-response area; becomes an interaction slot.
    Response { data: ResponseData },
}

/// Inline source content.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SourceInline {
    Text { text: String },
    Math { math: MathNode },
}

// ============================================================================
// Figure payloads
// ============================================================================

/// Structured figure payload. The widget-mapping phase maps each payload to a
/// concrete renderer — or to the not-found sentinel when none fits.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FigureData {
    /// A 3-D solid to draw isometrically.
    Solid {
        shape: SolidShape,
        dimensions: SolidDimensions,
        #[serde(default)]
        labels: Vec<SourceVertexLabel>,
        #[serde(default)]
        diagonals: Vec<SourceDiagonal>,
        #[serde(default)]
        shaded_face: Option<usize>,
        #[serde(default)]
        show_hidden_edges: bool,
    },
    /// Plotted (x, y) data with declared axes.
    Points {
        #[serde(default)]
        x_axis: Option<SourceAxis>,
        #[serde(default)]
        y_axis: Option<SourceAxis>,
        points: Vec<[f64; 2]>,
        #[serde(default)]
        trend: Option<TrendSpec>,
    },
    /// Labelled categories with one value each.
    Categories {
        #[serde(default)]
        value_axis: Option<SourceAxis>,
        categories: Vec<CategoryDatum>,
    },
    /// A qualitative or quantitative curve over declared axes.
    Curve {
        #[serde(default)]
        x_axis: Option<SourceAxis>,
        #[serde(default)]
        y_axis: Option<SourceAxis>,
        /// Sampled curve points in data space.
        points: Vec<[f64; 2]>,
        /// No numeric scale; axes are direction arrows with labels only.
        #[serde(default)]
        qualitative: bool,
    },
    /// A number line with highlighted marks.
    NumberLine {
        min: f64,
        max: f64,
        tick: f64,
        #[serde(default)]
        marks: Vec<f64>,
    },
    /// Tabular data.
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// An empty coordinate lattice.
    Grid {
        x_axis: SourceAxis,
        y_axis: SourceAxis,
    },
    /// Opaque external content (image URL, unconverted blob). No renderer
    /// fits this — it maps to the not-found sentinel.
    External {
        url: String,
        #[serde(default)]
        alt: Option<String>,
    },
}

impl FigureData {
    /// The payload tag, used in skip reports.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FigureData::Solid { .. } => "solid",
            FigureData::Points { .. } => "points",
            FigureData::Categories { .. } => "categories",
            FigureData::Curve { .. } => "curve",
            FigureData::NumberLine { .. } => "numberLine",
            FigureData::Table { .. } => "table",
            FigureData::Grid { .. } => "grid",
            FigureData::External { .. } => "external",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SolidShape {
    RectangularPrism,
    TriangularPrism,
    RectangularPyramid,
    TriangularPyramid,
}

/// Shape-specific dimensions; which fields apply is documented per shape in
/// the polyhedron renderer. All must be strictly positive.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolidDimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceVertexLabel {
    pub vertex: usize,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDiagonal {
    pub from_vertex_index: usize,
    pub to_vertex_index: usize,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceAxis {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub label: Option<String>,
    pub tick: f64,
    #[serde(default = "default_true")]
    pub gridlines: bool,
}

fn default_true() -> bool {
    true
}

/// How a trend line is requested: fitted from the data, or drawn between
/// literal endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum TrendSpec {
    /// Least-squares fit over the plotted points.
    Fitted,
    /// Straight segment between two literal data-space coordinates.
    Literal { from: [f64; 2], to: [f64; 2] },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDatum {
    pub label: String,
    pub value: f64,
}

// ============================================================================
// Response areas
// ============================================================================

/// A student-response area.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ResponseData {
    /// Select one or several choices.
    Choice {
        #[serde(default)]
        prompt: Option<String>,
        options: Vec<SourceOption>,
        /// Authored independently of the per-option `correct` flags;
        /// the merge phase cross-checks the two.
        scoring: Scoring,
        #[serde(default)]
        multiple: bool,
        #[serde(default)]
        feedback: Option<SourceFeedback>,
    },
    /// A dropdown embedded in running text. Option text is plain inline text
    /// by construction.
    InlineChoice {
        options: Vec<InlineOption>,
        scoring: Scoring,
    },
    /// Free text entry.
    TextEntry {
        /// The accepted answer strings.
        answers: Vec<String>,
        #[serde(default)]
        expected_length: Option<u32>,
    },
    /// Click a region on a figure. `figure` indexes the source figures in
    /// document order (0-based).
    Hotspot {
        #[serde(default)]
        prompt: Option<String>,
        figure: usize,
        regions: Vec<SourceRegion>,
        scoring: Scoring,
        #[serde(default)]
        multiple: bool,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceOption {
    pub content: Vec<SourceInline>,
    #[serde(default)]
    pub correct: bool,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineOption {
    pub text: String,
    #[serde(default)]
    pub correct: bool,
}

/// The independently authored answer key for a response area.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scoring {
    /// 0-based indices of the correct options/regions.
    pub correct: Vec<usize>,
    #[serde(default)]
    pub ordered: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFeedback {
    #[serde(default)]
    pub correct: Option<String>,
    #[serde(default)]
    pub incorrect: Option<String>,
}

/// A rectangular hotspot region in figure pixel coordinates.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source_item() {
        let json = r###"{
            "id": "x1a2b3",
            "exerciseTitle": "Volume of solids",
            "blocks": [
                {
                    "type": "paragraph",
                    "children": [
                        { "type": "text", "text": "Consider the prism below." }
                    ]
                },
                {
                    "type": "figure",
                    "data": {
                        "kind": "solid",
                        "shape": "rectangularPrism",
                        "dimensions": { "length": 10, "width": 8, "height": 6 }
                    }
                },
                {
                    "type": "response",
                    "data": {
                        "kind": "choice",
                        "prompt": "Select the volume.",
                        "options": [
                            { "content": [{ "type": "text", "text": "480" }], "correct": true },
                            { "content": [{ "type": "text", "text": "240" }] }
                        ],
                        "scoring": { "correct": [0] }
                    }
                }
            ]
        }"###;

        let item: SourceItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, "x1a2b3");
        assert_eq!(item.blocks.len(), 3);
        match &item.blocks[1] {
            SourceBlock::Figure { data, .. } => {
                assert!(matches!(data, FigureData::Solid { .. }));
            }
            other => panic!("expected figure, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_points_figure_with_trend() {
        let json = r###"{
            "kind": "points",
            "xAxis": { "min": 0, "max": 10, "tick": 2, "label": "Time (s)" },
            "yAxis": { "min": 0, "max": 50, "tick": 10 },
            "points": [[1, 5], [2, 12], [3, 18]],
            "trend": { "mode": "fitted" }
        }"###;
        let data: FigureData = serde_json::from_str(json).unwrap();
        match data {
            FigureData::Points { trend, points, .. } => {
                assert!(matches!(trend, Some(TrendSpec::Fitted)));
                assert_eq!(points.len(), 3);
            }
            other => panic!("expected points, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_external_figure() {
        let json = r###"{ "kind": "external", "url": "https://example.test/fig.png" }"###;
        let data: FigureData = serde_json::from_str(json).unwrap();
        assert!(matches!(data, FigureData::External { .. }));
    }
}
