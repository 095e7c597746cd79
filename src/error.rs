//! Error taxonomy for item compilation.
//!
//! All errors are per-item and fatal to that item's compilation; the pipeline
//! never patches malformed input and continues. An unmappable widget is NOT an
//! error — it is the `CannotMigrate` outcome (see [`crate::CompileOutcome`]).

use thiserror::Error;

/// A slot or response-declaration invariant was violated.
///
/// Every variant names the offending slot or field so batch logs point at the
/// exact location in the source item.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StructuralError {
    /// A `<slot>` reference in body or choice content has no widget or
    /// interaction entry keyed by that name.
    #[error("slot \"{name}\" is referenced in content but has no widget or interaction")]
    DanglingSlot { name: String },

    /// A widget or interaction entry exists but no slot references it.
    #[error("{kind} \"{name}\" is never referenced by a slot")]
    UnreferencedEntry { kind: &'static str, name: String },

    /// Two content elements produced the same slot name.
    #[error("slot \"{name}\" is defined more than once")]
    DuplicateSlot { name: String },

    /// A visual source element could not be turned into a slot.
    #[error("source block {index} is a visual element that cannot become a slot")]
    UnslottableContent { index: usize },

    /// Single-cardinality response without exactly one correct value.
    #[error(
        "response \"{response_id}\": cardinality single requires exactly one correct value, found {found}"
    )]
    SingleCardinality { response_id: String, found: usize },

    /// Correct-value count disagrees with the interaction's own choice flags.
    #[error(
        "response \"{response_id}\": {declared} correct value(s) declared but {marked} choice(s) marked correct"
    )]
    CorrectCountMismatch {
        response_id: String,
        declared: usize,
        marked: usize,
    },

    /// A declared correct value names no choice in the interaction.
    #[error("response \"{response_id}\": correct value \"{value}\" names no choice")]
    UnknownCorrectValue { response_id: String, value: String },

    /// Inline-only content (prompt, inline-choice option, per-choice feedback)
    /// contained block-level markup.
    #[error("{field} of slot \"{slot}\" must be inline-only content")]
    BlockContentInInlineField { slot: String, field: &'static str },

    /// A response area referenced a scoring index outside its option list.
    #[error("response \"{response_id}\": scoring index {index} is out of range ({len} options)")]
    ScoringIndexOutOfRange {
        response_id: String,
        index: usize,
        len: usize,
    },

    /// A hotspot response referenced a figure that does not exist.
    #[error("response \"{response_id}\": hotspot references figure {figure}, which does not exist")]
    HotspotFigureMissing { response_id: String, figure: usize },
}

/// A forbidden token or pattern was found in emitted text.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("banned construct {construct} in {field}")]
pub struct BannedConstructError {
    /// Slot name or field path where the construct was found.
    pub field: String,
    /// What was found.
    pub construct: BannedConstruct,
}

/// The closed list of constructs the validator rejects.
#[derive(Debug, Clone, PartialEq)]
pub enum BannedConstruct {
    /// A LaTeX command or `$` fence leaked into plain text or math leaves.
    LatexLeakage(String),
    /// A legacy `mfenced`-style group survived normalization.
    Mfenced,
    /// Entity text where a raw character is required
    /// (all escaping happens at emission; pre-escaped input double-escapes).
    PreEscapedEntity(String),
    /// A named character entity outside the XML built-ins.
    DisallowedEntity(String),
    /// Angle-bracket markup leaked into a text field or operator node.
    RawMarkup(String),
}

impl std::fmt::Display for BannedConstruct {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BannedConstruct::LatexLeakage(s) => write!(f, "LaTeX leakage ({s})"),
            BannedConstruct::Mfenced => write!(f, "legacy fenced math group"),
            BannedConstruct::PreEscapedEntity(s) => write!(f, "pre-escaped entity ({s})"),
            BannedConstruct::DisallowedEntity(s) => write!(f, "disallowed entity ({s})"),
            BannedConstruct::RawMarkup(s) => write!(f, "raw markup ({s})"),
        }
    }
}

/// A widget generator received out-of-domain geometry.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("widget \"{widget}\": {detail}")]
pub struct GeometryError {
    /// Slot name (or shape name when raised before slot assignment).
    pub widget: String,
    pub detail: GeometryErrorDetail,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeometryErrorDetail {
    /// A dimension that must be strictly positive was not.
    NonPositiveDimension { name: &'static str, value: f64 },
    /// A diagonal or label referenced a vertex index outside the shape's scheme.
    VertexIndexOutOfRange { index: usize, vertex_count: usize },
    /// The shaded-face index is outside the shape's face list.
    FaceIndexOutOfRange { index: usize, face_count: usize },
    /// Axis with min >= max or a non-positive tick interval.
    DegenerateAxis { axis: &'static str },
    /// No data where at least one point/category is required.
    EmptyData,
}

impl std::fmt::Display for GeometryErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryErrorDetail::NonPositiveDimension { name, value } => {
                write!(f, "dimension {name} must be positive, got {value}")
            }
            GeometryErrorDetail::VertexIndexOutOfRange {
                index,
                vertex_count,
            } => write!(f, "vertex index {index} out of range (shape has {vertex_count} vertices)"),
            GeometryErrorDetail::FaceIndexOutOfRange { index, face_count } => {
                write!(f, "face index {index} out of range (shape has {face_count} faces)")
            }
            GeometryErrorDetail::DegenerateAxis { axis } => {
                write!(f, "degenerate {axis} axis spec")
            }
            GeometryErrorDetail::EmptyData => write!(f, "widget has no data to render"),
        }
    }
}

/// Union of the fatal per-item failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    BannedConstruct(#[from] BannedConstructError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Input JSON did not parse into a source item.
    #[error("invalid source item: {0}")]
    Parse(String),
}
