//! qtic — structured assessment content to QTI 3.0 XML.
//!
//! A deterministic compiler that turns a structured source question (blocks,
//! inline text, structural math, figure payloads, response areas) into a
//! validated QTI 3.0 assessment-item document with embedded widget SVG.
//!
//! Compilation runs in phases: shell (body skeleton + named slots), widget
//! mapping (slot → renderer kind or not-found), realization (typed
//! interaction and widget objects), merge/validation (slot consistency,
//! response cross-checks, banned constructs, prompt dedup), then XML
//! emission. Every phase is a pure function of its inputs; compiling the
//! same item twice yields byte-identical XML.
//!
//! # Example
//!
//! ```ignore
//! use qtic::{compile_item_json, CompileOptions, CompileOutcome};
//!
//! let json = r#"{
//!     "id": "q1",
//!     "blocks": [
//!         { "type": "paragraph", "children": [{ "type": "text", "text": "Pick one." }] },
//!         { "type": "response", "data": { "kind": "choice", "options": [...], "scoring": { "correct": [0] } } }
//!     ]
//! }"#;
//!
//! match compile_item_json(json, &CompileOptions::default())? {
//!     CompileOutcome::Compiled(item) => println!("{}", item.xml),
//!     CompileOutcome::CannotMigrate { slot, reason } => eprintln!("skip {slot}: {reason}"),
//! }
//! ```

pub mod content;
pub mod dedup;
pub mod error;
pub mod item;
pub mod layout;
pub mod mapping;
pub mod math;
pub mod merge;
pub mod qti;
pub mod realize;
pub mod shell;
pub mod svg;
pub mod widget;
pub mod widgets;

use serde::{Deserialize, Serialize};

pub use content::SourceItem;
pub use error::{BannedConstructError, CompileError, GeometryError, StructuralError};
pub use item::AssessmentItem;
pub use merge::MergeOutcome;
pub use widget::{Widget, WidgetKind};

/// Compilation options.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    /// Override the item title (defaults to the source exercise title).
    pub title: Option<String>,
    /// Include the `<?xml ...?>` declaration (default: true).
    pub xml_declaration: bool,
    /// Decimal precision for widget SVG coordinates (default: 2).
    pub svg_precision: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            title: None,
            xml_declaration: true,
            svg_precision: svg::DEFAULT_PRECISION,
        }
    }
}

/// Metadata record the caller persists alongside the XML.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMetadata {
    pub source_id: String,
    pub exercise_id: Option<String>,
    pub exercise_title: Option<String>,
    pub item_identifier: String,
}

/// A successfully compiled item.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledItem {
    pub xml: String,
    pub metadata: ItemMetadata,
}

/// Overall result of compiling one item.
///
/// `CannotMigrate` is the expected outcome for content no renderer fits —
/// callers skip the item and continue their batch; it is not an error.
#[derive(Debug, Clone)]
pub enum CompileOutcome {
    Compiled(CompiledItem),
    CannotMigrate { slot: String, reason: String },
}

/// Compile one source item to QTI XML.
pub fn compile_item(
    source: &SourceItem,
    options: &CompileOptions,
) -> Result<CompileOutcome, CompileError> {
    if let Some(title) = &options.title {
        merge::check_text(title, "title")?;
    }

    let shell = shell::build_shell(source)?;
    let widget_mapping = mapping::resolve_mapping(source, &shell);
    let realized = realize::realize_interactions(source, &shell)?;
    let widgets = realize::realize_widgets(source, &shell, &widget_mapping, &realized);

    match merge::merge(source, shell, &widget_mapping, realized, widgets)? {
        MergeOutcome::CannotMigrate { slot, reason } => {
            Ok(CompileOutcome::CannotMigrate { slot, reason })
        }
        MergeOutcome::Item(mut item) => {
            if let Some(title) = &options.title {
                item.title = title.clone();
            }
            let xml = qti::emit(
                &item,
                &qti::EmitOptions {
                    xml_declaration: options.xml_declaration,
                    svg_precision: options.svg_precision,
                },
            )?;
            tracing::debug!(identifier = %item.identifier, bytes = xml.len(), "item compiled");
            Ok(CompileOutcome::Compiled(CompiledItem {
                xml,
                metadata: ItemMetadata {
                    source_id: source.id.clone(),
                    exercise_id: source.exercise_id.clone(),
                    exercise_title: source.exercise_title.clone(),
                    item_identifier: item.identifier.clone(),
                },
            }))
        }
    }
}

/// Compile a source item given as JSON.
pub fn compile_item_json(
    json: &str,
    options: &CompileOptions,
) -> Result<CompileOutcome, CompileError> {
    let source: SourceItem =
        serde_json::from_str(json).map_err(|e| CompileError::Parse(e.to_string()))?;
    compile_item(&source, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHOICE_ITEM: &str = r###"{
        "id": "x1a2b3",
        "exerciseId": "ex-42",
        "exerciseTitle": "Ancient regions",
        "blocks": [
            {
                "type": "paragraph",
                "children": [{ "type": "text", "text": "Anatolia is a peninsula in western Asia." }]
            },
            {
                "type": "paragraph",
                "children": [{ "type": "text", "text": "In which modern-day country is Anatolia located?" }]
            },
            {
                "type": "response",
                "data": {
                    "kind": "choice",
                    "prompt": "Select the modern-day country where Anatolia is located.",
                    "options": [
                        { "content": [{ "type": "text", "text": "Turkey" }], "correct": true },
                        { "content": [{ "type": "text", "text": "Greece" }] },
                        { "content": [{ "type": "text", "text": "Italy" }] }
                    ],
                    "scoring": { "correct": [0] }
                }
            }
        ]
    }"###;

    fn compiled_xml(json: &str) -> String {
        match compile_item_json(json, &CompileOptions::default()).unwrap() {
            CompileOutcome::Compiled(item) => item.xml,
            CompileOutcome::CannotMigrate { slot, reason } => {
                panic!("unexpected skip of {slot}: {reason}")
            }
        }
    }

    #[test]
    fn test_end_to_end_choice_item() {
        let xml = compiled_xml(CHOICE_ITEM);
        assert!(xml.contains("identifier=\"item-x1a2b3\""));
        assert!(xml.contains("title=\"Ancient regions\""));
        assert!(xml.contains("<qti-simple-choice identifier=\"interaction_1_choice_1\">"));
        assert!(xml.contains("Turkey"));
    }

    #[test]
    fn test_end_to_end_determinism() {
        assert_eq!(compiled_xml(CHOICE_ITEM), compiled_xml(CHOICE_ITEM));
    }

    #[test]
    fn test_paraphrased_question_asked_once() {
        let xml = compiled_xml(CHOICE_ITEM);
        // The prompt survives; the body restatement does not.
        assert!(xml.contains("Select the modern-day country where Anatolia is located."));
        assert!(!xml.contains("In which modern-day country is Anatolia located?"));
        // Context that is not a paraphrase stays.
        assert!(xml.contains("Anatolia is a peninsula in western Asia."));
    }

    #[test]
    fn test_metadata_carries_source_ids() {
        let outcome = compile_item_json(CHOICE_ITEM, &CompileOptions::default()).unwrap();
        let CompileOutcome::Compiled(item) = outcome else {
            panic!("expected compiled item");
        };
        assert_eq!(item.metadata.source_id, "x1a2b3");
        assert_eq!(item.metadata.exercise_id.as_deref(), Some("ex-42"));
        assert_eq!(item.metadata.item_identifier, "item-x1a2b3");
    }

    #[test]
    fn test_unmappable_widget_is_a_skip_not_an_error() {
        let json = r###"{
            "id": "q7",
            "blocks": [
                {
                    "type": "figure",
                    "data": { "kind": "external", "url": "https://example.test/photo.png" }
                },
                {
                    "type": "response",
                    "data": {
                        "kind": "choice",
                        "options": [{ "content": [{ "type": "text", "text": "A" }], "correct": true }],
                        "scoring": { "correct": [0] }
                    }
                }
            ]
        }"###;
        match compile_item_json(json, &CompileOptions::default()).unwrap() {
            CompileOutcome::CannotMigrate { slot, .. } => assert_eq!(slot, "widget_1"),
            CompileOutcome::Compiled(_) => panic!("expected cannot-migrate"),
        }
    }

    #[test]
    fn test_solid_figure_embeds_svg() {
        let json = r###"{
            "id": "q8",
            "blocks": [
                {
                    "type": "figure",
                    "data": {
                        "kind": "solid",
                        "shape": "rectangularPrism",
                        "dimensions": { "length": 10, "width": 8, "height": 6 },
                        "diagonals": [{ "fromVertexIndex": 0, "toVertexIndex": 6, "label": "d" }],
                        "showHiddenEdges": true
                    }
                },
                {
                    "type": "response",
                    "data": {
                        "kind": "choice",
                        "prompt": "Select the length of the diagonal.",
                        "options": [
                            { "content": [{ "type": "text", "text": "14.1" }], "correct": true },
                            { "content": [{ "type": "text", "text": "12" }] }
                        ],
                        "scoring": { "correct": [0] }
                    }
                }
            ]
        }"###;
        let xml = compiled_xml(json);
        assert!(xml.contains("<svg "));
        assert!(xml.contains("stroke-dasharray"));
        assert!(xml.contains("<qti-choice-interaction"));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = compile_item_json("not json", &CompileOptions::default()).unwrap_err();
        assert!(matches!(err, CompileError::Parse(_)));
    }

    #[test]
    fn test_banned_construct_fails_compilation() {
        let json = r###"{
            "id": "q9",
            "blocks": [
                {
                    "type": "paragraph",
                    "children": [{ "type": "text", "text": "Solve $x^2 = 4$." }]
                },
                {
                    "type": "response",
                    "data": {
                        "kind": "choice",
                        "options": [{ "content": [{ "type": "text", "text": "2" }], "correct": true }],
                        "scoring": { "correct": [0] }
                    }
                }
            ]
        }"###;
        let err = compile_item_json(json, &CompileOptions::default()).unwrap_err();
        assert!(matches!(err, CompileError::BannedConstruct(_)));
    }

    #[test]
    fn test_options_parse_from_json() {
        let options: CompileOptions =
            serde_json::from_str(r#"{ "xmlDeclaration": false, "svgPrecision": 3 }"#).unwrap();
        assert!(!options.xml_declaration);
        assert_eq!(options.svg_precision, 3);
        assert!(options.title.is_none());
    }
}
