//! Merge and validation — the final assembly phase.
//!
//! Combines the shell, the widget mapping and the realized content into one
//! validated [`AssessmentItem`]. Every invariant violation is a hard,
//! per-item failure naming the offending slot or field; the merge never
//! repairs malformed input. An unmappable widget slot short-circuits into the
//! cannot-migrate outcome before any other check.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::content::{SourceBlock, SourceItem};
use crate::dedup;
use crate::error::{BannedConstruct, BannedConstructError, CompileError, StructuralError};
use crate::item::{
    AssessmentItem, BaseType, BlockNode, Cardinality, InlineNode, Interaction,
};
use crate::math;
use crate::realize::RealizedInteractions;
use crate::shell::Shell;
use crate::widget::{MappedKind, Widget, WidgetMapping};

/// Result of the merge phase: a validated item, or the typed
/// "cannot migrate" outcome for an unmappable widget.
#[derive(Debug, Clone)]
pub enum MergeOutcome {
    Item(AssessmentItem),
    CannotMigrate { slot: String, reason: String },
}

/// Derive the emitted item identifier from the source question id.
pub fn item_identifier(source_id: &str) -> String {
    format!("item-{source_id}")
}

pub fn merge(
    source: &SourceItem,
    shell: Shell,
    mapping: &WidgetMapping,
    realized: RealizedInteractions,
    widgets: BTreeMap<String, Widget>,
) -> Result<MergeOutcome, CompileError> {
    // Unmappable slots end compilation as a skip, reported distinctly from
    // every failure below. First slot in document order names the outcome.
    for slot in &shell.widget_slots {
        if mapping.get(slot) == Some(&MappedKind::NotFound) {
            let reason = shell
                .slot_sources
                .get(slot)
                .and_then(|&index| source.blocks.get(index))
                .and_then(|block| match block {
                    SourceBlock::Figure { data, .. } => Some(format!(
                        "figure payload \"{}\" has no renderer",
                        data.kind_name()
                    )),
                    _ => None,
                })
                .unwrap_or_else(|| "no renderer for slot content".to_string());
            tracing::warn!(slot = %slot, %reason, "item cannot be migrated");
            return Ok(MergeOutcome::CannotMigrate {
                slot: slot.clone(),
                reason,
            });
        }
    }

    let RealizedInteractions {
        interactions,
        declarations,
        feedback,
    } = realized;

    let mut item = AssessmentItem {
        identifier: item_identifier(&source.id),
        title: source
            .exercise_title
            .clone()
            .unwrap_or_else(|| source.id.clone()),
        body: shell.body,
        widgets,
        interactions,
        response_declarations: declarations,
        feedback,
    };

    // Widgets consumed by a hotspot render inside the interaction; their
    // body slot would emit the figure a second time.
    let consumed: BTreeSet<String> = item
        .interactions
        .values()
        .filter_map(|i| match i {
            Interaction::Hotspot(h) => Some(h.image_slot.clone()),
            _ => None,
        })
        .collect();
    item.body.retain(|block| match block {
        BlockNode::Slot { name } => !consumed.contains(name),
        _ => true,
    });

    deduplicate_prompts(&mut item);
    check_slot_consistency(&item)?;
    check_response_correspondence(&item)?;
    check_banned_constructs(&item)?;

    Ok(MergeOutcome::Item(item))
}

/// Remove a body paragraph that merely restates the prompt of the
/// interaction slot that follows it.
fn deduplicate_prompts(item: &mut AssessmentItem) {
    let mut drop = vec![false; item.body.len()];

    for i in 1..item.body.len() {
        let BlockNode::Slot { name } = &item.body[i] else {
            continue;
        };
        let Some(prompt) = item
            .interactions
            .get(name)
            .and_then(|interaction| interaction.prompt_text())
        else {
            continue;
        };
        let Some(paragraph) = item.body[i - 1].paragraph_text() else {
            continue;
        };
        if dedup::is_paraphrase(&paragraph, prompt) {
            tracing::debug!(slot = %name, "dropped body paragraph restating the prompt");
            drop[i - 1] = true;
        }
    }

    let mut keep = drop.iter().map(|d| !d);
    item.body.retain(|_| keep.next().unwrap_or(true));
}

/// Slot names referenced anywhere in the item's content.
fn referenced_slots(item: &AssessmentItem) -> BTreeSet<String> {
    fn walk(blocks: &[BlockNode], out: &mut BTreeSet<String>) {
        for block in blocks {
            if let BlockNode::Slot { name } = block {
                out.insert(name.clone());
            }
        }
    }

    let mut refs = BTreeSet::new();
    walk(&item.body, &mut refs);
    for interaction in item.interactions.values() {
        match interaction {
            Interaction::Choice(c) => {
                for choice in &c.choices {
                    walk(&choice.content, &mut refs);
                }
            }
            Interaction::Hotspot(h) => {
                refs.insert(h.image_slot.clone());
            }
            _ => {}
        }
    }
    if let Some(fb) = &item.feedback {
        walk(&fb.correct, &mut refs);
        walk(&fb.incorrect, &mut refs);
    }
    refs
}

/// Every referenced slot has exactly one entry; every entry is referenced.
fn check_slot_consistency(item: &AssessmentItem) -> Result<(), StructuralError> {
    let refs = referenced_slots(item);

    for name in &refs {
        let in_widgets = item.widgets.contains_key(name);
        let in_interactions = item.interactions.contains_key(name);
        match (in_widgets, in_interactions) {
            (false, false) => {
                return Err(StructuralError::DanglingSlot { name: name.clone() });
            }
            (true, true) => {
                return Err(StructuralError::DuplicateSlot { name: name.clone() });
            }
            _ => {}
        }
    }

    for name in item.widgets.keys() {
        if !refs.contains(name) {
            return Err(StructuralError::UnreferencedEntry {
                kind: "widget",
                name: name.clone(),
            });
        }
    }
    for name in item.interactions.keys() {
        if !refs.contains(name) {
            return Err(StructuralError::UnreferencedEntry {
                kind: "interaction",
                name: name.clone(),
            });
        }
    }
    Ok(())
}

/// Cross-check each response declaration against the interaction's own
/// choice flags — the two are authored independently.
fn check_response_correspondence(item: &AssessmentItem) -> Result<(), StructuralError> {
    for decl in &item.response_declarations {
        if decl.base_type != BaseType::Identifier {
            // String declarations (text entry) have no choice list to check.
            continue;
        }
        let Some(interaction) = item
            .interactions
            .values()
            .find(|i| i.response_id() == decl.identifier)
        else {
            continue;
        };

        let choice_ids = interaction.choice_identifiers();
        for value in &decl.correct {
            if !choice_ids.iter().any(|id| id == value) {
                return Err(StructuralError::UnknownCorrectValue {
                    response_id: decl.identifier.clone(),
                    value: value.clone(),
                });
            }
        }

        let marked = interaction.marked_correct_count();
        match decl.cardinality {
            Cardinality::Single => {
                if decl.correct.len() != 1 {
                    return Err(StructuralError::SingleCardinality {
                        response_id: decl.identifier.clone(),
                        found: decl.correct.len(),
                    });
                }
                if marked != 1 {
                    return Err(StructuralError::CorrectCountMismatch {
                        response_id: decl.identifier.clone(),
                        declared: 1,
                        marked,
                    });
                }
            }
            Cardinality::Multiple | Cardinality::Ordered => {
                if decl.correct.len() != marked {
                    return Err(StructuralError::CorrectCountMismatch {
                        response_id: decl.identifier.clone(),
                        declared: decl.correct.len(),
                        marked,
                    });
                }
            }
        }
    }
    Ok(())
}

// ============================================================================
// Banned constructs
// ============================================================================

/// Scan a plain-text field for banned constructs: formula-syntax leakage,
/// raw markup, pre-escaped or disallowed entities.
pub fn check_text(text: &str, field: &str) -> Result<(), BannedConstructError> {
    if let Some(leak) = math::find_latex_leakage(text) {
        return Err(BannedConstructError {
            field: field.to_string(),
            construct: BannedConstruct::LatexLeakage(leak),
        });
    }
    // "<" followed by a letter or "/" is markup; a bare comparison ("n < 5",
    // "<1") is legitimate text and escapes cleanly at emission.
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '<' {
            if let Some(&next) = chars.peek() {
                if next.is_ascii_alphabetic() || next == '/' {
                    return Err(BannedConstructError {
                        field: field.to_string(),
                        construct: BannedConstruct::RawMarkup(text.to_string()),
                    });
                }
            }
        }
    }
    // Entity-shaped sequences: built-ins mean the text was escaped upstream
    // and would double-escape; anything else garbles intent.
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        rest = &rest[pos + 1..];
        let Some(end) = rest.find(';') else { break };
        let name = &rest[..end];
        if name.is_empty() || name.len() > 10 || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '#') {
            continue; // a bare ampersand, escaped at emission
        }
        let construct = match name {
            "amp" | "lt" | "gt" | "quot" | "apos" => {
                BannedConstruct::PreEscapedEntity(format!("&{name};"))
            }
            _ if name.starts_with('#') => BannedConstruct::PreEscapedEntity(format!("&{name};")),
            _ => BannedConstruct::DisallowedEntity(format!("&{name};")),
        };
        return Err(BannedConstructError {
            field: field.to_string(),
            construct,
        });
    }
    Ok(())
}

fn check_inlines(inlines: &[InlineNode], field: &str) -> Result<(), BannedConstructError> {
    for inline in inlines {
        match inline {
            InlineNode::Text(text) => check_text(text, field)?,
            InlineNode::Math(node) => math::check(node, field)?,
        }
    }
    Ok(())
}

fn check_blocks(blocks: &[BlockNode], field: &str) -> Result<(), BannedConstructError> {
    for block in blocks {
        if let BlockNode::Paragraph(inlines) = block {
            check_inlines(inlines, field)?;
        }
    }
    Ok(())
}

/// Blacklist scan over every string field of the merged item.
fn check_banned_constructs(item: &AssessmentItem) -> Result<(), BannedConstructError> {
    check_text(&item.title, "title")?;
    check_blocks(&item.body, "body")?;

    for (slot, interaction) in &item.interactions {
        match interaction {
            Interaction::Choice(c) => {
                if let Some(prompt) = &c.prompt {
                    check_text(prompt, &format!("{slot}.prompt"))?;
                }
                for choice in &c.choices {
                    let field = format!("{slot}.{}", choice.identifier);
                    check_blocks(&choice.content, &field)?;
                    if let Some(note) = &choice.note {
                        check_text(note, &field)?;
                    }
                }
            }
            Interaction::InlineChoice(c) => {
                for choice in &c.choices {
                    check_text(&choice.text, &format!("{slot}.{}", choice.identifier))?;
                }
            }
            Interaction::Hotspot(h) => {
                if let Some(prompt) = &h.prompt {
                    check_text(prompt, &format!("{slot}.prompt"))?;
                }
            }
            Interaction::TextEntry(_) => {}
        }
    }

    for (slot, widget) in &item.widgets {
        check_widget_text(widget, slot)?;
    }

    if let Some(fb) = &item.feedback {
        check_blocks(&fb.correct, "feedback.correct")?;
        check_blocks(&fb.incorrect, "feedback.incorrect")?;
    }
    Ok(())
}

fn check_widget_text(widget: &Widget, slot: &str) -> Result<(), BannedConstructError> {
    let field = |part: &str| format!("{slot}.{part}");
    match widget {
        Widget::Polyhedron(w) => {
            for label in &w.labels {
                check_text(&label.text, &field("label"))?;
            }
            for diagonal in &w.diagonals {
                if let Some(label) = &diagonal.label {
                    check_text(label, &field("diagonal label"))?;
                }
            }
        }
        Widget::Scatter(w) => {
            check_axis_labels(&w.x_axis.label, &w.y_axis.label, slot)?;
        }
        Widget::LineGraph(w) => {
            check_axis_labels(&w.x_axis.label, &w.y_axis.label, slot)?;
        }
        Widget::Bar(w) => {
            if let Some(label) = &w.value_axis.label {
                check_text(label, &field("axis label"))?;
            }
            for (label, _) in &w.categories {
                check_text(label, &field("category"))?;
            }
        }
        Widget::ConceptualGraph(w) => {
            check_axis_labels(&w.x_label, &w.y_label, slot)?;
        }
        Widget::DataTable(w) => {
            for header in &w.headers {
                check_text(header, &field("header"))?;
            }
            for row in &w.rows {
                for cell in row {
                    check_text(cell, &field("cell"))?;
                }
            }
        }
        Widget::CoordinateGrid(w) => {
            check_axis_labels(&w.x_axis.label, &w.y_axis.label, slot)?;
        }
        Widget::NumberLine(_) => {}
    }
    Ok(())
}

fn check_axis_labels(
    x: &Option<String>,
    y: &Option<String>,
    slot: &str,
) -> Result<(), BannedConstructError> {
    if let Some(label) = x {
        check_text(label, &format!("{slot}.x-axis label"))?;
    }
    if let Some(label) = y {
        check_text(label, &format!("{slot}.y-axis label"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{
        FigureData, ResponseData, Scoring, SourceInline, SourceOption,
    };
    use crate::mapping::resolve_mapping;
    use crate::realize::{realize_interactions, realize_widgets};
    use crate::shell::build_shell;

    fn pipeline(source: &SourceItem) -> Result<MergeOutcome, CompileError> {
        let shell = build_shell(source)?;
        let mapping = resolve_mapping(source, &shell);
        let realized = realize_interactions(source, &shell)?;
        let widgets = realize_widgets(source, &shell, &mapping, &realized);
        merge(source, shell, &mapping, realized, widgets)
    }

    fn item(blocks: Vec<SourceBlock>) -> SourceItem {
        SourceItem {
            id: "q9".to_string(),
            exercise_id: None,
            exercise_title: Some("Test exercise".to_string()),
            blocks,
        }
    }

    fn paragraph(text: &str) -> SourceBlock {
        SourceBlock::Paragraph {
            children: vec![SourceInline::Text {
                text: text.to_string(),
            }],
        }
    }

    fn option(text: &str, correct: bool) -> SourceOption {
        SourceOption {
            content: vec![SourceInline::Text {
                text: text.to_string(),
            }],
            correct,
            note: None,
        }
    }

    fn choice(prompt: &str, options: Vec<SourceOption>, correct: Vec<usize>, multiple: bool) -> SourceBlock {
        SourceBlock::Response {
            data: ResponseData::Choice {
                prompt: Some(prompt.to_string()),
                options,
                scoring: Scoring {
                    correct,
                    ordered: false,
                },
                multiple,
                feedback: None,
            },
        }
    }

    #[test]
    fn test_merge_produces_consistent_item() {
        let source = item(vec![
            paragraph("The table shows five trials."),
            SourceBlock::Figure {
                data: FigureData::Table {
                    headers: vec!["Trial".to_string()],
                    rows: vec![vec!["1".to_string()]],
                },
                caption: None,
            },
            choice("Which trial ran longest?", vec![option("Trial 1", true), option("Trial 2", false)], vec![0], false),
        ]);
        let outcome = pipeline(&source).unwrap();
        let MergeOutcome::Item(item) = outcome else {
            panic!("expected merged item");
        };
        assert_eq!(item.identifier, "item-q9");
        assert_eq!(item.widgets.len(), 1);
        assert_eq!(item.interactions.len(), 1);
    }

    #[test]
    fn test_unmappable_widget_reports_cannot_migrate() {
        let source = item(vec![
            SourceBlock::Figure {
                data: FigureData::External {
                    url: "https://example.test/x.png".to_string(),
                    alt: None,
                },
                caption: None,
            },
            choice("Pick.", vec![option("A", true)], vec![0], false),
        ]);
        match pipeline(&source).unwrap() {
            MergeOutcome::CannotMigrate { slot, reason } => {
                assert_eq!(slot, "widget_1");
                assert!(reason.contains("external"));
            }
            MergeOutcome::Item(_) => panic!("expected cannot-migrate"),
        }
    }

    #[test]
    fn test_correct_count_mismatch_is_fatal() {
        // Two options marked correct but scoring declares only one.
        let source = item(vec![choice(
            "Select all that apply.",
            vec![option("A", true), option("B", true), option("C", false)],
            vec![0],
            true,
        )]);
        let err = pipeline(&source).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Structural(StructuralError::CorrectCountMismatch {
                declared: 1,
                marked: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_single_requires_flag_agreement() {
        // Scoring names one option but none carry the correct flag.
        let source = item(vec![choice(
            "Pick.",
            vec![option("A", false), option("B", false)],
            vec![0],
            false,
        )]);
        let err = pipeline(&source).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Structural(StructuralError::CorrectCountMismatch { marked: 0, .. })
        ));
    }

    #[test]
    fn test_prompt_paraphrase_paragraph_removed() {
        let source = item(vec![
            paragraph("In which modern-day country is Anatolia located?"),
            choice(
                "Select the modern-day country where Anatolia is located.",
                vec![option("Turkey", true), option("Greece", false)],
                vec![0],
                false,
            ),
        ]);
        let MergeOutcome::Item(item) = pipeline(&source).unwrap() else {
            panic!("expected merged item");
        };
        // Only the interaction slot remains in the body.
        assert_eq!(item.body.len(), 1);
        assert!(matches!(item.body[0], BlockNode::Slot { .. }));
    }

    #[test]
    fn test_instruction_augmented_paragraph_survives() {
        let body_text = "Which experiment represents the trial where they used larger pieces \
                         of zinc? Justify your answer using evidence from the data.";
        let source = item(vec![
            paragraph(body_text),
            choice(
                "Which experiment represents the trial where they used larger pieces of zinc? \
                 Select one answer.",
                vec![option("Experiment 2", true), option("Experiment 3", false)],
                vec![0],
                false,
            ),
        ]);
        let MergeOutcome::Item(item) = pipeline(&source).unwrap() else {
            panic!("expected merged item");
        };
        assert_eq!(item.body.len(), 2);
        assert!(
            item.body[0]
                .paragraph_text()
                .unwrap()
                .contains("Justify your answer using evidence from the data.")
        );
    }

    #[test]
    fn test_latex_leakage_in_body_is_fatal() {
        let source = item(vec![
            paragraph("Evaluate \\frac{1}{2} + 1."),
            choice("Pick.", vec![option("A", true)], vec![0], false),
        ]);
        let err = pipeline(&source).unwrap_err();
        assert!(matches!(err, CompileError::BannedConstruct(_)));
    }

    #[test]
    fn test_disallowed_entity_rejected() {
        assert!(check_text("a&nbsp;b", "f").is_err());
        assert!(check_text("pre&lt;escaped", "f").is_err());
        assert!(check_text("AT&T plus & more", "f").is_ok());
    }

    #[test]
    fn test_markup_banned_but_comparisons_allowed() {
        assert!(check_text("<div>boxed</div>", "f").is_err());
        assert!(check_text("</p>", "f").is_err());
        assert!(check_text("mass < 12 g", "f").is_ok());
        assert!(check_text("<1", "f").is_ok());
    }

    #[test]
    fn test_dangling_and_unreferenced_slots() {
        let source = item(vec![
            paragraph("Just text, no figure."),
            choice("Pick.", vec![option("A", true)], vec![0], false),
        ]);
        let shell = build_shell(&source).unwrap();
        let mapping = resolve_mapping(&source, &shell);
        let realized = realize_interactions(&source, &shell).unwrap();
        let mut widgets = realize_widgets(&source, &shell, &mapping, &realized);
        // Inject an entry no slot references.
        widgets.insert(
            "widget_99".to_string(),
            Widget::NumberLine(crate::widget::NumberLineWidget {
                min: 0.0,
                max: 1.0,
                tick: 1.0,
                marks: vec![],
            }),
        );
        let err = merge(&source, shell, &mapping, realized, widgets).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Structural(StructuralError::UnreferencedEntry { .. })
        ));
    }
}
