//! Content realization — phase 3.
//!
//! Turns each slot into a fully typed interaction or widget object.
//! Interactions are realized first; widget realization may read the realized
//! interaction semantics (a number line with no authored marks highlights the
//! asked-about values), never the other way around.
//!
//! Placement rules are enforced here: inline-only fields (prompts,
//! inline-choice option text, per-choice notes) reject block markup, and
//! standard choice content is wrapped in block containers.

use std::collections::BTreeMap;

use crate::content::{
    FigureData, ResponseData, SourceAxis, SourceBlock, SourceItem, TrendSpec,
};
use crate::error::StructuralError;
use crate::item::{
    BaseType, BlockNode, Cardinality, Choice, ChoiceInteraction, Feedback, HotspotInteraction,
    HotspotRegion, InlineChoiceInteraction, InlineChoiceOption, InlineNode, Interaction,
    ResponseDeclaration, TextEntryInteraction,
};
use crate::shell::{Shell, normalize_inlines};
use crate::widget::{
    AxisSpec, BarWidget, ConceptualGraphWidget, CoordinateGridWidget, DataTableWidget,
    LineGraphWidget, MappedKind, NumberLineWidget, PolyhedronWidget, ScatterWidget, Trend, Widget,
    WidgetMapping,
};

/// Everything the interaction pass produces.
#[derive(Debug, Clone, Default)]
pub struct RealizedInteractions {
    pub interactions: BTreeMap<String, Interaction>,
    pub declarations: Vec<ResponseDeclaration>,
    pub feedback: Option<Feedback>,
}

/// Substrings whose presence marks block-level markup in an inline-only field.
const BLOCK_MARKERS: [&str; 6] = ["<p>", "<p ", "<div", "<table", "<ul", "<ol"];

fn ensure_inline(text: &str, slot: &str, field: &'static str) -> Result<(), StructuralError> {
    let lowered = text.to_ascii_lowercase();
    if BLOCK_MARKERS.iter().any(|m| lowered.contains(m)) || text.contains("\n\n") {
        return Err(StructuralError::BlockContentInInlineField {
            slot: slot.to_string(),
            field,
        });
    }
    Ok(())
}

/// Deterministic response identifier for the `n`-th interaction (0-based).
fn response_identifier(n: usize) -> String {
    if n == 0 {
        "RESPONSE".to_string()
    } else {
        format!("RESPONSE_{}", n + 1)
    }
}

/// Realize every interaction slot, in document order.
pub fn realize_interactions(
    source: &SourceItem,
    shell: &Shell,
) -> Result<RealizedInteractions, StructuralError> {
    let mut out = RealizedInteractions::default();

    for (n, slot) in shell.interaction_slots.iter().enumerate() {
        let Some(SourceBlock::Response { data }) = shell
            .slot_sources
            .get(slot)
            .and_then(|&index| source.blocks.get(index))
        else {
            continue; // impossible by construction; merge reports the hole
        };

        let response_id = response_identifier(n);
        match data {
            ResponseData::Choice {
                prompt,
                options,
                scoring,
                multiple,
                feedback,
            } => {
                if let Some(p) = prompt {
                    ensure_inline(p, slot, "prompt")?;
                }

                let mut choices = Vec::with_capacity(options.len());
                for (i, opt) in options.iter().enumerate() {
                    if let Some(note) = &opt.note {
                        ensure_inline(note, slot, "choice note")?;
                    }
                    choices.push(Choice {
                        identifier: format!("{slot}_choice_{}", i + 1),
                        // Standard choice content is block-wrapped.
                        content: vec![BlockNode::Paragraph(normalize_inlines(&opt.content))],
                        correct: opt.correct,
                        note: opt.note.clone(),
                    });
                }

                let correct = resolve_scoring(&response_id, &scoring.correct, &choices, |c| {
                    c.identifier.clone()
                })?;
                let cardinality = if scoring.ordered {
                    Cardinality::Ordered
                } else if *multiple {
                    Cardinality::Multiple
                } else {
                    Cardinality::Single
                };

                out.declarations.push(ResponseDeclaration {
                    identifier: response_id.clone(),
                    cardinality,
                    base_type: BaseType::Identifier,
                    correct,
                });
                out.interactions.insert(
                    slot.clone(),
                    Interaction::Choice(ChoiceInteraction {
                        response_id,
                        prompt: prompt.clone(),
                        max_choices: if *multiple { 0 } else { 1 },
                        choices,
                    }),
                );

                if out.feedback.is_none() {
                    if let Some(fb) = feedback {
                        out.feedback = Some(Feedback {
                            correct: fb
                                .correct
                                .iter()
                                .map(|t| BlockNode::Paragraph(vec![InlineNode::Text(t.clone())]))
                                .collect(),
                            incorrect: fb
                                .incorrect
                                .iter()
                                .map(|t| BlockNode::Paragraph(vec![InlineNode::Text(t.clone())]))
                                .collect(),
                        });
                    }
                }
            }

            ResponseData::InlineChoice { options, scoring } => {
                let mut choices = Vec::with_capacity(options.len());
                for (i, opt) in options.iter().enumerate() {
                    ensure_inline(&opt.text, slot, "inline-choice option")?;
                    choices.push(InlineChoiceOption {
                        identifier: format!("{slot}_choice_{}", i + 1),
                        text: opt.text.clone(),
                        correct: opt.correct,
                    });
                }

                let correct = resolve_scoring(&response_id, &scoring.correct, &choices, |c| {
                    c.identifier.clone()
                })?;

                out.declarations.push(ResponseDeclaration {
                    identifier: response_id.clone(),
                    cardinality: Cardinality::Single,
                    base_type: BaseType::Identifier,
                    correct,
                });
                out.interactions.insert(
                    slot.clone(),
                    Interaction::InlineChoice(InlineChoiceInteraction {
                        response_id,
                        choices,
                    }),
                );
            }

            ResponseData::TextEntry {
                answers,
                expected_length,
            } => {
                if answers.is_empty() {
                    return Err(StructuralError::SingleCardinality {
                        response_id,
                        found: 0,
                    });
                }
                out.declarations.push(ResponseDeclaration {
                    identifier: response_id.clone(),
                    cardinality: Cardinality::Single,
                    base_type: BaseType::String,
                    correct: answers.clone(),
                });
                out.interactions.insert(
                    slot.clone(),
                    Interaction::TextEntry(TextEntryInteraction {
                        response_id,
                        expected_length: *expected_length,
                    }),
                );
            }

            ResponseData::Hotspot {
                prompt,
                figure,
                regions,
                scoring,
                multiple,
            } => {
                if let Some(p) = prompt {
                    ensure_inline(p, slot, "prompt")?;
                }
                let image_slot = shell.figure_slot(*figure).ok_or_else(|| {
                    StructuralError::HotspotFigureMissing {
                        response_id: response_id.clone(),
                        figure: *figure,
                    }
                })?;

                let mut realized = Vec::with_capacity(regions.len());
                for (i, region) in regions.iter().enumerate() {
                    realized.push(HotspotRegion {
                        identifier: format!("{slot}_region_{}", i + 1),
                        rect: [region.x, region.y, region.width, region.height],
                        correct: scoring.correct.contains(&i),
                    });
                }
                for &index in &scoring.correct {
                    if index >= regions.len() {
                        return Err(StructuralError::ScoringIndexOutOfRange {
                            response_id,
                            index,
                            len: regions.len(),
                        });
                    }
                }

                let correct: Vec<String> = scoring
                    .correct
                    .iter()
                    .map(|&i| realized[i].identifier.clone())
                    .collect();

                out.declarations.push(ResponseDeclaration {
                    identifier: response_id.clone(),
                    cardinality: if *multiple {
                        Cardinality::Multiple
                    } else {
                        Cardinality::Single
                    },
                    base_type: BaseType::Identifier,
                    correct,
                });
                out.interactions.insert(
                    slot.clone(),
                    Interaction::Hotspot(HotspotInteraction {
                        response_id,
                        prompt: prompt.clone(),
                        image_slot: image_slot.to_string(),
                        max_choices: if *multiple { 0 } else { 1 },
                        regions: realized,
                    }),
                );
            }
        }
    }

    tracing::debug!(count = out.interactions.len(), "interactions realized");
    Ok(out)
}

/// Map scoring indices to element identifiers, range-checked.
fn resolve_scoring<T>(
    response_id: &str,
    indices: &[usize],
    items: &[T],
    ident: impl Fn(&T) -> String,
) -> Result<Vec<String>, StructuralError> {
    let mut out = Vec::with_capacity(indices.len());
    for &index in indices {
        let item = items
            .get(index)
            .ok_or_else(|| StructuralError::ScoringIndexOutOfRange {
                response_id: response_id.to_string(),
                index,
                len: items.len(),
            })?;
        out.push(ident(item));
    }
    Ok(out)
}

// ============================================================================
// Widgets
// ============================================================================

/// Realize every mapped widget slot. Slots mapped to the not-found sentinel
/// are left out; the merge phase turns them into the cannot-migrate outcome
/// before slot consistency is checked.
pub fn realize_widgets(
    source: &SourceItem,
    shell: &Shell,
    mapping: &WidgetMapping,
    realized: &RealizedInteractions,
) -> BTreeMap<String, Widget> {
    let mut widgets = BTreeMap::new();

    for slot in &shell.widget_slots {
        if mapping.get(slot) == Some(&MappedKind::NotFound) {
            continue;
        }
        let Some(SourceBlock::Figure { data, .. }) = shell
            .slot_sources
            .get(slot)
            .and_then(|&index| source.blocks.get(index))
        else {
            continue; // impossible by construction; merge reports the hole
        };

        if let Some(widget) = realize_figure(data, realized) {
            widgets.insert(slot.clone(), widget);
        }
    }

    widgets
}

fn realize_figure(data: &FigureData, realized: &RealizedInteractions) -> Option<Widget> {
    match data {
        FigureData::Solid {
            shape,
            dimensions,
            labels,
            diagonals,
            shaded_face,
            show_hidden_edges,
        } => Some(Widget::Polyhedron(PolyhedronWidget {
            shape: *shape,
            dimensions: *dimensions,
            labels: labels
                .iter()
                .map(|l| crate::widget::VertexLabel {
                    vertex: l.vertex,
                    text: l.text.clone(),
                })
                .collect(),
            diagonals: diagonals
                .iter()
                .map(|d| crate::widget::Diagonal {
                    from: d.from_vertex_index,
                    to: d.to_vertex_index,
                    label: d.label.clone(),
                })
                .collect(),
            shaded_face: *shaded_face,
            show_hidden_edges: *show_hidden_edges,
        })),

        FigureData::Points {
            x_axis,
            y_axis,
            points,
            trend,
        } => Some(Widget::Scatter(ScatterWidget {
            x_axis: resolve_axis(x_axis.as_ref()?),
            y_axis: resolve_axis(y_axis.as_ref()?),
            points: points.iter().map(|p| (p[0], p[1])).collect(),
            trend: trend.as_ref().map(|t| match t {
                TrendSpec::Fitted => Trend::Fitted,
                TrendSpec::Literal { from, to } => Trend::Literal {
                    from: (from[0], from[1]),
                    to: (to[0], to[1]),
                },
            }),
        })),

        FigureData::Categories {
            value_axis,
            categories,
        } => Some(Widget::Bar(BarWidget {
            value_axis: resolve_axis(value_axis.as_ref()?),
            categories: categories
                .iter()
                .map(|c| (c.label.clone(), c.value))
                .collect(),
        })),

        FigureData::Curve {
            x_axis,
            y_axis,
            points,
            qualitative,
        } => {
            if *qualitative {
                Some(Widget::ConceptualGraph(ConceptualGraphWidget {
                    x_label: x_axis.as_ref().and_then(|a| a.label.clone()),
                    y_label: y_axis.as_ref().and_then(|a| a.label.clone()),
                    points: points.iter().map(|p| (p[0], p[1])).collect(),
                }))
            } else {
                Some(Widget::LineGraph(LineGraphWidget {
                    x_axis: resolve_axis(x_axis.as_ref()?),
                    y_axis: resolve_axis(y_axis.as_ref()?),
                    points: points.iter().map(|p| (p[0], p[1])).collect(),
                }))
            }
        }

        FigureData::NumberLine {
            min,
            max,
            tick,
            marks,
        } => {
            // A number line with no authored marks highlights the values the
            // interactions ask about.
            let marks = if marks.is_empty() {
                answer_values(realized)
                    .into_iter()
                    .filter(|v| *v >= *min && *v <= *max)
                    .collect()
            } else {
                marks.clone()
            };
            Some(Widget::NumberLine(NumberLineWidget {
                min: *min,
                max: *max,
                tick: *tick,
                marks,
            }))
        }

        FigureData::Table { headers, rows } => Some(Widget::DataTable(DataTableWidget {
            headers: headers.clone(),
            rows: rows.clone(),
        })),

        FigureData::Grid { x_axis, y_axis } => Some(Widget::CoordinateGrid(CoordinateGridWidget {
            x_axis: resolve_axis(x_axis),
            y_axis: resolve_axis(y_axis),
        })),

        FigureData::External { .. } => None,
    }
}

fn resolve_axis(axis: &SourceAxis) -> AxisSpec {
    AxisSpec {
        min: axis.min,
        max: axis.max,
        label: axis.label.clone(),
        tick: axis.tick,
        gridlines: axis.gridlines,
    }
}

/// Numeric values named by the realized correct answers: text-entry answers
/// that parse as numbers, and the text of correct choices.
fn answer_values(realized: &RealizedInteractions) -> Vec<f64> {
    let mut values = Vec::new();

    for decl in &realized.declarations {
        if decl.base_type == BaseType::String {
            values.extend(decl.correct.iter().filter_map(|s| s.trim().parse::<f64>().ok()));
        }
    }
    for interaction in realized.interactions.values() {
        if let Interaction::Choice(choice) = interaction {
            for c in choice.choices.iter().filter(|c| c.correct) {
                for block in &c.content {
                    if let Some(text) = block.paragraph_text() {
                        if let Ok(v) = text.trim().parse() {
                            values.push(v);
                        }
                    }
                }
            }
        }
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Scoring, SourceInline, SourceOption};
    use crate::mapping::resolve_mapping;
    use crate::shell::build_shell;

    fn item(blocks: Vec<SourceBlock>) -> SourceItem {
        SourceItem {
            id: "q".to_string(),
            exercise_id: None,
            exercise_title: None,
            blocks,
        }
    }

    fn text_option(s: &str, correct: bool) -> SourceOption {
        SourceOption {
            content: vec![SourceInline::Text {
                text: s.to_string(),
            }],
            correct,
            note: None,
        }
    }

    fn choice_block(options: Vec<SourceOption>, correct: Vec<usize>, multiple: bool) -> SourceBlock {
        SourceBlock::Response {
            data: ResponseData::Choice {
                prompt: Some("Pick.".to_string()),
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
    fn test_choice_realization_ids_and_declaration() {
        let source = item(vec![choice_block(
            vec![text_option("240", false), text_option("480", true)],
            vec![1],
            false,
        )]);
        let shell = build_shell(&source).unwrap();
        let realized = realize_interactions(&source, &shell).unwrap();

        let interaction = &realized.interactions["interaction_1"];
        assert_eq!(interaction.response_id(), "RESPONSE");
        assert_eq!(
            interaction.choice_identifiers(),
            vec!["interaction_1_choice_1", "interaction_1_choice_2"]
        );

        let decl = &realized.declarations[0];
        assert_eq!(decl.cardinality, Cardinality::Single);
        assert_eq!(decl.correct, vec!["interaction_1_choice_2"]);
    }

    #[test]
    fn test_second_interaction_gets_numbered_response_id() {
        let source = item(vec![
            choice_block(vec![text_option("A", true)], vec![0], false),
            choice_block(vec![text_option("B", true)], vec![0], false),
        ]);
        let shell = build_shell(&source).unwrap();
        let realized = realize_interactions(&source, &shell).unwrap();
        assert_eq!(
            realized.interactions["interaction_2"].response_id(),
            "RESPONSE_2"
        );
    }

    #[test]
    fn test_block_markup_in_prompt_rejected() {
        let source = item(vec![SourceBlock::Response {
            data: ResponseData::Choice {
                prompt: Some("<p>Pick.</p>".to_string()),
                options: vec![text_option("A", true)],
                scoring: Scoring {
                    correct: vec![0],
                    ordered: false,
                },
                multiple: false,
                feedback: None,
            },
        }]);
        let shell = build_shell(&source).unwrap();
        let err = realize_interactions(&source, &shell).unwrap_err();
        assert!(matches!(
            err,
            StructuralError::BlockContentInInlineField { field: "prompt", .. }
        ));
    }

    #[test]
    fn test_choice_content_is_block_wrapped() {
        let source = item(vec![choice_block(
            vec![text_option("A", true)],
            vec![0],
            false,
        )]);
        let shell = build_shell(&source).unwrap();
        let realized = realize_interactions(&source, &shell).unwrap();
        match &realized.interactions["interaction_1"] {
            Interaction::Choice(c) => {
                assert!(matches!(c.choices[0].content[0], BlockNode::Paragraph(_)));
            }
            other => panic!("expected choice, got {other:?}"),
        }
    }

    #[test]
    fn test_scoring_index_out_of_range() {
        let source = item(vec![choice_block(
            vec![text_option("A", true)],
            vec![3],
            false,
        )]);
        let shell = build_shell(&source).unwrap();
        let err = realize_interactions(&source, &shell).unwrap_err();
        assert!(matches!(
            err,
            StructuralError::ScoringIndexOutOfRange { index: 3, .. }
        ));
    }

    #[test]
    fn test_number_line_reads_interaction_answers() {
        let source = item(vec![
            SourceBlock::Figure {
                data: FigureData::NumberLine {
                    min: 0.0,
                    max: 10.0,
                    tick: 1.0,
                    marks: vec![],
                },
                caption: None,
            },
            choice_block(
                vec![text_option("7", true), text_option("12", false)],
                vec![0],
                false,
            ),
        ]);
        let shell = build_shell(&source).unwrap();
        let mapping = resolve_mapping(&source, &shell);
        let realized = realize_interactions(&source, &shell).unwrap();
        let widgets = realize_widgets(&source, &shell, &mapping, &realized);

        match &widgets["widget_1"] {
            Widget::NumberLine(nl) => assert_eq!(nl.marks, vec![7.0]),
            other => panic!("expected number line, got {other:?}"),
        }
    }

    #[test]
    fn test_hotspot_resolves_figure_slot() {
        let source = item(vec![
            SourceBlock::Figure {
                data: FigureData::Grid {
                    x_axis: SourceAxis {
                        min: 0.0,
                        max: 10.0,
                        label: None,
                        tick: 1.0,
                        gridlines: true,
                    },
                    y_axis: SourceAxis {
                        min: 0.0,
                        max: 10.0,
                        label: None,
                        tick: 1.0,
                        gridlines: true,
                    },
                },
                caption: None,
            },
            SourceBlock::Response {
                data: ResponseData::Hotspot {
                    prompt: None,
                    figure: 0,
                    regions: vec![crate::content::SourceRegion {
                        x: 0.0,
                        y: 0.0,
                        width: 20.0,
                        height: 20.0,
                    }],
                    scoring: Scoring {
                        correct: vec![0],
                        ordered: false,
                    },
                    multiple: false,
                },
            },
        ]);
        let shell = build_shell(&source).unwrap();
        let realized = realize_interactions(&source, &shell).unwrap();
        match &realized.interactions["interaction_1"] {
            Interaction::Hotspot(h) => {
                assert_eq!(h.image_slot, "widget_1");
                assert!(h.regions[0].correct);
            }
            other => panic!("expected hotspot, got {other:?}"),
        }
    }
}
