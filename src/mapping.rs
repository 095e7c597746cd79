//! Widget-mapping resolution — phase 2.
//!
//! Assigns each widget slot exactly one concrete widget kind from the closed
//! vocabulary, or the not-found sentinel. The resolver is total over the slot
//! set and inspects only the figure payload's declared structure; axis and
//! tick counts come from the declared axis spec, never from the data.

use crate::content::{FigureData, SourceBlock, SourceItem};
use crate::shell::Shell;
use crate::widget::{MappedKind, WidgetKind, WidgetMapping};

/// Resolve the kind of every widget slot in `shell`.
///
/// Every slot name in `shell.widget_slots` appears as a key in the result.
pub fn resolve_mapping(source: &SourceItem, shell: &Shell) -> WidgetMapping {
    let mut mapping = WidgetMapping::new();

    for slot in &shell.widget_slots {
        let kind = shell
            .slot_sources
            .get(slot)
            .and_then(|&index| source.blocks.get(index))
            .and_then(|block| match block {
                SourceBlock::Figure { data, .. } => Some(classify(data)),
                _ => None,
            })
            .unwrap_or(MappedKind::NotFound);

        if kind == MappedKind::NotFound {
            tracing::debug!(slot = %slot, "no renderer fits this figure");
        }
        mapping.insert(slot.clone(), kind);
    }

    mapping
}

/// Map one figure payload to a renderer kind.
fn classify(data: &FigureData) -> MappedKind {
    match data {
        FigureData::Solid { .. } => MappedKind::Kind(WidgetKind::PolyhedronDiagram),
        FigureData::Points { x_axis, y_axis, .. } => {
            // Scatter needs both scales declared; unscaled point clouds have
            // no renderer.
            if x_axis.is_some() && y_axis.is_some() {
                MappedKind::Kind(WidgetKind::ScatterPlot)
            } else {
                MappedKind::NotFound
            }
        }
        FigureData::Categories { value_axis, .. } => {
            if value_axis.is_some() {
                MappedKind::Kind(WidgetKind::BarChart)
            } else {
                MappedKind::NotFound
            }
        }
        FigureData::Curve {
            qualitative,
            x_axis,
            y_axis,
            ..
        } => {
            if *qualitative {
                MappedKind::Kind(WidgetKind::ConceptualGraph)
            } else if x_axis.is_some() && y_axis.is_some() {
                MappedKind::Kind(WidgetKind::LineGraph)
            } else {
                MappedKind::NotFound
            }
        }
        FigureData::NumberLine { .. } => MappedKind::Kind(WidgetKind::NumberLine),
        FigureData::Table { .. } => MappedKind::Kind(WidgetKind::DataTable),
        FigureData::Grid { .. } => MappedKind::Kind(WidgetKind::CoordinateGrid),
        FigureData::External { .. } => MappedKind::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{SourceAxis, SourceItem};
    use crate::shell::build_shell;

    fn axis() -> SourceAxis {
        SourceAxis {
            min: 0.0,
            max: 10.0,
            label: None,
            tick: 2.0,
            gridlines: true,
        }
    }

    fn item_with_figures(figures: Vec<FigureData>) -> SourceItem {
        SourceItem {
            id: "q".to_string(),
            exercise_id: None,
            exercise_title: None,
            blocks: figures
                .into_iter()
                .map(|data| SourceBlock::Figure { data, caption: None })
                .collect(),
        }
    }

    #[test]
    fn test_mapping_is_total_over_slots() {
        let source = item_with_figures(vec![
            FigureData::NumberLine {
                min: 0.0,
                max: 5.0,
                tick: 1.0,
                marks: vec![],
            },
            FigureData::External {
                url: "https://example.test/x.png".to_string(),
                alt: None,
            },
            FigureData::Points {
                x_axis: Some(axis()),
                y_axis: Some(axis()),
                points: vec![[1.0, 2.0]],
                trend: None,
            },
        ]);
        let shell = build_shell(&source).unwrap();
        let mapping = resolve_mapping(&source, &shell);

        assert_eq!(mapping.len(), shell.widget_slots.len());
        assert_eq!(
            mapping["widget_1"],
            MappedKind::Kind(WidgetKind::NumberLine)
        );
        assert_eq!(mapping["widget_2"], MappedKind::NotFound);
        assert_eq!(
            mapping["widget_3"],
            MappedKind::Kind(WidgetKind::ScatterPlot)
        );
    }

    #[test]
    fn test_unscaled_points_have_no_renderer() {
        let source = item_with_figures(vec![FigureData::Points {
            x_axis: None,
            y_axis: Some(axis()),
            points: vec![[1.0, 2.0]],
            trend: None,
        }]);
        let shell = build_shell(&source).unwrap();
        let mapping = resolve_mapping(&source, &shell);
        assert_eq!(mapping["widget_1"], MappedKind::NotFound);
    }

    #[test]
    fn test_curve_splits_on_qualitative() {
        let source = item_with_figures(vec![
            FigureData::Curve {
                x_axis: None,
                y_axis: None,
                points: vec![[0.0, 0.0], [1.0, 2.0]],
                qualitative: true,
            },
            FigureData::Curve {
                x_axis: Some(axis()),
                y_axis: Some(axis()),
                points: vec![[0.0, 0.0], [1.0, 2.0]],
                qualitative: false,
            },
        ]);
        let shell = build_shell(&source).unwrap();
        let mapping = resolve_mapping(&source, &shell);
        assert_eq!(
            mapping["widget_1"],
            MappedKind::Kind(WidgetKind::ConceptualGraph)
        );
        assert_eq!(mapping["widget_2"], MappedKind::Kind(WidgetKind::LineGraph));
    }
}
