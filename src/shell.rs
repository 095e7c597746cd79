//! Shell compilation — phase 1.
//!
//! Walks the source blocks and produces the body skeleton: paragraphs with
//! normalized math, and a named slot for every figure and response area.
//! Nothing visual or interactive is embedded directly; slot content is
//! realized in later phases.

use std::collections::BTreeMap;

use crate::content::{SourceBlock, SourceInline, SourceItem};
use crate::error::StructuralError;
use crate::item::{BlockNode, InlineNode};
use crate::math;

/// The body skeleton plus slot name lists, before slot content exists.
#[derive(Debug, Clone)]
pub struct Shell {
    pub body: Vec<BlockNode>,
    /// Widget slot names in document order.
    pub widget_slots: Vec<String>,
    /// Interaction slot names in document order.
    pub interaction_slots: Vec<String>,
    /// Slot name → index of the originating block in `SourceItem::blocks`.
    pub slot_sources: BTreeMap<String, usize>,
}

impl Shell {
    /// Slot name assigned to the `n`-th figure block (0-based), if any.
    pub fn figure_slot(&self, n: usize) -> Option<&str> {
        self.widget_slots.get(n).map(String::as_str)
    }
}

/// Build the shell for one source item.
///
/// Slot names are generated in document order (`widget_1`, `widget_2`, ...;
/// `interaction_1`, ...), so they are a pure function of the source structure.
pub fn build_shell(source: &SourceItem) -> Result<Shell, StructuralError> {
    let mut body = Vec::with_capacity(source.blocks.len());
    let mut widget_slots = Vec::new();
    let mut interaction_slots = Vec::new();
    let mut slot_sources = BTreeMap::new();

    for (index, block) in source.blocks.iter().enumerate() {
        match block {
            SourceBlock::Paragraph { children } => {
                body.push(BlockNode::Paragraph(normalize_inlines(children)));
            }
            SourceBlock::Figure { caption, .. } => {
                let name = format!("widget_{}", widget_slots.len() + 1);
                if slot_sources.insert(name.clone(), index).is_some() {
                    return Err(StructuralError::DuplicateSlot { name });
                }
                widget_slots.push(name.clone());
                body.push(BlockNode::Slot { name });
                if let Some(caption) = caption {
                    body.push(BlockNode::Paragraph(vec![InlineNode::Text(
                        caption.clone(),
                    )]));
                }
            }
            SourceBlock::Response { .. } => {
                let name = format!("interaction_{}", interaction_slots.len() + 1);
                if slot_sources.insert(name.clone(), index).is_some() {
                    return Err(StructuralError::DuplicateSlot { name });
                }
                interaction_slots.push(name.clone());
                body.push(BlockNode::Slot { name });
            }
        }
    }

    tracing::debug!(
        widgets = widget_slots.len(),
        interactions = interaction_slots.len(),
        "shell built"
    );

    Ok(Shell {
        body,
        widget_slots,
        interaction_slots,
        slot_sources,
    })
}

/// Normalize source inline content: text passes through, math is structurally
/// rewritten (legacy fenced groups become explicit delimiter rows).
pub fn normalize_inlines(children: &[SourceInline]) -> Vec<InlineNode> {
    children
        .iter()
        .map(|inline| match inline {
            SourceInline::Text { text } => InlineNode::Text(text.clone()),
            SourceInline::Math { math } => InlineNode::Math(math::normalize(math.clone())),
        })
        .collect()
}
