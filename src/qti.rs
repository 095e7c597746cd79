//! QTI 3.0 XML emission.
//!
//! Walks a validated [`AssessmentItem`] and writes the complete
//! `qti-assessment-item` document. Emission is deterministic: map iteration
//! is ordered, attribute order is fixed, and nothing is stamped with time or
//! randomness — the same item always produces byte-identical XML.

use crate::error::CompileError;
use crate::item::{
    AssessmentItem, BaseType, BlockNode, Choice, Feedback, InlineNode, Interaction,
    ResponseDeclaration,
};
use crate::math;
use crate::svg::{DEFAULT_PRECISION, escape_xml};
use crate::widgets::render_widget;

pub const QTI_NS: &str = "http://www.imsglobal.org/xsd/imsqtiasi_v3p0";

#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// Include the `<?xml ...?>` declaration.
    pub xml_declaration: bool,
    /// Decimal precision for widget SVG coordinates.
    pub svg_precision: usize,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            xml_declaration: true,
            svg_precision: DEFAULT_PRECISION,
        }
    }
}

/// Emit the full QTI document for one item.
pub fn emit(item: &AssessmentItem, options: &EmitOptions) -> Result<String, CompileError> {
    let mut out = String::new();

    if options.xml_declaration {
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    }
    out.push_str(&format!(
        "<qti-assessment-item xmlns=\"{}\" identifier=\"{}\" title=\"{}\" adaptive=\"false\" time-dependent=\"false\">",
        QTI_NS,
        escape_xml(&item.identifier),
        escape_xml(&item.title),
    ));

    for decl in &item.response_declarations {
        emit_response_declaration(decl, &mut out);
    }
    out.push_str(
        "<qti-outcome-declaration identifier=\"SCORE\" cardinality=\"single\" base-type=\"float\"/>",
    );
    if needs_feedback_outcome(item) {
        out.push_str(
            "<qti-outcome-declaration identifier=\"FEEDBACK\" cardinality=\"single\" base-type=\"identifier\"/>",
        );
    }

    out.push_str("<qti-item-body>");
    for block in &item.body {
        emit_block(item, block, options, &mut out)?;
    }
    out.push_str("</qti-item-body>");

    if let Some(feedback) = &item.feedback {
        emit_modal_feedback(feedback, &mut out)?;
    }

    out.push_str("</qti-assessment-item>");
    Ok(out)
}

fn needs_feedback_outcome(item: &AssessmentItem) -> bool {
    item.feedback.is_some()
        || item.interactions.values().any(|i| match i {
            Interaction::Choice(c) => c.choices.iter().any(|choice| choice.note.is_some()),
            _ => false,
        })
}

fn emit_response_declaration(decl: &ResponseDeclaration, out: &mut String) {
    out.push_str(&format!(
        "<qti-response-declaration identifier=\"{}\" cardinality=\"{}\" base-type=\"{}\">",
        escape_xml(&decl.identifier),
        decl.cardinality.as_str(),
        decl.base_type.as_str(),
    ));

    match decl.base_type {
        BaseType::Identifier => {
            out.push_str("<qti-correct-response>");
            for value in &decl.correct {
                out.push_str(&format!("<qti-value>{}</qti-value>", escape_xml(value)));
            }
            out.push_str("</qti-correct-response>");
        }
        BaseType::String => {
            // First accepted answer is the canonical correct response;
            // alternates score through the mapping.
            if let Some(first) = decl.correct.first() {
                out.push_str(&format!(
                    "<qti-correct-response><qti-value>{}</qti-value></qti-correct-response>",
                    escape_xml(first)
                ));
            }
            if decl.correct.len() > 1 {
                out.push_str("<qti-mapping default-value=\"0\">");
                for value in &decl.correct {
                    out.push_str(&format!(
                        "<qti-map-entry map-key=\"{}\" mapped-value=\"1\"/>",
                        escape_xml(value)
                    ));
                }
                out.push_str("</qti-mapping>");
            }
        }
    }
    out.push_str("</qti-response-declaration>");
}

fn emit_block(
    item: &AssessmentItem,
    block: &BlockNode,
    options: &EmitOptions,
    out: &mut String,
) -> Result<(), CompileError> {
    match block {
        BlockNode::Paragraph(inlines) => {
            out.push_str("<p>");
            emit_inlines(inlines, out)?;
            out.push_str("</p>");
        }
        BlockNode::Slot { name } => {
            if let Some(widget) = item.widgets.get(name) {
                out.push_str(&render_widget(widget, name, options.svg_precision)?);
            } else if let Some(interaction) = item.interactions.get(name) {
                emit_interaction(item, interaction, options, out)?;
            }
            // A name matching neither map cannot survive merge validation.
        }
    }
    Ok(())
}

fn emit_inlines(inlines: &[InlineNode], out: &mut String) -> Result<(), CompileError> {
    for inline in inlines {
        match inline {
            InlineNode::Text(text) => out.push_str(&escape_xml(text)),
            InlineNode::Math(node) => math::emit_math_element(node, out)?,
        }
    }
    Ok(())
}

fn emit_blocks_plain(blocks: &[BlockNode], out: &mut String) -> Result<(), CompileError> {
    for block in blocks {
        if let BlockNode::Paragraph(inlines) = block {
            out.push_str("<p>");
            emit_inlines(inlines, out)?;
            out.push_str("</p>");
        }
    }
    Ok(())
}

fn emit_interaction(
    item: &AssessmentItem,
    interaction: &Interaction,
    options: &EmitOptions,
    out: &mut String,
) -> Result<(), CompileError> {
    match interaction {
        Interaction::Choice(c) => {
            out.push_str(&format!(
                "<qti-choice-interaction response-identifier=\"{}\" max-choices=\"{}\">",
                escape_xml(&c.response_id),
                c.max_choices,
            ));
            if let Some(prompt) = &c.prompt {
                out.push_str(&format!("<qti-prompt>{}</qti-prompt>", escape_xml(prompt)));
            }
            for choice in &c.choices {
                emit_choice(choice, out)?;
            }
            out.push_str("</qti-choice-interaction>");
        }

        Interaction::InlineChoice(c) => {
            // Inline interactions sit inside block content.
            out.push_str("<p>");
            out.push_str(&format!(
                "<qti-inline-choice-interaction response-identifier=\"{}\">",
                escape_xml(&c.response_id),
            ));
            for choice in &c.choices {
                out.push_str(&format!(
                    "<qti-inline-choice identifier=\"{}\">{}</qti-inline-choice>",
                    escape_xml(&choice.identifier),
                    escape_xml(&choice.text),
                ));
            }
            out.push_str("</qti-inline-choice-interaction></p>");
        }

        Interaction::TextEntry(t) => {
            out.push_str("<p>");
            match t.expected_length {
                Some(len) => out.push_str(&format!(
                    "<qti-text-entry-interaction response-identifier=\"{}\" expected-length=\"{}\"/>",
                    escape_xml(&t.response_id),
                    len,
                )),
                None => out.push_str(&format!(
                    "<qti-text-entry-interaction response-identifier=\"{}\"/>",
                    escape_xml(&t.response_id),
                )),
            }
            out.push_str("</p>");
        }

        Interaction::Hotspot(h) => {
            out.push_str(&format!(
                "<qti-hotspot-interaction response-identifier=\"{}\" max-choices=\"{}\">",
                escape_xml(&h.response_id),
                h.max_choices,
            ));
            if let Some(prompt) = &h.prompt {
                out.push_str(&format!("<qti-prompt>{}</qti-prompt>", escape_xml(prompt)));
            }
            if let Some(widget) = item.widgets.get(&h.image_slot) {
                let svg = render_widget(widget, &h.image_slot, options.svg_precision)?;
                out.push_str(&format!(
                    "<object type=\"image/svg+xml\" data=\"data:image/svg+xml;utf8,{}\"/>",
                    escape_xml(&svg),
                ));
            }
            for region in &h.regions {
                let [x, y, w, hgt] = region.rect;
                out.push_str(&format!(
                    "<qti-hotspot-choice identifier=\"{}\" shape=\"rect\" coords=\"{},{},{},{}\"/>",
                    escape_xml(&region.identifier),
                    x.round() as i64,
                    y.round() as i64,
                    (x + w).round() as i64,
                    (y + hgt).round() as i64,
                ));
            }
            out.push_str("</qti-hotspot-interaction>");
        }
    }
    Ok(())
}

fn emit_choice(choice: &Choice, out: &mut String) -> Result<(), CompileError> {
    out.push_str(&format!(
        "<qti-simple-choice identifier=\"{}\">",
        escape_xml(&choice.identifier)
    ));
    emit_blocks_plain(&choice.content, out)?;
    if let Some(note) = &choice.note {
        out.push_str(&format!(
            "<qti-feedback-inline outcome-identifier=\"FEEDBACK\" identifier=\"{}\" show-hide=\"show\">{}</qti-feedback-inline>",
            escape_xml(&choice.identifier),
            escape_xml(note),
        ));
    }
    out.push_str("</qti-simple-choice>");
    Ok(())
}

fn emit_modal_feedback(feedback: &Feedback, out: &mut String) -> Result<(), CompileError> {
    if !feedback.correct.is_empty() {
        out.push_str(
            "<qti-modal-feedback outcome-identifier=\"FEEDBACK\" identifier=\"CORRECT\" show-hide=\"show\"><qti-content-body>",
        );
        emit_blocks_plain(&feedback.correct, out)?;
        out.push_str("</qti-content-body></qti-modal-feedback>");
    }
    if !feedback.incorrect.is_empty() {
        out.push_str(
            "<qti-modal-feedback outcome-identifier=\"FEEDBACK\" identifier=\"INCORRECT\" show-hide=\"show\"><qti-content-body>",
        );
        emit_blocks_plain(&feedback.incorrect, out)?;
        out.push_str("</qti-content-body></qti-modal-feedback>");
    }
    Ok(())
}
