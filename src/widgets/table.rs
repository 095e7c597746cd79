//! Data table rendering — an XHTML fragment, not SVG.

use crate::svg::escape_xml;
use crate::widget::DataTableWidget;

pub fn render(widget: &DataTableWidget) -> String {
    let mut out = String::from("<table><thead><tr>");
    for header in &widget.headers {
        out.push_str("<th>");
        out.push_str(&escape_xml(header));
        out.push_str("</th>");
    }
    out.push_str("</tr></thead><tbody>");
    for row in &widget.rows {
        out.push_str("<tr>");
        for cell in row {
            out.push_str("<td>");
            out.push_str(&escape_xml(cell));
            out.push_str("</td>");
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
    out
}
