//! HTML table export. Also the input for external PDF renderers.

use std::fmt::Write;

use super::{render_rows, ExportOptions, Layout, RenderedRow};
use crate::grouping::AnnotatedRow;
use crate::model::Alignment;

const STYLE: &str = "\
body { font-family: Arial, sans-serif; margin: 20px; }
h1 { color: #333; border-bottom: 2px solid #333; padding-bottom: 10px; }
table { width: 100%; border-collapse: collapse; margin-top: 20px; }
th { background-color: #4472C4; color: white; padding: 10px; text-align: left; border: 1px solid #999; }
td { padding: 8px; border: 1px solid #ddd; }
tr:nth-child(even) { background-color: #f2f2f2; }
.subtotal { background-color: #e8e8e8; font-weight: bold; }
.group-header { background-color: #d9e1f2; font-weight: bold; }
";

pub(crate) fn render(
    title: &str,
    rows: &[AnnotatedRow],
    layout: &Layout,
    options: &ExportOptions,
) -> String {
    let mut html = String::new();
    let title = escape(title);

    // Writing to a String cannot fail
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>\n{}</style>\n</head>\n<body>\n<h1>{}</h1>\n<table>\n",
        title, STYLE, title
    );

    html.push_str("<tr>");
    for column in &layout.columns {
        let _ = write!(html, "<th>{}</th>", escape(&column.label));
    }
    html.push_str("</tr>\n");

    let span = layout.columns.len().max(1);
    for row in render_rows(rows, layout, options) {
        match row {
            RenderedRow::Data(cells) => {
                html.push_str("<tr>");
                push_cells(&mut html, layout, &cells);
                html.push_str("</tr>\n");
            }
            RenderedRow::GroupHeader(text) => {
                let _ = writeln!(
                    html,
                    "<tr class=\"group-header\"><td colspan=\"{}\">{}</td></tr>",
                    span,
                    escape(&text)
                );
            }
            RenderedRow::Subtotal(cells) => {
                html.push_str("<tr class=\"subtotal\">");
                push_cells(&mut html, layout, &cells);
                html.push_str("</tr>\n");
            }
        }
    }

    html.push_str("</table>\n</body>\n</html>\n");
    html
}

fn push_cells(html: &mut String, layout: &Layout, cells: &[String]) {
    for (column, cell) in layout.columns.iter().zip(cells) {
        match column.alignment {
            Alignment::Left => {
                let _ = write!(html, "<td>{}</td>", escape(cell));
            }
            other => {
                let _ = write!(
                    html,
                    "<td style=\"text-align: {}\">{}</td>",
                    other.as_css(),
                    escape(cell)
                );
            }
        }
    }
}

/// Escape text for element content and quoted attributes.
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
