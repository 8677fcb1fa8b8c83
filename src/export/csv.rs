//! CSV export (RFC 4180 quoting, CRLF line endings).

use super::{render_rows, ExportOptions, Layout, RenderedRow};
use crate::grouping::AnnotatedRow;

pub(crate) fn render(rows: &[AnnotatedRow], layout: &Layout, options: &ExportOptions) -> String {
    let mut out = String::new();
    write_row(&mut out, layout.labels());

    let width = layout.columns.len();
    for row in render_rows(rows, layout, options) {
        match row {
            RenderedRow::Data(cells) | RenderedRow::Subtotal(cells) => write_row(&mut out, cells),
            RenderedRow::GroupHeader(text) => {
                let mut cells = vec![String::new(); width.max(1)];
                cells[0] = text;
                write_row(&mut out, cells);
            }
        }
    }

    out
}

fn write_row<I, S>(out: &mut String, values: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let line = values
        .into_iter()
        .map(|v| escape_value(v.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&line);
    out.push_str("\r\n");
}

fn escape_value(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
