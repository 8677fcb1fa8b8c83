//! Excel export via `rust_xlsxwriter`.
//!
//! Sheet layout:
//!
//! ```text
//! A1      report title (bold 14pt, white on blue)
//! row 3   column labels (bold, light blue fill)
//! row 4+  data, group headers and subtotals (markers in bold)
//! ```

use rust_xlsxwriter::{Color, Format, Workbook};

use super::{
    header_text, render_rows, ExportOptions, ExportResult, Layout, LayoutColumn, RenderedRow,
};
use crate::grouping::{subtotal_value, AnnotatedRow};
use crate::model::{FieldType, Value};

const TITLE_ROW: u32 = 0;
const HEADER_ROW: u32 = 2;
const FIRST_DATA_ROW: u32 = 3;

pub(crate) fn render(
    title: &str,
    rows: &[AnnotatedRow],
    layout: &Layout,
    options: &ExportOptions,
) -> ExportResult<Vec<u8>> {
    let title_format = Format::new()
        .set_bold()
        .set_font_size(14)
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(0x4472C4));
    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xD9E1F2));
    let marker_format = Format::new().set_bold();

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Report")?;

    let mut widths = vec![0usize; layout.columns.len().max(1)];
    let mut track = |col: usize, text: &str| {
        if let Some(width) = widths.get_mut(col) {
            *width = (*width).max(text.chars().count());
        }
    };

    worksheet.write_string_with_format(TITLE_ROW, 0, title, &title_format)?;
    track(0, title);

    for (col, column) in layout.columns.iter().enumerate() {
        worksheet.write_string_with_format(HEADER_ROW, col as u16, &column.label, &header_format)?;
        track(col, &column.label);
    }

    let rendered = render_rows(rows, layout, options);
    for (offset, (row, cells)) in rows.iter().zip(rendered).enumerate() {
        let excel_row = FIRST_DATA_ROW + offset as u32;

        match (row, cells) {
            (AnnotatedRow::Data(record), RenderedRow::Data(cells)) => {
                for (col, (column, cell)) in layout.columns.iter().zip(&cells).enumerate() {
                    match plain_number(column, record.get(&column.field)) {
                        Some(n) => {
                            worksheet.write_number(excel_row, col as u16, n)?;
                        }
                        None if cell.is_empty() => {}
                        None => {
                            worksheet.write_string(excel_row, col as u16, cell)?;
                        }
                    }
                    track(col, cell);
                }
            }
            (AnnotatedRow::Subtotal { values, .. }, RenderedRow::Subtotal(cells)) => {
                for (col, (column, cell)) in layout.columns.iter().zip(&cells).enumerate() {
                    match plain_number(column, subtotal_value(values, &column.field)) {
                        Some(n) => {
                            worksheet.write_number_with_format(excel_row, col as u16, n, &marker_format)?;
                        }
                        None if cell.is_empty() => {}
                        None => {
                            worksheet.write_string_with_format(
                                excel_row,
                                col as u16,
                                cell,
                                &marker_format,
                            )?;
                        }
                    }
                    track(col, cell);
                }
            }
            (AnnotatedRow::GroupHeader { key, record_count }, _) => {
                // Spans the row visually; left out of column widths
                worksheet.write_string_with_format(
                    excel_row,
                    0,
                    header_text(key, *record_count),
                    &marker_format,
                )?;
            }
            _ => {}
        }
    }

    for (col, width) in widths.iter().enumerate() {
        let width = (width + 2).min(options.max_column_width);
        worksheet.set_column_width(col as u16, width as f64)?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// Numbers in columns without display formatting are written as numbers.
fn plain_number(column: &LayoutColumn, value: Option<&Value>) -> Option<f64> {
    let plain = match column.field_type {
        FieldType::Text => true,
        FieldType::Number => column.format.is_none(),
        FieldType::Currency | FieldType::Percent | FieldType::Date => false,
    };
    match value {
        Some(Value::Int(i)) if plain => Some(*i as f64),
        Some(Value::Float(f)) if plain && f.is_finite() => Some(*f),
        _ => None,
    }
}
