#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};
    use insta::assert_snapshot;
    use tally::export::{export, ExportFormat, ExportOptions, Layout};
    use tally::format::report_statistics;
    use tally::model::{AggregateOp, Alignment, ColumnSpec, FieldType, SubtotalSpec};
    use tally::{apply_grouping, AnnotatedRow, Record, Value};

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_hms_opt(18, 0, 5)
            .unwrap()
    }

    fn layout() -> Layout {
        let mut amount = ColumnSpec::new("amt");
        amount.display_label = Some("Amount".to_string());
        amount.field_type = FieldType::Currency;
        amount.alignment = Alignment::Right;
        Layout::from_columns(&[ColumnSpec::new("dept"), amount])
    }

    fn rows() -> Vec<AnnotatedRow> {
        let records = vec![
            Record::from_iter([("dept", Value::from("A")), ("amt", Value::Int(10))]),
            Record::from_iter([("dept", Value::from("A")), ("amt", Value::Float(5.5))]),
            Record::from_iter([("dept", Value::from("B, Ltd")), ("amt", Value::Int(1200))]),
        ];
        apply_grouping(records, &["dept"], &[SubtotalSpec::new("amt", AggregateOp::Sum)]).unwrap()
    }

    fn render(format: ExportFormat) -> Vec<u8> {
        export(
            "Dept Totals",
            &rows(),
            &layout(),
            format,
            &ExportOptions::default(),
            timestamp(),
        )
        .unwrap()
        .bytes
    }

    #[test]
    fn test_csv() {
        let csv = String::from_utf8(render(ExportFormat::Csv)).unwrap();
        assert_snapshot!(csv.replace("\r\n", "\n"), @r#"
        Dept,Amount
        dept: A (2 records),
        A,$10.00
        A,$5.50
        Subtotal,$15.50
        "dept: B, Ltd (1 record)",
        "B, Ltd","$1,200.00"
        Subtotal,"$1,200.00"
        "#);
        assert!(csv.ends_with("\r\n"));
    }

    #[test]
    fn test_html_marks_rows() {
        let html = String::from_utf8(render(ExportFormat::Html)).unwrap();

        assert!(html.contains("<title>Dept Totals</title>"));
        assert!(html.contains("<tr><th>Dept</th><th>Amount</th></tr>"));
        assert!(html.contains(
            r#"<tr class="group-header"><td colspan="2">dept: A (2 records)</td></tr>"#
        ));
        assert!(html.contains(
            r#"<tr><td>A</td><td style="text-align: right">$10.00</td></tr>"#
        ));
        assert!(html.contains(
            r#"<tr class="subtotal"><td>Subtotal</td><td style="text-align: right">$15.50</td></tr>"#
        ));
        assert_eq!(html.matches("class=\"subtotal\"").count(), 2);
        assert_eq!(html.matches("class=\"group-header\"").count(), 2);
    }

    #[test]
    fn test_html_escapes_values() {
        let rows = vec![AnnotatedRow::Data(Record::from_iter([
            ("dept", "<script>"),
            ("amt", "1"),
        ]))];
        let file = export(
            "R&D",
            &rows,
            &layout(),
            ExportFormat::Html,
            &ExportOptions::default(),
            timestamp(),
        )
        .unwrap();
        let html = String::from_utf8(file.bytes).unwrap();

        assert!(html.contains("<h1>R&amp;D</h1>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_json_wire_rows() {
        let json: serde_json::Value =
            serde_json::from_slice(&render(ExportFormat::Json)).unwrap();
        let rows = json.as_array().unwrap();

        assert_eq!(rows.len(), 7);
        assert_eq!(rows[0]["_type"], "GROUP_HEADER");
        assert_eq!(rows[0]["_record_count"], 2);
        assert!(rows[1].get("_type").is_none());
        assert_eq!(rows[3]["_type"], "SUBTOTAL");
        assert_eq!(rows[3]["amt_subtotal"], 15.5);
        assert_eq!(rows[3]["_group_key"]["dept"], "A");
    }

    #[test]
    fn test_xlsx_is_a_workbook() {
        let bytes = render(ExportFormat::Xlsx);
        // xlsx is a zip archive
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_exported_file_metadata() {
        let file = export(
            "Dept Totals",
            &rows(),
            &layout(),
            ExportFormat::Xlsx,
            &ExportOptions::default(),
            timestamp(),
        )
        .unwrap();
        assert_eq!(file.file_name, "Dept Totals_20240331_180005.xlsx");
        assert_eq!(
            file.content_type,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
    }

    #[test]
    fn test_currency_symbol_option() {
        let options = ExportOptions {
            currency_symbol: "€".to_string(),
            precision: 0,
            ..ExportOptions::default()
        };
        let file = export(
            "t",
            &rows(),
            &layout(),
            ExportFormat::Csv,
            &options,
            timestamp(),
        )
        .unwrap();
        let csv = String::from_utf8(file.bytes).unwrap();
        assert!(csv.contains("A,€10\r\n"));
        assert!(csv.contains("Subtotal,\"€1,200\"\r\n"));
    }

    #[test]
    fn test_statistics_ignore_markers() {
        let stats = report_statistics(&rows());

        assert_eq!(stats.total_rows, 3);
        let amount = &stats.numeric_fields["amt"];
        assert_eq!(amount.sum, 1215.5);
        assert_eq!(amount.min, Some(5.5));
        assert_eq!(amount.max, Some(1200.0));
        assert_eq!(stats.text_fields["dept"].unique_values, 2);
    }
}
