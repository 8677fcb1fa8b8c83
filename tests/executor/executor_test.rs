#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use insta::assert_snapshot;
    use tally::executor::{
        render_sql, Executor, ExecutorOptions, QueryConfig, QueryError, SqliteDatabase,
    };
    use tally::grouping::{GroupOrder, GroupingError, GroupingOptions};
    use tally::model::samples::{sample, DEMO_SCHEMA};
    use tally::model::{
        AggregateOp, FilterOperator, FilterSpec, GroupingSpec, QueryKind, ReportDefinition,
        SubtotalSpec, ValidationError,
    };
    use tally::sql::{Dialect, StatementError};
    use tally::{AnnotatedRow, Record, Value};

    fn demo() -> Executor<SqliteDatabase> {
        let db = SqliteDatabase::open_in_memory().unwrap();
        db.execute_batch(DEMO_SCHEMA).unwrap();
        Executor::new(db)
    }

    fn subtotals(rows: &[AnnotatedRow]) -> Vec<(String, Record)> {
        rows.iter()
            .filter_map(|row| match row {
                AnnotatedRow::Subtotal { key, values } => {
                    Some((key.iter().map(|(_, v)| v.to_display()).collect(), values.clone()))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_sales_sample() {
        let outcome = demo()
            .run_report(&sample("sales").unwrap(), &HashMap::new())
            .unwrap();

        assert_eq!(outcome.count, 8);
        assert_eq!(outcome.rows.len(), outcome.count);
        assert_eq!(
            subtotals(&outcome.rows),
            vec![
                (
                    "2024-02".to_string(),
                    Record::from_iter([
                        ("invoice_count_subtotal", 2.0),
                        ("total_amount_subtotal", 1125.25),
                    ])
                ),
                (
                    "2024-01".to_string(),
                    Record::from_iter([
                        ("invoice_count_subtotal", 3.0),
                        ("total_amount_subtotal", 2430.5),
                    ])
                ),
            ]
        );
    }

    #[test]
    fn test_sorted_grouping_uses_sort_order() {
        let mut report = sample("sales").unwrap();
        report.report_query = report.report_query.replace("period DESC", "period ASC");
        let db = SqliteDatabase::open_in_memory().unwrap();
        db.execute_batch(DEMO_SCHEMA).unwrap();

        let first_seen = demo().run_report(&report, &HashMap::new()).unwrap();
        let periods: Vec<_> = subtotals(&first_seen.rows).into_iter().map(|(k, _)| k).collect();
        assert_eq!(periods, vec!["2024-01", "2024-02"]);

        let sorted = Executor::with_options(
            db,
            ExecutorOptions {
                grouping: GroupingOptions {
                    group_order: GroupOrder::Sorted,
                    ..GroupingOptions::default()
                },
                ..ExecutorOptions::default()
            },
        );
        let outcome = sorted.run_report(&report, &HashMap::new()).unwrap();
        let periods: Vec<_> = subtotals(&outcome.rows).into_iter().map(|(k, _)| k).collect();
        assert_eq!(periods, vec!["2024-02", "2024-01"]);
    }

    #[test]
    fn test_sales_sample_with_prompt() {
        let prompts = HashMap::from([("customer".to_string(), "CUST-B".to_string())]);
        let outcome = demo()
            .run_report(&sample("sales").unwrap(), &prompts)
            .unwrap();

        let customers: Vec<_> = outcome
            .rows
            .iter()
            .filter_map(|r| r.as_data()?.get("customer").cloned())
            .collect();
        assert_eq!(customers, vec![Value::from("CUST-B"), Value::from("CUST-B")]);
        assert_eq!(outcome.count, 6);
    }

    #[test]
    fn test_purchase_sample_static_filter() {
        let outcome = demo()
            .run_report(&sample("purchase").unwrap(), &HashMap::new())
            .unwrap();

        let groups: Vec<_> = subtotals(&outcome.rows)
            .into_iter()
            .map(|(key, values)| (key, values.get("grand_total_subtotal").cloned()))
            .collect();
        assert_eq!(
            groups,
            vec![
                ("SUP-2".to_string(), Some(Value::Float(860.4))),
                ("SUP-1".to_string(), Some(Value::Float(5400.0))),
            ]
        );
    }

    #[test]
    fn test_inventory_sample_groups_by_warehouse() {
        let outcome = demo()
            .run_report(&sample("inventory").unwrap(), &HashMap::new())
            .unwrap();

        let headers: Vec<_> = outcome
            .rows
            .iter()
            .filter_map(|r| match r {
                AnnotatedRow::GroupHeader { key, record_count } => {
                    Some((key.get("warehouse")?.to_display(), *record_count))
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            headers,
            vec![("Main Store".to_string(), 2), ("Overflow".to_string(), 2)]
        );
    }

    #[test]
    fn test_execute_config_json() {
        let config = QueryConfig::from_json(
            r#"{
                "query": "SELECT customer, grand_total FROM sales_invoice WHERE docstatus = 1",
                "query_type": "SQL",
                "grouping_fields": ["customer"],
                "subtotal_fields": [{"field": "grand_total", "operation": "MAX"}],
                "filters": [{"field": "grand_total", "operator": ">", "value": "200"}]
            }"#,
        )
        .unwrap();
        let outcome = demo().execute(&config).unwrap();

        let maxima: Vec<_> = subtotals(&outcome.rows)
            .into_iter()
            .map(|(key, values)| (key, values.get("grand_total_subtotal").cloned()))
            .collect();
        assert_eq!(
            maxima,
            vec![
                ("CUST-A".to_string(), Some(Value::Float(1200.0))),
                ("CUST-B".to_string(), Some(Value::Float(975.25))),
            ]
        );
    }

    #[test]
    fn test_view_report() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        db.execute_batch(DEMO_SCHEMA).unwrap();
        db.execute_batch(
            "CREATE VIEW open_orders AS
             SELECT po_number, supplier, grand_total FROM purchase_order WHERE status = 'Submitted'",
        )
        .unwrap();
        let executor = Executor::new(db);

        let mut config = QueryConfig::new("open_orders", QueryKind::View);
        config.filters.push(FilterSpec::new("supplier", FilterOperator::Eq, "SUP-2"));
        config.subtotal_fields.push(SubtotalSpec::new("po_number", AggregateOp::Count));
        config.grouping_fields.push(GroupingSpec::new("supplier"));

        let outcome = executor.execute(&config).unwrap();
        assert_eq!(
            outcome.rows.last(),
            Some(&AnnotatedRow::Subtotal {
                key: Record::from_iter([("supplier", "SUP-2")]),
                values: Record::from_iter([("po_number_subtotal", Value::Int(2))]),
            })
        );
    }

    #[test]
    fn test_no_grouping_returns_rows_unchanged() {
        let config = QueryConfig::new("SELECT item_code FROM item ORDER BY item_code", QueryKind::Sql);
        let outcome = demo().execute(&config).unwrap();

        assert_eq!(outcome.count, 3);
        assert!(outcome.rows.iter().all(|r| !r.is_marker()));
    }

    #[test]
    fn test_errors_propagate() {
        let executor = demo();

        let missing = QueryConfig::new("SELECT * FROM no_such_table", QueryKind::Sql);
        assert!(matches!(
            executor.execute(&missing),
            Err(QueryError::Execution(msg)) if msg.contains("no_such_table")
        ));

        let procedure = QueryConfig::new("CALL stock_report()", QueryKind::StoredProcedure);
        assert!(matches!(
            executor.execute(&procedure),
            Err(QueryError::Execution(_))
        ));

        let forbidden = QueryConfig::new("DROP TABLE item", QueryKind::Sql);
        assert!(matches!(
            executor.execute(&forbidden),
            Err(QueryError::Statement(StatementError::Forbidden("DROP")))
        ));
        assert_eq!(executor.tables().unwrap().len(), 5);

        let mut extremes = QueryConfig::new("SELECT customer_name FROM sales_invoice", QueryKind::Sql);
        extremes.grouping_fields.push(GroupingSpec::new("customer_name"));
        extremes
            .subtotal_fields
            .push(SubtotalSpec::new("customer_name", AggregateOp::Min));
        assert!(matches!(
            executor.execute(&extremes),
            Err(QueryError::Grouping(GroupingError::EmptyAggregation { .. }))
        ));
    }

    fn two_depts() -> Executor<SqliteDatabase> {
        let db = SqliteDatabase::open_in_memory().unwrap();
        db.execute_batch(
            "CREATE TABLE t (dept TEXT, amt REAL);
             INSERT INTO t VALUES ('A', 1.0), ('B', 2.0);",
        )
        .unwrap();
        Executor::new(db)
    }

    #[test]
    fn test_filter_on_unknown_column_fails() {
        let mut config = QueryConfig::new("SELECT dept, amt FROM t", QueryKind::Sql);
        config.filters.push(FilterSpec::new("dpt", FilterOperator::Eq, "dpt"));

        assert!(matches!(
            two_depts().execute(&config),
            Err(QueryError::Execution(msg)) if msg.contains("dpt")
        ));
    }

    #[test]
    fn test_trailing_line_comment() {
        let executor = two_depts();
        let mut config = QueryConfig::new("SELECT dept, amt FROM t -- all depts", QueryKind::Sql);
        assert_eq!(executor.execute(&config).unwrap().count, 2);

        config.filters.push(FilterSpec::new("dept", FilterOperator::Eq, "A"));
        let outcome = executor.execute(&config).unwrap();
        assert_eq!(outcome.count, 1);
        assert_eq!(outcome.rows[0].as_data().unwrap().get("dept"), Some(&Value::from("A")));

        let preview = executor.preview("SELECT dept FROM t -- all depts").unwrap();
        assert_eq!(preview.total_count, 2);
    }

    #[test]
    fn test_disabled_report() {
        let mut report = sample("sales").unwrap();
        report.enabled = false;
        assert!(matches!(
            demo().run_report(&report, &HashMap::new()),
            Err(QueryError::Validation(ValidationError::Disabled(name))) if name == report.report_name
        ));
    }

    #[test]
    fn test_preview() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        db.execute_batch(DEMO_SCHEMA).unwrap();
        let executor = Executor::with_options(
            db,
            ExecutorOptions {
                preview_rows: 2,
                ..ExecutorOptions::default()
            },
        );

        let preview = executor.preview("SELECT * FROM sales_invoice;").unwrap();
        assert_eq!(preview.rows.len(), 2);
        assert_eq!(preview.total_count, 6);

        assert!(matches!(
            executor.preview("UPDATE item SET valuation_rate = 0"),
            Err(QueryError::Statement(StatementError::Forbidden("UPDATE")))
        ));
        assert!(matches!(executor.preview("  "), Err(QueryError::EmptyQuery)));
    }

    #[test]
    fn test_schema_browsing() {
        let executor = demo();
        assert_eq!(
            executor.tables().unwrap(),
            vec!["bin", "item", "purchase_order", "sales_invoice", "supplier"]
        );

        let columns: Vec<_> = executor
            .columns("item")
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(columns, vec!["item_code", "item_name", "valuation_rate"]);
    }

    #[test]
    fn test_render_sql_for_display() {
        let report = sample("purchase").unwrap();
        let prompts = HashMap::from([("supplier".to_string(), "SUP-1".to_string())]);
        let config = report.query_config(&prompts).unwrap();

        assert_snapshot!(
            render_sql(&config, Dialect::Postgres).unwrap(),
            @r#"
            SELECT * FROM (
            SELECT po.po_number, po.supplier, sup.supplier_name, po.posting_date, po.delivery_date, po.grand_total, po.status FROM purchase_order po JOIN supplier sup ON po.supplier = sup.supplier WHERE po.docstatus = 1 ORDER BY po.posting_date DESC
            ) AS "_report" WHERE "supplier" = 'SUP-1' AND "status" = 'Submitted'
            "#
        );

        let view = QueryConfig::new("reports.open_orders", QueryKind::View);
        assert_snapshot!(
            render_sql(&view, Dialect::MySql).unwrap(),
            @"SELECT * FROM `reports`.`open_orders`"
        );
    }

    #[test]
    fn test_definition_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.json");
        sample("sales").unwrap().to_file(&path).unwrap();

        let report = ReportDefinition::from_file(&path).unwrap();
        let outcome = demo().run_report(&report, &HashMap::new()).unwrap();
        assert_eq!(outcome.count, 8);
    }
}
