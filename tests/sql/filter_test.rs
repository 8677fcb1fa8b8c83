#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use tally::executor::{Database, SqliteDatabase};
    use tally::model::samples::DEMO_SCHEMA;
    use tally::model::{FilterOperator, FilterSpec, Value};
    use tally::sql::filter::inline;
    use tally::sql::{
        build_predicates, parameterize, render_fragment, splice_filters, Dialect, FilterError,
    };

    fn filter(field: &str, operator: &str, value: &str) -> FilterSpec {
        FilterSpec::new(field, operator.parse().unwrap(), value)
    }

    fn demo() -> SqliteDatabase {
        let db = SqliteDatabase::open_in_memory().unwrap();
        db.execute_batch(DEMO_SCHEMA).unwrap();
        db
    }

    // =========================================================================
    // Legacy textual splice
    // =========================================================================

    #[test]
    fn test_splice_appends_where() {
        assert_eq!(
            splice_filters("SELECT * FROM t", &[filter("x", "=", "5")]),
            "SELECT * FROM t WHERE x = '5'"
        );
    }

    #[test]
    fn test_splice_prepends_after_existing_where() {
        assert_eq!(
            splice_filters("SELECT * FROM t WHERE y=1", &[filter("x", "=", "5")]),
            "SELECT * FROM t WHERE x = '5' AND y=1"
        );
    }

    #[test]
    fn test_splice_joins_with_and() {
        let filters = [
            filter("a", "!=", "z"),
            filter("b", ">", "2"),
            filter("c", "LIKE", "ac"),
        ];
        assert_eq!(
            splice_filters("SELECT * FROM t", &filters),
            "SELECT * FROM t WHERE a != 'z' AND b > 2 AND c LIKE '%ac%'"
        );
    }

    #[test]
    fn test_in_fragment() {
        assert_eq!(
            render_fragment(&filter("field", "IN", "1,2,3")),
            "field IN ('1', '2', '3')"
        );
    }

    #[test]
    fn test_unknown_operator() {
        assert_eq!(
            "BETWEEN".parse::<FilterOperator>(),
            Err(FilterError::InvalidFilterOperator("BETWEEN".to_string()))
        );
    }

    // =========================================================================
    // Parameterized assembly
    // =========================================================================

    #[test]
    fn test_parameterized_sql_per_dialect() {
        let predicates = build_predicates(&[
            filter("si.customer", "=", "CUST-A"),
            filter("grand_total", ">", "500"),
            filter("status", "IN", "Submitted, Completed"),
        ])
        .unwrap();
        let base = "SELECT * FROM sales_invoice si WHERE si.docstatus = 1";

        assert_snapshot!(
            parameterize(base, &predicates, Dialect::Sqlite).sql,
            @"
        SELECT * FROM (
        SELECT * FROM sales_invoice si WHERE si.docstatus = 1
        ) AS `_report` WHERE `customer` = ? AND `grand_total` > ? AND `status` IN (?, ?)
        "
        );
        assert_snapshot!(
            parameterize(base, &predicates, Dialect::Postgres).sql,
            @r#"
        SELECT * FROM (
        SELECT * FROM sales_invoice si WHERE si.docstatus = 1
        ) AS "_report" WHERE "customer" = $1 AND "grand_total" > $2 AND "status" IN ($3, $4)
        "#
        );
        assert_snapshot!(
            parameterize(base, &predicates, Dialect::MySql).sql,
            @"
        SELECT * FROM (
        SELECT * FROM sales_invoice si WHERE si.docstatus = 1
        ) AS `_report` WHERE `customer` = ? AND `grand_total` > ? AND `status` IN (?, ?)
        "
        );
    }

    #[test]
    fn test_parameters_are_typed_and_ordered() {
        let predicates = build_predicates(&[
            filter("grand_total", ">", "500"),
            filter("status", "IN", "Submitted, Completed"),
            filter("supplier", "LIKE", "SUP"),
        ])
        .unwrap();
        let query = parameterize("SELECT * FROM purchase_order", &predicates, Dialect::Sqlite);

        assert_eq!(
            query.params,
            vec![
                Value::Int(500),
                Value::from("Submitted"),
                Value::from("Completed"),
                Value::from("%SUP%"),
            ]
        );
    }

    #[test]
    fn test_inline_for_display() {
        let predicates = build_predicates(&[filter("customer", "=", "Bob's")]).unwrap();
        assert_snapshot!(
            inline("SELECT * FROM sales_invoice;", &predicates, Dialect::TSql),
            @"
        SELECT * FROM (
        SELECT * FROM sales_invoice
        ) AS [_report] WHERE [customer] = 'Bob''s'
        "
        );
    }

    #[test]
    fn test_invalid_field_is_rejected() {
        assert_eq!(
            build_predicates(&[filter("x = 1 OR 1", "=", "1")]),
            Err(FilterError::InvalidFieldName("x = 1 OR 1".to_string()))
        );
    }

    // =========================================================================
    // Against SQLite
    // =========================================================================

    #[test]
    fn test_parameterized_query_runs() {
        let db = demo();
        let predicates = build_predicates(&[
            filter("status", "IN", "Submitted"),
            filter("grand_total", ">", "500"),
        ])
        .unwrap();
        let query = parameterize(
            "SELECT po_number, status, grand_total FROM purchase_order WHERE docstatus = 1",
            &predicates,
            db.dialect(),
        );

        let rows = db.fetch(&query.sql, &query.params).unwrap();
        let numbers: Vec<_> = rows
            .iter()
            .filter_map(|r| r.get("po_number").cloned())
            .collect();
        assert_eq!(numbers, vec![Value::from("PO-0001"), Value::from("PO-0003")]);
    }

    #[test]
    fn test_injection_attempt_matches_nothing() {
        let db = demo();
        let predicates = build_predicates(&[filter("customer", "=", "x' OR '1'='1")]).unwrap();
        let query = parameterize("SELECT * FROM sales_invoice", &predicates, db.dialect());

        assert!(db.fetch(&query.sql, &query.params).unwrap().is_empty());
        assert_eq!(db.fetch("SELECT * FROM sales_invoice", &[]).unwrap().len(), 6);
    }
}
