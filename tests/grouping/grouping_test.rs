#[cfg(test)]
mod tests {
    use tally::grouping::{
        EmptyExtremes, GroupOrder, Grouper, GroupingError, GroupingOptions, MissingFieldPolicy,
        RowKind,
    };
    use tally::model::{AggregateOp, GroupingSpec, SubtotalSpec};
    use tally::{apply_grouping, AnnotatedRow, Record, Value};

    fn record(dept: &str, amt: &str) -> Record {
        Record::from_iter([("dept", dept), ("amt", amt)])
    }

    fn sum(field: &str) -> SubtotalSpec {
        SubtotalSpec::new(field, AggregateOp::Sum)
    }

    /// Data rows grouped under the key of the header before them.
    fn members_by_group(rows: &[AnnotatedRow]) -> Vec<(Record, Vec<Record>)> {
        let mut groups: Vec<(Record, Vec<Record>)> = Vec::new();
        for row in rows {
            match row {
                AnnotatedRow::GroupHeader { key, .. } => groups.push((key.clone(), Vec::new())),
                AnnotatedRow::Data(record) => {
                    groups.last_mut().unwrap().1.push(record.clone());
                }
                AnnotatedRow::Subtotal { .. } => {}
            }
        }
        groups
    }

    #[test]
    fn test_dept_example() {
        let records = vec![record("A", "10"), record("A", "x"), record("B", "5")];
        let rows = apply_grouping(records.clone(), &["dept"], &[sum("amt")]).unwrap();

        let dept = |d: &str| Record::from_iter([("dept", d)]);
        assert_eq!(
            rows,
            vec![
                AnnotatedRow::GroupHeader {
                    key: dept("A"),
                    record_count: 2
                },
                AnnotatedRow::Data(records[0].clone()),
                AnnotatedRow::Data(records[1].clone()),
                AnnotatedRow::Subtotal {
                    key: dept("A"),
                    values: Record::from_iter([("amt_subtotal", 10.0)]),
                },
                AnnotatedRow::GroupHeader {
                    key: dept("B"),
                    record_count: 1
                },
                AnnotatedRow::Data(records[2].clone()),
                AnnotatedRow::Subtotal {
                    key: dept("B"),
                    values: Record::from_iter([("amt_subtotal", 5.0)]),
                },
            ]
        );
    }

    #[test]
    fn test_identity_without_group_fields() {
        let records = vec![record("B", "1"), record("A", "2"), record("B", "3")];
        let rows = apply_grouping::<&str>(records.clone(), &[], &[sum("amt")]).unwrap();

        assert!(rows.iter().all(|r| r.kind() == RowKind::Data));
        let back: Vec<Record> = rows.iter().filter_map(|r| r.as_data().cloned()).collect();
        assert_eq!(back, records);
    }

    #[test]
    fn test_no_rows_lost_or_duplicated() {
        let records: Vec<Record> = (0..30)
            .map(|i| {
                Record::from_iter([
                    ("id", Value::Int(i)),
                    ("region", Value::from(["N", "S", "E"][i as usize % 3])),
                    ("tier", Value::Int(i % 2)),
                ])
            })
            .collect();

        let rows = apply_grouping(records.clone(), &["region", "tier"], &[sum("id")]).unwrap();
        let groups = members_by_group(&rows);
        assert_eq!(groups.len(), 6);

        let mut seen: Vec<i64> = Vec::new();
        for (key, members) in &groups {
            for member in members {
                assert_eq!(member.get("region"), key.get("region"));
                assert_eq!(member.get("tier"), key.get("tier"));
                if let Some(Value::Int(id)) = member.get("id") {
                    seen.push(*id);
                }
            }
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..30).collect::<Vec<_>>());
    }

    #[test]
    fn test_member_order_is_preserved() {
        let records = vec![record("A", "1"), record("B", "2"), record("A", "3"), record("A", "4")];
        let rows = apply_grouping(records, &["dept"], &[]).unwrap();

        let groups = members_by_group(&rows);
        let amounts: Vec<_> = groups[0]
            .1
            .iter()
            .map(|r| r.get("amt").unwrap().to_display())
            .collect();
        assert_eq!(amounts, vec!["1", "3", "4"]);
        assert!(rows.iter().all(|r| r.kind() != RowKind::Subtotal));
    }

    #[test]
    fn test_all_operations() {
        let records = vec![
            Record::from_iter([("g", Value::from("x")), ("v", Value::Int(2))]),
            Record::from_iter([("g", Value::from("x")), ("v", Value::Null)]),
            Record::from_iter([("g", Value::from("x")), ("v", Value::Float(7.0))]),
        ];
        let specs: Vec<SubtotalSpec> = [
            AggregateOp::Sum,
            AggregateOp::Avg,
            AggregateOp::Count,
            AggregateOp::Max,
            AggregateOp::Min,
        ]
        .into_iter()
        .map(|op| SubtotalSpec::new("v", op))
        .collect();

        // All five write `v_subtotal`, so run them one at a time
        let expected = [
            Value::Float(9.0),
            Value::Float(4.5),
            Value::Int(3),
            Value::Float(7.0),
            Value::Float(2.0),
        ];
        for (spec, expected) in specs.iter().zip(expected) {
            let rows = apply_grouping(records.clone(), &["g"], std::slice::from_ref(spec)).unwrap();
            match rows.last() {
                Some(AnnotatedRow::Subtotal { values, .. }) => {
                    assert_eq!(values.get("v_subtotal"), Some(&expected), "{}", spec.operation);
                }
                other => panic!("expected subtotal, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_count_includes_nulls_and_avg_of_nothing_is_zero() {
        let records = vec![
            Record::from_iter([("g", Value::from("x")), ("v", Value::Null)]),
            Record::from_iter([("g", Value::from("x"))]),
        ];
        let rows = apply_grouping(
            records,
            &["g"],
            &[
                SubtotalSpec::new("v", AggregateOp::Count),
                SubtotalSpec::new("w", AggregateOp::Avg),
            ],
        )
        .unwrap();

        assert_eq!(
            rows.last(),
            Some(&AnnotatedRow::Subtotal {
                key: Record::from_iter([("g", "x")]),
                values: Record::from_iter([
                    ("v_subtotal", Value::Int(2)),
                    ("w_subtotal", Value::Float(0.0)),
                ]),
            })
        );
    }

    #[test]
    fn test_extremes_over_non_numeric_group() {
        let records = vec![record("A", "n/a")];
        let spec = [SubtotalSpec::new("amt", AggregateOp::Max)];

        assert_eq!(
            apply_grouping(records.clone(), &["dept"], &spec),
            Err(GroupingError::EmptyAggregation {
                field: "amt".to_string(),
                op: AggregateOp::Max,
            })
        );

        let lenient = Grouper::new(GroupingOptions {
            empty_extremes: EmptyExtremes::Zero,
            ..GroupingOptions::default()
        });
        let rows = lenient
            .group(records, &[GroupingSpec::new("dept")], &spec)
            .unwrap();
        assert_eq!(
            rows.last().and_then(|r| match r {
                AnnotatedRow::Subtotal { values, .. } => values.get("amt_subtotal").cloned(),
                _ => None,
            }),
            Some(Value::Float(0.0))
        );
    }

    #[test]
    fn test_missing_field_policies() {
        let records = vec![
            Record::from_iter([("amt", "1")]),
            record("", "2"),
            Record::from_iter([("dept", Value::Null), ("amt", Value::from("3"))]),
        ];

        let rows = apply_grouping(records.clone(), &["dept"], &[]).unwrap();
        let counts: Vec<usize> = rows
            .iter()
            .filter_map(|r| match r {
                AnnotatedRow::GroupHeader { record_count, .. } => Some(*record_count),
                _ => None,
            })
            .collect();
        // Missing and "" share a bucket; null is its own key
        assert_eq!(counts, vec![2, 1]);

        let strict = Grouper::new(GroupingOptions {
            missing_field: MissingFieldPolicy::Reject,
            ..GroupingOptions::default()
        });
        assert_eq!(
            strict.group(records, &[GroupingSpec::new("dept")], &[]),
            Err(GroupingError::MalformedRecord {
                row: 0,
                field: "dept".to_string(),
            })
        );
    }

    #[test]
    fn test_sorted_group_order() {
        let records = vec![record("B", "1"), record("C", "2"), record("A", "3")];
        let sorted = Grouper::new(GroupingOptions {
            group_order: GroupOrder::Sorted,
            ..GroupingOptions::default()
        });

        let keys = |rows: Vec<AnnotatedRow>| -> Vec<String> {
            rows.iter()
                .filter(|r| r.kind() == RowKind::GroupHeader)
                .filter_map(|r| r.group_key()?.get("dept").map(Value::to_display))
                .collect()
        };

        let ascending = sorted
            .group(records.clone(), &[GroupingSpec::new("dept")], &[])
            .unwrap();
        assert_eq!(keys(ascending), vec!["A", "B", "C"]);

        let descending = sorted
            .group(records, &[GroupingSpec::new("dept").descending()], &[])
            .unwrap();
        assert_eq!(keys(descending), vec!["C", "B", "A"]);
    }

    #[test]
    fn test_numeric_keys_group_across_types() {
        let records = vec![
            Record::from_iter([("n", Value::Int(1)), ("v", Value::Int(1))]),
            Record::from_iter([("n", Value::Float(1.0)), ("v", Value::Int(2))]),
            Record::from_iter([("n", Value::from("1")), ("v", Value::Int(3))]),
        ];
        let rows = apply_grouping(records, &["n"], &[sum("v")]).unwrap();
        let groups = members_by_group(&rows);

        // 1 and 1.0 are the same key; the text "1" is not
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].1.len(), 2);
    }

    #[test]
    fn test_wire_shape() {
        let rows = apply_grouping(vec![record("A", "10")], &["dept"], &[sum("amt")]).unwrap();
        let json = serde_json::to_string(&rows).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"[{"_type":"GROUP_HEADER","_group_key":{"dept":"A"},"_record_count":1},"#,
                r#"{"dept":"A","amt":"10"},"#,
                r#"{"_type":"SUBTOTAL","_group_key":{"dept":"A"},"amt_subtotal":10.0}]"#
            )
        );
    }
}
