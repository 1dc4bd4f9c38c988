use chrono::NaiveDate;
use ledger_merge::ErrorKind;
use ledger_merge::ToolError;
use ledger_merge::merge::normalize::{deduplicate, fill_missing};
use ledger_merge::merge::{AlignedRow, AlignedTable, ResultRow, ResultTable, merge_sources};
use ledger_merge::model::{CellValue, ColumnKind, JoinKey, Origin, SheetSpec, SourceTable};

fn text(value: &str) -> CellValue {
    CellValue::Text(value.to_string())
}

fn num(value: f64) -> CellValue {
    CellValue::Number(value)
}

fn table(origin: Origin, columns: &[&str], rows: Vec<Vec<CellValue>>) -> SourceTable {
    let spec = SheetSpec::for_origin(origin);
    SourceTable::new(
        origin,
        spec.sheet_name,
        columns.iter().map(|name| name.to_string()).collect(),
        rows,
    )
}

fn custom(columns: &[&str], rows: Vec<Vec<CellValue>>) -> SourceTable {
    table(Origin::Custom, columns, rows)
}

fn items(columns: &[&str], rows: Vec<Vec<CellValue>>) -> SourceTable {
    table(Origin::Items, columns, rows)
}

fn parsed_date(value: &str) -> Option<NaiveDate> {
    if value.is_empty() {
        None
    } else {
        Some(NaiveDate::parse_from_str(value, "%d/%m/%Y").expect("DD/MM/YYYY date"))
    }
}

fn assert_sorted(result: &ResultTable) {
    for pair in result.rows.windows(2) {
        let lhs = (parsed_date(&pair[0].date), &pair[0].reference);
        let rhs = (parsed_date(&pair[1].date), &pair[1].reference);
        assert!(lhs <= rhs, "rows out of order: {lhs:?} then {rhs:?}");
    }
}

#[test]
fn repeated_keys_cross_match() {
    let custom = custom(
        &["Date", "Reference No", "amt"],
        vec![
            vec![text("01/02/2023"), text("A1"), num(100.0)],
            vec![text("01/02/2023"), text("A1"), num(50.0)],
        ],
    );
    let items = items(
        &["Date", "Invoice No./Txn No.", "qty"],
        vec![vec![text("01/02/2023"), text("A1"), num(2.0)]],
    );

    let result = merge_sources(&custom, &items).expect("merge succeeds");

    assert_eq!(result.columns, vec!["date", "Ref_No", "Custom_amt", "Items_qty"]);
    assert_eq!(result.len(), 2);
    for row in &result.rows {
        assert_eq!(row.date, "01/02/2023");
        assert_eq!(row.reference, "A1");
    }
    assert_eq!(result.cell(0, "Custom_amt"), Some(&num(100.0)));
    assert_eq!(result.cell(1, "Custom_amt"), Some(&num(50.0)));
    assert_eq!(result.cell(0, "Items_qty"), Some(&num(2.0)));
    assert_eq!(result.cell(1, "Items_qty"), Some(&num(2.0)));
}

#[test]
fn duplicates_on_both_sides_produce_every_pairing() {
    let custom = custom(
        &["Date", "Reference No", "amt"],
        vec![
            vec![text("05/03/2023"), text("INV-1"), num(10.0)],
            vec![text("05/03/2023"), text("INV-1"), num(20.0)],
        ],
    );
    let items = items(
        &["Date", "Invoice No./Txn No.", "sku"],
        vec![
            vec![text("05/03/2023"), text("INV-1"), text("bolt")],
            vec![text("05/03/2023"), text("INV-1"), text("nut")],
        ],
    );

    let result = merge_sources(&custom, &items).expect("merge succeeds");

    assert_eq!(result.len(), 4);
    let mut pairs: Vec<(String, String)> = (0..result.len())
        .map(|row| {
            (
                result.cell(row, "Custom_amt").expect("amt").render(),
                result.cell(row, "Items_sku").expect("sku").render(),
            )
        })
        .collect();
    pairs.sort();
    assert_eq!(
        pairs,
        vec![
            ("10".to_string(), "bolt".to_string()),
            ("10".to_string(), "nut".to_string()),
            ("20".to_string(), "bolt".to_string()),
            ("20".to_string(), "nut".to_string()),
        ]
    );
}

#[test]
fn unmatched_rows_receive_type_appropriate_fill() {
    let custom = custom(
        &["Date", "Reference No", "amt"],
        vec![vec![text("03/02/2023"), text("B2"), num(10.0)]],
    );
    let items = items(
        &["Date", "Invoice No./Txn No.", "qty", "desc"],
        vec![vec![text("01/02/2023"), text("A1"), num(2.0), text("widget")]],
    );

    let result = merge_sources(&custom, &items).expect("merge succeeds");

    assert_eq!(result.len(), 2);
    assert_eq!(result.rows[0].reference, "A1");
    assert_eq!(result.cell(0, "Custom_amt"), Some(&num(0.0)));
    assert_eq!(result.cell(0, "Items_desc"), Some(&text("widget")));

    assert_eq!(result.rows[1].reference, "B2");
    assert_eq!(result.cell(1, "Custom_amt"), Some(&num(10.0)));
    assert_eq!(result.cell(1, "Items_qty"), Some(&num(0.0)));
    assert_eq!(result.cell(1, "Items_desc"), Some(&text("")));

    assert!(
        result
            .rows
            .iter()
            .all(|row| row.cells.iter().all(|cell| !cell.is_empty()))
    );
}

#[test]
fn unparsable_dates_become_empty_and_sort_first() {
    let custom = custom(
        &["Date", "Reference No", "amt"],
        vec![
            vec![text("02/02/2023"), text("A1"), num(1.0)],
            vec![text("N/A"), text("C3"), num(5.0)],
        ],
    );
    let items = items(
        &["Date", "Invoice No./Txn No.", "qty"],
        vec![vec![text("02/02/2023"), text("A1"), num(3.0)]],
    );

    let result = merge_sources(&custom, &items).expect("unparsable dates are not fatal");

    assert_eq!(result.len(), 2);
    assert_eq!(result.rows[0].date, "");
    assert_eq!(result.rows[0].reference, "C3");
    assert_eq!(result.cell(0, "Custom_amt"), Some(&num(5.0)));
    assert_eq!(result.rows[1].date, "02/02/2023");
    assert_sorted(&result);
}

#[test]
fn output_is_sorted_by_date_then_reference() {
    let custom = custom(
        &["Date", "Reference No", "amt"],
        vec![
            vec![text("15/01/2023"), text("Z9"), num(1.0)],
            vec![text("02/12/2022"), text("B1"), num(2.0)],
            vec![text("15/01/2023"), text("A5"), num(3.0)],
            vec![CellValue::Empty, text("Q1"), num(4.0)],
        ],
    );
    let items = items(
        &["Date", "Invoice No./Txn No.", "qty"],
        vec![
            vec![text("2023-01-15"), text("A5"), num(7.0)],
            vec![text("01/01/2021"), text("OLD"), num(8.0)],
        ],
    );

    let result = merge_sources(&custom, &items).expect("merge succeeds");

    assert_sorted(&result);
    let order: Vec<&str> = result.rows.iter().map(|row| row.reference.as_str()).collect();
    assert_eq!(order, vec!["Q1", "OLD", "B1", "A5", "Z9"]);
    for row in &result.rows {
        assert!(row.date.is_empty() || parsed_date(&row.date).is_some());
    }
}

#[test]
fn exact_duplicate_rows_are_removed_but_differing_repeats_kept() {
    let custom = custom(
        &["Date", "Reference No", "amt", "line"],
        vec![
            vec![text("01/03/2023"), text("R1"), num(5.0), text("a")],
            vec![text("01/03/2023"), text("R1"), num(5.0), text("a")],
            vec![text("01/03/2023"), text("R1"), num(5.0), text("b")],
        ],
    );
    let items = items(&["Date", "Invoice No./Txn No."], vec![vec![
        text("09/09/2023"),
        text("R9"),
    ]]);

    let result = merge_sources(&custom, &items).expect("merge succeeds");

    let lines: Vec<String> = (0..result.len())
        .filter(|row| result.rows[*row].reference == "R1")
        .map(|row| result.cell(row, "Custom_line").expect("line").render())
        .collect();
    assert_eq!(lines, vec!["a", "b"]);
    assert_eq!(deduplicate(result.rows.clone()), result.rows);
}

#[test]
fn deduplication_is_idempotent() {
    let custom = custom(
        &["Date", "Reference No", "amt"],
        vec![
            vec![text("01/02/2023"), text("A1"), num(1.0)],
            vec![text("01/02/2023"), text("A1"), num(1.0)],
            vec![text("01/02/2023"), text("A2"), num(1.0)],
        ],
    );
    let items = items(
        &["Date", "Invoice No./Txn No.", "qty"],
        vec![vec![text("01/02/2023"), text("A1"), num(1.0)]],
    );

    let result = merge_sources(&custom, &items).expect("merge succeeds");
    let once = deduplicate(result.rows.clone());
    let twice = deduplicate(once.clone());

    assert_eq!(once, twice);
    assert_eq!(once, result.rows);
}

#[test]
fn column_names_are_trimmed_and_matched_case_insensitively() {
    let custom = custom(
        &["  Amount ", " date", "REFERENCE NO  ", "Memo"],
        vec![vec![num(12.5), text("07/07/2023"), text("K1"), text("note")]],
    );
    let items = items(
        &["Date ", "Invoice No./Txn No.", " Qty"],
        vec![vec![text("07/07/2023"), text("K1"), num(4.0)]],
    );

    let result = merge_sources(&custom, &items).expect("merge succeeds");

    assert_eq!(
        result.columns,
        vec!["date", "Ref_No", "Custom_Amount", "Custom_Memo", "Items_Qty"]
    );
    assert_eq!(result.len(), 1);
    assert_eq!(result.cell(0, "Custom_Amount"), Some(&num(12.5)));
    assert_eq!(result.cell(0, "Items_Qty"), Some(&num(4.0)));
}

#[test]
fn numeric_references_match_textual_ones() {
    let custom = custom(
        &["Date", "Reference No", "amt"],
        vec![vec![text("01/02/2023"), num(1001.0), num(9.0)]],
    );
    let items = items(
        &["Date", "Invoice No./Txn No.", "qty"],
        vec![vec![text("01/02/2023"), text("1001"), num(1.0)]],
    );

    let result = merge_sources(&custom, &items).expect("merge succeeds");

    assert_eq!(result.len(), 1);
    assert_eq!(result.rows[0].reference, "1001");
    assert_eq!(result.cell(0, "Items_qty"), Some(&num(1.0)));
}

#[test]
fn missing_key_columns_are_schema_errors() {
    let custom = custom(
        &["Date", "Reference No", "amt"],
        vec![vec![text("01/02/2023"), text("A1"), num(1.0)]],
    );
    let items = items(&["When", "qty"], vec![vec![text("01/02/2023"), num(1.0)]]);

    let error = merge_sources(&custom, &items).expect_err("schema error");

    assert_eq!(error.kind(), ErrorKind::SchemaError);
    match error {
        ToolError::MissingColumns { sheet, columns } => {
            assert_eq!(sheet, "Item Details");
            assert_eq!(columns, vec!["Date", "Invoice No./Txn No."]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn empty_sheets_are_reported_distinctly() {
    let custom = custom(&["Date", "Reference No", "amt"], Vec::new());
    let items = items(
        &["Date", "Invoice No./Txn No.", "qty"],
        vec![vec![text("01/02/2023"), text("A1"), num(1.0)]],
    );

    let error = merge_sources(&custom, &items).expect_err("empty sheet");

    assert_eq!(error.kind(), ErrorKind::EmptySheetError);
    assert!(error.to_string().contains("Custom Report"));
}

#[test]
fn two_digit_years_align_with_four_digit_years() {
    let custom = custom(
        &["Date", "Reference No", "amt"],
        vec![vec![text("01/02/23"), text("A1"), num(1.0)]],
    );
    let items = items(
        &["Date", "Invoice No./Txn No.", "qty"],
        vec![vec![text("01/02/2023"), text("A1"), num(2.0)]],
    );

    let result = merge_sources(&custom, &items).expect("merge succeeds");

    assert_eq!(result.len(), 1);
    assert_eq!(result.rows[0].date, "01/02/2023");
    assert_eq!(result.cell(0, "Custom_amt"), Some(&num(1.0)));
    assert_eq!(result.cell(0, "Items_qty"), Some(&num(2.0)));
}

#[test]
fn rows_differing_only_in_sign_of_zero_are_duplicates() {
    let row = |value: f64| ResultRow {
        date: "01/02/2023".to_string(),
        reference: "A1".to_string(),
        cells: vec![num(value)],
    };

    let rows = deduplicate(vec![row(0.0), row(-0.0), row(1.0)]);

    assert_eq!(rows.len(), 2);
    assert_eq!(num(0.0), num(-0.0));
}

#[test]
fn fill_kind_is_decided_on_the_merged_column() {
    let key = JoinKey::new(None, "A1");
    let mut table = AlignedTable {
        columns: vec![
            "Custom_amt".to_string(),
            "Items_desc".to_string(),
            "Items_blank".to_string(),
        ],
        rows: vec![
            AlignedRow {
                key: key.clone(),
                cells: vec![num(3.0), text("bolt"), CellValue::Empty],
            },
            AlignedRow {
                key,
                cells: vec![CellValue::Empty, CellValue::Empty, CellValue::Empty],
            },
        ],
    };

    let kinds = fill_missing(&mut table);

    assert_eq!(kinds, vec![ColumnKind::Numeric, ColumnKind::Text, ColumnKind::Numeric]);
    assert_eq!(table.rows[1].cells, vec![num(0.0), text(""), num(0.0)]);
}
