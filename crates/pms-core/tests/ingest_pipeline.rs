//! CSV 파이프라인 통합 테스트
//!
//! 파싱 -> 정규화 -> 리포트 집계가 스토리지 없이 맞물려 도는지 검증합니다.

use proptest::prelude::*;
use rust_decimal_macros::dec;

use pms_core::{
    build_report, normalize_row, parse_decimal, parse_master_sheet, upload_message, DateRange,
    FailedRow, NormalizedRecord, SheetError, FAILED_ROW_SAMPLE, REQUIRED_COLUMNS,
};

const HEADER: &str = "Date,Portfolio Value,Cash In/Out,NAV,Prev NAV,PnL,Daily P/L %,\
Exposure Value,Prev Portfolio Value,Prev Exposure Value,Prev Pnl,Drawdown %,System Tag";

fn row(date: &str, tag: &str) -> String {
    format!(
        "{},1000000,0,100.5,100.0,5000,0.5%,900000,995000,890000,4500,-2.1%,{}",
        date, tag
    )
}

/// 서비스 계층이 수행하는 정규화 루프와 같은 모양의 테스트용 축약판.
fn run_pipeline(
    csv: &str,
    range: Option<&DateRange>,
) -> Result<(Vec<NormalizedRecord>, Vec<FailedRow>, Vec<String>, usize), SheetError> {
    let sheet = parse_master_sheet(csv.as_bytes())?;
    let mut records = Vec::new();
    let mut failed = Vec::new();
    for parsed in &sheet.rows {
        match normalize_row(parsed, range) {
            Ok(record) => records.push(record),
            Err(err) => failed.push(FailedRow::from_row(parsed, &sheet.headers, err.to_string())),
        }
    }
    let total = sheet.rows.len();
    Ok((records, failed, sheet.headers, total))
}

#[test]
fn test_clean_sheet_normalizes_every_row() {
    let csv = format!(
        "{}\n{}\n{}\n{}\n",
        HEADER,
        row("2024-01-02", "SPSAR"),
        row("2024-01-03", "SPSAR"),
        row("2024-01-04", "momentum")
    );

    let (records, failed, headers, total) = run_pipeline(&csv, None).unwrap();

    assert_eq!(total, 3);
    assert_eq!(records.len(), 3);
    assert!(failed.is_empty());
    assert_eq!(headers.len(), REQUIRED_COLUMNS.len());
    assert_eq!(records[0].portfolio_value, Some(dec!(1000000)));
    assert_eq!(records[2].system_tag, "momentum");
}

#[test]
fn test_sample_scenario_empty_date_on_second_row() {
    // 행 1은 완전 유효, 행 2는 Date가 비어 있음
    let csv = format!("{}\n{}\n{}\n", HEADER, row("2024-01-02", "SPSAR"), row("", "SPSAR"));

    let (records, failed, headers, total) = run_pipeline(&csv, None).unwrap();

    assert_eq!(total, 2);
    assert_eq!(records.len(), 1);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].row_index, 2);
    assert_eq!(failed[0].error, "Missing required field: Date");

    let report = build_report(
        upload_message(records.len(), failed.len()),
        total,
        records.len(),
        headers,
        &failed,
        FAILED_ROW_SAMPLE,
    );
    assert_eq!(report.message, "1 rows inserted, 1 failed");
    assert_eq!(report.total_rows, Some(2));
    assert_eq!(report.inserted_rows, Some(1));
    assert_eq!(report.first_error.unwrap().row_index, 2);
}

#[test]
fn test_date_range_filter_keeps_only_rows_inside_window() {
    let csv = format!(
        "{}\n{}\n{}\n{}\n",
        HEADER,
        row("2023-12-31", "SPSAR"),
        row("2024-01-15", "SPSAR"),
        row("2024-02-01", "SPSAR")
    );
    let range = DateRange::from_params(Some("2024-01-01"), Some("2024-01-31"))
        .unwrap()
        .unwrap();

    let (records, failed, _, total) = run_pipeline(&csv, Some(&range)).unwrap();

    assert_eq!(total, 3);
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].date,
        chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    );
    assert_eq!(failed.len(), 2);
    assert_eq!(failed[0].row_index, 1);
    assert_eq!(
        failed[0].error,
        "Date 2023-12-31 is outside the specified range: 2024-01-01 to 2024-01-31"
    );
    assert_eq!(failed[1].row_index, 3);
}

#[test]
fn test_missing_columns_rejects_before_row_work() {
    let csv = "Date,NAV\n2024-01-02,100.5\n";
    match run_pipeline(csv, None) {
        Err(SheetError::MissingColumns { missing, .. }) => {
            assert!(missing.contains(&"System Tag".to_string()));
        }
        other => panic!("expected MissingColumns, got {:?}", other),
    }
}

#[test]
fn test_bom_and_semicolon_sheet_round_trip() {
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    let header = HEADER.replace(',', ";");
    let body = row("2024-01-02", "SPSAR").replace(',', ";");
    // 숫자 안의 쉼표가 없는 행이므로 단순 치환으로 충분
    bytes.extend_from_slice(format!("{}\n{}\n", header, body).as_bytes());

    let sheet = parse_master_sheet(&bytes).unwrap();
    assert_eq!(sheet.headers[0], "Date");
    let record = normalize_row(&sheet.rows[0], None).unwrap();
    assert_eq!(record.system_tag, "SPSAR");
}

#[test]
fn test_failed_row_sample_capped_at_ten_with_true_totals() {
    let mut csv = format!("{}\n", HEADER);
    for _ in 0..15 {
        csv.push_str(&row("not-a-date", "SPSAR"));
        csv.push('\n');
    }

    let (records, failed, headers, total) = run_pipeline(&csv, None).unwrap();
    assert!(records.is_empty());
    assert_eq!(failed.len(), 15);

    let report = build_report(
        upload_message(0, failed.len()),
        total,
        0,
        headers,
        &failed,
        FAILED_ROW_SAMPLE,
    );
    assert_eq!(report.total_rows, Some(15));
    assert_eq!(report.failed_rows.unwrap().len(), 10);
    assert_eq!(
        report.first_error.unwrap().error,
        "Invalid date format: not-a-date"
    );
}

proptest! {
    /// 관대한 숫자 파서는 어떤 입력에도 패닉 없이 결정적으로 동작해야 한다
    #[test]
    fn prop_parse_decimal_total_and_deterministic(s in ".{0,64}") {
        let first = parse_decimal(&s);
        let second = parse_decimal(&s);
        prop_assert_eq!(first, second);
    }

    /// 정규화는 호출 간 상태를 공유하지 않는다
    #[test]
    fn prop_normalize_is_stateless(date in "[0-9]{4}-[0-9]{2}-[0-9]{2}", tag in "[A-Za-z]{1,8}") {
        let csv = format!("{}\n{}\n", HEADER, row(&date, &tag));
        if let Ok(sheet) = parse_master_sheet(csv.as_bytes()) {
            let once = normalize_row(&sheet.rows[0], None);
            let twice = normalize_row(&sheet.rows[0], None);
            prop_assert_eq!(once, twice);
        }
    }
}
