//! 행 정규화: 원시 CSV 값을 타입이 있는 레코드로 변환합니다.
//!
//! 필드별로 파싱 정책이 다릅니다:
//! - **Date**: 엄격한 `YYYY-MM-DD`. 실패는 행 단위 치명 에러.
//! - **System Tag**: 키 조회는 관대하게(대소문자/공백/BOM), 값은 비어 있으면 행 단위 치명 에러.
//! - **숫자 필드 11개**: 관대한 파싱. 빈 값이나 해석 불가능한 값은 에러가 아니라 NULL.
//!
//! 행 에러는 해당 행만 건너뛰게 하며 배치나 요청을 중단시키지 않습니다.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::error::{SheetError, SheetResult};
use crate::parse::ParsedRow;

/// 행 Date 필드와 날짜 범위 파라미터의 형식.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 행 하나를 건너뛰게 하는 에러. Display 문자열이 FailedRow에 그대로 실립니다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("Missing required field: Date")]
    MissingDate,

    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Missing required field: System Tag")]
    MissingSystemTag,

    #[error("Date {date} is outside the specified range: {start} to {end}")]
    OutOfRange {
        date: String,
        start: String,
        end: String,
    },
}

/// 삽입 준비가 끝난 행. 테이블 컬럼 순서는 `schema::INSERT_COLUMNS`를 따르며
/// qcode는 삽입 시점에 스토리지 계층이 붙입니다.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub date: NaiveDate,
    pub portfolio_value: Option<Decimal>,
    pub capital_in_out: Option<Decimal>,
    pub nav: Option<Decimal>,
    pub prev_nav: Option<Decimal>,
    pub pnl: Option<Decimal>,
    pub daily_p_l: Option<Decimal>,
    pub exposure_value: Option<Decimal>,
    pub prev_portfolio_value: Option<Decimal>,
    pub prev_exposure_value: Option<Decimal>,
    pub prev_pnl: Option<Decimal>,
    pub drawdown: Option<Decimal>,
    pub system_tag: String,
}

/// 포함 범위 `[start, end]`의 날짜 필터.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// 폼 파라미터 쌍에서 범위를 만듭니다.
    ///
    /// 호출자는 빈 문자열을 `None`으로 바꿔서 전달해야 합니다.
    ///
    /// # Errors
    ///
    /// - [`SheetError::IncompleteDateRange`]: 둘 중 하나만 지정됨
    /// - [`SheetError::InvalidRangeDate`]: `YYYY-MM-DD` 형식이 아니거나 실재하지 않는 날짜
    /// - [`SheetError::InvertedDateRange`]: start가 end보다 뒤
    pub fn from_params(start: Option<&str>, end: Option<&str>) -> SheetResult<Option<Self>> {
        match (start, end) {
            (None, None) => Ok(None),
            (Some(start_raw), Some(end_raw)) => {
                let start =
                    parse_iso_date(start_raw).ok_or(SheetError::InvalidRangeDate)?;
                let end = parse_iso_date(end_raw).ok_or(SheetError::InvalidRangeDate)?;
                if start > end {
                    return Err(SheetError::InvertedDateRange);
                }
                Ok(Some(Self { start, end }))
            }
            _ => Err(SheetError::IncompleteDateRange),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// `YYYY-MM-DD` 꼴인지 확인합니다. chrono 파서는 한 자리 월/일도 수용하므로
/// 형식 검사를 별도로 둡니다.
fn is_iso_date_shape(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && [0usize, 1, 2, 3, 5, 6, 8, 9]
            .iter()
            .all(|&i| bytes[i].is_ascii_digit())
}

/// 엄격한 `YYYY-MM-DD` 날짜 파싱. 형식이 어긋나거나 달력에 없는 날짜면 `None`.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    if !is_iso_date_shape(raw) {
        return None;
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

/// 관대한 숫자 파싱.
///
/// 천 단위 쉼표와 퍼센트 기호를 제거한 뒤 Decimal로 해석합니다. 지수 표기는
/// 폴백으로 수용합니다. 빈 값이나 해석 불가능한 값은 에러가 아니라 `None`이며,
/// 이는 의도된 정책입니다 (숫자 칸이 비어 있는 시트는 유효한 입력).
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let cleaned: String = trimmed.chars().filter(|c| *c != ',' && *c != '%').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned
        .parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(&cleaned).ok())
}

/// System Tag 키 비교용 정규화: BOM 잔재 제거, 공백 정리, 소문자화.
fn normalized_key(key: &str) -> String {
    let mut cleaned = key.trim();
    loop {
        if let Some(rest) = cleaned.strip_prefix('\u{feff}') {
            cleaned = rest.trim();
        } else if let Some(rest) = cleaned.strip_prefix("ï»¿") {
            cleaned = rest.trim();
        } else {
            break;
        }
    }
    cleaned
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// System Tag 값을 관대한 키 조회로 찾습니다. 값이 공백뿐이면 없는 것으로 봅니다.
pub fn system_tag_value(row: &ParsedRow) -> Option<String> {
    let direct = row.get("System Tag").trim();
    if !direct.is_empty() {
        return Some(direct.to_string());
    }
    row.values.iter().find_map(|(key, value)| {
        if normalized_key(key) == "system tag" && !value.trim().is_empty() {
            Some(value.trim().to_string())
        } else {
            None
        }
    })
}

/// 파싱된 행 하나를 정규화합니다.
///
/// 검사 순서는 Date -> System Tag -> 숫자 변환 -> 날짜 범위 필터이며,
/// 행당 첫 번째 에러만 보고합니다. 호출 간에 상태를 공유하지 않으므로
/// 같은 입력은 항상 같은 결과를 냅니다.
pub fn normalize_row(
    row: &ParsedRow,
    range: Option<&DateRange>,
) -> Result<NormalizedRecord, RowError> {
    let date_raw = row.get("Date").trim();
    if date_raw.is_empty() {
        return Err(RowError::MissingDate);
    }
    let date = parse_iso_date(date_raw)
        .ok_or_else(|| RowError::InvalidDate(date_raw.to_string()))?;

    let system_tag = system_tag_value(row).ok_or(RowError::MissingSystemTag)?;

    let record = NormalizedRecord {
        date,
        portfolio_value: parse_decimal(row.get("Portfolio Value")),
        capital_in_out: parse_decimal(row.get("Cash In/Out")),
        nav: parse_decimal(row.get("NAV")),
        prev_nav: parse_decimal(row.get("Prev NAV")),
        pnl: parse_decimal(row.get("PnL")),
        daily_p_l: parse_decimal(row.get("Daily P/L %")),
        exposure_value: parse_decimal(row.get("Exposure Value")),
        prev_portfolio_value: parse_decimal(row.get("Prev Portfolio Value")),
        prev_exposure_value: parse_decimal(row.get("Prev Exposure Value")),
        prev_pnl: parse_decimal(row.get("Prev Pnl")),
        drawdown: parse_decimal(row.get("Drawdown %")),
        system_tag,
    };

    if let Some(range) = range {
        if !range.contains(date) {
            return Err(RowError::OutOfRange {
                date: date_raw.to_string(),
                start: range.start.format(DATE_FORMAT).to_string(),
                end: range.end.format(DATE_FORMAT).to_string(),
            });
        }
    }

    Ok(record)
}
