//! 마스터 시트 테이블의 스키마 계약.
//!
//! 업로드 CSV의 필수 컬럼 목록, 대상 테이블의 컬럼 순서, qcode 검증 규칙을
//! 한 곳에서 정의합니다. qcode는 테이블 식별자에 직접 삽입되므로 허용 목록
//! 검증을 거치지 않은 값은 절대 스토리지 계층에 도달해서는 안 됩니다.

use crate::error::{SheetError, SheetResult};

/// 업로드 CSV 헤더에 반드시 존재해야 하는 컬럼 (대소문자 구분, 순서 유지).
pub const REQUIRED_COLUMNS: [&str; 13] = [
    "Date",
    "Portfolio Value",
    "Cash In/Out",
    "NAV",
    "Prev NAV",
    "PnL",
    "Daily P/L %",
    "Exposure Value",
    "Prev Portfolio Value",
    "Prev Exposure Value",
    "Prev Pnl",
    "Drawdown %",
    "System Tag",
];

/// 대상 테이블의 컬럼 순서. 삽입은 위치 기반이므로 이 순서 자체가 계약입니다.
pub const INSERT_COLUMNS: [&str; 14] = [
    "qcode",
    "date",
    "portfolio_value",
    "capital_in_out",
    "nav",
    "prev_nav",
    "pnl",
    "daily_p_l",
    "exposure_value",
    "prev_portfolio_value",
    "prev_exposure_value",
    "prev_pnl",
    "drawdown",
    "system_tag",
];

/// 계정별 테이블 이름 접두사.
pub const TABLE_PREFIX: &str = "master_sheet_";

/// qcode가 허용 패턴(`^[a-z0-9_]+$`)에 맞는지 확인합니다.
pub fn is_valid_qcode(qcode: &str) -> bool {
    !qcode.is_empty()
        && qcode
            .bytes()
            .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'_'))
}

/// qcode를 소문자로 정규화한 뒤 허용 패턴을 검증합니다.
///
/// 보안 경계: 이 함수를 통과한 값만 테이블 식별자로 사용할 수 있습니다.
pub fn normalize_qcode(raw: &str) -> SheetResult<String> {
    let qcode = raw.to_lowercase();
    if !is_valid_qcode(&qcode) {
        return Err(SheetError::InvalidQcode);
    }
    Ok(qcode)
}

/// 정규화된 qcode에 대한 마스터 시트 테이블 이름을 반환합니다.
pub fn master_sheet_table(qcode: &str) -> String {
    format!("{}{}", TABLE_PREFIX, qcode)
}

/// 발견된 헤더에서 누락된 필수 컬럼을 [`REQUIRED_COLUMNS`] 순서로 반환합니다.
///
/// 비교는 트리밍된 헤더에 대한 대소문자 구분 일치입니다. 요청당 한 번,
/// 헤더에 대해서만 수행하며 행 단위로 반복하지 않습니다.
pub fn missing_columns(headers: &[String]) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|required| !headers.iter().any(|h| h == *required))
        .map(|required| required.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_qcode() {
        assert!(is_valid_qcode("acct1"));
        assert!(is_valid_qcode("fund_2024"));
        assert!(is_valid_qcode("a"));
        assert!(is_valid_qcode("123"));
    }

    #[test]
    fn test_invalid_qcode() {
        assert!(!is_valid_qcode(""));
        assert!(!is_valid_qcode("ACCT1"));
        assert!(!is_valid_qcode("acct-1"));
        assert!(!is_valid_qcode("acct 1"));
        assert!(!is_valid_qcode("acct;drop table users"));
        assert!(!is_valid_qcode("acct\u{feff}"));
    }

    #[test]
    fn test_normalize_qcode_lowercases_before_validation() {
        assert_eq!(normalize_qcode("ACCT1").unwrap(), "acct1");
        assert_eq!(normalize_qcode("Fund_A").unwrap(), "fund_a");
        assert!(normalize_qcode("acct-1").is_err());
        assert!(normalize_qcode("").is_err());
    }

    #[test]
    fn test_master_sheet_table() {
        assert_eq!(master_sheet_table("acct1"), "master_sheet_acct1");
    }

    #[test]
    fn test_missing_columns_preserves_required_order() {
        let headers = vec![
            "Portfolio Value".to_string(),
            "NAV".to_string(),
            "System Tag".to_string(),
        ];
        let missing = missing_columns(&headers);
        assert_eq!(missing[0], "Date");
        assert!(missing.contains(&"Drawdown %".to_string()));
        assert!(!missing.contains(&"NAV".to_string()));
        assert_eq!(missing.len(), REQUIRED_COLUMNS.len() - 3);
    }

    #[test]
    fn test_missing_columns_is_case_sensitive() {
        let headers: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .map(|c| c.to_lowercase())
            .collect();
        let missing = missing_columns(&headers);
        // "date" != "Date"이므로 전부 누락으로 처리
        assert_eq!(missing.len(), REQUIRED_COLUMNS.len());
    }

    #[test]
    fn test_missing_columns_all_present() {
        let headers: Vec<String> = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
        assert!(missing_columns(&headers).is_empty());
    }
}
