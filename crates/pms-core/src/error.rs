//! 마스터 시트 업로드 파이프라인의 에러 타입.
//!
//! 이 모듈은 인제스트 파이프라인 전반에서 사용되는 에러 타입을 정의합니다.
//! Display 문자열은 API 응답 본문에 그대로 노출되는 계약 문자열입니다.

use thiserror::Error;

use crate::report::FailedRow;

/// 인제스트 요청을 중단시키는 에러.
///
/// 행 단위 실패([`FailedRow`])와 달리, 이 에러들은 요청 전체를 거부합니다.
#[derive(Debug, Error)]
pub enum SheetError {
    /// 파일 또는 qcode 누락
    #[error("Missing file or qcode")]
    MissingInput,

    /// CSV가 아닌 파일 업로드
    #[error("File must be a CSV")]
    NotCsv,

    /// 허용 패턴(`^[a-z0-9_]+$`)을 벗어난 qcode
    #[error("Invalid qcode format")]
    InvalidQcode,

    /// startDate/endDate 중 하나만 지정됨
    #[error("Both startDate and endDate are required")]
    IncompleteDateRange,

    /// YYYY-MM-DD 형식이 아닌 날짜 범위 경계
    #[error("Invalid date format. Use YYYY-MM-DD.")]
    InvalidRangeDate,

    /// startDate > endDate
    #[error("startDate cannot be after endDate")]
    InvertedDateRange,

    /// 대상 테이블 미존재
    #[error("Table {0} does not exist")]
    TableNotFound(String),

    /// 빈 파일
    #[error("CSV file is empty")]
    EmptyFile,

    /// 헤더만 있고 데이터 행이 없는 파일
    #[error("CSV file is empty or has no valid rows")]
    NoDataRows,

    /// 필수 컬럼 누락
    ///
    /// `missing`은 누락된 컬럼, `column_names`는 실제로 발견된 헤더입니다.
    #[error("Missing required columns: {}", missing.join(", "))]
    MissingColumns {
        missing: Vec<String>,
        column_names: Vec<String>,
    },

    /// 날짜 범위 필터로 모든 행이 제외됨
    ///
    /// 삽입을 시도하기 전에 요청 전체를 거부하며, 제외된 행의 내역을 함께 보존합니다.
    #[error("No valid rows found for the specified date range")]
    AllRowsExcluded {
        total_rows: usize,
        column_names: Vec<String>,
        failed_rows: Vec<FailedRow>,
    },

    /// CSV 레코드 읽기 실패
    #[error("CSV parse error: {0}")]
    Parse(String),

    /// 스토리지 접근 실패
    #[error("Database error: {0}")]
    Storage(String),
}

/// 인제스트 작업을 위한 Result 타입.
pub type SheetResult<T> = Result<T, SheetError>;

impl SheetError {
    /// 클라이언트 입력 문제로 분류되는 에러인지 확인합니다 (HTTP 400 대상).
    pub fn is_validation(&self) -> bool {
        !matches!(self, SheetError::Storage(_))
    }

    /// 스토리지 계층 에러인지 확인합니다 (HTTP 500 대상).
    pub fn is_storage(&self) -> bool {
        matches!(self, SheetError::Storage(_))
    }
}

impl From<csv::Error> for SheetError {
    fn from(err: csv::Error) -> Self {
        SheetError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let storage_err = SheetError::Storage("connection reset".to_string());
        assert!(storage_err.is_storage());
        assert!(!storage_err.is_validation());

        let input_err = SheetError::MissingInput;
        assert!(input_err.is_validation());
        assert!(!input_err.is_storage());

        let table_err = SheetError::TableNotFound("master_sheet_acct1".to_string());
        assert!(table_err.is_validation());
    }

    #[test]
    fn test_missing_columns_message() {
        let err = SheetError::MissingColumns {
            missing: vec!["Date".to_string(), "System Tag".to_string()],
            column_names: vec!["Foo".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Missing required columns: Date, System Tag"
        );
    }

    #[test]
    fn test_table_not_found_message() {
        let err = SheetError::TableNotFound("master_sheet_acct1".to_string());
        assert_eq!(err.to_string(), "Table master_sheet_acct1 does not exist");
    }

    #[test]
    fn test_range_error_messages() {
        assert_eq!(
            SheetError::IncompleteDateRange.to_string(),
            "Both startDate and endDate are required"
        );
        assert_eq!(
            SheetError::InvalidRangeDate.to_string(),
            "Invalid date format. Use YYYY-MM-DD."
        );
        assert_eq!(
            SheetError::InvertedDateRange.to_string(),
            "startDate cannot be after endDate"
        );
    }
}
