//! 업로드 결과 리포트 집계.
//!
//! 파이프라인의 마지막 단계로, 카운트와 실패 샘플을 담은 구조화된 리포트를
//! 만듭니다. I/O가 없는 결정적 포매팅만 수행합니다.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SheetError;
use crate::parse::ParsedRow;

/// FailedRow.row에 실리는 값의 기본 미리보기 길이.
pub const VALUE_PREVIEW_LEN: usize = 50;

/// 리포트에 남기는 실패 행 샘플의 기본 개수. 카운트는 항상 전체 기준입니다.
pub const FAILED_ROW_SAMPLE: usize = 10;

/// 건너뛴 행 하나의 기록: 위치, 원본 내용, 에러 메시지.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct FailedRow {
    /// 데이터 행 기준 1-base 위치 (헤더 제외)
    pub row_index: usize,
    /// 원본 행 내용. 값이 길면 미리보기 길이로 잘라냅니다.
    pub row: Value,
    /// 사람이 읽을 수 있는 에러 메시지
    pub error: String,
}

impl FailedRow {
    /// 파싱된 행에서 실패 기록을 만듭니다. 값은 기본 미리보기 길이로 잘립니다.
    pub fn from_row(row: &ParsedRow, headers: &[String], error: impl Into<String>) -> Self {
        Self::with_preview(row, headers, error, VALUE_PREVIEW_LEN)
    }

    /// 미리보기 길이를 지정해서 실패 기록을 만듭니다.
    pub fn with_preview(
        row: &ParsedRow,
        headers: &[String],
        error: impl Into<String>,
        preview_len: usize,
    ) -> Self {
        let mut object = Map::new();
        for header in headers {
            object.insert(
                header.clone(),
                Value::String(truncate_value(row.get(header), preview_len)),
            );
        }
        Self {
            row_index: row.index,
            row: Value::Object(object),
            error: error.into(),
        }
    }
}

/// 값 미리보기 절단. 한도를 넘으면 잘라내고 말줄임표를 붙입니다.
fn truncate_value(value: &str, max_len: usize) -> String {
    if value.chars().count() > max_len {
        let truncated: String = value.chars().take(max_len).collect();
        format!("{}...", truncated)
    } else {
        value.to_string()
    }
}

/// 한 번의 업로드 호출이 돌려주는 최종 리포트.
///
/// `message`만 항상 존재하며 나머지 필드는 경로에 따라 생략될 수 있습니다.
/// 부분 실패(일부 행만 삽입됨)도 이 리포트로 표현되고, 그 경우에도 카운트는
/// 잘린 샘플이 아니라 실제 전체 값을 반영합니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UploadReport {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inserted_rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_error: Option<FailedRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_rows: Option<Vec<FailedRow>>,
}

impl UploadReport {
    /// 요청 거부 에러에 대한 응답 본문을 만듭니다.
    ///
    /// 대부분의 거부는 메시지만 싣지만, 컬럼 누락은 발견된 헤더를,
    /// 전체 제외 거부는 카운트와 최대 `sample`개의 실패 샘플을 함께 싣습니다.
    pub fn rejection(error: &SheetError, sample: usize) -> Self {
        match error {
            SheetError::MissingColumns { column_names, .. } => Self {
                message: error.to_string(),
                column_names: Some(column_names.clone()),
                ..Default::default()
            },
            SheetError::AllRowsExcluded {
                total_rows,
                column_names,
                failed_rows,
            } => Self {
                message: error.to_string(),
                total_rows: Some(*total_rows),
                column_names: Some(column_names.clone()),
                first_error: failed_rows.first().cloned(),
                failed_rows: Some(failed_rows.iter().take(sample).cloned().collect()),
                ..Default::default()
            },
            _ => Self {
                message: error.to_string(),
                ..Default::default()
            },
        }
    }
}

/// (전체 수, 삽입 수, 헤더, 실패 목록)을 리포트로 집계합니다.
///
/// `failed_rows`는 발생 순서를 유지한 전체 목록이어야 하며, 리포트에는
/// 처음 `sample`개만 실립니다. `first_error`는 항상 전체 목록의 첫 요소입니다.
pub fn build_report(
    message: impl Into<String>,
    total_rows: usize,
    inserted_rows: usize,
    column_names: Vec<String>,
    failed_rows: &[FailedRow],
    sample: usize,
) -> UploadReport {
    UploadReport {
        message: message.into(),
        total_rows: Some(total_rows),
        inserted_rows: Some(inserted_rows),
        column_names: Some(column_names),
        first_error: failed_rows.first().cloned(),
        failed_rows: Some(failed_rows.iter().take(sample).cloned().collect()),
    }
}

/// 업로드 요약 메시지.
pub fn upload_message(inserted: usize, failed: usize) -> String {
    format!("{} rows inserted, {} failed", inserted, failed)
}

/// 전체 교체 요약 메시지. 실패가 있을 때만 실패 문구가 붙습니다.
pub fn replace_message(inserted: usize, failed: usize) -> String {
    let mut message = format!(
        "Master sheet replaced successfully. Inserted {} rows.",
        inserted
    );
    if failed > 0 {
        message.push_str(&format!(" {} rows failed to insert.", failed));
    }
    message
}

/// 삭제 요약 메시지.
pub fn delete_message(deleted: u64) -> String {
    format!("Deleted {} records", deleted)
}
