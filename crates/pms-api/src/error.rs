//! 통합 API 에러 응답 타입.
//!
//! 업로드 계열 엔드포인트는 계약상 `UploadReport` 본문을 그대로 돌려주지만,
//! 나머지 조회성 엔드포인트는 이 모듈의 `ApiErrorResponse`로 일관된 에러
//! 형식을 제공합니다.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// 통합 API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "TABLE_NOT_FOUND",
///   "message": "Table master_sheet_acct1 does not exist",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "DB_ERROR", "INVALID_QCODE", "TABLE_NOT_FOUND")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp, 선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details),
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// API 핸들러 Result 타입 별칭.
///
/// # Example
///
/// ```ignore
/// async fn count_rows(
///     Path(qcode): Path<String>,
///     State(state): State<Arc<AppState>>,
/// ) -> ApiResult<Json<CountResponse>> {
///     // ...
/// }
/// ```
pub type ApiResult<T> = Result<T, (axum::http::StatusCode, axum::Json<ApiErrorResponse>)>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_response_new() {
        let error = ApiErrorResponse::new("TEST_ERROR", "Test message");
        assert_eq!(error.code, "TEST_ERROR");
        assert_eq!(error.message, "Test message");
        assert!(error.timestamp.is_some());
        assert!(error.details.is_none());
    }

    #[test]
    fn test_api_error_response_with_details() {
        let details = serde_json::json!({"qcode": "acct1"});
        let error = ApiErrorResponse::with_details("TABLE_NOT_FOUND", "missing table", details);
        assert_eq!(error.code, "TABLE_NOT_FOUND");
        assert_eq!(error.details.as_ref().unwrap()["qcode"], "acct1");
    }

    #[test]
    fn test_json_serialization_skips_empty_fields() {
        let mut error = ApiErrorResponse::new("DB_ERROR", "connection refused");
        error.timestamp = None;
        let json = serde_json::to_string(&error).unwrap();

        assert!(!json.contains("timestamp"));
        assert!(!json.contains("details"));
        assert!(json.contains(r#""code":"DB_ERROR""#));
        assert!(json.contains(r#""message":"connection refused""#));
    }

    #[test]
    fn test_display_format() {
        let error = ApiErrorResponse::new("INVALID_QCODE", "Invalid qcode format");
        assert_eq!(error.to_string(), "[INVALID_QCODE] Invalid qcode format");
    }
}
