//! 마스터 시트 endpoint.
//!
//! 계정별 마스터 시트 CSV의 업로드/교체/삭제/카운트를 제공합니다.
//!
//! # 엔드포인트
//!
//! - `POST /api/v1/master-sheet/upload` - CSV 추가 업로드
//! - `POST /api/v1/master-sheet/replace` - 테이블 전체 교체
//! - `DELETE /api/v1/master-sheet/{qcode}` - 날짜 범위 삭제
//! - `GET /api/v1/master-sheet/{qcode}/count` - 행 수 조회
//!
//! 업로드/교체/삭제의 응답 본문은 대시보드 UI가 그대로 렌더링하는 계약이므로
//! `message` 문자열과 필드 구성을 임의로 바꾸면 안 됩니다.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use pms_core::{
    build_report, delete_message, replace_message, upload_message, IngestConfig, SheetError,
    UploadReport,
};
use pms_data::{IngestOutcome, UploadRequest};

use crate::error::{ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 업로드 요청 본문 크기 상한. 멀티파트 폼 전체 기준입니다.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// 업로드 처리 중 스토리지 단계에서 실패했을 때의 응답 메시지.
const UPLOAD_FAILURE_MESSAGE: &str = "Failed to process CSV file";

/// 교체 처리 중 스토리지 단계에서 실패했을 때의 응답 메시지.
const REPLACE_FAILURE_MESSAGE: &str = "Failed to replace master sheet";

/// 삭제 처리 중 스토리지 단계에서 실패했을 때의 응답 메시지.
const DELETE_FAILURE_MESSAGE: &str = "Failed to delete records";

// ==================== 요청/응답 타입 ====================

/// 업로드 폼 스키마 (OpenAPI 문서화용).
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadForm {
    /// CSV 파일
    #[schema(value_type = String, format = Binary)]
    pub file: String,
    /// 계정 코드 (소문자 영숫자와 밑줄만 허용)
    pub qcode: String,
    /// 포함 범위 시작일 (YYYY-MM-DD, endDate와 함께 지정)
    pub start_date: Option<String>,
    /// 포함 범위 종료일 (YYYY-MM-DD, startDate와 함께 지정)
    pub end_date: Option<String>,
}

/// 날짜 범위 삭제 쿼리 파라미터.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// 삭제 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    /// 사람이 읽을 수 있는 요약 (예: "Deleted 42 records")
    pub message: String,
    /// 삭제된 행 수
    pub deleted_count: u64,
}

/// 행 수 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CountResponse {
    /// 정규화된 계정 코드
    pub qcode: String,
    /// 테이블의 총 행 수
    pub rows: i64,
}

// ==================== 공통 처리 ====================

/// 멀티파트 폼에서 업로드 요청을 수집합니다.
///
/// 알 수 없는 필드는 무시합니다. 필드 존재 여부 검증은 서비스 계층의
/// 책임이므로 여기서는 수집만 합니다.
async fn read_upload_request(
    mut multipart: Multipart,
) -> Result<UploadRequest, axum::extract::multipart::MultipartError> {
    let mut request = UploadRequest::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "file" => {
                request.file_name = field.file_name().map(str::to_string);
                request.content = Some(field.bytes().await?.to_vec());
            }
            "qcode" => request.qcode = Some(field.text().await?),
            "startDate" => request.start_date = Some(field.text().await?),
            "endDate" => request.end_date = Some(field.text().await?),
            _ => {}
        }
    }

    Ok(request)
}

/// 인제스트 결과를 HTTP 응답으로 변환합니다.
///
/// - 검증 거부 -> 400 + 거부 본문
/// - 스토리지 에러 / 연결 장애로 중단 -> 500 (중단 시점까지의 카운트 포함)
/// - 그 외 -> 200 (일부 행 실패도 200)
fn report_response(
    result: Result<IngestOutcome, SheetError>,
    cfg: &IngestConfig,
    summary: fn(&IngestOutcome) -> String,
    failure_message: &str,
) -> (StatusCode, Json<UploadReport>) {
    match result {
        Err(err) if err.is_validation() => (
            StatusCode::BAD_REQUEST,
            Json(UploadReport::rejection(&err, cfg.failed_row_sample)),
        ),
        Err(err) => {
            error!(error = %err, "Master sheet request failed before insert stage");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(UploadReport {
                    message: failure_message.to_string(),
                    ..Default::default()
                }),
            )
        }
        Ok(outcome) => {
            if let Some(ref detail) = outcome.aborted {
                error!(
                    qcode = %outcome.qcode,
                    inserted_rows = outcome.inserted_rows,
                    error = %detail,
                    "Master sheet ingest aborted mid-way"
                );
                let report = build_report(
                    failure_message,
                    outcome.total_rows,
                    outcome.inserted_rows,
                    outcome.column_names,
                    &outcome.failed_rows,
                    cfg.failed_row_sample,
                );
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(report));
            }

            let report = build_report(
                summary(&outcome),
                outcome.total_rows,
                outcome.inserted_rows,
                outcome.column_names,
                &outcome.failed_rows,
                cfg.failed_row_sample,
            );
            (StatusCode::OK, Json(report))
        }
    }
}

fn upload_summary(outcome: &IngestOutcome) -> String {
    upload_message(outcome.inserted_rows, outcome.failed_count())
}

fn replace_summary(outcome: &IngestOutcome) -> String {
    replace_message(outcome.inserted_rows, outcome.failed_count())
}

// ==================== 핸들러 ====================

/// 마스터 시트 CSV 업로드.
///
/// POST /api/v1/master-sheet/upload
#[utoipa::path(
    post,
    path = "/api/v1/master-sheet/upload",
    tag = "master-sheet",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "업로드 완료 (일부 행 실패 포함)", body = UploadReport),
        (status = 400, description = "검증 실패, 어떤 행도 삽입되지 않음", body = UploadReport),
        (status = 500, description = "스토리지 장애", body = UploadReport)
    )
)]
pub async fn upload_master_sheet(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> (StatusCode, Json<UploadReport>) {
    let request = match read_upload_request(multipart).await {
        Ok(request) => request,
        Err(err) => {
            error!(error = %err, "Failed to read upload form");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(UploadReport {
                    message: UPLOAD_FAILURE_MESSAGE.to_string(),
                    ..Default::default()
                }),
            );
        }
    };

    let result = pms_data::ingest_master_sheet(&state.db_pool, &state.ingest, &request).await;
    report_response(result, &state.ingest, upload_summary, UPLOAD_FAILURE_MESSAGE)
}

/// 마스터 시트 전체 교체.
///
/// POST /api/v1/master-sheet/replace
///
/// 테이블을 비우고 업로드된 CSV로 다시 채웁니다. 검증이 전부 통과한 뒤에만
/// 비우므로 깨진 파일로 기존 데이터가 사라지지 않습니다.
#[utoipa::path(
    post,
    path = "/api/v1/master-sheet/replace",
    tag = "master-sheet",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "교체 완료", body = UploadReport),
        (status = 400, description = "검증 실패, 기존 데이터 유지", body = UploadReport),
        (status = 500, description = "스토리지 장애", body = UploadReport)
    )
)]
pub async fn replace_master_sheet(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> (StatusCode, Json<UploadReport>) {
    let request = match read_upload_request(multipart).await {
        Ok(mut request) => {
            // 교체는 테이블 전체 기준이므로 날짜 범위 필드를 받지 않는다
            request.start_date = None;
            request.end_date = None;
            request
        }
        Err(err) => {
            error!(error = %err, "Failed to read replace form");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(UploadReport {
                    message: REPLACE_FAILURE_MESSAGE.to_string(),
                    ..Default::default()
                }),
            );
        }
    };

    let result = pms_data::replace_master_sheet(&state.db_pool, &state.ingest, &request).await;
    report_response(result, &state.ingest, replace_summary, REPLACE_FAILURE_MESSAGE)
}

/// 날짜 범위의 마스터 시트 행 삭제.
///
/// DELETE /api/v1/master-sheet/{qcode}?startDate=...&endDate=...
#[utoipa::path(
    delete,
    path = "/api/v1/master-sheet/{qcode}",
    tag = "master-sheet",
    params(
        ("qcode" = String, Path, description = "계정 코드"),
        ("startDate" = String, Query, description = "삭제 범위 시작일 (YYYY-MM-DD)"),
        ("endDate" = String, Query, description = "삭제 범위 종료일 (YYYY-MM-DD)")
    ),
    responses(
        (status = 200, description = "삭제 완료", body = DeleteResponse),
        (status = 400, description = "검증 실패", body = UploadReport),
        (status = 500, description = "스토리지 장애", body = UploadReport)
    )
)]
pub async fn delete_master_sheet(
    State(state): State<Arc<AppState>>,
    Path(qcode): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Response {
    let result = pms_data::delete_master_sheet_rows(
        &state.db_pool,
        &qcode,
        query.start_date.as_deref(),
        query.end_date.as_deref(),
    )
    .await;

    match result {
        Ok(deleted) => (
            StatusCode::OK,
            Json(DeleteResponse {
                message: delete_message(deleted),
                deleted_count: deleted,
            }),
        )
            .into_response(),
        Err(err) if err.is_validation() => (
            StatusCode::BAD_REQUEST,
            Json(UploadReport::rejection(&err, state.ingest.failed_row_sample)),
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, qcode = %qcode, "Failed to delete master sheet rows");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(UploadReport {
                    message: DELETE_FAILURE_MESSAGE.to_string(),
                    ..Default::default()
                }),
            )
                .into_response()
        }
    }
}

/// 마스터 시트 행 수 조회.
///
/// GET /api/v1/master-sheet/{qcode}/count
#[utoipa::path(
    get,
    path = "/api/v1/master-sheet/{qcode}/count",
    tag = "master-sheet",
    params(
        ("qcode" = String, Path, description = "계정 코드")
    ),
    responses(
        (status = 200, description = "행 수 조회 성공", body = CountResponse),
        (status = 400, description = "잘못된 계정 코드", body = ApiErrorResponse),
        (status = 404, description = "테이블 없음", body = ApiErrorResponse),
        (status = 500, description = "스토리지 장애", body = ApiErrorResponse)
    )
)]
pub async fn count_master_sheet(
    State(state): State<Arc<AppState>>,
    Path(qcode): Path<String>,
) -> ApiResult<Json<CountResponse>> {
    match pms_data::count_master_sheet_rows(&state.db_pool, &qcode).await {
        Ok(rows) => Ok(Json(CountResponse {
            qcode: qcode.to_lowercase(),
            rows,
        })),
        Err(err @ SheetError::InvalidQcode) => Err((
            StatusCode::BAD_REQUEST,
            Json(ApiErrorResponse::new("INVALID_QCODE", err.to_string())),
        )),
        Err(err @ SheetError::TableNotFound(_)) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiErrorResponse::with_details(
                "TABLE_NOT_FOUND",
                err.to_string(),
                serde_json::json!({ "qcode": qcode.to_lowercase() }),
            )),
        )),
        Err(err) => {
            error!(error = %err, qcode = %qcode, "Failed to count master sheet rows");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiErrorResponse::new("DB_ERROR", "Failed to count rows")),
            ))
        }
    }
}

/// 마스터 시트 라우터 생성.
pub fn master_sheet_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload", post(upload_master_sheet))
        .route("/replace", post(replace_master_sheet))
        .route("/{qcode}", delete(delete_master_sheet))
        .route("/{qcode}/count", get(count_master_sheet))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
