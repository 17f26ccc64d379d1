//! OpenAPI 문서화 설정.
//!
//! utoipa를 사용하여 REST API의 OpenAPI 3.0 스펙을 생성합니다.
//! Swagger UI는 `/swagger-ui` 경로에서 사용 가능합니다.
//!
//! # 자동 생성 구조
//!
//! 각 라우트 모듈은 자체 스키마를 정의하고, 중앙 `ApiDoc`에서 집계합니다.
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// ==================== 각 모듈에서 스키마 Import ====================

use crate::error::ApiErrorResponse;
use crate::routes::{
    master_sheet::UploadForm,
    // Health 모듈
    ComponentHealth,
    ComponentStatus,
    // Master sheet 모듈
    CountResponse,
    DeleteResponse,
    HealthResponse,
};
use pms_core::{FailedRow, UploadReport};

// ==================== OpenAPI 문서 정의 ====================

/// PMS Dashboard API 문서.
///
/// 모든 엔드포인트와 스키마를 포함하는 OpenAPI 3.0 스펙입니다.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "PMS Dashboard API",
        version = "0.1.0",
        description = r#"
# 포트폴리오 관리 대시보드 REST API

계정별 마스터 시트(일별 성과 기록)의 CSV 인제스트를 담당하는 REST API입니다.

## 주요 기능

- **업로드**: CSV를 파싱/검증하여 계정 테이블에 배치 삽입
- **교체**: 검증 통과 후 테이블 전체를 새 CSV로 교체
- **삭제**: 날짜 범위의 기존 기록 삭제
- **카운트**: 계정 테이블의 행 수 조회

## 업로드 계약

업로드/교체는 `multipart/form-data`로 `file`, `qcode`, 선택적으로
`startDate`/`endDate`(업로드만)를 받습니다. 검증 실패는 400과 거부 사유를,
행 단위 실패는 200과 실패 샘플을 돌려줍니다.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT"),
        contact(
            name = "PMS Dashboard Team",
            url = "https://github.com/user/pms-ingest"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "로컬 개발 서버"),
    ),
    tags(
        (name = "health", description = "헬스 체크 - 서버 상태 확인"),
        (name = "master-sheet", description = "마스터 시트 - CSV 업로드/교체/삭제/카운트")
    ),
    // ==================== 스키마 등록 ====================
    components(
        schemas(
            // ===== Health =====
            HealthResponse,
            ComponentHealth,
            ComponentStatus,

            // ===== Common =====
            ApiErrorResponse,

            // ===== Master sheet =====
            UploadForm,
            UploadReport,
            FailedRow,
            DeleteResponse,
            CountResponse,
        )
    ),
    // ==================== 경로 등록 ====================
    paths(
        // ===== Health =====
        crate::routes::health::health_check,
        crate::routes::health::health_ready,

        // ===== Master sheet =====
        crate::routes::master_sheet::upload_master_sheet,
        crate::routes::master_sheet::replace_master_sheet,
        crate::routes::master_sheet::delete_master_sheet,
        crate::routes::master_sheet::count_master_sheet,
    )
)]
pub struct ApiDoc;

// ==================== Swagger UI 라우터 ====================

/// Swagger UI 라우터 생성.
///
/// 다음 경로에 문서 UI를 마운트합니다:
/// - `/swagger-ui` - Swagger UI 대화형 문서
/// - `/api-docs/openapi.json` - OpenAPI JSON 스펙
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}

// ==================== 테스트 ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_valid() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&spec).unwrap();

        // 기본 정보 확인
        assert!(json.contains("PMS Dashboard API"));
        assert!(json.contains("0.1.0"));

        // 태그 확인
        assert!(json.contains("health"));
        assert!(json.contains("master-sheet"));

        // 경로 확인
        assert!(json.contains("/health"));
        assert!(json.contains("/health/ready"));
        assert!(json.contains("/api/v1/master-sheet/upload"));
        assert!(json.contains("/api/v1/master-sheet/replace"));
        assert!(json.contains("/api/v1/master-sheet/{qcode}"));
        assert!(json.contains("/api/v1/master-sheet/{qcode}/count"));
    }

    #[test]
    fn test_swagger_ui_router_creates() {
        let _router: Router<()> = swagger_ui_router();
    }

    #[test]
    fn test_openapi_contains_schemas() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_string(&spec).unwrap();

        // 스키마 확인
        assert!(json.contains("HealthResponse"));
        assert!(json.contains("UploadReport"));
        assert!(json.contains("FailedRow"));
        assert!(json.contains("DeleteResponse"));
        assert!(json.contains("CountResponse"));
        assert!(json.contains("ApiErrorResponse"));
    }
}
