//! API 라우트 모듈.
//!
//! # 라우트 구성
//!
//! - `/health` - 리브니스/레디니스 체크
//! - `/api/v1/master-sheet` - 마스터 시트 업로드/교체/삭제/카운트

pub mod health;
pub mod master_sheet;

pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use master_sheet::{master_sheet_router, CountResponse, DeleteResponse};

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// 전체 API 라우터를 생성합니다.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/api/v1/master-sheet", master_sheet_router())
}
