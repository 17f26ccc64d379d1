//! # PMS Core
//!
//! 포트폴리오 관리 대시보드의 핵심 도메인 타입을 제공합니다.
//!
//! 이 크레이트는 마스터 시트 CSV 인제스트 파이프라인의 순수 로직을 담당합니다:
//! - 업로드 요청 검증 (qcode, 날짜 범위)
//! - CSV 디코딩 및 파싱 (BOM 제거, 구분자 감지)
//! - 행 정규화 (날짜/숫자/시스템 태그 변환)
//! - 결과 리포트 집계
//! - 설정 관리
//! - 로깅 인프라
//!
//! 데이터베이스 접근은 `pms-data`, HTTP 레이어는 `pms-api`가 담당합니다.

pub mod config;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod parse;
pub mod report;
pub mod schema;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use normalize::*;
pub use parse::*;
pub use report::*;
pub use schema::*;
