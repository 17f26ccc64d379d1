//! # PMS Data
//!
//! 마스터 시트의 스토리지 계층을 제공합니다.
//!
//! - `repository`: 계정별 `master_sheet_<qcode>` 테이블에 대한 쿼리
//! - `ingest`: 검증 -> 파싱 -> 정규화 -> 배치 삽입 -> 리포트의 순차 파이프라인

pub mod ingest;
pub mod repository;

pub use ingest::*;
pub use repository::*;
