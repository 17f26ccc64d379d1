//! Standalone master sheet importer for the PMS dashboard backend.
//!
//! 이 crate는 API 서버와 독립적으로 마스터 시트 CSV를 처리하는 바이너리를
//! 제공합니다:
//! - 파일 사전 검증 (파싱/정규화만 수행, DB 접근 없음)
//! - 추가 임포트 및 전체 교체 임포트 (HTTP 업로드와 동일한 파이프라인)

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::ImporterConfig;
pub use error::{ImporterError, Result};
pub use stats::ImportStats;
