//! 에러 타입 정의.

use std::fmt;

/// Importer 에러 타입
#[derive(Debug)]
pub enum ImporterError {
    /// 데이터베이스 에러
    Database(sqlx::Error),
    /// 설정 에러
    Config(String),
    /// 파일 읽기 에러
    Io(std::io::Error),
    /// 인제스트 파이프라인 에러 (검증/파싱/스토리지)
    Sheet(pms_core::SheetError),
}

impl fmt::Display for ImporterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database(e) => write!(f, "Database error: {}", e),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Sheet(e) => write!(f, "Ingest error: {}", e),
        }
    }
}

impl std::error::Error for ImporterError {}

impl From<sqlx::Error> for ImporterError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err)
    }
}

impl From<std::io::Error> for ImporterError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<pms_core::SheetError> for ImporterError {
    fn from(err: pms_core::SheetError) -> Self {
        Self::Sheet(err)
    }
}

impl From<std::env::VarError> for ImporterError {
    fn from(err: std::env::VarError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, ImporterError>;
