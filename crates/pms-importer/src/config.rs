//! 환경변수 기반 설정 모듈.

use crate::Result;
use pms_core::{AppConfig, IngestConfig};

/// Importer 전체 설정
#[derive(Debug, Clone)]
pub struct ImporterConfig {
    /// 데이터베이스 URL
    pub database_url: String,
    /// 인제스트 파이프라인 설정 (배치 크기, 실패 샘플 수)
    pub ingest: IngestConfig,
}

impl ImporterConfig {
    /// 환경변수에서 설정 로드
    ///
    /// `PMS_CONFIG` 경로의 설정 파일이 있으면 인제스트 설정을 거기서 읽고,
    /// `IMPORT_BATCH_SIZE` 환경변수로 배치 크기를 덮어쓸 수 있습니다.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").map_err(|_| {
            crate::error::ImporterError::Config(
                "DATABASE_URL 환경변수가 설정되지 않았습니다".to_string(),
            )
        })?;

        let mut ingest = load_ingest_config();
        ingest.batch_size = env_var_parse("IMPORT_BATCH_SIZE", ingest.batch_size);

        Ok(Self {
            database_url,
            ingest,
        })
    }
}

/// 설정 파일에서 인제스트 설정 로드 (없으면 기본값)
///
/// `check` 커맨드처럼 DATABASE_URL 없이도 동작해야 하는 경로에서 직접
/// 사용합니다.
pub fn load_ingest_config() -> IngestConfig {
    let path = std::env::var("PMS_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

    if std::path::Path::new(&path).exists() {
        match AppConfig::load(&path) {
            Ok(config) => return config.ingest,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "설정 파일 로드 실패, 기본값 사용");
            }
        }
    }

    IngestConfig::default()
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
