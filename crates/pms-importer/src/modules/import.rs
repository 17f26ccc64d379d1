//! 데이터베이스 임포트 모듈.

use crate::{ImportStats, ImporterConfig, Result};
use pms_data::{count_master_sheet_rows, ingest_master_sheet, replace_master_sheet, UploadRequest};
use sqlx::PgPool;
use std::path::Path;
use std::time::Instant;

/// 임포트 옵션.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// 대상 계정 코드
    pub qcode: String,
    /// 포함 범위 시작일 (YYYY-MM-DD, end_date와 함께 지정)
    pub start_date: Option<String>,
    /// 포함 범위 종료일 (YYYY-MM-DD, start_date와 함께 지정)
    pub end_date: Option<String>,
    /// true면 기존 테이블을 비운 뒤 삽입
    pub replace: bool,
}

/// CSV 파일을 계정 테이블에 임포트합니다.
///
/// HTTP 업로드와 같은 파이프라인을 사용하므로 검증/정규화/배치 폴백 동작이
/// 동일합니다. 교체 모드에서도 날짜 범위를 지정하면 범위 밖 행은 실패로
/// 집계되고 삽입되지 않습니다.
pub async fn import_file(
    pool: &PgPool,
    config: &ImporterConfig,
    path: &Path,
    options: &ImportOptions,
) -> Result<ImportStats> {
    let start = Instant::now();

    let content = std::fs::read(path)?;
    tracing::info!(
        path = %path.display(),
        qcode = %options.qcode,
        replace = options.replace,
        bytes = content.len(),
        "임포트 시작"
    );

    let request = UploadRequest {
        qcode: Some(options.qcode.clone()),
        file_name: path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string),
        content: Some(content),
        start_date: options.start_date.clone(),
        end_date: options.end_date.clone(),
    };

    let outcome = if options.replace {
        replace_master_sheet(pool, &config.ingest, &request).await?
    } else {
        ingest_master_sheet(pool, &config.ingest, &request).await?
    };

    if let Some(ref detail) = outcome.aborted {
        tracing::error!(
            inserted = outcome.inserted_rows,
            error = %detail,
            "연결 장애로 임포트가 중단되었습니다"
        );
    }

    for failed in outcome
        .failed_rows
        .iter()
        .take(config.ingest.failed_row_sample)
    {
        tracing::warn!(row = failed.row_index, error = %failed.error, "행 처리 실패");
    }

    let mut stats = ImportStats {
        total: outcome.total_rows,
        inserted: outcome.inserted_rows,
        failed: outcome.failed_count(),
        ..Default::default()
    };

    // 요약용 테이블 행 수 조회. 실패해도 임포트 결과에는 영향이 없습니다.
    match count_master_sheet_rows(pool, &outcome.qcode).await {
        Ok(rows) => stats.table_rows = Some(rows),
        Err(e) => tracing::warn!(error = %e, "행 수 조회 실패"),
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}
