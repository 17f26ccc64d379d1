//! 파일 사전 검증 모듈.
//!
//! DB 접근 없이 파싱과 정규화만 수행합니다. 업로드 전에 파일이 어떻게
//! 처리될지 미리 확인하는 용도입니다.

use crate::{ImportStats, Result};
use pms_core::{normalize_row, parse_master_sheet, DateRange, ParsedSheet};
use std::path::Path;
use std::time::Instant;

/// CSV 파일을 파싱/정규화하고 결과를 보고합니다.
///
/// 통과한 행은 `inserted`로 집계합니다 (실제 임포트 시 삽입될 행 수).
/// 날짜 범위가 지정되면 범위 밖 행도 실패로 집계합니다.
pub fn check_file(
    path: &Path,
    start_date: Option<&str>,
    end_date: Option<&str>,
    sample: usize,
) -> Result<ImportStats> {
    let start = Instant::now();

    let content = std::fs::read(path)?;
    tracing::info!(path = %path.display(), bytes = content.len(), "파일 검증 시작");

    let range = DateRange::from_params(start_date, end_date)?;
    let ParsedSheet { headers, rows } = parse_master_sheet(&content)?;
    tracing::info!(columns = headers.len(), rows = rows.len(), "파싱 완료");

    let mut stats = ImportStats::new();
    stats.total = rows.len();

    let mut reported = 0usize;
    for row in &rows {
        match normalize_row(row, range.as_ref()) {
            Ok(_) => stats.inserted += 1,
            Err(err) => {
                stats.failed += 1;
                if reported < sample {
                    tracing::warn!(row = row.index, error = %err, "행 검증 실패");
                    reported += 1;
                }
            }
        }
    }

    if stats.failed > sample {
        tracing::warn!(omitted = stats.failed - sample, "생략된 실패 행이 더 있습니다");
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}
