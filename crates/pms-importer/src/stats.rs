//! 임포트 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 임포트 작업 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportStats {
    /// 파일의 총 데이터 행 수
    pub total: usize,
    /// 삽입된 행 수
    pub inserted: usize,
    /// 실패한 행 수 (정규화 실패 + 삽입 실패)
    pub failed: usize,
    /// 임포트 후 테이블 총 행 수 (DB 조회 실패 시 None)
    pub table_rows: Option<i64>,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl ImportStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.inserted as f64 / self.total as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            inserted = self.inserted,
            failed = self.failed,
            table_rows = self.table_rows,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "임포트 완료"
        );
    }
}
