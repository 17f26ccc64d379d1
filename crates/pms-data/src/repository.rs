//! 마스터 시트 Repository.
//!
//! 계정별 `master_sheet_<qcode>` 테이블에 대한 삽입/삭제/조회를 담당합니다.
//! 모든 메서드의 `table` 인자는 허용 목록 검증을 통과한 qcode로 만든
//! `schema::master_sheet_table` 결과여야 합니다. 테이블 식별자는 바인드
//! 파라미터가 될 수 없으므로 쿼리 문자열에 보간되며, 그 안전성은 전적으로
//! qcode 검증에 기댑니다.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use tracing::debug;

use pms_core::{DateRange, NormalizedRecord};

/// 마스터 시트 테이블 Repository.
pub struct MasterSheetRepository;

impl MasterSheetRepository {
    // ==================== 메타데이터 ====================

    /// 테이블 존재 확인.
    ///
    /// 테이블 프로비저닝은 외부(계정 생성 경로)의 책임이므로, 인제스트는
    /// 존재 여부만 확인하고 절대 테이블을 만들지 않습니다.
    pub async fn table_exists(pool: &PgPool, table: &str) -> Result<bool, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            ) AS "present"
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        Ok(row.get::<bool, _>("present"))
    }

    // ==================== 삽입 ====================

    /// 정규화된 레코드 일괄 삽입.
    ///
    /// UNNEST 패턴을 사용하여 배치 전체를 한 번의 INSERT로 처리합니다.
    /// 숫자 필드의 `None`은 NULL 원소로 인코딩됩니다.
    pub async fn insert_batch(
        pool: &PgPool,
        table: &str,
        qcode: &str,
        records: &[NormalizedRecord],
    ) -> Result<u64, sqlx::Error> {
        if records.is_empty() {
            return Ok(0);
        }

        // 각 컬럼에 대한 배열 생성
        let qcodes: Vec<String> = records.iter().map(|_| qcode.to_string()).collect();
        let dates: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
        let portfolio_values: Vec<Option<Decimal>> =
            records.iter().map(|r| r.portfolio_value).collect();
        let capital_in_outs: Vec<Option<Decimal>> =
            records.iter().map(|r| r.capital_in_out).collect();
        let navs: Vec<Option<Decimal>> = records.iter().map(|r| r.nav).collect();
        let prev_navs: Vec<Option<Decimal>> = records.iter().map(|r| r.prev_nav).collect();
        let pnls: Vec<Option<Decimal>> = records.iter().map(|r| r.pnl).collect();
        let daily_p_ls: Vec<Option<Decimal>> = records.iter().map(|r| r.daily_p_l).collect();
        let exposure_values: Vec<Option<Decimal>> =
            records.iter().map(|r| r.exposure_value).collect();
        let prev_portfolio_values: Vec<Option<Decimal>> =
            records.iter().map(|r| r.prev_portfolio_value).collect();
        let prev_exposure_values: Vec<Option<Decimal>> =
            records.iter().map(|r| r.prev_exposure_value).collect();
        let prev_pnls: Vec<Option<Decimal>> = records.iter().map(|r| r.prev_pnl).collect();
        let drawdowns: Vec<Option<Decimal>> = records.iter().map(|r| r.drawdown).collect();
        let system_tags: Vec<String> = records.iter().map(|r| r.system_tag.clone()).collect();

        let query = format!(
            r#"
            INSERT INTO {} (
                qcode, date, portfolio_value, capital_in_out, nav, prev_nav,
                pnl, daily_p_l, exposure_value, prev_portfolio_value,
                prev_exposure_value, prev_pnl, drawdown, system_tag
            )
            SELECT * FROM UNNEST(
                $1::text[], $2::date[], $3::numeric[], $4::numeric[],
                $5::numeric[], $6::numeric[], $7::numeric[], $8::numeric[],
                $9::numeric[], $10::numeric[], $11::numeric[], $12::numeric[],
                $13::numeric[], $14::text[]
            )
            "#,
            table
        );

        let result = sqlx::query(&query)
            .bind(&qcodes)
            .bind(&dates)
            .bind(&portfolio_values)
            .bind(&capital_in_outs)
            .bind(&navs)
            .bind(&prev_navs)
            .bind(&pnls)
            .bind(&daily_p_ls)
            .bind(&exposure_values)
            .bind(&prev_portfolio_values)
            .bind(&prev_exposure_values)
            .bind(&prev_pnls)
            .bind(&drawdowns)
            .bind(&system_tags)
            .execute(pool)
            .await?;

        debug!(
            table = %table,
            rows = result.rows_affected(),
            "Bulk insert completed"
        );

        Ok(result.rows_affected())
    }

    /// 단건 삽입. 배치가 거부됐을 때의 행 단위 폴백 경로에서 사용합니다.
    pub async fn insert_row(
        pool: &PgPool,
        table: &str,
        qcode: &str,
        record: &NormalizedRecord,
    ) -> Result<(), sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO {} (
                qcode, date, portfolio_value, capital_in_out, nav, prev_nav,
                pnl, daily_p_l, exposure_value, prev_portfolio_value,
                prev_exposure_value, prev_pnl, drawdown, system_tag
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
            table
        );

        sqlx::query(&query)
            .bind(qcode)
            .bind(record.date)
            .bind(record.portfolio_value)
            .bind(record.capital_in_out)
            .bind(record.nav)
            .bind(record.prev_nav)
            .bind(record.pnl)
            .bind(record.daily_p_l)
            .bind(record.exposure_value)
            .bind(record.prev_portfolio_value)
            .bind(record.prev_exposure_value)
            .bind(record.prev_pnl)
            .bind(record.drawdown)
            .bind(&record.system_tag)
            .execute(pool)
            .await?;

        Ok(())
    }

    // ==================== 삭제/조회 ====================

    /// 행 삭제. 범위가 주어지면 해당 날짜 구간만, 없으면 전체를 비웁니다.
    pub async fn delete_rows(
        pool: &PgPool,
        table: &str,
        range: Option<&DateRange>,
    ) -> Result<u64, sqlx::Error> {
        let result = match range {
            Some(range) => {
                let query = format!("DELETE FROM {} WHERE date >= $1 AND date <= $2", table);
                sqlx::query(&query)
                    .bind(range.start)
                    .bind(range.end)
                    .execute(pool)
                    .await?
            }
            None => {
                let query = format!("DELETE FROM {}", table);
                sqlx::query(&query).execute(pool).await?
            }
        };

        debug!(
            table = %table,
            deleted = result.rows_affected(),
            "Rows deleted"
        );

        Ok(result.rows_affected())
    }

    /// 행 수 조회.
    pub async fn count_rows(pool: &PgPool, table: &str) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) AS row_count FROM {}", table);
        let row = sqlx::query(&query).fetch_one(pool).await?;
        Ok(row.get::<i64, _>("row_count"))
    }
}
