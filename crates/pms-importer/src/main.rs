//! Standalone master sheet importer CLI.

use clap::{Parser, Subcommand};
use pms_core::{init_logging, LogConfig, LogFormat};
use pms_importer::{config, modules, ImporterConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pms-importer")]
#[command(about = "PMS Master Sheet Importer", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 로그 형식 (pretty, json, compact)
    #[arg(long, default_value = "pretty")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// CSV 파일 사전 검증 (DB 접근 없음)
    Check {
        /// 검증할 CSV 파일 경로
        file: PathBuf,

        /// 포함 범위 시작일 (YYYY-MM-DD, --end-date와 함께 지정)
        #[arg(long)]
        start_date: Option<String>,

        /// 포함 범위 종료일 (YYYY-MM-DD, --start-date와 함께 지정)
        #[arg(long)]
        end_date: Option<String>,
    },

    /// CSV 파일을 계정 테이블에 임포트
    Import {
        /// 임포트할 CSV 파일 경로
        file: PathBuf,

        /// 대상 계정 코드 (소문자 영숫자와 밑줄만 허용)
        #[arg(long)]
        qcode: String,

        /// 포함 범위 시작일 (YYYY-MM-DD, --end-date와 함께 지정)
        #[arg(long)]
        start_date: Option<String>,

        /// 포함 범위 종료일 (YYYY-MM-DD, --start-date와 함께 지정)
        #[arg(long)]
        end_date: Option<String>,

        /// 기존 테이블을 비운 뒤 삽입
        #[arg(long)]
        replace: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 로깅 초기화
    let format = cli.log_format.parse().unwrap_or(LogFormat::Pretty);
    init_logging(
        LogConfig::new(format!(
            "pms_importer={level},pms_data={level},pms_core={level}",
            level = cli.log_level
        ))
        .with_format(format),
    )?;

    tracing::info!("PMS Master Sheet Importer 시작");

    match cli.command {
        Commands::Check {
            file,
            start_date,
            end_date,
        } => {
            let ingest = config::load_ingest_config();
            let stats = modules::check_file(
                &file,
                start_date.as_deref(),
                end_date.as_deref(),
                ingest.failed_row_sample,
            )?;
            stats.log_summary("파일 검증");
        }
        Commands::Import {
            file,
            qcode,
            start_date,
            end_date,
            replace,
        } => {
            // 설정 로드
            let importer_config = ImporterConfig::from_env()?;
            tracing::debug!(
                batch_size = importer_config.ingest.batch_size,
                "설정 로드 완료"
            );

            // DB 연결
            let pool = sqlx::PgPool::connect(&importer_config.database_url).await?;
            tracing::info!("데이터베이스 연결 성공");

            let operation = if replace {
                "전체 교체 임포트"
            } else {
                "추가 임포트"
            };
            let options = modules::ImportOptions {
                qcode,
                start_date,
                end_date,
                replace,
            };

            let stats = modules::import_file(&pool, &importer_config, &file, &options).await?;
            stats.log_summary(operation);

            pool.close().await;
        }
    }

    tracing::info!("PMS Master Sheet Importer 종료");

    Ok(())
}
