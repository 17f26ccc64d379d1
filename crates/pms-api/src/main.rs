//! 포트폴리오 관리 대시보드 API 서버.
//!
//! Axum 기반 REST API 서버를 시작합니다.
//! 헬스 체크와 마스터 시트 CSV 인제스트 엔드포인트를 제공합니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, Router};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use pms_api::openapi::swagger_ui_router;
use pms_api::routes::create_api_router;
use pms_api::state::AppState;
use pms_core::{AppConfig, ServerConfig};

/// 설정 파일 로드.
///
/// `PMS_CONFIG` 환경변수가 가리키는 파일을 우선 사용하고, 없으면
/// `config/default.toml`을 시도합니다. 둘 다 없으면 내장 기본값을 사용합니다.
fn load_app_config() -> AppConfig {
    let path = std::env::var("PMS_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

    if std::path::Path::new(&path).exists() {
        match AppConfig::load(&path) {
            Ok(config) => {
                info!(path = %path, "Configuration loaded from file");
                return config;
            }
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to load config file, using defaults");
            }
        }
    }

    AppConfig::default()
}

/// 바인딩 주소 결정.
///
/// 설정 파일 값을 `API_HOST`/`API_PORT` 환경변수로 덮어쓸 수 있습니다.
///
/// # Errors
/// `host:port` 형식이 유효하지 않으면 `AddrParseError`를 반환합니다.
fn socket_addr(server: &ServerConfig) -> Result<SocketAddr, std::net::AddrParseError> {
    let host = std::env::var("API_HOST").unwrap_or_else(|_| server.host.clone());
    let port = std::env::var("API_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(server.port);

    format!("{}:{}", host, port).parse()
}

/// AppState 초기화.
///
/// 인제스트 파이프라인은 스토리지 없이는 동작하지 않으므로 `DATABASE_URL`이
/// 없거나 연결에 실패하면 서버를 시작하지 않습니다.
async fn create_app_state(config: &AppConfig) -> Result<AppState, Box<dyn std::error::Error>> {
    let database_url = std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL is not set")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.connection_timeout_secs))
        .idle_timeout(Duration::from_secs(config.database.idle_timeout_secs))
        .connect(&database_url)
        .await?;

    // 연결 테스트
    sqlx::query("SELECT 1").fetch_one(&pool).await?;
    info!("Connected to PostgreSQL successfully");

    Ok(AppState::new(pool).with_ingest_config(config.ingest.clone()))
}

/// CORS 미들웨어 구성.
///
/// CORS_ORIGINS 환경변수가 설정되어 있으면 해당 origin만 허용합니다.
/// 설정되지 않으면 개발 모드로 간주하여 모든 origin을 허용합니다.
///
/// # 환경변수
///
/// - `CORS_ORIGINS`: 쉼표로 구분된 허용 origin 목록
///   예: `https://dashboard.example.com,https://admin.example.com`
fn cors_layer() -> CorsLayer {
    let allow_origin = match std::env::var("CORS_ORIGINS") {
        Ok(origins) if !origins.is_empty() => {
            // 프로덕션: 특정 origin만 허용
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                warn!("CORS_ORIGINS is set but contains no valid origins, allowing any");
                AllowOrigin::any()
            } else {
                info!("CORS configured with {} allowed origins", origins.len());
                AllowOrigin::list(origins)
            }
        }
        _ => {
            // 개발: 모든 origin 허용
            warn!("CORS_ORIGINS not set, allowing any origin (development mode)");
            AllowOrigin::any()
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        // 허용되는 HTTP 메서드
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        // 허용되는 헤더
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ])
        // 자격 증명 포함 허용 (CORS_ORIGINS 설정 시에만)
        .allow_credentials(std::env::var("CORS_ORIGINS").is_ok())
        // preflight 요청 캐시 시간
        .max_age(Duration::from_secs(3600))
}

/// 전체 라우터 생성.
fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(create_api_router().with_state(state))
        // OpenAPI 문서 및 Swagger UI
        .merge(swagger_ui_router())
        .layer(TraceLayer::new_for_http())
        // 전역 타임아웃 (30초) - 408 상태 코드 반환
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(cors_layer())
}

/// OpenAPI 스펙 내보내기 처리.
///
/// `--export-openapi` 플래그 또는 `EXPORT_OPENAPI` 환경변수가 설정된 경우
/// OpenAPI JSON 스펙을 stdout으로 출력하고 종료합니다.
fn handle_export_openapi() -> Result<(), Box<dyn std::error::Error>> {
    use pms_api::openapi::ApiDoc;
    use utoipa::OpenApi as _;

    let export_flag = std::env::args().any(|arg| arg == "--export-openapi");
    let export_env = std::env::var("EXPORT_OPENAPI")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    if export_flag || export_env {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&spec)?;
        println!("{}", json);
        std::process::exit(0);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    // OpenAPI 내보내기 처리 (서버 시작 전)
    handle_export_openapi()?;

    // tracing 초기화
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pms_api=info,tower_http=debug".into()),
        )
        .init();

    info!("Starting PMS API server...");

    // 설정 로드
    let config = load_app_config();
    let addr = socket_addr(&config.server).map_err(|e| {
        error!(
            host = %config.server.host,
            port = config.server.port,
            error = %e,
            "소켓 주소 설정이 유효하지 않습니다. API_HOST, API_PORT 환경변수를 확인하세요."
        );
        e
    })?;

    // AppState 생성 (DB 연결 포함)
    let state = Arc::new(create_app_state(&config).await?);

    info!(
        version = %state.version,
        batch_size = state.ingest.batch_size,
        "Application state initialized"
    );

    // 라우터 생성
    let app = create_router(state);

    // 서버 시작
    info!(%addr, "API server listening");
    info!("Swagger UI available at http://{}/swagger-ui", addr);
    info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");

    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 반환하여 진행 중인 요청이
/// 완료된 뒤 서버가 종료되게 합니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
