use std::net::TcpListener;
use session_auth::auth::TokenEngine;
use session_auth::configuration::get_configuration;
use session_auth::error::{AppError, ErrorHandler};
use session_auth::startup::run;
use session_auth::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // 구조화된 로깅 초기화
    init_telemetry();

    tracing::info!("Starting application");

    // 설정 로드
    let configuration = get_configuration()
        .map_err(|e| startup_error(AppError::from(e)))?;
    tracing::info!("Configuration loaded successfully");

    // 토큰 엔진 생성: 알고리즘/시크릿/만료 설정은 여기서 한 번만 검증
    let engine = TokenEngine::new(&configuration.jwt)
        .map_err(|e| startup_error(AppError::from(e)))?;
    tracing::info!(
        algorithm = %engine.algorithm(),
        access_ttl_secs = engine.access_token_lifetime().num_seconds(),
        refresh_ttl_secs = engine.refresh_token_lifetime().num_seconds(),
        "Token engine ready"
    );

    // 서버 주소 설정
    let address = configuration.application.address();
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    // 서버 실행
    run(listener, engine)?.await
}

fn startup_error(err: AppError) -> std::io::Error {
    err.log_error("startup");
    std::io::Error::new(std::io::ErrorKind::InvalidInput, err.to_string())
}
