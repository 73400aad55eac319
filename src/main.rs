use contract_audit_rust::{router, AppConfig, AppState, AuditReportService, BackendClient, RouteGuard};
use tracing::{info, warn};
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 使用本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置: config 文件 + APP__ 环境变量, 失败时退回普通环境变量
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load layered config ({}), falling back to env", e);
            AppConfig::from_env()
        }
    };
    info!("Starting server with config: {:?}", config);

    // 后端客户端, 配置了服务账号时先登录
    let client = BackendClient::new(&config.backend)?;
    if let (Some(email), Some(password)) = (&config.backend.email, &config.backend.password) {
        match client.login(email, password).await {
            Ok(_) => info!("Backend session established: {}", client.base_url()),
            Err(e) => warn!("Backend login failed, requests go out without token: {}", e),
        }
    }

    let reports = AuditReportService::new(client.clone(), config.report.clone());
    let guard = RouteGuard::new(&config.auth.jwt_secret, config.auth.allowed_roles.clone())?;
    let app = router(AppState::new(reports, guard)?);

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET  /api/contracts/:id/audit[.html|.pdf|.csv]");
    info!("  GET  /api/receipts/:id/audit[.html|.pdf]");
    info!("  GET  /api/documents/:kind/:id/file");
    info!("  GET|PATCH /api/documents/:kind/:id/fields");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 退出前注销服务账号
    if client.is_logged_in() {
        if let Err(e) = client.logout().await {
            warn!("Backend logout failed, local session cleared anyway: {}", e);
        }
    }
    info!("Server stopped");

    Ok(())
}

/// 监听 Ctrl+C 与 SIGTERM
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
