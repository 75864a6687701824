use initials_avatar::cors::build_cors_layer;
use initials_avatar::startup::run_startup_checks;
use initials_avatar::{AppConfig, AppState, ShutdownManager, build_router};

#[tokio::main]
async fn main() {
    // 先加载配置，日志级别依赖配置（RUST_LOG 优先）
    let config_result = AppConfig::init_global();
    let level = config_result
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("initials_avatar={level},tower_http=info").into()),
        )
        .init();

    let config = match config_result {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Config init failed: {}", e);
            std::process::exit(1);
        }
    };

    let shutdown_manager = ShutdownManager::new();
    shutdown_manager.start_signal_handler();

    let store = match run_startup_checks(config).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("启动检查失败: {}", e);
            std::process::exit(1);
        }
    };

    let parallelism = config.image.effective_parallelism();
    tracing::info!("渲染并发上限: {}", parallelism);
    let state = AppState::new(store, parallelism);

    let mut app = build_router(state);
    if let Some(cors) = build_cors_layer(&config.cors) {
        app = app.layer(cors);
        tracing::info!("CORS 已启用");
    }

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    tracing::info!("Server: http://{}", addr);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!("Health: http://{}/health", addr);
    tracing::info!("Generate: POST http://{}/generate", addr);
    tracing::info!("Variants: POST http://{}/generate-variants", addr);
    tracing::info!("Bulk: POST http://{}/bulk-generate", addr);
    tracing::info!("Images: {:?}", config.output_dir());

    let shutdown_timeout = config.shutdown.timeout_duration();
    let signal_manager = shutdown_manager.clone();
    let graceful = axum::serve(listener, app).with_graceful_shutdown(async move {
        let reason = signal_manager.wait_for_shutdown().await;
        tracing::info!("接收到退出信号: {:?}，开始优雅关闭HTTP服务器...", reason);
    })
    .into_future();

    // 退出信号之后，最多等待 timeout 让在途请求完成
    let deadline = async {
        shutdown_manager.wait_for_shutdown().await;
        tokio::time::sleep(shutdown_timeout).await;
    };

    tokio::select! {
        result = graceful => {
            if let Err(e) = result {
                tracing::error!("服务器运行错误: {}", e);
                std::process::exit(1);
            }
            tracing::info!("服务器已优雅关闭");
        }
        _ = deadline => {
            tracing::warn!(
                "优雅退出超时（{}秒），强制退出",
                config.shutdown.timeout_secs
            );
        }
    }
}
