use std::sync::Arc;
use sales_report_rust::{api, AppConfig, ReportService};
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    let service = Arc::new(ReportService::new(config.report.clone()));
    let app = api::router(service, &config);

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET  /api/template         - modelo_vendas.xlsx");
    info!("  POST /api/reports/preview  - summary table + chart data (JSON)");
    info!("  POST /api/reports/bundle   - relatorios_vendas.zip");
    info!("  POST /api/reports/pdf      - relatorio_vendas.pdf");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
