pub mod handlers;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;

use crate::config::AppConfig;
use crate::service::ReportService;

pub use handlers::*;

/// 构建路由 (上传大小上限取自配置)
pub fn router(service: Arc<ReportService>, config: &AppConfig) -> Router {
    let upload_limit = config.report.max_upload_bytes;

    let report_routes = Router::new()
        .route("/api/reports/preview", post(handlers::preview_report))
        .route("/api/reports/bundle", post(handlers::download_bundle))
        .route("/api/reports/pdf", post(handlers::download_pdf))
        .with_state(service);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/template", get(handlers::download_template))
        .merge(report_routes)
        .layer(ServiceBuilder::new().layer(DefaultBodyLimit::max(upload_limit)))
}
