use crate::error::ReportError;
use crate::loader::Upload;
use crate::models::SummaryTable;
use crate::service::packager::ARCHIVE_FILE_NAME;
use crate::service::pdf::PDF_FILE_NAME;
use crate::service::template::{template_workbook, TEMPLATE_FILE_NAME};
use crate::service::{ChartSpec, ReportService};
use axum::{
    extract::{Json, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::io;
use std::sync::Arc;

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const ZIP_MIME: &str = "application/zip";
pub const PDF_MIME: &str = "application/pdf";

/// 上传字段名
const UPLOAD_FIELD: &str = "file";

/// 响应体
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SummaryTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charts: Option<Vec<ChartSpec>>,
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 下载模板表格
pub async fn download_template() -> Response {
    match template_workbook() {
        Ok(bytes) => attachment(bytes, TEMPLATE_FILE_NAME, XLSX_MIME),
        Err(e) => error_response(e),
    }
}

/// 预览：汇总表 + 图表数据
pub async fn preview_report(
    State(service): State<Arc<ReportService>>,
    multipart: Multipart,
) -> Response {
    let result = match read_upload(multipart).await {
        Ok(upload) => run_blocking(service, move |s| s.preview(&upload)).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(preview) => {
            let response = ReportResponse {
                success: true,
                message: format!("Loaded {} salespeople", preview.summary.len()),
                summary: Some(preview.summary),
                charts: Some(
                    preview
                        .sales_by_salesperson
                        .into_iter()
                        .chain(preview.sales_by_product)
                        .collect(),
                ),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// 下载 relatorios_vendas.zip
pub async fn download_bundle(
    State(service): State<Arc<ReportService>>,
    multipart: Multipart,
) -> Response {
    let result = match read_upload(multipart).await {
        Ok(upload) => run_blocking(service, move |s| s.generate_reports(&upload)).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(output) => attachment(output.archive, ARCHIVE_FILE_NAME, ZIP_MIME),
        Err(e) => error_response(e),
    }
}

/// 下载 relatorio_vendas.pdf
pub async fn download_pdf(
    State(service): State<Arc<ReportService>>,
    multipart: Multipart,
) -> Response {
    let result = match read_upload(multipart).await {
        Ok(upload) => run_blocking(service, move |s| s.generate_reports(&upload)).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(output) => attachment(output.pdf, PDF_FILE_NAME, PDF_MIME),
        Err(e) => error_response(e),
    }
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, ReportError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ReportError::Input(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ReportError::Input(e.to_string()))?;
        return Ok(Upload {
            file_name,
            bytes: bytes.to_vec(),
        });
    }
    Err(ReportError::Input(format!(
        "missing multipart field '{}'",
        UPLOAD_FIELD
    )))
}

/// 同步流程放到阻塞线程池执行
async fn run_blocking<T, F>(service: Arc<ReportService>, f: F) -> Result<T, ReportError>
where
    F: FnOnce(&ReportService) -> Result<T, ReportError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&service))
        .await
        .map_err(|e| ReportError::Io(io::Error::new(io::ErrorKind::Other, e)))?
}

fn attachment(bytes: Vec<u8>, file_name: &str, content_type: &'static str) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response()
}

fn error_response(e: ReportError) -> Response {
    let status = if e.is_user_error() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        tracing::error!("Report generation failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    };
    let response = ReportResponse {
        success: false,
        message: format!("Error: {}", e),
        summary: None,
        charts: None,
    };
    (status, Json(response)).into_response()
}
