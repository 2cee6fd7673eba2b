use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::Path;
use tempfile::TempDir;

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::loader::{self, Upload};
use crate::models::{ArtifactBundle, SalesTable, SummaryTable};
use crate::service::chart::{build_chart, ChartKind, ChartSpec};
use crate::service::{aggregator, packager, pdf, splitter, workbook};

/// 请求级上下文：临时目录随 drop 删除 (任何退出路径)
pub struct ReportContext {
    workdir: TempDir,
    generated_at: DateTime<Local>,
}

impl ReportContext {
    pub fn new(temp_root: Option<&Path>) -> Result<Self, ReportError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("sales-report-");
        let workdir = match temp_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(Self {
            workdir,
            generated_at: Local::now(),
        })
    }

    pub fn dir(&self) -> &Path {
        self.workdir.path()
    }

    pub fn generated_at(&self) -> DateTime<Local> {
        self.generated_at
    }
}

/// 一次完整生成的结果
#[derive(Debug, Clone)]
pub struct ReportOutput {
    pub summary: SummaryTable,
    /// relatorios_vendas.zip
    pub archive: Vec<u8>,
    /// relatorio_vendas.pdf
    pub pdf: Vec<u8>,
    pub archive_members: Vec<String>,
}

/// 页面预览：汇总表 + 两个图表模型
#[derive(Debug, Clone, Serialize)]
pub struct ReportPreview {
    pub summary: SummaryTable,
    pub sales_by_salesperson: Option<ChartSpec>,
    pub sales_by_product: Option<ChartSpec>,
}

/// 报表服务 (无状态，每次调用独立)
pub struct ReportService {
    config: ReportConfig,
}

impl ReportService {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    /// 读取 + 校验
    pub fn load(&self, upload: &Upload) -> Result<SalesTable, ReportError> {
        let raw = loader::load_table(upload)?;
        let table = SalesTable::from_raw(raw).map_err(|e| {
            tracing::warn!("Rejected upload {:?}: {}", upload.file_name, e);
            e
        })?;
        tracing::info!("校验通过: {} 条记录", table.len());
        Ok(table)
    }

    pub fn preview(&self, upload: &Upload) -> Result<ReportPreview, ReportError> {
        let table = self.load(upload)?;
        Ok(ReportPreview {
            summary: aggregator::summarize(&table),
            sales_by_salesperson: build_chart(&table, ChartKind::BySalesperson),
            sales_by_product: build_chart(&table, ChartKind::ByProduct),
        })
    }

    /// 完整流程：校验 -> 汇总 -> 拆分 -> 汇总工作簿 -> PDF -> ZIP
    pub fn generate_reports(&self, upload: &Upload) -> Result<ReportOutput, ReportError> {
        let ctx = ReportContext::new(self.config.temp_root.as_deref())?;
        self.generate_with_context(&ctx, upload)
    }

    pub fn generate_with_context(
        &self,
        ctx: &ReportContext,
        upload: &Upload,
    ) -> Result<ReportOutput, ReportError> {
        let table = self.load(upload)?;
        let summary = aggregator::summarize(&table);
        tracing::info!("汇总完成: {} 个销售员", summary.len());

        let bundle = ArtifactBundle {
            split_files: splitter::split_by_salesperson(&table, ctx.dir())?,
            summary_workbook: workbook::build_summary_workbook(&table, &summary, ctx.dir())?,
            pdf: pdf::build_pdf_report(&summary, &table, ctx.generated_at(), ctx.dir())?,
        };

        for split in &bundle.split_files {
            tracing::info!(
                "拆分文件 {} -> {} ({} 行)",
                split.salesperson,
                split.path.display(),
                split.rows
            );
        }

        let members = bundle.archive_members();
        let archive = packager::package(&members)?;
        let pdf = std::fs::read(&bundle.pdf)?;

        let archive_members = members
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .collect();

        tracing::info!(
            "Reports generated: {} split files, archive {} bytes, pdf {} bytes",
            bundle.split_files.len(),
            archive.len(),
            pdf.len()
        );

        Ok(ReportOutput {
            summary,
            archive,
            pdf,
            archive_members,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv(body: &str) -> Upload {
        Upload::new("vendas.csv", body.as_bytes().to_vec())
    }

    #[test]
    fn context_directory_is_removed_on_drop() {
        let ctx = ReportContext::new(None).unwrap();
        let dir = ctx.dir().to_path_buf();
        assert!(dir.exists());
        drop(ctx);
        assert!(!dir.exists());
    }

    #[test]
    fn context_directory_is_removed_after_failure() {
        let service = ReportService::new(ReportConfig::default());
        let ctx = ReportContext::new(None).unwrap();
        let dir = ctx.dir().to_path_buf();

        let err = service
            .generate_with_context(&ctx, &csv("Vendedor,Vendas\nAna,1\n"))
            .unwrap_err();
        assert!(matches!(err, ReportError::Schema { ref missing } if missing == &["Produto"]));
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
        drop(ctx);
        assert!(!dir.exists());
    }

    #[test]
    fn temp_root_is_honoured() {
        let root = tempfile::tempdir().unwrap();
        let ctx = ReportContext::new(Some(root.path())).unwrap();
        assert!(ctx.dir().starts_with(root.path()));
    }

    #[test]
    fn preview_has_summary_and_charts() {
        let service = ReportService::new(ReportConfig::default());
        let preview = service
            .preview(&csv("Vendedor,Produto,Vendas\nAna,X,10.0\nAna,Y,15.0\n"))
            .unwrap();
        assert_eq!(preview.summary.len(), 1);
        assert_eq!(preview.summary.get("Ana").unwrap().to_string(), "25.0");
        assert_eq!(preview.sales_by_product.unwrap().points.len(), 2);
    }
}
