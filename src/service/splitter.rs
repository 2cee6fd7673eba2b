use rust_xlsxwriter::Workbook;
use std::path::Path;

use crate::error::ReportError;
use crate::models::{SalesTable, SplitArtifact};
use crate::service::aggregator;
use crate::service::naming::{sanitize_file_stem, NameRegistry, FILE_STEM_MAX_BYTES};
use crate::service::sheet::{write_records, SheetFormats};

/// 汇总工作簿文件名主干，拆分文件不得占用
pub const SUMMARY_WORKBOOK_STEM: &str = "planilha_resumo";

/// 按销售员拆分：每人一个 `<名称>.xlsx`，包含其全部原始记录
pub fn split_by_salesperson(
    table: &SalesTable,
    dir: &Path,
) -> Result<Vec<SplitArtifact>, ReportError> {
    let formats = SheetFormats::new();
    let mut names = NameRegistry::with_max_bytes(FILE_STEM_MAX_BYTES);
    names.reserve(SUMMARY_WORKBOOK_STEM);

    let groups = aggregator::partition(table);
    let mut artifacts = Vec::with_capacity(groups.len());

    for (salesperson, records) in groups {
        let stem = names.allocate(&sanitize_file_stem(salesperson));
        let path = dir.join(format!("{}.xlsx", stem));

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        write_records(
            sheet,
            table.columns(),
            table.schema().amount,
            &records,
            &formats,
        )?;
        workbook.save(&path)?;

        artifacts.push(SplitArtifact {
            salesperson: salesperson.to_string(),
            path,
            rows: records.len(),
        });
    }

    Ok(artifacts)
}
