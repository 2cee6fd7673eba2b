use rust_xlsxwriter::Workbook;

use crate::error::ReportError;
use crate::models::REQUIRED_COLUMNS;
use crate::service::sheet::SheetFormats;

pub const TEMPLATE_FILE_NAME: &str = "modelo_vendas.xlsx";

/// 示例数据行
const EXAMPLE_ROWS: [(&str, &str, f64); 2] = [("João", "Caneta", 150.50), ("Maria", "Caderno", 320.00)];

/// 生成可下载的模板表格 (与主流程无关)
pub fn template_workbook() -> Result<Vec<u8>, ReportError> {
    let formats = SheetFormats::new();
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, name) in REQUIRED_COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &formats.header)?;
        sheet.set_column_width(col as u16, 16)?;
    }
    for (idx, (salesperson, product, amount)) in EXAMPLE_ROWS.iter().enumerate() {
        let row = idx as u32 + 1;
        sheet.write_string(row, 0, *salesperson)?;
        sheet.write_string(row, 1, *product)?;
        sheet.write_number_with_format(row, 2, *amount, &formats.amount)?;
    }

    Ok(workbook.save_to_buffer()?)
}
