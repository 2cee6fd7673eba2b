use bigdecimal::{BigDecimal, ToPrimitive};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Worksheet, XlsxError};

use crate::models::{Cell, SalesRecord};

/// 各工作簿共用的单元格格式
pub struct SheetFormats {
    pub header: Format,
    pub amount: Format,
}

impl SheetFormats {
    pub fn new() -> Self {
        Self {
            header: Format::new()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_border(FormatBorder::Thin),
            amount: Format::new().set_num_format("#,##0.00"),
        }
    }
}

impl Default for SheetFormats {
    fn default() -> Self {
        Self::new()
    }
}

pub fn amount_as_f64(amount: &BigDecimal) -> f64 {
    amount.to_f64().unwrap_or_default()
}

/// 写表头 + 原始记录 (保留所有列及原始顺序)
pub fn write_records(
    sheet: &mut Worksheet,
    columns: &[String],
    amount_col: usize,
    records: &[&SalesRecord],
    formats: &SheetFormats,
) -> Result<(), XlsxError> {
    for (col, name) in columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, name, &formats.header)?;
        sheet.set_column_width(col as u16, 16)?;
    }

    for (idx, record) in records.iter().enumerate() {
        let row = idx as u32 + 1;
        for (col, cell) in record.cells.iter().enumerate() {
            let col_num = col as u16;
            if col == amount_col {
                sheet.write_number_with_format(
                    row,
                    col_num,
                    amount_as_f64(&record.amount),
                    &formats.amount,
                )?;
                continue;
            }
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => {
                    sheet.write_string(row, col_num, s)?;
                }
                Cell::Number(n) => {
                    sheet.write_number(row, col_num, *n)?;
                }
                Cell::Bool(b) => {
                    sheet.write_boolean(row, col_num, *b)?;
                }
            }
        }
    }
    Ok(())
}
