use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

use crate::error::ReportError;
use crate::models::{Cell, RawTable};

/// 读取第一个工作表，首行为表头
pub fn read_first_sheet(bytes: &[u8]) -> Result<RawTable, ReportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ReportError::Input(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ReportError::Input("the workbook has no worksheets".to_string()))?
        .map_err(|e| ReportError::Input(e.to_string()))?;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header_row) => header_row.iter().map(|d| d.to_string()).collect(),
        None => Vec::new(),
    };
    let rows = rows
        .map(|row| row.iter().map(to_cell).collect())
        .collect();

    Ok(RawTable { headers, rows })
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        other => Cell::Text(other.to_string()),
    }
}
