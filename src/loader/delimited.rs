use csv::ReaderBuilder;

use crate::error::ReportError;
use crate::models::{Cell, RawTable};

/// 解析 CSV：首行为表头，字段均按文本读取，空字段记为 Empty
pub fn read_csv(bytes: &[u8]) -> Result<RawTable, ReportError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(bytes);

    let headers = rdr
        .headers()
        .map_err(|e| ReportError::Input(e.to_string()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| ReportError::Input(e.to_string()))?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(RawTable { headers, rows })
}
