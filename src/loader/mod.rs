pub mod delimited;
pub mod spreadsheet;

use crate::error::ReportError;
use crate::models::RawTable;

/// 上传的文件
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            bytes,
        }
    }

    fn is_csv(&self) -> bool {
        self.file_name
            .as_deref()
            .map(|n| n.to_ascii_lowercase().ends_with(".csv"))
            .unwrap_or(false)
    }
}

/// 读取上传文件：.csv 走 CSV 解析，其余按表格文件处理
pub fn load_table(upload: &Upload) -> Result<RawTable, ReportError> {
    if upload.bytes.is_empty() {
        return Err(ReportError::Input("the uploaded file is empty".to_string()));
    }

    let table = if upload.is_csv() {
        delimited::read_csv(&upload.bytes)?
    } else {
        spreadsheet::read_first_sheet(&upload.bytes)?
    };

    tracing::info!(
        "Loaded {:?}: {} columns, {} rows",
        upload.file_name,
        table.headers.len(),
        table.rows.len()
    );
    Ok(table)
}
