use std::io;

use thiserror::Error;

/// 报表生成过程中的错误
#[derive(Debug, Error)]
pub enum ReportError {
    /// 缺少必需列 (SchemaError)
    #[error("the file must contain the columns: {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    /// 金额列无法转换为非负数值 (ConversionError)
    #[error("row {row}: column '{column}' has a non-numeric or negative value '{value}'")]
    Conversion {
        row: usize,
        column: String,
        value: String,
    },

    /// 必需列存在但单元格为空
    #[error("row {row}: column '{column}' is empty")]
    MissingValue { row: usize, column: String },

    /// 上传文件无法解析
    #[error("unable to read the uploaded file: {0}")]
    Input(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("pdf error: {0}")]
    Pdf(String),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl ReportError {
    /// 用户输入类错误 (页面内提示)，其余为致命错误
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ReportError::Schema { .. }
                | ReportError::Conversion { .. }
                | ReportError::MissingValue { .. }
                | ReportError::Input(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_names_missing_columns() {
        let err = ReportError::Schema {
            missing: vec!["Produto".to_string(), "Vendas".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "the file must contain the columns: Produto, Vendas"
        );
        assert!(err.is_user_error());
    }

    #[test]
    fn io_errors_are_fatal() {
        let err = ReportError::from(io::Error::new(io::ErrorKind::Other, "disk full"));
        assert!(!err.is_user_error());
    }
}
