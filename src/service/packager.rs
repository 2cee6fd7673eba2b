use std::fs::File;
use std::io::{self, Cursor};
use std::path::PathBuf;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::ReportError;

pub const ARCHIVE_FILE_NAME: &str = "relatorios_vendas.zip";

/// 打包为内存 ZIP：只保留文件名，丢弃目录结构
///
/// 固定条目时间戳，相同输入得到相同的归档。
pub fn package(paths: &[PathBuf]) -> Result<Vec<u8>, ReportError> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("not a file path: {}", path.display()),
                )
            })?;
        zip.start_file(name, options)?;
        let mut file = File::open(path)?;
        io::copy(&mut file, &mut zip)?;
    }

    let bytes = zip.finish()?.into_inner();
    tracing::info!("打包完成: {} 个文件, {} bytes", paths.len(), bytes.len());
    Ok(bytes)
}
