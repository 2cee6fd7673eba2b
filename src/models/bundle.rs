use std::path::PathBuf;

/// 单个销售员的拆分文件
#[derive(Debug, Clone)]
pub struct SplitArtifact {
    pub salesperson: String,
    pub path: PathBuf,
    pub rows: usize,
}

/// 一次请求生成的全部文件 (位于请求临时目录内，随目录一起删除)
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    pub split_files: Vec<SplitArtifact>,
    pub summary_workbook: PathBuf,
    pub pdf: PathBuf,
}

impl ArtifactBundle {
    /// ZIP 成员：各销售员文件 + 汇总工作簿 (PDF 单独下载)
    pub fn archive_members(&self) -> Vec<PathBuf> {
        self.split_files
            .iter()
            .map(|s| s.path.clone())
            .chain(std::iter::once(self.summary_workbook.clone()))
            .collect()
    }
}
