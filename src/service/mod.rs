pub mod aggregator;
pub mod chart;
pub mod naming;
pub mod packager;
pub mod pdf;
pub mod report;
pub mod sheet;
pub mod splitter;
pub mod template;
pub mod workbook;

pub use chart::{build_chart, ChartKind, ChartSpec};
pub use report::{ReportContext, ReportOutput, ReportPreview, ReportService};
