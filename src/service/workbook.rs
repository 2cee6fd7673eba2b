use rust_xlsxwriter::{
    Chart, ChartDataLabel, ChartLegendPosition, ChartPoint as XlsxChartPoint, ChartSolidFill,
    ChartType, Color, Workbook, Worksheet, XlsxError,
};
use std::path::{Path, PathBuf};

use crate::error::ReportError;
use crate::models::{SalesTable, SummaryTable, GROUP_COLUMN};
use crate::service::aggregator;
use crate::service::chart::{build_chart, ChartKind, ChartSpec, BAR_COLOR};
use crate::service::naming::{sanitize_sheet_name, NameRegistry, SHEET_NAME_MAX_LEN};
use crate::service::sheet::{amount_as_f64, write_records, SheetFormats};
use crate::service::splitter::SUMMARY_WORKBOOK_STEM;

pub const SUMMARY_SHEET: &str = "Resumo";
pub const CHARTS_SHEET: &str = "Gráficos";
pub const TOTAL_COLUMN: &str = "Total de Vendas";

const CHART_WIDTH: u32 = 480;
const CHART_HEIGHT: u32 = 300;

/// 生成 planilha_resumo.xlsx：Resumo + Gráficos + 每个销售员一张表
pub fn build_summary_workbook(
    table: &SalesTable,
    summary: &SummaryTable,
    dir: &Path,
) -> Result<PathBuf, ReportError> {
    let path = dir.join(format!("{}.xlsx", SUMMARY_WORKBOOK_STEM));
    let mut workbook = summary_workbook(table, summary)?;
    workbook.save(&path)?;
    tracing::info!("汇总工作簿 {}", path.display());
    Ok(path)
}

fn summary_workbook(table: &SalesTable, summary: &SummaryTable) -> Result<Workbook, XlsxError> {
    let formats = SheetFormats::new();
    let mut workbook = Workbook::new();

    // Resumo
    let sheet = workbook.add_worksheet();
    sheet.set_name(SUMMARY_SHEET)?;
    sheet.write_string_with_format(0, 0, GROUP_COLUMN, &formats.header)?;
    sheet.write_string_with_format(0, 1, TOTAL_COLUMN, &formats.header)?;
    sheet.set_column_width(0, 28)?;
    sheet.set_column_width(1, 18)?;
    for (idx, row) in summary.iter().enumerate() {
        let r = idx as u32 + 1;
        sheet.write_string(r, 0, &row.salesperson)?;
        sheet.write_number_with_format(r, 1, amount_as_f64(&row.total), &formats.amount)?;
    }

    // Gráficos
    let sheet = workbook.add_worksheet();
    sheet.set_name(CHARTS_SHEET)?;
    let bar = build_chart(table, ChartKind::BySalesperson);
    let pie = build_chart(table, ChartKind::ByProduct);
    match (&bar, &pie) {
        (None, None) => {
            sheet.write_string(0, 0, "Sem dados")?;
        }
        _ => {
            if let Some(spec) = &bar {
                write_chart_data(sheet, spec, 0, &formats)?;
                sheet.insert_chart(1, 7, &column_chart(spec))?;
            }
            if let Some(spec) = &pie {
                write_chart_data(sheet, spec, 3, &formats)?;
                sheet.insert_chart(22, 7, &pie_chart(spec))?;
            }
        }
    }

    // 每个销售员一张表
    let mut names = NameRegistry::with_max_len(SHEET_NAME_MAX_LEN);
    names.reserve(SUMMARY_SHEET);
    names.reserve(CHARTS_SHEET);
    names.reserve("History");
    for (salesperson, records) in aggregator::partition(table) {
        let name = names.allocate(&sanitize_sheet_name(salesperson));
        let sheet = workbook.add_worksheet();
        sheet.set_name(&name)?;
        write_records(
            sheet,
            table.columns(),
            table.schema().amount,
            &records,
            &formats,
        )?;
    }

    Ok(workbook)
}

/// 图表数据区：两列 (类别, 金额)，从第 first_col 列开始
fn write_chart_data(
    sheet: &mut Worksheet,
    spec: &ChartSpec,
    first_col: u16,
    formats: &SheetFormats,
) -> Result<(), XlsxError> {
    sheet.write_string_with_format(0, first_col, &spec.category_axis, &formats.header)?;
    sheet.write_string_with_format(0, first_col + 1, &spec.value_axis, &formats.header)?;
    sheet.set_column_width(first_col, 22)?;
    sheet.set_column_width(first_col + 1, 16)?;
    for (idx, point) in spec.points.iter().enumerate() {
        let r = idx as u32 + 1;
        sheet.write_string(r, first_col, &point.label)?;
        sheet.write_number_with_format(
            r,
            first_col + 1,
            amount_as_f64(&point.value),
            &formats.amount,
        )?;
    }
    Ok(())
}

/// (工作表, 起始行, 起始列, 结束行, 结束列)
type ChartRange = (&'static str, u32, u16, u32, u16);

fn data_ranges(spec: &ChartSpec, first_col: u16) -> (ChartRange, ChartRange) {
    let last_row = spec.points.len() as u32;
    (
        (CHARTS_SHEET, 1, first_col, last_row, first_col),
        (CHARTS_SHEET, 1, first_col + 1, last_row, first_col + 1),
    )
}

fn column_chart(spec: &ChartSpec) -> Chart {
    let (categories, values) = data_ranges(spec, 0);
    let mut chart = Chart::new(ChartType::Column);
    chart.title().set_name(spec.title.as_str());
    chart.x_axis().set_name(spec.category_axis.as_str());
    chart.y_axis().set_name(spec.value_axis.as_str());
    chart.legend().set_hidden();
    chart
        .add_series()
        .set_name(spec.value_axis.as_str())
        .set_categories(categories)
        .set_values(values)
        .set_format(ChartSolidFill::new().set_color(Color::RGB(BAR_COLOR)))
        .set_data_label(ChartDataLabel::new().show_value().set_num_format("0.00"));
    chart.set_width(CHART_WIDTH).set_height(CHART_HEIGHT);
    chart
}

fn pie_chart(spec: &ChartSpec) -> Chart {
    let (categories, values) = data_ranges(spec, 3);
    let points: Vec<XlsxChartPoint> = spec
        .points
        .iter()
        .map(|p| {
            XlsxChartPoint::new().set_format(ChartSolidFill::new().set_color(Color::RGB(p.color)))
        })
        .collect();

    let mut chart = Chart::new(ChartType::Pie);
    chart.title().set_name(spec.title.as_str());
    chart.legend().set_position(ChartLegendPosition::Right);
    chart
        .add_series()
        .set_name(spec.legend_title.as_deref().unwrap_or(spec.category_axis.as_str()))
        .set_categories(categories)
        .set_values(values)
        .set_points(&points)
        .set_data_label(ChartDataLabel::new().show_percentage().set_num_format("0.0%"));
    chart.set_width(CHART_WIDTH).set_height(CHART_HEIGHT);
    chart
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sales::tests::table;
    use crate::service::aggregator::summarize;
    use calamine::{open_workbook_auto, Data, Reader};

    #[test]
    fn sheets_are_summary_charts_then_salespeople() {
        let dir = tempfile::tempdir().unwrap();
        let t = table(&[("João", "Caneta", 150.5), ("Maria", "Caderno", 320.0)]);
        let path = build_summary_workbook(&t, &summarize(&t), dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "planilha_resumo.xlsx");

        let mut wb = open_workbook_auto(&path).unwrap();
        assert_eq!(wb.sheet_names(), vec!["Resumo", "Gráficos", "João", "Maria"]);

        let resumo = wb.worksheet_range("Resumo").unwrap();
        let rows: Vec<_> = resumo.rows().collect();
        assert_eq!(rows[0][1], Data::String("Total de Vendas".into()));
        assert_eq!(rows[1][0], Data::String("João".into()));
        assert_eq!(rows[1][1], Data::Float(150.5));
        assert_eq!(rows[2][1], Data::Float(320.0));

        let graficos = wb.worksheet_range("Gráficos").unwrap();
        // 柱状图数据按金额降序
        assert_eq!(graficos.get_value((1, 0)), Some(&Data::String("Maria".into())));
    }

    #[test]
    fn long_sheet_names_are_truncated_and_unique() {
        let dir = tempfile::tempdir().unwrap();
        let t = table(&[
            ("Maria Aparecida dos Santos Oliveira", "X", 1.0),
            ("Maria Aparecida dos Santos Olivares", "Y", 2.0),
            ("Resumo", "Z", 3.0),
        ]);
        let path = build_summary_workbook(&t, &summarize(&t), dir.path()).unwrap();

        let wb = open_workbook_auto(&path).unwrap();
        let names = wb.sheet_names();
        assert_eq!(names[2], "Maria Aparecida dos Santos Oliv");
        assert_eq!(names[3], "Maria Aparecida dos Santos (2)");
        assert_eq!(names[4], "Resumo (2)");
        assert!(names.iter().all(|n| n.chars().count() <= 31));
    }

    #[test]
    fn empty_table_still_has_summary_and_chart_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let t = table(&[]);
        let path = build_summary_workbook(&t, &summarize(&t), dir.path()).unwrap();

        let mut wb = open_workbook_auto(&path).unwrap();
        assert_eq!(wb.sheet_names(), vec!["Resumo", "Gráficos"]);
        let graficos = wb.worksheet_range("Gráficos").unwrap();
        assert_eq!(graficos.get_value((0, 0)), Some(&Data::String("Sem dados".into())));
    }
}
