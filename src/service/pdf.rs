use chrono::{DateTime, Local};
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Polygon, Rgb,
};
use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use crate::error::ReportError;
use crate::models::{SalesTable, SummaryTable, GROUP_COLUMN};
use crate::service::chart::{build_chart, ChartKind, ChartSpec};
use crate::service::sheet::amount_as_f64;
use crate::service::workbook::TOTAL_COLUMN;

pub const PDF_FILE_NAME: &str = "relatorio_vendas.pdf";

// A4, 单位 mm
const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const PT: f32 = 0.352_778;
// 图表固定尺寸 400x250 pt
const CHART_WIDTH: f32 = 400.0 * PT;
const CHART_HEIGHT: f32 = 250.0 * PT;
const LAYER: &str = "Camada 1";

/// 报告版面块，按顺序排版
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Title(String),
    Paragraph(String),
    Heading(String),
    Spacer(f32),
    Table {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// None 表示无数据，绘制占位框
    Chart(Option<ChartSpec>),
}

/// PDF 报告的版面模型
#[derive(Debug, Clone)]
pub struct ReportDocument {
    title: String,
    blocks: Vec<Block>,
}

impl ReportDocument {
    /// 标题、生成时间、汇总表、柱状图、饼图
    pub fn compose(
        summary: &SummaryTable,
        table: &SalesTable,
        generated_at: DateTime<Local>,
    ) -> Self {
        let title = "Relatório de Vendas".to_string();
        let rows = summary
            .iter()
            .map(|r| {
                vec![
                    r.salesperson.clone(),
                    format!("{:.2}", amount_as_f64(&r.total)),
                ]
            })
            .collect();

        let blocks = vec![
            Block::Title(title.clone()),
            Block::Paragraph(format!(
                "Gerado em: {}",
                generated_at.format("%d/%m/%Y %H:%M")
            )),
            Block::Spacer(12.0 * PT),
            Block::Heading("Resumo de Vendas por Vendedor:".to_string()),
            Block::Table {
                header: vec![GROUP_COLUMN.to_string(), TOTAL_COLUMN.to_string()],
                rows,
            },
            Block::Spacer(20.0 * PT),
            Block::Heading("Vendas por Vendedor".to_string()),
            Block::Chart(build_chart(table, ChartKind::BySalesperson)),
            Block::Spacer(20.0 * PT),
            Block::Heading("Proporção de Vendas por Produto".to_string()),
            Block::Chart(build_chart(table, ChartKind::ByProduct)),
        ];

        Self { title, blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn render(&self) -> Result<Vec<u8>, ReportError> {
        self.render_pages().map(|(bytes, _)| bytes)
    }

    fn render_pages(&self) -> Result<(Vec<u8>, usize), ReportError> {
        let mut writer = PdfWriter::new(&self.title)?;
        for block in &self.blocks {
            match block {
                Block::Title(text) => writer.title(text),
                Block::Paragraph(text) => writer.paragraph(text, 10.0, false),
                Block::Heading(text) => writer.paragraph(text, 14.0, true),
                Block::Spacer(h) => writer.y -= h,
                Block::Table { header, rows } => writer.table(header, rows),
                Block::Chart(Some(spec)) => writer.chart(spec),
                Block::Chart(None) => writer.chart_placeholder(),
            }
        }
        writer.finish()
    }
}

/// 生成 relatorio_vendas.pdf
pub fn build_pdf_report(
    summary: &SummaryTable,
    table: &SalesTable,
    generated_at: DateTime<Local>,
    dir: &Path,
) -> Result<PathBuf, ReportError> {
    let path = dir.join(PDF_FILE_NAME);
    let bytes = ReportDocument::compose(summary, table, generated_at).render()?;
    std::fs::write(&path, bytes)?;
    tracing::info!("PDF 报告 {}", path.display());
    Ok(path)
}

fn pdf_error(e: impl std::fmt::Display) -> ReportError {
    ReportError::Pdf(e.to_string())
}

fn rgb(hex: u32) -> Color {
    let channel = |shift: u32| ((hex >> shift) & 0xFF) as f32 / 255.0;
    Color::Rgb(Rgb::new(channel(16), channel(8), channel(0), None))
}

const BLACK: u32 = 0x000000;
const WHITE: u32 = 0xF5F5F5;
const GREY: u32 = 0x808080;
const BEIGE: u32 = 0xF5F5DC;

/// 粗略估算 Helvetica 文本宽度 (mm)
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.5 * PT
}

fn fit_text(text: &str, size: f32, width: f32) -> String {
    // 容差避免按自然宽度布局的文本被误截
    let max_chars = (width / (size * 0.5 * PT) + 1e-3).floor().max(1.0) as usize;
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut s: String = text.chars().take(max_chars.saturating_sub(1).max(1)).collect();
        s.push('.');
        s
    }
}

const TABLE_FONT_SIZE: f32 = 10.0;
const TABLE_PAD: f32 = 3.0;

/// 列宽按最长文本估算；总宽超出可用宽度时先压缩最宽列，仍超出再等比缩放
fn column_widths(
    header: &[String],
    rows: &[Vec<String>],
    size: f32,
    available: f32,
) -> Vec<f32> {
    let mut widths: Vec<f32> = (0..header.len())
        .map(|col| {
            std::iter::once(&header[col])
                .chain(rows.iter().filter_map(|r| r.get(col)))
                .map(|s| text_width(s, size))
                .fold(0.0, f32::max)
                + TABLE_PAD * 2.0
        })
        .collect();

    let total: f32 = widths.iter().sum();
    if total <= available {
        return widths;
    }
    if let Some((widest, width)) = widths
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))
    {
        let others = total - width;
        widths[widest] = (available - others).max(TABLE_PAD * 2.0 + text_width("...", size));
    }
    let total: f32 = widths.iter().sum();
    if total > available {
        let scale = available / total;
        widths.iter_mut().for_each(|w| *w *= scale);
    }
    widths
}

fn point(x: f32, y: f32) -> (Point, bool) {
    (Point::new(Mm(x), Mm(y)), false)
}

struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// 当前基线 (距页面底部, mm)
    y: f32,
    pages: usize,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self, ReportError> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_error)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN,
            pages: 1,
        })
    }

    fn finish(self) -> Result<(Vec<u8>, usize), ReportError> {
        let pages = self.pages;
        let bytes = self.doc.save_to_bytes().map_err(pdf_error)?;
        Ok((bytes, pages))
    }

    /// 剩余空间不足时换页
    fn ensure_space(&mut self, height: f32) {
        if self.y - height >= MARGIN {
            return;
        }
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
        self.pages += 1;
    }

    fn text(&self, text: &str, size: f32, x: f32, y: f32, bold: bool, color: u32) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.set_fill_color(rgb(color));
        self.layer.use_text(text, size, Mm(x), Mm(y), font);
    }

    fn text_centered(&self, text: &str, size: f32, cx: f32, y: f32, bold: bool, color: u32) {
        self.text(text, size, cx - text_width(text, size) / 2.0, y, bold, color);
    }

    fn fill_rect(&self, x: f32, y: f32, w: f32, h: f32, fill: u32) {
        self.layer.set_fill_color(rgb(fill));
        self.layer.add_polygon(Polygon {
            rings: vec![vec![
                point(x, y),
                point(x + w, y),
                point(x + w, y + h),
                point(x, y + h),
            ]],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
    }

    fn stroke_rect(&self, x: f32, y: f32, w: f32, h: f32, color: u32, thickness: f32) {
        self.layer.set_outline_color(rgb(color));
        self.layer.set_outline_thickness(thickness);
        self.layer.add_line(Line {
            points: vec![
                point(x, y),
                point(x + w, y),
                point(x + w, y + h),
                point(x, y + h),
            ],
            is_closed: true,
        });
    }

    fn line(&self, from: (f32, f32), to: (f32, f32), color: u32, thickness: f32) {
        self.layer.set_outline_color(rgb(color));
        self.layer.set_outline_thickness(thickness);
        self.layer.add_line(Line {
            points: vec![point(from.0, from.1), point(to.0, to.1)],
            is_closed: false,
        });
    }

    fn title(&mut self, text: &str) {
        let size = 18.0;
        self.ensure_space(size * PT * 1.5);
        self.y -= size * PT;
        self.text_centered(text, size, PAGE_WIDTH / 2.0, self.y, true, BLACK);
        self.y -= size * PT * 0.8;
    }

    fn paragraph(&mut self, text: &str, size: f32, bold: bool) {
        let line_height = size * PT * 1.4;
        self.ensure_space(line_height);
        self.y -= size * PT;
        self.text(text, size, MARGIN, self.y, bold, BLACK);
        self.y -= line_height - size * PT;
    }

    /// 灰色表头、米色表体、灰色网格，居中
    fn table(&mut self, header: &[String], rows: &[Vec<String>]) {
        let widths = column_widths(header, rows, TABLE_FONT_SIZE, PAGE_WIDTH - 2.0 * MARGIN);
        let total_width: f32 = widths.iter().sum();
        let left = (PAGE_WIDTH - total_width) / 2.0;

        let header_height = 8.0;
        self.table_row(header, &widths, left, header_height, TABLE_FONT_SIZE, true);
        for row in rows {
            self.table_row(row, &widths, left, 6.5, TABLE_FONT_SIZE, false);
        }
    }

    fn table_row(
        &mut self,
        cells: &[String],
        widths: &[f32],
        left: f32,
        height: f32,
        size: f32,
        is_header: bool,
    ) {
        self.ensure_space(height);
        let bottom = self.y - height;
        let (fill, text_color) = if is_header { (GREY, WHITE) } else { (BEIGE, BLACK) };

        let mut x = left;
        for (cell, width) in cells.iter().zip(widths) {
            self.fill_rect(x, bottom, *width, height, fill);
            self.stroke_rect(x, bottom, *width, height, GREY, 0.5);
            // 表头底部留白更大
            let baseline = if is_header {
                bottom + height / 2.0 - size * PT * 0.15
            } else {
                bottom + (height - size * PT * 0.7) / 2.0
            };
            let label = fit_text(cell, size, width - TABLE_PAD * 2.0);
            self.text_centered(&label, size, x + width / 2.0, baseline, is_header, text_color);
            x += width;
        }
        self.y = bottom;
    }

    fn chart_box(&mut self) -> (f32, f32) {
        self.ensure_space(CHART_HEIGHT);
        let left = (PAGE_WIDTH - CHART_WIDTH) / 2.0;
        let bottom = self.y - CHART_HEIGHT;
        self.y = bottom;
        (left, bottom)
    }

    fn chart_placeholder(&mut self) {
        let (left, bottom) = self.chart_box();
        self.stroke_rect(left, bottom, CHART_WIDTH, CHART_HEIGHT, GREY, 0.5);
        self.text_centered(
            "Sem dados para exibir",
            10.0,
            left + CHART_WIDTH / 2.0,
            bottom + CHART_HEIGHT / 2.0,
            false,
            GREY,
        );
    }

    fn chart(&mut self, spec: &ChartSpec) {
        let (left, bottom) = self.chart_box();
        self.text_centered(
            &spec.title,
            9.0,
            left + CHART_WIDTH / 2.0,
            bottom + CHART_HEIGHT - 9.0 * PT,
            false,
            BLACK,
        );
        match spec.kind {
            ChartKind::BySalesperson => self.bar_chart(spec, left, bottom),
            ChartKind::ByProduct => self.pie_chart(spec, left, bottom),
        }
    }

    fn bar_chart(&mut self, spec: &ChartSpec, left: f32, bottom: f32) {
        let plot_left = left + 16.0;
        let plot_bottom = bottom + 14.0;
        let plot_width = CHART_WIDTH - 20.0;
        let plot_height = CHART_HEIGHT - 26.0;
        let max = spec.max_value();

        // 坐标轴与刻度
        self.line((plot_left, plot_bottom), (plot_left + plot_width, plot_bottom), BLACK, 0.5);
        self.line((plot_left, plot_bottom), (plot_left, plot_bottom + plot_height), BLACK, 0.5);
        for step in 0..=4 {
            let fraction = step as f32 / 4.0;
            let y = plot_bottom + plot_height * fraction;
            let label = format!("{:.0}", max * fraction as f64);
            self.line((plot_left - 1.0, y), (plot_left, y), BLACK, 0.5);
            self.text(&label, 5.0, plot_left - 2.0 - text_width(&label, 5.0), y - 0.6, false, BLACK);
        }
        self.text(&spec.value_axis, 7.0, left, plot_bottom + plot_height + 3.0, false, BLACK);
        self.text_centered(
            &spec.category_axis,
            7.0,
            plot_left + plot_width / 2.0,
            bottom + 1.0,
            false,
            BLACK,
        );

        let slot = plot_width / spec.points.len() as f32;
        let bar_width = slot * 0.8;
        for (idx, point) in spec.points.iter().enumerate() {
            let value = amount_as_f64(&point.value);
            let height = if max > 0.0 {
                (value / max) as f32 * plot_height
            } else {
                0.0
            };
            let x = plot_left + slot * idx as f32 + (slot - bar_width) / 2.0;
            let cx = x + bar_width / 2.0;

            if height > 0.0 {
                self.fill_rect(x, plot_bottom, bar_width, height, point.color);
                self.stroke_rect(x, plot_bottom, bar_width, height, BLACK, 0.5);
            }
            self.text_centered(&spec.value_label(point), 5.0, cx, plot_bottom + height + 0.8, false, BLACK);
            let label = fit_text(&point.label, 5.0, slot);
            self.text_centered(&label, 5.0, cx, plot_bottom - 3.0, false, BLACK);
        }
    }

    fn pie_chart(&mut self, spec: &ChartSpec, left: f32, bottom: f32) {
        let radius = 30.0;
        let cx = left + 45.0;
        let cy = bottom + (CHART_HEIGHT - 8.0) / 2.0;

        // 从 90° 开始逆时针
        let mut start = 90.0_f32;
        for point in &spec.points {
            let sweep = point.share as f32 / 100.0 * 360.0;
            if sweep > 0.0 {
                self.wedge(cx, cy, radius, start, sweep, point.color);
            }
            let mid = (start + sweep / 2.0).to_radians();
            let label = spec.value_label(point);
            let (lx, ly) = (cx + radius * 1.15 * mid.cos(), cy + radius * 1.15 * mid.sin());
            self.text_centered(&label, 5.0, lx, ly - 0.6, false, BLACK);
            start += sweep;
        }

        // 图例
        let legend_left = cx + radius + 18.0;
        let mut ly = cy + radius;
        if let Some(title) = &spec.legend_title {
            self.text(title, 6.0, legend_left, ly, true, BLACK);
            ly -= 4.0;
        }
        let legend_bottom = bottom + 2.0;
        let available = left + CHART_WIDTH - legend_left - 6.0;
        for (idx, point) in spec.points.iter().enumerate() {
            if ly < legend_bottom {
                let rest = spec.points.len() - idx;
                self.text(&format!("+{} ...", rest), 5.0, legend_left, ly + 2.0, false, BLACK);
                break;
            }
            self.fill_rect(legend_left, ly - 0.5, 3.0, 2.5, point.color);
            let label = fit_text(&point.label, 5.0, available);
            self.text(&label, 5.0, legend_left + 4.5, ly, false, BLACK);
            ly -= 3.6;
        }
    }

    fn wedge(&self, cx: f32, cy: f32, radius: f32, start_deg: f32, sweep_deg: f32, color: u32) {
        let segments = (sweep_deg / 2.0).ceil().max(1.0) as usize;
        let mut ring = Vec::with_capacity(segments + 2);
        ring.push(point(cx, cy));
        for i in 0..=segments {
            let angle = (start_deg + sweep_deg * i as f32 / segments as f32) * PI / 180.0;
            ring.push(point(cx + radius * angle.cos(), cy + radius * angle.sin()));
        }
        self.layer.set_fill_color(rgb(color));
        self.layer.add_polygon(Polygon {
            rings: vec![ring],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sales::tests::table;
    use crate::service::aggregator::summarize;
    use chrono::TimeZone;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 0).unwrap()
    }

    fn summary_rows(doc: &ReportDocument) -> &[Vec<String>] {
        doc.blocks()
            .iter()
            .find_map(|b| match b {
                Block::Table { rows, .. } => Some(rows.as_slice()),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn layout_order_and_summary_rows() {
        let t = table(&[("João", "Caneta", 150.50), ("Maria", "Caderno", 320.00)]);
        let doc = ReportDocument::compose(&summarize(&t), &t, at());

        assert_eq!(doc.blocks()[0], Block::Title("Relatório de Vendas".into()));
        assert_eq!(doc.blocks()[1], Block::Paragraph("Gerado em: 05/03/2024 14:07".into()));
        assert_eq!(
            summary_rows(&doc),
            &[
                vec!["João".to_string(), "150.50".to_string()],
                vec!["Maria".to_string(), "320.00".to_string()],
            ]
        );

        let charts: Vec<_> = doc
            .blocks()
            .iter()
            .filter_map(|b| match b {
                Block::Chart(spec) => Some(spec.as_ref().map(|s| s.kind)),
                _ => None,
            })
            .collect();
        assert_eq!(
            charts,
            vec![Some(ChartKind::BySalesperson), Some(ChartKind::ByProduct)]
        );
    }

    #[test]
    fn renders_a_pdf() {
        let t = table(&[("João", "Caneta", 150.50), ("Maria", "Caderno", 320.00)]);
        let bytes = ReportDocument::compose(&summarize(&t), &t, at())
            .render()
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn empty_table_renders_placeholders() {
        let t = table(&[]);
        let doc = ReportDocument::compose(&summarize(&t), &t, at());
        assert_eq!(summary_rows(&doc).len(), 0);
        assert!(doc
            .blocks()
            .iter()
            .filter(|b| matches!(b, Block::Chart(_)))
            .all(|b| *b == Block::Chart(None)));
        assert!(doc.render().unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn long_tables_flow_onto_new_pages() {
        let names: Vec<String> = (0..80).map(|i| format!("Vendedor {i}")).collect();
        let rows: Vec<(&str, &str, f64)> = names.iter().map(|n| (n.as_str(), "X", 1.0)).collect();
        let t = table(&rows);
        let (bytes, pages) = ReportDocument::compose(&summarize(&t), &t, at())
            .render_pages()
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(pages >= 3);
    }

    #[test]
    fn wide_names_are_kept_inside_the_margins() {
        let header = vec![GROUP_COLUMN.to_string(), TOTAL_COLUMN.to_string()];
        let rows = vec![
            vec!["Maria ".repeat(60), "320.00".to_string()],
            vec!["Ana".to_string(), "10.00".to_string()],
        ];
        let available = PAGE_WIDTH - 2.0 * MARGIN;
        let widths = column_widths(&header, &rows, TABLE_FONT_SIZE, available);

        let total: f32 = widths.iter().sum();
        assert!(total <= available + 0.01);
        assert!((PAGE_WIDTH - total) / 2.0 >= MARGIN - 0.01);
        // 金额列保持原宽
        assert!(widths[1] >= text_width(TOTAL_COLUMN, TABLE_FONT_SIZE) + TABLE_PAD * 2.0);

        let label = fit_text(&rows[0][0], TABLE_FONT_SIZE, widths[0] - TABLE_PAD * 2.0);
        assert!(label.ends_with('.'));
        assert!(text_width(&label, TABLE_FONT_SIZE) <= widths[0] - TABLE_PAD * 2.0 + 0.01);

        let t = table(&[(rows[0][0].trim(), "X", 320.0), ("Ana", "Y", 10.0)]);
        let bytes = ReportDocument::compose(&summarize(&t), &t, at())
            .render()
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn narrow_tables_keep_their_natural_widths() {
        let header = vec!["A".to_string(), "B".to_string()];
        let rows = vec![vec!["x".to_string(), "y".to_string()]];
        let widths = column_widths(&header, &rows, TABLE_FONT_SIZE, 170.0);
        let expected = text_width("A", TABLE_FONT_SIZE) + TABLE_PAD * 2.0;
        assert!((widths[0] - expected).abs() < 0.001);
        assert!((widths[1] - expected).abs() < 0.001);
    }

    #[test]
    fn writes_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let t = table(&[("Ana", "X", 10.0)]);
        let path = build_pdf_report(&summarize(&t), &t, at(), dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "relatorio_vendas.pdf");
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}
