use bigdecimal::{BigDecimal, Zero};
use serde::Serialize;

use crate::models::SalesTable;
use crate::service::aggregator;
use crate::service::sheet::amount_as_f64;

/// matplotlib tab20 调色板
pub const TAB20: [u32; 20] = [
    0x1F77B4, 0xAEC7E8, 0xFF7F0E, 0xFFBB78, 0x2CA02C, 0x98DF8A, 0xD62728, 0xFF9896, 0x9467BD,
    0xC5B0D5, 0x8C564B, 0xC49C94, 0xE377C2, 0xF7B6D2, 0x7F7F7F, 0xC7C7C7, 0xBCBD22, 0xDBDB8D,
    0x17BECF, 0x9EDAE5,
];

pub const BAR_COLOR: u32 = 0x87CEEB;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// 柱状图：各销售员销售总额，降序
    BySalesperson,
    /// 饼图：各产品销售占比
    ByProduct,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: BigDecimal,
    /// 占总额百分比 (0-100)
    pub share: f64,
    pub color: u32,
}

/// 与渲染无关的图表模型，由工作簿和 PDF 分别绘制
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub category_axis: String,
    pub value_axis: String,
    pub legend_title: Option<String>,
    pub points: Vec<ChartPoint>,
}

impl ChartSpec {
    /// 数据标签：柱状图显示金额，饼图显示百分比
    pub fn value_label(&self, point: &ChartPoint) -> String {
        match self.kind {
            ChartKind::BySalesperson => format!("{:.2}", amount_as_f64(&point.value)),
            ChartKind::ByProduct => format!("{:.1}%", point.share),
        }
    }

    pub fn max_value(&self) -> f64 {
        self.points
            .iter()
            .map(|p| amount_as_f64(&p.value))
            .fold(0.0, f64::max)
    }
}

/// 生成图表模型；空表 (或饼图总额为零) 返回 None
pub fn build_chart(table: &SalesTable, kind: ChartKind) -> Option<ChartSpec> {
    if table.is_empty() {
        return None;
    }

    let totals: Vec<(String, BigDecimal)> = match kind {
        ChartKind::BySalesperson => aggregator::summarize(table)
            .iter()
            .map(|r| (r.salesperson.clone(), r.total.clone()))
            .collect(),
        ChartKind::ByProduct => aggregator::totals_by_product(table)
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    };

    let grand_total = totals
        .iter()
        .fold(BigDecimal::zero(), |acc, (_, v)| acc + v);
    if kind == ChartKind::ByProduct && grand_total.is_zero() {
        return None;
    }
    let grand_total = amount_as_f64(&grand_total);

    let mut totals = totals;
    // 稳定排序：金额相同保持首次出现顺序
    totals.sort_by(|a, b| b.1.cmp(&a.1));

    let points = totals
        .into_iter()
        .enumerate()
        .map(|(rank, (label, value))| {
            let share = if grand_total > 0.0 {
                amount_as_f64(&value) / grand_total * 100.0
            } else {
                0.0
            };
            let color = match kind {
                ChartKind::BySalesperson => BAR_COLOR,
                ChartKind::ByProduct => TAB20[rank % TAB20.len()],
            };
            ChartPoint {
                label,
                value,
                share,
                color,
            }
        })
        .collect();

    let spec = match kind {
        ChartKind::BySalesperson => ChartSpec {
            kind,
            title: "Vendas por Vendedor".to_string(),
            category_axis: "Vendedor".to_string(),
            value_axis: "Total de Vendas".to_string(),
            legend_title: None,
            points,
        },
        ChartKind::ByProduct => ChartSpec {
            kind,
            title: "Proporção de Vendas por Produto".to_string(),
            category_axis: "Produto".to_string(),
            value_axis: "Vendas".to_string(),
            legend_title: Some("Produtos".to_string()),
            points,
        },
    };
    Some(spec)
}
