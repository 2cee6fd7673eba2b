use bigdecimal::{BigDecimal, Zero};
use serde::Serialize;

/// 汇总行：销售员 -> 销售总额
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub salesperson: String,
    pub total: BigDecimal,
}

/// 汇总表 (按首次出现顺序)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SummaryTable {
    rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub fn new(rows: Vec<SummaryRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &SummaryRow> {
        self.rows.iter()
    }

    pub fn get(&self, salesperson: &str) -> Option<&BigDecimal> {
        self.rows
            .iter()
            .find(|r| r.salesperson == salesperson)
            .map(|r| &r.total)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total(&self) -> BigDecimal {
        self.rows
            .iter()
            .fold(BigDecimal::zero(), |acc, r| acc + &r.total)
    }
}
