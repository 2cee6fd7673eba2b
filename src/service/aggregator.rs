use bigdecimal::{BigDecimal, Zero};
use indexmap::IndexMap;

use crate::models::{SalesRecord, SalesTable, SummaryRow, SummaryTable};

/// 按销售员分组求和，顺序为首次出现顺序
pub fn summarize(table: &SalesTable) -> SummaryTable {
    let totals = sum_by(table, |r| r.salesperson.as_str());
    SummaryTable::new(
        totals
            .into_iter()
            .map(|(salesperson, total)| SummaryRow {
                salesperson: salesperson.to_string(),
                total,
            })
            .collect(),
    )
}

/// 按产品分组求和 (饼图用)
pub fn totals_by_product(table: &SalesTable) -> IndexMap<&str, BigDecimal> {
    sum_by(table, |r| r.product.as_str())
}

/// 按销售员拆分记录，组内保持输入顺序
pub fn partition(table: &SalesTable) -> IndexMap<&str, Vec<&SalesRecord>> {
    let mut groups: IndexMap<&str, Vec<&SalesRecord>> = IndexMap::new();
    for record in table.records() {
        groups
            .entry(record.salesperson.as_str())
            .or_default()
            .push(record);
    }
    groups
}

fn sum_by<'a, F>(table: &'a SalesTable, key: F) -> IndexMap<&'a str, BigDecimal>
where
    F: Fn(&'a SalesRecord) -> &'a str,
{
    let mut totals: IndexMap<&str, BigDecimal> = IndexMap::new();
    for record in table.records() {
        let entry = totals.entry(key(record)).or_insert_with(BigDecimal::zero);
        *entry += &record.amount;
    }
    totals
}
