use bigdecimal::{BigDecimal, Zero};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::ReportError;

/// 分组键列 (销售员)
pub const GROUP_COLUMN: &str = "Vendedor";
/// 类别键列 (产品)
pub const PRODUCT_COLUMN: &str = "Produto";
/// 金额列
pub const AMOUNT_COLUMN: &str = "Vendas";

pub const REQUIRED_COLUMNS: [&str; 3] = [GROUP_COLUMN, PRODUCT_COLUMN, AMOUNT_COLUMN];

/// 原始单元格
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// 未校验的原始表 (上传文件读取结果)
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// 必需列在表头中的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaIndex {
    pub salesperson: usize,
    pub product: usize,
    pub amount: usize,
}

/// 校验表头是否包含三个必需列，缺失时按固定顺序列出缺失列名
pub fn validate_schema(headers: &[String]) -> Result<SchemaIndex, ReportError> {
    let positions = REQUIRED_COLUMNS.map(|name| headers.iter().position(|h| h == name));

    match positions {
        [Some(salesperson), Some(product), Some(amount)] => Ok(SchemaIndex {
            salesperson,
            product,
            amount,
        }),
        _ => Err(ReportError::Schema {
            missing: REQUIRED_COLUMNS
                .iter()
                .zip(positions)
                .filter(|(_, pos)| pos.is_none())
                .map(|(name, _)| name.to_string())
                .collect(),
        }),
    }
}

/// 销售记录
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub salesperson: String,
    pub product: String,
    pub amount: BigDecimal,
    /// 原始整行 (额外列原样保留)
    pub cells: Vec<Cell>,
}

/// 已校验的销售表：只能通过 `from_raw` 构造
#[derive(Debug, Clone)]
pub struct SalesTable {
    columns: Vec<String>,
    index: SchemaIndex,
    records: Vec<SalesRecord>,
}

impl SalesTable {
    /// 校验表头并逐行转换；全空行跳过
    pub fn from_raw(raw: RawTable) -> Result<Self, ReportError> {
        let index = validate_schema(&raw.headers)?;
        let width = raw.headers.len();

        let mut records = Vec::with_capacity(raw.rows.len());
        for (idx, mut cells) in raw.rows.into_iter().enumerate() {
            if cells.iter().all(Cell::is_empty) {
                continue;
            }
            // 表头占第 1 行
            let row = idx + 2;
            cells.resize(width, Cell::Empty);

            let salesperson = key_value(&cells[index.salesperson], row, GROUP_COLUMN)?;
            let product = key_value(&cells[index.product], row, PRODUCT_COLUMN)?;
            let amount = amount_value(&cells[index.amount], row)?;

            records.push(SalesRecord {
                salesperson,
                product,
                amount,
                cells,
            });
        }

        Ok(Self {
            columns: raw.headers,
            index,
            records,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn schema(&self) -> SchemaIndex {
        self.index
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 全表金额合计
    pub fn total_amount(&self) -> BigDecimal {
        self.records
            .iter()
            .fold(BigDecimal::zero(), |acc, r| acc + &r.amount)
    }
}

fn key_value(cell: &Cell, row: usize, column: &str) -> Result<String, ReportError> {
    if cell.is_empty() {
        return Err(ReportError::MissingValue {
            row,
            column: column.to_string(),
        });
    }
    Ok(cell.to_string())
}

fn amount_value(cell: &Cell, row: usize) -> Result<BigDecimal, ReportError> {
    let conversion = |value: String| ReportError::Conversion {
        row,
        column: AMOUNT_COLUMN.to_string(),
        value,
    };

    let amount = match cell {
        Cell::Empty => {
            return Err(ReportError::MissingValue {
                row,
                column: AMOUNT_COLUMN.to_string(),
            })
        }
        Cell::Text(s) if s.trim().is_empty() => {
            return Err(ReportError::MissingValue {
                row,
                column: AMOUNT_COLUMN.to_string(),
            })
        }
        // f64 的 Display 是最短往返表示: 150.5 -> "150.5"
        Cell::Number(n) => BigDecimal::from_str(&n.to_string())
            .map_err(|_| conversion(n.to_string()))?,
        Cell::Text(s) => BigDecimal::from_str(s.trim()).map_err(|_| conversion(s.clone()))?,
        Cell::Bool(b) => return Err(conversion(b.to_string())),
    };

    if amount < BigDecimal::zero() {
        return Err(conversion(amount.to_string()));
    }
    Ok(amount)
}
