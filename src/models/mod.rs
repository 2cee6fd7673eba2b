pub mod bundle;
pub mod sales;
pub mod summary;

pub use bundle::{ArtifactBundle, SplitArtifact};
pub use sales::{
    validate_schema, Cell, RawTable, SalesRecord, SalesTable, SchemaIndex, AMOUNT_COLUMN,
    GROUP_COLUMN, PRODUCT_COLUMN, REQUIRED_COLUMNS,
};
pub use summary::{SummaryRow, SummaryTable};
