//! Played-track history: filtering, pagination and CSV export

pub mod batch;
pub mod csv;
pub mod error;
pub mod export;
pub mod paginate;
pub mod query;
pub mod source;

pub use batch::BatchIterator;
pub use self::csv::{ColumnSpec, csv_filename, history_columns};
pub use error::ExportError;
pub use export::{ExportFormat, ExportSettings, HistoryExporter, HistoryRequest, RawHistoryParams};
pub use paginate::{Page, Pagination};
pub use query::{DateRange, HistoryQuery, HistoryQueryBuilder, SortDirection};
pub use source::{HistorySource, SortKey};
