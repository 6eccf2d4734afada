pub mod benchmark;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod locate;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod series;
pub mod snapshot;
pub mod state;
pub mod utils;

pub use benchmark::{TierMatch, classify, classify_match};
pub use config::{CliArgs, DashboardConfig};
pub use error::DashboardError;
pub use locate::{Located, locate, resolve_sheet};
pub use logging::{LoggingConfig, init_logging};
pub use model::{
    BenchmarkTable, CellRef, CellValue, Department, DepartmentDashboard, FileDescriptor,
    KpiDefinition, KpiResult, NormalizedValue, SeriesMetadata, SnapshotId, TableGrid, Tier,
    TimeSeries, ValueKind,
};
pub use normalize::normalize;
pub use pipeline::{extract_kpi, extract_kpis, extract_table, infer_kind};
pub use series::{Period, decode_period, extract_series};
pub use snapshot::{SnapshotBuilder, SpreadsheetSnapshot};
pub use state::{CacheStats, DashboardState};
