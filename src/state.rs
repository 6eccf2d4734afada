use crate::catalog;
use crate::client::DataSource;
use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::locate::{Located, locate};
use crate::model::{
    CellRef, Department, DepartmentDashboard, FileDescriptor, NormalizedValue, TableGrid,
    TableRequest, TimeSeries, ValueKind,
};
use crate::normalize::normalize;
use crate::pipeline;
use crate::series::{self, Period};
use crate::snapshot::SpreadsheetSnapshot;
use futures::stream::{self, StreamExt};
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Engine state shared by every extraction request: the data source, the
/// parsed-snapshot cache and the single-cell result memo. Both caches are
/// best-effort; a miss is always resolvable by redoing the work.
pub struct DashboardState {
    config: Arc<DashboardConfig>,
    source: DataSource,
    snapshots: RwLock<LruCache<SnapshotKey, CachedSnapshot>>,
    cells: RwLock<LruCache<CellKey, CachedCell>>,
    /// Current selection; bumping it supersedes in-flight loads.
    generation: AtomicU64,
    active: Mutex<Option<CancellationToken>>,
    cache_ops: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

type SnapshotKey = (Department, String);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CellKey {
    snapshot: String,
    sheet_pattern: String,
    row_index: u32,
    column: String,
    kind: ValueKind,
}

struct CachedSnapshot {
    snapshot: Arc<SpreadsheetSnapshot>,
    loaded_at: Instant,
}

struct CachedCell {
    value: NormalizedValue,
    cached_at: Instant,
}

/// Token for one user selection. Starting a new selection cancels the
/// previous one, so a superseded load aborts instead of racing the fresh
/// result.
pub struct SelectionGuard {
    generation: u64,
    pub token: CancellationToken,
}

impl DashboardState {
    pub fn new(config: Arc<DashboardConfig>) -> Self {
        let source = match (&config.workspace_root, &config.data_service_url) {
            (Some(root), _) => DataSource::local(root.clone()),
            (None, Some(url)) => DataSource::remote(url.clone()),
            (None, None) => DataSource::local("."),
        };
        Self::with_source(config, source)
    }

    pub fn with_source(config: Arc<DashboardConfig>, source: DataSource) -> Self {
        let capacity = NonZeroUsize::new(config.cache_capacity.max(1))
            .unwrap_or(NonZeroUsize::MIN);
        // Cell results are tiny; give the memo more headroom than the
        // snapshot cache.
        let cell_capacity = NonZeroUsize::new(config.cache_capacity.max(1) * 64)
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            config,
            source,
            snapshots: RwLock::new(LruCache::new(capacity)),
            cells: RwLock::new(LruCache::new(cell_capacity)),
            generation: AtomicU64::new(0),
            active: Mutex::new(None),
            cache_ops: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> Arc<DashboardConfig> {
        self.config.clone()
    }

    pub fn begin_selection(&self) -> SelectionGuard {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        let previous = self.active.lock().replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }
        SelectionGuard { generation, token }
    }

    pub fn selection_is_current(&self, guard: &SelectionGuard) -> bool {
        self.generation.load(Ordering::SeqCst) == guard.generation
    }

    /// Files advertised for a department, filtered to spreadsheet extensions
    /// and sorted ascending by decoded period. Undated files sort first so
    /// the latest dated export is always last.
    pub async fn list_files(
        &self,
        department: Department,
        cancel: &CancellationToken,
    ) -> Result<Vec<FileDescriptor>, DashboardError> {
        let names = self.source.list_files(department, cancel).await?;
        let mut dated: Vec<(Option<Period>, FileDescriptor)> = names
            .into_iter()
            .filter(|name| self.config.is_supported_file(name))
            .map(|name| {
                let period = series::decode_period(&name);
                let descriptor = FileDescriptor {
                    period: period.map(|p| p.label()),
                    bytes: self.source.file_size(department, &name),
                    name,
                };
                (period, descriptor)
            })
            .collect();
        dated.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name.cmp(&b.1.name)));
        Ok(dated.into_iter().map(|(_, descriptor)| descriptor).collect())
    }

    pub async fn latest_file(
        &self,
        department: Department,
        cancel: &CancellationToken,
    ) -> Result<Option<FileDescriptor>, DashboardError> {
        Ok(self.list_files(department, cancel).await?.into_iter().last())
    }

    /// Parsed snapshot for one file, served from cache while fresh.
    pub async fn load_snapshot(
        &self,
        department: Department,
        file_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Arc<SpreadsheetSnapshot>, DashboardError> {
        self.cache_ops.fetch_add(1, Ordering::Relaxed);
        let key = (department, file_name.to_string());
        let ttl = Duration::from_secs(self.config.cache_ttl_secs);

        {
            let mut cache = self.snapshots.write();
            if let Some(entry) = cache.get(&key) {
                if entry.loaded_at.elapsed() <= ttl {
                    self.cache_hits.fetch_add(1, Ordering::Relaxed);
                    debug!(department = %department, file = file_name, "snapshot cache hit");
                    return Ok(entry.snapshot.clone());
                }
                cache.pop(&key);
            }
        }
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
        debug!(department = %department, file = file_name, "snapshot cache miss");

        let bytes = self.source.fetch_file(department, file_name, cancel).await?;
        let name = file_name.to_string();
        let snapshot =
            task::spawn_blocking(move || SpreadsheetSnapshot::from_bytes(&name, &bytes)).await??;
        let snapshot = Arc::new(snapshot);

        self.snapshots.write().put(
            key,
            CachedSnapshot {
                snapshot: snapshot.clone(),
                loaded_at: Instant::now(),
            },
        );
        Ok(snapshot)
    }

    /// Memoized locate-and-normalize of one cell, keyed by snapshot identity
    /// plus the cell coordinates. Pure with respect to its inputs: an
    /// expired or evicted entry is simply recomputed.
    pub fn normalized_cell(
        &self,
        snapshot: &SpreadsheetSnapshot,
        sheet_pattern: &str,
        row_index: u32,
        column: &str,
        kind: ValueKind,
    ) -> NormalizedValue {
        let key = CellKey {
            snapshot: snapshot.id().as_str().to_string(),
            sheet_pattern: sheet_pattern.to_string(),
            row_index,
            column: column.to_ascii_uppercase(),
            kind,
        };
        let ttl = Duration::from_secs(self.config.cache_ttl_secs);
        self.cache_ops.fetch_add(1, Ordering::Relaxed);

        {
            let mut cells = self.cells.write();
            if let Some(entry) = cells.get(&key) {
                if entry.cached_at.elapsed() <= ttl {
                    self.cache_hits.fetch_add(1, Ordering::Relaxed);
                    return entry.value.clone();
                }
                cells.pop(&key);
            }
        }
        self.cache_misses.fetch_add(1, Ordering::Relaxed);

        let value = match locate(snapshot, sheet_pattern, row_index, column) {
            Located::Value(raw) => normalize(&raw, kind),
            Located::Missing => NormalizedValue::missing(),
        };
        self.cells.write().put(
            key,
            CachedCell {
                value: value.clone(),
                cached_at: Instant::now(),
            },
        );
        value
    }

    /// Refresh one department dashboard: resolve the target file (latest
    /// dated export unless pinned), load it, and extract the full KPI set.
    pub async fn refresh_department(
        &self,
        department: Department,
        file: Option<&str>,
    ) -> Result<DepartmentDashboard, DashboardError> {
        let guard = self.begin_selection();
        let descriptor = match file {
            Some(name) => FileDescriptor {
                period: series::decode_period(name).map(|p| p.label()),
                bytes: self.source.file_size(department, name),
                name: name.to_string(),
            },
            None => self
                .latest_file(department, &guard.token)
                .await?
                .ok_or_else(|| DashboardError::NoFiles {
                    department: department.code().to_string(),
                })?,
        };

        let snapshot = self
            .load_snapshot(department, &descriptor.name, &guard.token)
            .await?;
        let kpis = pipeline::extract_kpis(&snapshot, catalog::definitions(department));

        if !self.selection_is_current(&guard) {
            return Err(DashboardError::Superseded);
        }
        Ok(DepartmentDashboard {
            department,
            file: descriptor,
            snapshot_id: snapshot.id().clone(),
            kpis,
        })
    }

    /// Extract a display grid from one department file.
    pub async fn department_table(
        &self,
        department: Department,
        file_name: &str,
        request: &TableRequest,
    ) -> Result<TableGrid, DashboardError> {
        let guard = self.begin_selection();
        let snapshot = self
            .load_snapshot(department, file_name, &guard.token)
            .await?;
        Ok(pipeline::extract_table(&snapshot, request))
    }

    /// Monthly time series of one cataloged KPI.
    pub async fn kpi_series(
        &self,
        department: Department,
        kpi_id: &str,
    ) -> Result<TimeSeries, DashboardError> {
        let def = catalog::definition(department, kpi_id).ok_or_else(|| {
            DashboardError::UnknownKpi {
                department: department.code().to_string(),
                kpi_id: kpi_id.to_string(),
            }
        })?;
        self.cell_series(department, &def.cell, def.kind).await
    }

    /// Extract the same cell across every dated export of a department.
    /// Files are fetched with a bounded fan-out; per-file failures are
    /// logged and skipped, and the final ordering depends only on decoded
    /// periods, never on fetch completion order.
    pub async fn cell_series(
        &self,
        department: Department,
        cell: &CellRef,
        kind: ValueKind,
    ) -> Result<TimeSeries, DashboardError> {
        let guard = self.begin_selection();
        let files = self.list_files(department, &guard.token).await?;
        let dated: Vec<FileDescriptor> = files
            .into_iter()
            .filter(|descriptor| descriptor.period.is_some())
            .collect();

        let loaded: Vec<(FileDescriptor, Result<Arc<SpreadsheetSnapshot>, DashboardError>)> =
            stream::iter(dated)
                .map(|descriptor| {
                    let token = guard.token.clone();
                    async move {
                        let result = self
                            .load_snapshot(department, &descriptor.name, &token)
                            .await;
                        (descriptor, result)
                    }
                })
                .buffer_unordered(self.config.fetch_concurrency)
                .collect()
                .await;

        let mut points = Vec::new();
        for (descriptor, result) in loaded {
            let snapshot = match result {
                Ok(snapshot) => snapshot,
                Err(err) if err.is_cancellation() => return Err(err),
                Err(err) => {
                    warn!(file = %descriptor.name, error = %err, "skipping file in series");
                    continue;
                }
            };
            let Some(period) = series::decode_period(&descriptor.name) else {
                continue;
            };
            let normalized = self.normalized_cell(
                &snapshot,
                &cell.sheet_pattern,
                cell.row_index,
                &cell.column,
                kind,
            );
            match normalized.numeric {
                Some(value) => points.push((period, value)),
                None => {
                    debug!(file = %descriptor.name, "no numeric value for series point");
                }
            }
        }

        if !self.selection_is_current(&guard) {
            return Err(DashboardError::Superseded);
        }
        Ok(series::assemble(points))
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            operations: self.cache_ops.load(Ordering::Relaxed),
            hits: self.cache_hits.load(Ordering::Relaxed),
            misses: self.cache_misses.load(Ordering::Relaxed),
            snapshots: self.snapshots.read().len(),
            cells: self.cells.read().len(),
        }
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub operations: u64,
    pub hits: u64,
    pub misses: u64,
    pub snapshots: usize,
    pub cells: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.operations == 0 {
            0.0
        } else {
            self.hits as f64 / self.operations as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;
    use crate::snapshot::SnapshotBuilder;

    fn test_state() -> DashboardState {
        let config = Arc::new(DashboardConfig {
            data_service_url: None,
            workspace_root: None,
            cache_capacity: 4,
            cache_ttl_secs: 300,
            fetch_concurrency: 2,
            supported_extensions: vec!["xlsx".into()],
        });
        DashboardState::with_source(config, DataSource::local("."))
    }

    #[test]
    fn new_selection_cancels_the_previous_one() {
        let state = test_state();
        let first = state.begin_selection();
        let second = state.begin_selection();

        assert!(first.token.is_cancelled());
        assert!(!second.token.is_cancelled());
        assert!(!state.selection_is_current(&first));
        assert!(state.selection_is_current(&second));
    }

    #[test]
    fn cell_memo_hits_on_repeat_lookups() {
        let state = test_state();
        let snapshot = SnapshotBuilder::new("ED-2025-JAN.xlsx")
            .cell("ED KPIs", "AC3", CellValue::Number(0.0104))
            .build();

        let first = state.normalized_cell(&snapshot, "ED KPIs", 2, "AC", ValueKind::DurationHoursMinutes);
        let second = state.normalized_cell(&snapshot, "ED KPIs", 2, "AC", ValueKind::DurationHoursMinutes);

        assert_eq!(first, second);
        assert_eq!(first.display, "00:15");
        let stats = state.cache_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn memo_distinguishes_value_kinds_for_the_same_cell() {
        let state = test_state();
        let snapshot = SnapshotBuilder::new("ED-2025-JAN.xlsx")
            .cell("ED KPIs", "AC3", CellValue::Number(0.5))
            .build();

        let duration =
            state.normalized_cell(&snapshot, "ED KPIs", 2, "AC", ValueKind::DurationHoursMinutes);
        let percent = state.normalized_cell(&snapshot, "ED KPIs", 2, "AC", ValueKind::Percentage);

        assert_eq!(duration.display, "12:00");
        assert_eq!(percent.display, "50%");
    }
}
