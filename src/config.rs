use crate::model::Department;
use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CACHE_CAPACITY: usize = 8;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_FETCH_CONCURRENCY: usize = 2;
const DEFAULT_EXTENSIONS: &[&str] = &["xlsx", "xlsm"];

/// Resolved engine configuration: CLI flags win over the optional config
/// file, which wins over defaults.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub data_service_url: Option<String>,
    pub workspace_root: Option<PathBuf>,
    pub cache_capacity: usize,
    pub cache_ttl_secs: u64,
    pub fetch_concurrency: usize,
    pub supported_extensions: Vec<String>,
}

impl DashboardConfig {
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let file_config = if let Some(path) = args.config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let data_service_url = args
            .data_service_url
            .clone()
            .or(file_config.data_service_url);
        let workspace_root = args.workspace_root.clone().or(file_config.workspace_root);

        anyhow::ensure!(
            data_service_url.is_some() || workspace_root.is_some(),
            "either a data service URL or a local workspace root must be configured"
        );

        if let Some(root) = workspace_root.as_ref() {
            anyhow::ensure!(
                root.exists(),
                "workspace root {:?} does not exist",
                root
            );
            anyhow::ensure!(
                root.is_dir(),
                "workspace root {:?} is not a directory",
                root
            );
        }

        let cache_capacity = args
            .cache_capacity
            .or(file_config.cache_capacity)
            .unwrap_or(DEFAULT_CACHE_CAPACITY)
            .max(1);

        let cache_ttl_secs = args
            .cache_ttl_secs
            .or(file_config.cache_ttl_secs)
            .unwrap_or(DEFAULT_CACHE_TTL_SECS)
            .max(1);

        // The fetch layer saturates quickly; keep the fan-out small.
        let fetch_concurrency = args
            .fetch_concurrency
            .or(file_config.fetch_concurrency)
            .unwrap_or(DEFAULT_FETCH_CONCURRENCY)
            .max(1);

        let mut supported_extensions = args
            .extensions
            .clone()
            .or(file_config.extensions)
            .unwrap_or_else(|| {
                DEFAULT_EXTENSIONS
                    .iter()
                    .map(|ext| (*ext).to_string())
                    .collect()
            })
            .into_iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect::<Vec<_>>();

        supported_extensions.sort();
        supported_extensions.dedup();

        anyhow::ensure!(
            !supported_extensions.is_empty(),
            "at least one file extension must be provided"
        );

        Ok(Self {
            data_service_url,
            workspace_root,
            cache_capacity,
            cache_ttl_secs,
            fetch_concurrency,
            supported_extensions,
        })
    }

    pub fn is_supported_file(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let lower = ext.to_ascii_lowercase();
                self.supported_extensions
                    .iter()
                    .any(|candidate| candidate == &lower)
            })
            .unwrap_or(false)
    }
}

#[derive(Parser, Debug, Default, Clone)]
#[command(name = "wardboard", about = "Hospital operations KPI engine", version)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "WARDBOARD_DATA_URL",
        value_name = "URL",
        help = "Base URL of the file-serving collaborator"
    )]
    pub data_service_url: Option<String>,

    #[arg(
        long,
        env = "WARDBOARD_WORKSPACE",
        value_name = "DIR",
        help = "Local directory of department exports, used instead of the data service"
    )]
    pub workspace_root: Option<PathBuf>,

    #[arg(
        long,
        env = "WARDBOARD_CACHE_CAPACITY",
        value_name = "N",
        help = "Maximum number of parsed snapshots kept in memory"
    )]
    pub cache_capacity: Option<usize>,

    #[arg(
        long,
        env = "WARDBOARD_CACHE_TTL",
        value_name = "SECS",
        help = "Seconds before a cached snapshot or cell result expires"
    )]
    pub cache_ttl_secs: Option<u64>,

    #[arg(
        long,
        env = "WARDBOARD_FETCH_CONCURRENCY",
        value_name = "N",
        help = "Files fetched in flight at once during series extraction"
    )]
    pub fetch_concurrency: Option<usize>,

    #[arg(
        long,
        env = "WARDBOARD_EXTENSIONS",
        value_name = "EXT",
        value_delimiter = ',',
        help = "Comma-separated list of allowed spreadsheet extensions"
    )]
    pub extensions: Option<Vec<String>>,

    #[arg(
        long,
        short = 'd',
        value_enum,
        help = "Department dashboard to refresh"
    )]
    pub department: Option<Department>,

    #[arg(long, value_name = "FILE", help = "Specific export file to load")]
    pub file: Option<String>,

    #[arg(
        long,
        value_name = "KPI_ID",
        help = "Also extract the monthly time series of this KPI"
    )]
    pub series_kpi: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    data_service_url: Option<String>,
    workspace_root: Option<PathBuf>,
    cache_capacity: Option<usize>,
    cache_ttl_secs: Option<u64>,
    fetch_concurrency: Option<usize>,
    extensions: Option<Vec<String>>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
