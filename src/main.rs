use clap::Parser;
use std::sync::Arc;
use wardboard::{CliArgs, DashboardConfig, DashboardState, LoggingConfig, init_logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logging_config = LoggingConfig::from_env();
    let _guard = init_logging(logging_config)?;

    let cli = CliArgs::parse();
    let config = DashboardConfig::from_args(&cli)?;
    let state = DashboardState::new(Arc::new(config));

    let Some(department) = cli.department else {
        anyhow::bail!("--department is required (one of: ed, lab, bb, or, rad)");
    };

    let dashboard = state
        .refresh_department(department, cli.file.as_deref())
        .await?;
    println!("{}", serde_json::to_string_pretty(&dashboard)?);

    if let Some(kpi_id) = cli.series_kpi.as_deref() {
        let series = state.kpi_series(department, kpi_id).await?;
        println!("{}", serde_json::to_string_pretty(&series)?);
    }

    Ok(())
}
