use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use monitor::logger::logs_tracing;
use monitor::parse::{config_path, parser};
use monitor::{CommandSpawner, HealthChecker, Supervisor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = config_path();
    let cfg = parser(&path).context("Cannot load config")?;

    let _guard = logs_tracing(cfg.log_file.as_deref()).context("Cannot setup logging")?;
    info!(config = ?cfg, "Monitor starting");

    let checker = HealthChecker::new().context("Cannot build health checker")?;
    let supervisor = Supervisor::new(cfg, Arc::new(CommandSpawner), Arc::new(checker));

    supervisor.start().await.context("Cannot start app")?;

    supervisor.run().await;
    Ok(())
}
