use anyhow::Context;
use print_agent::{
    Agent, EscPosTransport, HttpJobSource, JobOrchestrator, LOG_CLEANUP_INTERVAL, Rasterizer,
    ReceiptRenderer, periodic_cleanup, setup_environment,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. .env, config, logging
    let config = setup_environment();
    tracing::info!(
        restaurant_id = %config.restaurant_id,
        job_folder = %config.job_folder.display(),
        timezone = %config.timezone,
        "Print agent starting"
    );

    let shutdown = CancellationToken::new();
    if let Some(dir) = config.log_dir.clone() {
        tokio::spawn(periodic_cleanup(
            dir.into(),
            config.log_retention_days,
            LOG_CLEANUP_INTERVAL,
            shutdown.clone(),
        ));
    }

    // 2. Pipeline
    let source = HttpJobSource::new(&config).context("failed to build job source client")?;
    let orchestrator = JobOrchestrator::new(
        ReceiptRenderer::new(config.timezone),
        Rasterizer::new(config.font_dir.as_deref()),
        EscPosTransport::from_config(&config),
    );
    let agent = Agent::new(source, orchestrator);

    // 3. Ctrl-C stops the loop after the current cycle
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            signal.cancel();
        }
    });

    agent.run(&config, shutdown).await;
    Ok(())
}
