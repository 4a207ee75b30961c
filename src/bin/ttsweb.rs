use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use tokio::select;
use tracing::info;
use tracing_subscriber::{
    fmt::time::SystemTime, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use ttsweb::{
    app::{self, AppStateBuilder},
    config::{Cli, Config},
    handler::middleware::request_log::AccessLogEventFormat,
    version,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_cli(&cli)?;

    let mut env_filter = EnvFilter::from_default_env();
    if let Some(level) = config.log_level_filter()? {
        env_filter = env_filter.add_directive(level.into());
    }

    let mut guard_holder = None;
    if let Some(ref log_file) = config.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .map_err(|e| anyhow::anyhow!("{}: {}", e, log_file))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        guard_holder = Some(guard);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .event_format(AccessLogEventFormat::new(SystemTime))
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer().event_format(AccessLogEventFormat::new(SystemTime)),
            )
            .try_init()?;
    }
    let _ = guard_holder; // keep the guard alive

    info!("{}", version::get_version_info().replace('\n', ", "));
    info!(
        endpoint = %config.openai_endpoint,
        output_dir = %config.output_dir.display(),
        "starting ttsweb on {}",
        config.http_addr
    );

    let state = AppStateBuilder::new().config(config).build()?;
    let token = state.token.clone();
    select! {
        result = app::run(state) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received CTRL+C, shutting down");
            token.cancel();
        }
    }
    Ok(())
}
