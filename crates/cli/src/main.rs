use std::{sync::Arc, time::Duration};

use {
    anyhow::Context,
    clap::Parser,
    tracing::{error, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    guildsync::pipeline,
    guildsync_config::GuildsyncConfig,
    guildsync_cron::{RunFn, SyncScheduler, trigger_from_schedule},
    guildsync_source::{DiscordSource, MessagePurger},
    guildsync_web::WebState,
};

/// How long to wait between source readiness probes at startup.
const READY_BACKOFF: Duration = Duration::from_secs(5);
const READY_ATTEMPTS: u32 = 12;

#[derive(Parser)]
#[command(
    name = "guildsync",
    about = "Reads a guild's category/channel directory and republishes it to a sink on a schedule"
)]
struct Cli {
    /// Run a single sync and exit instead of starting the scheduler.
    #[arg(long)]
    once: bool,

    /// Path to a config file (otherwise standard locations, then environment
    /// variables).
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Port for the liveness server (overrides config value).
    #[arg(long)]
    port: Option<u16>,
}

fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

/// Per-run wiring: a fresh sink (and its adaptive delay) is built for every
/// run, so no state leaks across runs beyond the external store itself.
fn make_run_fn(source: Arc<DiscordSource>, cfg: Arc<GuildsyncConfig>) -> RunFn {
    Arc::new(move || {
        let source = Arc::clone(&source);
        let cfg = Arc::clone(&cfg);
        Box::pin(async move {
            let sink_cfg = cfg
                .sink
                .clone()
                .ok_or_else(|| anyhow::anyhow!("no sink configured"))?;
            let (sink, shape) = pipeline::build_sink(&sink_cfg);
            let spec = pipeline::purge_spec(&cfg);
            let purge = spec
                .as_ref()
                .map(|s| (source.as_ref() as &dyn MessagePurger, s));
            pipeline::run_sync(source.as_ref(), purge, sink, shape, &cfg.allow_list())
                .await
                .map(|_| ())
        })
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli);

    let mut cfg = match &cli.config {
        Some(path) => guildsync_config::load_config(path)?,
        None => guildsync_config::discover_and_load()?,
    };
    if let Some(port) = cli.port {
        cfg.server.port = port;
    }
    cfg.validate().context("configuration error")?;

    let guild_id = cfg.source.guild_id.unwrap_or_default();
    let source = Arc::new(DiscordSource::new(cfg.source_token()?, guild_id));
    let cfg = Arc::new(cfg);

    let trigger = trigger_from_schedule(&cfg.schedule).context("invalid schedule")?;
    let deadline = Duration::from_secs(cfg.schedule.run_deadline_secs());
    let run = make_run_fn(Arc::clone(&source), Arc::clone(&cfg));
    let (scheduler, status_rx) = SyncScheduler::new(trigger, run, Some(deadline));

    // Explicit init sequencing: the scheduler only starts once the source
    // resolves, so the first run never races the connection.
    info!(guild_id, "waiting for source guild");
    source
        .wait_ready(READY_ATTEMPTS, READY_BACKOFF)
        .await
        .context("source guild never became reachable")?;

    if cli.once {
        if scheduler.run_once().await {
            return Ok(());
        }
        anyhow::bail!("sync run failed");
    }

    let web_state = WebState {
        version: env!("CARGO_PKG_VERSION"),
        status: status_rx,
    };
    let bind = cfg.server.bind.clone();
    let port = cfg.server.port;
    tokio::spawn(async move {
        if let Err(e) = guildsync_web::serve(&bind, port, web_state).await {
            error!(error = %e, "liveness server exited");
        }
    });

    tokio::select! {
        res = scheduler.run_loop() => {
            res.context("scheduler failed")?;
        },
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
        },
    }
    Ok(())
}
