use anyhow::Result;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use cheapcharge::cli::{parse_args, print_help};
use cheapcharge::config::Config;
use cheapcharge::growatt::GrowattClient;
use cheapcharge::octopus::OctopusClient;
use cheapcharge::orchestrator::{self, RunOutcome, RunSettings};
use cheapcharge::redact;
use cheapcharge::scheduler::run_scheduler;

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args();

    if args.help {
        print_help();
        return Ok(());
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cheapcharge=info".parse()?),
        )
        .init();

    info!("cheapcharge v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!("  Account: {}", redact::username(&config.growatt_username));
    info!("  Inverter: {}", redact::serial_number(&config.serial_number));
    info!("  Cost threshold: {}p", config.cost_threshold_pence);
    info!("  Price feed: {}", config.octopus_url);

    // Handle --validate mode
    if args.validate {
        info!("Validating configuration...");
        match config.validate() {
            Ok(()) => {
                info!("Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        }
    }
    config.validate()?;

    let feed = OctopusClient::new(config.octopus_url.clone());
    let device = GrowattClient::new(
        config.growatt_url.clone(),
        config.growatt_username.clone(),
        config.growatt_password.clone(),
        config.serial_number.clone(),
    );
    let settings = RunSettings::from(&config);

    if args.dry_run {
        info!("Dry run: the inverter will not be contacted");
        match orchestrator::plan(Utc::now(), &feed, &settings).await? {
            Some(plan) => {
                info!("Summer time: {}", plan.daylight_saving);
                info!("Primary slot params: {:?}", plan.primary.params);
                info!("Secondary slot params: {:?}", plan.secondary.params);
            }
            None => warn!("No tariffs published for tomorrow yet"),
        }
        return Ok(());
    }

    if args.once {
        info!("Running single update (--once mode)");
        log_outcome(&orchestrator::run(Utc::now(), &feed, &device, &settings).await?);
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            shutdown.cancel();
        }
    });

    let (feed, device, settings) = (&feed, &device, &settings);
    run_scheduler(config.run_hour_utc, cancel, || async move {
        match orchestrator::run(Utc::now(), feed, device, settings).await {
            Ok(outcome) => log_outcome(&outcome),
            Err(e) => error!("Charge update failed: {:#}", e),
        }
    })
    .await;

    Ok(())
}

fn log_outcome(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Scheduled(plan) => {
            info!(
                "Programmed {} windows for tomorrow, {} enabled",
                plan.windows.len(),
                plan.enabled_windows()
            );
            if plan.enabled_windows() == 0 {
                warn!("Every selected window is above the cost threshold; no charging will happen");
            }
        }
        RunOutcome::NoTariffs => warn!("Nothing scheduled: no tariffs for tomorrow"),
    }
}
