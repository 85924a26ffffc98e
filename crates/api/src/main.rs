use std::sync::Arc;

use anyhow::Context;

use shelfwatch_api::{AlertFeed, DaemonConfig, sample_catalog};
use shelfwatch_catalog::Catalog;
use shelfwatch_infra::{AlertStore, CatalogSource, InMemorySalesLedger, PipelineRunner, Scope};

fn load_catalog(config: &DaemonConfig) -> anyhow::Result<Catalog> {
    match &config.catalog_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading catalog {}", path.display()))?;
            Catalog::from_json(&raw).with_context(|| format!("parsing catalog {}", path.display()))
        }
        None => sample_catalog().context("building sample catalog"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real deployments set the environment directly.
    let _ = dotenvy::dotenv();

    let config = DaemonConfig::from_env().context("reading configuration")?;
    shelfwatch_observability::init(config.log_format);

    let ledger = Arc::new(InMemorySalesLedger::with_catalog(load_catalog(&config)?));
    let catalog = Arc::new(ledger.load_catalog().context("loading catalog from ledger")?);
    tracing::info!(
        cities = catalog.cities().len(),
        stores = catalog.stores().len(),
        products = catalog.products().len(),
        "catalog loaded"
    );

    let store = Arc::new(AlertStore::new(
        config.pipeline.max_alerts,
        config.pipeline.max_forecasts,
    ));
    let feed = AlertFeed::new(store.clone(), catalog.clone());

    let runner = PipelineRunner::new(config.pipeline.clone());
    let handle = runner.spawn(catalog, ledger.clone(), store);
    tracing::info!(
        tick_secs = config.pipeline.tick_interval.as_secs(),
        window_days = config.pipeline.forecast_window_days,
        "pipeline started"
    );

    let mut status = tokio::time::interval(config.status_interval);
    status.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = status.tick() => {
                let counts = feed.get_counts(Scope::All);
                let stats = handle.stats();
                let top = feed.riskiest_forecasts(Scope::All, 1).into_iter().next();
                tracing::info!(
                    total = counts.total,
                    restock_needed = counts.restock_needed,
                    overstock = counts.overstock,
                    ok = counts.ok,
                    ledger_events = ledger.len(),
                    restarts = stats.restarts,
                    top_forecast_store = ?top.as_ref().map(|f| f.store_id),
                    top_forecast_product = ?top.as_ref().map(|f| f.product_id),
                    top_forecast_units = top.as_ref().map(|f| f.predicted_units),
                    "status"
                );
            }
            res = &mut ctrl_c => {
                if let Err(e) = res {
                    tracing::error!(error = %e, "failed to listen for ctrl-c; shutting down");
                }
                break;
            }
        }
    }

    tracing::info!("shutdown requested");
    let stats = tokio::task::spawn_blocking(move || handle.shutdown())
        .await
        .context("joining pipeline shutdown")?;
    tracing::info!(
        ticks = stats.ticks,
        alerts_emitted = stats.alerts_emitted,
        ticks_abandoned = stats.ticks_abandoned,
        forecast_cycles = stats.forecast_cycles,
        forecast_failures = stats.forecast_failures,
        restarts = stats.restarts,
        "pipeline stopped"
    );

    Ok(())
}
