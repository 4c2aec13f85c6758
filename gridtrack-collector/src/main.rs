mod settings;

use std::sync::Arc;

use clap::Parser;
use gridtrack::{Collector, ConnectorBuilder, GridConnector, MemoryStore, QuotaConfig};
use gridtrack_connectors::{CarbonIntensityConnector, ElexonConnector};
use tracing_subscriber::EnvFilter;

use settings::Settings;

fn wrap(raw: Arc<dyn GridConnector>, quota: Option<&QuotaConfig>) -> Arc<dyn GridConnector> {
    match quota {
        Some(quota) => ConnectorBuilder::new(raw).with_quota(quota).build(),
        None => raw,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG overrides, e.g. RUST_LOG=info,gridtrack=debug
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let settings = Settings::parse();
    let quota = settings.quota();
    let carbon = settings
        .carbon_base_url
        .as_deref()
        .map_or_else(CarbonIntensityConnector::new_default, |url| {
            CarbonIntensityConnector::with_base_url(url)
        });
    let elexon = settings
        .elexon_base_url
        .as_deref()
        .map_or_else(ElexonConnector::new_default, |url| ElexonConnector::with_base_url(url));

    let collector = Collector::builder()
        .with_connector(wrap(Arc::new(carbon), quota.as_ref()))
        .with_connector(wrap(Arc::new(elexon), quota.as_ref()))
        .store(Arc::new(MemoryStore::new()))
        .config(settings.collector_config())
        .build()?;

    let series: Vec<String> = collector
        .config()
        .series
        .iter()
        .map(|s| s.series.to_string())
        .collect();
    tracing::info!(
        series = %series.join(","),
        collection_interval_s = collector.config().collection_interval.as_secs(),
        "starting gridtrack collector"
    );

    let handle = Arc::new(collector).spawn();
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");
    handle.stop().await;
    Ok(())
}
