use std::path::Path;
use std::sync::Arc;

use krp_proxy_sequencer::{logger, run_diagnostics, ProxySequencer, SequencerConfig};
use krp_restproxy::{HttpRestProxyClient, RestProxyConfig};
use krp_schemaregistry::{HttpSchemaRegistryClient, SchemaRegistryConfig};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/config.yaml".to_string());
    let path = Path::new(&config_path);
    let config_found = path.exists();
    let cfg = if config_found {
        SequencerConfig::load(path)?
    } else {
        SequencerConfig::default()
    };

    logger::init_logger(&cfg.logging);
    if !config_found {
        warn!(config_path = %config_path, "config file not found, using built-in defaults");
    }

    info!(
        app_name = %cfg.app.name,
        schema_registry = %cfg.schema_registry.url,
        rest_proxy = %cfg.rest_proxy.url,
        topic = %cfg.topic,
        group = %cfg.consumer.group,
        consumer = %cfg.consumer.name,
        "starting proxy sequencer"
    );

    let registry = Arc::new(HttpSchemaRegistryClient::new(cfg.schema_registry.clone())?);
    let proxy = Arc::new(HttpRestProxyClient::new(cfg.rest_proxy.clone())?);
    let sequencer = ProxySequencer::new(cfg.clone(), registry, proxy);

    let report = match sequencer.run().await {
        Ok(report) => report,
        Err(e) => {
            error!(step = ?e.step(), error = %e, "sequence aborted");
            return Err(e.into());
        }
    };
    for record in &report.records {
        info!(
            topic = %record.topic,
            partition = record.partition,
            offset = record.offset,
            value = %record.value,
            "received record"
        );
    }

    if let Some(diag) = &cfg.diagnostics {
        let registry_url = diag
            .schema_registry_url
            .clone()
            .unwrap_or_else(|| cfg.schema_registry.url.clone());
        let proxy_url = diag
            .rest_proxy_url
            .clone()
            .unwrap_or_else(|| cfg.rest_proxy.url.clone());
        let diag_registry = HttpSchemaRegistryClient::new(SchemaRegistryConfig {
            url: registry_url,
            ..cfg.schema_registry.clone()
        })?;
        let diag_proxy = HttpRestProxyClient::new(RestProxyConfig {
            url: proxy_url,
            ..cfg.rest_proxy.clone()
        })?;
        let diag_report = run_diagnostics(&diag_registry, &diag_proxy, diag).await;
        if diag_report.failures > 0 {
            warn!(failures = diag_report.failures, "diagnostics finished with failures");
        }
    }

    Ok(())
}
