use std::{collections::HashMap, time::Duration};

use color_eyre::{eyre::Context, Result};
use opentelemetry_otlp::WithExportConfig;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{prelude::*, EnvFilter, Registry};
use tracing_tree::HierarchicalLayer;

pub const DEFAULT_FILTER: &str = "warn,collector=info,timeline=info";

/// Installs the global subscriber: a hierarchical stdout layer filtered by
/// `RUST_LOG`, plus Honeycomb export when `HONEYCOMB_API_KEY` is set.
///
/// `dataset` names the Honeycomb dataset spans are sent to.
pub fn setup_tracing(dataset: &str) -> Result<()> {
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.into());

    let env_filter = EnvFilter::builder()
        .parse(&rust_log)
        .wrap_err_with(|| format!("Couldn't create env filter from {rust_log}"))?;

    let opentelemetry_layer = if let Ok(honeycomb_key) = std::env::var("HONEYCOMB_API_KEY") {
        let mut map = HashMap::<String, String>::new();
        map.insert("x-honeycomb-team".to_string(), honeycomb_key);
        map.insert("x-honeycomb-dataset".to_string(), dataset.to_string());

        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(
                opentelemetry_otlp::new_exporter()
                    .http()
                    .with_endpoint("https://api.honeycomb.io/v1/traces")
                    .with_timeout(Duration::from_secs(3))
                    .with_headers(map),
            )
            .with_trace_config(opentelemetry_sdk::trace::Config::default().with_resource(
                opentelemetry_sdk::Resource::new(vec![opentelemetry::KeyValue::new(
                    "service.name",
                    dataset.to_string(),
                )]),
            ))
            .install_batch(opentelemetry_sdk::runtime::Tokio)
            .wrap_err("Couldn't install the Honeycomb exporter")?;

        eprintln!("Honeycomb layer configured");

        Some(OpenTelemetryLayer::new(tracer))
    } else {
        None
    };

    let hierarchical = HierarchicalLayer::default()
        .with_writer(std::io::stderr)
        .with_indent_lines(true)
        .with_indent_amount(2)
        .with_targets(true);

    Registry::default()
        .with(hierarchical)
        .with(opentelemetry_layer)
        .with(env_filter)
        .try_init()
        .wrap_err("Couldn't install the tracing subscriber")?;

    Ok(())
}
