//! Log subscriber and optional span export
//!
//! Spans come from two places: the HTTP trace layer in [`crate::api`] and
//! the instrumented store methods. Export to an OTLP collector is compiled in
//! with the `otlp` feature and switched on with `tracing.enabled`; it only
//! observes and never changes a response.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingSection, TracingSection};

/// Handle kept alive by `main` so buffered spans can be flushed on exit.
#[derive(Default)]
pub struct Telemetry {
    #[cfg(feature = "otlp")]
    provider: Option<opentelemetry_sdk::trace::TracerProvider>,
}

impl Telemetry {
    /// True when spans are being exported to a collector.
    pub fn exporting(&self) -> bool {
        #[cfg(feature = "otlp")]
        {
            self.provider.is_some()
        }
        #[cfg(not(feature = "otlp"))]
        {
            false
        }
    }

    /// Flush pending spans and stop the exporter.
    pub fn shutdown(self) {
        #[cfg(feature = "otlp")]
        if let Some(provider) = self.provider {
            if let Err(err) = provider.shutdown() {
                tracing::warn!(error = %err, "Failed to flush span exporter");
            }
        }
    }
}

pub fn build_env_filter(logging: &LoggingSection) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(logging.level.clone()))
        .unwrap_or_else(|_| EnvFilter::new("plants_api=info"))
}

/// Install the global subscriber. Call once, inside the tokio runtime.
pub fn init(logging: &LoggingSection, tracing_config: &TracingSection) -> anyhow::Result<Telemetry> {
    let env_filter = build_env_filter(logging);

    #[cfg(feature = "otlp")]
    let (otel_layer, telemetry) = if tracing_config.enabled {
        let (layer, provider) = otlp::layer(tracing_config)?;
        (
            Some(layer),
            Telemetry {
                provider: Some(provider),
            },
        )
    } else {
        (None, Telemetry::default())
    };

    #[cfg(not(feature = "otlp"))]
    let (otel_layer, telemetry) = (
        None::<tracing_subscriber::layer::Identity>,
        Telemetry::default(),
    );

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(otel_layer);

    match logging.format {
        LogFormat::Json => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            registry.with(tracing_subscriber::fmt::layer()).init();
        }
    }

    if telemetry.exporting() {
        tracing::info!(endpoint = %tracing_config.endpoint, "Exporting spans over OTLP");
    } else if tracing_config.enabled {
        tracing::warn!("tracing.enabled is set but this build lacks the `otlp` feature; spans stay local");
    }

    Ok(telemetry)
}

#[cfg(feature = "otlp")]
mod otlp {
    use anyhow::Context;
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::{Tracer, TracerProvider};
    use opentelemetry_sdk::{runtime, Resource};
    use tracing_opentelemetry::OpenTelemetryLayer;

    use crate::config::TracingSection;

    pub fn layer<S>(
        config: &TracingSection,
    ) -> anyhow::Result<(OpenTelemetryLayer<S, Tracer>, TracerProvider)>
    where
        S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
    {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(config.endpoint.clone())
            .build()
            .with_context(|| format!("failed to build OTLP exporter for {}", config.endpoint))?;

        let provider = TracerProvider::builder()
            .with_batch_exporter(exporter, runtime::Tokio)
            .with_resource(Resource::new(vec![KeyValue::new(
                "service.name",
                config.service_name.clone(),
            )]))
            .build();

        let tracer = provider.tracer(config.service_name.clone());
        opentelemetry::global::set_tracer_provider(provider.clone());

        Ok((tracing_opentelemetry::layer().with_tracer(tracer), provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_filter_falls_back_on_garbage_level() {
        let logging = LoggingSection {
            level: "[[not a directive".into(),
            format: LogFormat::Text,
        };
        // Must not panic whatever RUST_LOG holds.
        let _ = build_env_filter(&logging);
    }

    #[test]
    fn disabled_telemetry_exports_nothing() {
        let telemetry = Telemetry::default();
        assert!(!telemetry.exporting());
        telemetry.shutdown();
    }
}
