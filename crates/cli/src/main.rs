//! Pay.nl CLI entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Load configuration**: an optional JSON config file, overlaid with
//!    `PAYNL_*` environment variables (environment wins).
//! 2. **Wire observability**: `tracing-subscriber` with a JSON layer on
//!    stderr, plus an OpenTelemetry OTLP exporter when
//!    `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
//! 3. **Construct infrastructure**: `HttpTransport` and `OutboundAddress`,
//!    injected into an [`invoker::Client`].
//! 4. **Invoke**: perform one call and print the decoded response as JSON on
//!    stdout.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context as _};
use clap::Parser;
use invoker::{Client, ConfigPatch, Params};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::TracerProvider;
use serde_json::Value;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::EnvFilter;
use transport::{HttpTransport, OutboundAddress};

/// Invoke a Pay.nl REST API method.
#[derive(Debug, Parser)]
#[command(name = "paynl", version)]
struct Cli {
    /// Method to call, as `namespace/action/version` (e.g. `Enduser/export/v3`).
    method: String,

    /// JSON config file with camelCase keys (`apiHost`, `token`, ...).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Query parameter as `key=value`; may be repeated.
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Query parameters as a JSON object; merged before `--param` values.
    #[arg(long, value_name = "JSON")]
    params_json: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let provider = init_tracing()?;

    let result = run(cli).await;

    if let Some(provider) = provider {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "failed to flush traces");
        }
    }
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let patch = load_config(cli.config.as_deref())?;
    let params = collect_params(cli.params_json.as_deref(), &cli.params)?;

    let mut transport = HttpTransport::builder();
    if let Some(secs) = cli.timeout {
        transport = transport.timeout(Duration::from_secs(secs));
    }
    let transport = transport.build().context("build HTTP transport")?;

    let client = Client::builder(Arc::new(transport), Arc::new(OutboundAddress::default()))
        .configure(patch)
        .build();
    tracing::debug!(config = ?client.config(), "client configured");

    let response = client
        .invoke(&cli.method, params)
        .await
        .with_context(|| format!("invoke {}", cli.method))?;

    let rendered =
        serde_json::to_string_pretty(response.as_value()).context("render response")?;
    println!("{rendered}");
    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<ConfigPatch> {
    let file = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("read config file {}", path.display()))?;
            serde_json::from_str::<ConfigPatch>(&content)
                .with_context(|| format!("parse config file {}", path.display()))?
        }
        None => ConfigPatch::default(),
    };
    let env = ConfigPatch::from_env().context("read PAYNL_* environment")?;
    Ok(file.and_then(env))
}

fn collect_params(json: Option<&str>, pairs: &[String]) -> anyhow::Result<Option<Params>> {
    let mut params = match json {
        Some(raw) => match serde_json::from_str::<Value>(raw).context("parse --params-json")? {
            Value::Object(map) => map,
            _ => bail!("--params-json must be a JSON object"),
        },
        None => Params::new(),
    };

    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("--param expects KEY=VALUE, got '{pair}'");
        };
        params.insert(key.to_owned(), Value::String(value.to_owned()));
    }

    Ok((!params.is_empty() || json.is_some()).then_some(params))
}

fn init_tracing() -> anyhow::Result<Option<TracerProvider>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr);

    let provider = if std::env::var_os("OTEL_EXPORTER_OTLP_ENDPOINT").is_some() {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .build()
            .context("build OTLP span exporter")?;
        Some(
            TracerProvider::builder()
                .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
                .build(),
        )
    } else {
        None
    };
    let otel = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer("paynl")));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt)
        .with(otel)
        .try_init()
        .context("install tracing subscriber")?;
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn params_merge_json_then_pairs() {
        let params = collect_params(
            Some(r#"{"id":7,"name":"a"}"#),
            &["name=b".to_owned(), "empty=".to_owned()],
        )
        .unwrap()
        .unwrap();

        assert_eq!(params["id"], json!(7));
        assert_eq!(params["name"], json!("b"));
        assert_eq!(params["empty"], json!(""));
    }

    #[test]
    fn no_params_means_no_query() {
        assert!(collect_params(None, &[]).unwrap().is_none());
    }

    #[test]
    fn malformed_pair_is_rejected() {
        assert!(collect_params(None, &["novalue".to_owned()]).is_err());
    }

    #[test]
    fn non_object_json_is_rejected() {
        assert!(collect_params(Some("[1,2]"), &[]).is_err());
    }

    #[test]
    fn cli_parses_repeated_params() {
        let cli = Cli::try_parse_from([
            "paynl",
            "Enduser/export/v3",
            "-p",
            "id=7",
            "--param",
            "page=2",
            "--timeout",
            "30",
        ])
        .unwrap();
        assert_eq!(cli.method, "Enduser/export/v3");
        assert_eq!(cli.params, ["id=7", "page=2"]);
        assert_eq!(cli.timeout, Some(30));
    }
}
