//! Storefront server entry point.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use storefront::prelude::*;
use storefront_config::DEFAULT_ENV_PREFIX;

const DEFAULT_CONFIG_PATH: &str = "storefront.toml";

/// Command-line arguments.
struct Args {
    config: PathBuf,
    required: bool,
    development: bool,
}

impl Args {
    fn parse() -> anyhow::Result<Self> {
        let mut args = std::env::args().skip(1);
        let mut parsed = Self {
            config: PathBuf::from(DEFAULT_CONFIG_PATH),
            required: false,
            development: false,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let path = args.next().context("--config needs a path")?;
                    parsed.config = PathBuf::from(path);
                    parsed.required = true;
                }
                "--dev" => parsed.development = true,
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("storefront {}", env!("CARGO_PKG_VERSION"));
                    std::process::exit(0);
                }
                other => anyhow::bail!("unknown argument: {other}"),
            }
        }
        Ok(parsed)
    }
}

fn print_help() {
    println!(
        r"Storefront - catalog and order HTTP backend

USAGE:
    storefront [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Configuration file, TOML or JSON (default: storefront.toml if present)
        --dev              Start from development defaults (pretty debug logs, no metrics)
    -h, --help             Print help information
    -v, --version          Print version information

ENVIRONMENT VARIABLES:
    STOREFRONT__SERVER__HTTP_ADDR                 Listen address (default: 0.0.0.0:8080)
    STOREFRONT__SERVER__MAX_BODY_BYTES            Request body limit (default: 1048576)
    STOREFRONT__PAGINATION__DEFAULT_PAGE_SIZE     Listing page size (default: 40)
    STOREFRONT__PAGINATION__MIN_SEARCH_LEN        Shortest search text (default: 3)
    STOREFRONT__TELEMETRY__LOGGING__LEVEL         Log level (default: info)
    STOREFRONT__TELEMETRY__METRICS__ADDR          Prometheus listener (default: 0.0.0.0:9090)
    RUST_LOG                                      Overrides the log level filter

Variables may also be set in a .env file in the working directory.
"
    );
}

fn load_config(args: &Args) -> anyhow::Result<StorefrontConfig> {
    let mut loader = ConfigLoader::new().with_dotenv();
    if args.development {
        loader = loader.with_development();
    }
    let loader = if args.required {
        loader.with_file(&args.config)?
    } else {
        loader.with_optional_file(&args.config)?
    };
    let config = loader.with_env_prefix(DEFAULT_ENV_PREFIX).load()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse()?;
    let config = load_config(&args).context("failed to load configuration")?;
    init_telemetry(&config.telemetry).context("failed to initialize telemetry")?;

    let state = AppState::new(Arc::new(MemoryStore::new()), Arc::new(MemoryIdentity::new()))
        .with_validator(Arc::new(RuleValidator::new()))
        .with_metrics(Arc::new(PrometheusSink))
        .with_pagination(config.pagination);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.server.http_addr,
        "starting storefront"
    );
    Server::new(App::new(state), config.server).run().await?;
    info!("storefront stopped");
    Ok(())
}
