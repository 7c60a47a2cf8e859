//! shopify-id-export - Export a Shopify store's product and variant identifiers.

use anyhow::Result;
use clap::{CommandFactory, FromArgMatches, Parser};
use shopify_id_export::commands::ExportCommand;
use shopify_id_export::config::{Api, Config, OutputFormat, MAX_PAGE_SIZE};
use shopify_id_export::RootProperty;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "shopify-id-export",
    version,
    about = "Export a Shopify store's product and variant identifiers",
    long_about = "Export a Shopify store's products and variants to <shop>.csv, or to <shop>.json with --json."
)]
struct Cli {
    /// Shop name (acme) or domain (acme.myshopify.com)
    shop: String,

    /// Output the dump as JSON instead of CSV
    #[arg(short, long)]
    json: bool,

    /// Use this property as the top-level key of each JSON object
    #[arg(short = 'r', long, value_name = "PROPERTY")]
    json_root: Option<String>,

    /// Page size to use when retrieving products
    #[arg(short = 's', long = "size", value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_PAGE_SIZE)))]
    page_size: Option<u32>,

    /// Shopify API key [env: SHOPIFY_API_KEY]
    #[arg(short, long)]
    key: Option<String>,

    /// Shopify API password [env: SHOPIFY_API_PASSWORD]
    #[arg(short, long)]
    password: Option<String>,

    /// Shopify API access token [env: SHOPIFY_API_TOKEN]
    #[arg(short, long)]
    token: Option<String>,

    /// Request timeout in seconds, 0 for none [default: 10]
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Admin API to page through (rest, graphql) [default: rest]
    #[arg(long)]
    api: Option<Api>,

    /// Admin API version, e.g. 2024-07 [env: SHOPIFY_API_VERSION]
    #[arg(long)]
    api_version: Option<String>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long)]
    proxy: Option<String>,

    /// Directory to write the export file to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log Shopify API requests and responses
    #[arg(long)]
    verbose: bool,
}

fn root_help() -> String {
    format!("Valid properties for the --json-root option are: {}", RootProperty::names().join(", "))
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Cli::command().after_help(root_help()).get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    config.shop = cli.shop;

    if cli.json {
        config.format = OutputFormat::Json;
    }
    if let Some(root) = cli.json_root {
        config.json_root = root;
    }
    if let Some(size) = cli.page_size {
        config.page_size = size;
    }
    if let Some(key) = cli.key {
        config.api_key = Some(key);
    }
    if let Some(password) = cli.password {
        config.api_password = Some(password);
    }
    if let Some(token) = cli.token {
        config.access_token = Some(token);
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = Some(timeout);
    }
    if let Some(api) = cli.api {
        config.api = api;
    }
    if let Some(version) = cli.api_version {
        config.api_version = version;
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = Some(dir);
    }

    let report = ExportCommand::new(config).execute().await?;
    println!("{}", report);

    Ok(())
}
