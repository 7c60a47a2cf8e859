//! Configuration management with TOML, environment variables, and CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Largest page the Admin API serves.
pub const MAX_PAGE_SIZE: u32 = 250;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Shop name or domain; normally supplied on the command line
    #[serde(default)]
    pub shop: String,

    /// Admin API access token
    #[serde(default)]
    pub access_token: Option<String>,

    /// Private app API key
    #[serde(default)]
    pub api_key: Option<String>,

    /// Private app API password
    #[serde(default)]
    pub api_password: Option<String>,

    /// Which Admin API transport to page through
    #[serde(default)]
    pub api: Api,

    /// Admin API version, e.g. "2024-07"
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Products requested per page (1 to 250)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Request timeout in seconds; `0` disables it
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: Option<u64>,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Top-level property for JSON records; empty for a plain array
    #[serde(default)]
    pub json_root: String,

    /// Directory the export file is written to
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

fn default_api_version() -> String {
    "2024-07".to_string()
}

fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_timeout_secs() -> Option<u64> {
    Some(10)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shop: String::new(),
            access_token: None,
            api_key: None,
            api_password: None,
            api: Api::Rest,
            api_version: default_api_version(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
            proxy: None,
            format: OutputFormat::Csv,
            json_root: String::new(),
            output_dir: None,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        anyhow::ensure!(
            (1..=MAX_PAGE_SIZE).contains(&config.page_size),
            "Invalid page_size {} in {}: must be between 1 and {}",
            config.page_size,
            path.display(),
            MAX_PAGE_SIZE
        );

        Ok(config)
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("shopify-id-export").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(key) = std::env::var("SHOPIFY_API_KEY") {
            self.api_key = Some(key);
        }

        if let Ok(password) = std::env::var("SHOPIFY_API_PASSWORD") {
            self.api_password = Some(password);
        }

        if let Ok(token) = std::env::var("SHOPIFY_API_TOKEN") {
            self.access_token = Some(token);
        }

        if let Ok(version) = std::env::var("SHOPIFY_API_VERSION") {
            if !version.is_empty() {
                self.api_version = version;
            }
        }

        self
    }

    /// Shop name with any scheme, domain suffix, or trailing slash removed.
    ///
    /// `https://acme.myshopify.com/` and `acme` both give `acme`.
    pub fn shop_name(&self) -> &str {
        let shop = self.shop.trim().trim_end_matches('/');
        let shop = shop.strip_prefix("https://").or_else(|| shop.strip_prefix("http://")).unwrap_or(shop);
        shop.strip_suffix(".myshopify.com").unwrap_or(shop)
    }

    /// Path of the export file: `<output_dir>/<shop>.<csv|json>`.
    pub fn output_path(&self) -> PathBuf {
        let file_name = format!("{}.{}", self.shop_name(), self.format.extension());
        match &self.output_dir {
            Some(dir) => dir.join(file_name),
            None => PathBuf::from(file_name),
        }
    }
}

/// Shopify Admin API flavour used to page through products.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Api {
    Graphql,
    #[default]
    Rest,
}

impl std::str::FromStr for Api {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "graphql" | "gql" => Ok(Api::Graphql),
            "rest" => Ok(Api::Rest),
            _ => Err(format!("Unknown API: {}. Use: graphql, rest", s)),
        }
    }
}

impl std::fmt::Display for Api {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Api::Graphql => write!(f, "graphql"),
            Api::Rest => write!(f, "rest"),
        }
    }
}

/// Output format for the export file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    /// File extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use: csv, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.shop.is_empty());
        assert_eq!(config.api, Api::Rest);
        assert_eq!(config.api_version, "2024-07");
        assert_eq!(config.page_size, 250);
        assert_eq!(config.format, OutputFormat::Csv);
        assert!(config.json_root.is_empty());
        assert!(config.access_token.is_none());
        assert_eq!(config.timeout_secs, Some(10));
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);

        let err = "xml".parse::<OutputFormat>().unwrap_err();
        assert!(err.contains("Unknown format"));
        assert!(err.contains("csv, json"));
    }

    #[test]
    fn test_api_parsing() {
        assert_eq!("graphql".parse::<Api>().unwrap(), Api::Graphql);
        assert_eq!("GQL".parse::<Api>().unwrap(), Api::Graphql);
        assert_eq!("rest".parse::<Api>().unwrap(), Api::Rest);
        assert!("soap".parse::<Api>().unwrap_err().contains("graphql, rest"));
        assert_eq!(Api::Rest.to_string(), "rest");
    }

    #[test]
    fn test_output_format_serde() {
        let json = serde_json::to_string(&OutputFormat::Json).unwrap();
        assert_eq!(json, "\"json\"");

        let parsed: OutputFormat = serde_json::from_str("\"csv\"").unwrap();
        assert_eq!(parsed, OutputFormat::Csv);
    }

    #[test]
    fn test_output_path() {
        let mut config = Config { shop: "acme".to_string(), ..Config::default() };
        assert_eq!(config.output_path(), PathBuf::from("acme.csv"));

        config.format = OutputFormat::Json;
        config.output_dir = Some(PathBuf::from("exports"));
        assert_eq!(config.output_path(), PathBuf::from("exports/acme.json"));
    }

    #[test]
    fn test_shop_name_strips_domain() {
        for shop in ["acme", "acme.myshopify.com", "https://acme.myshopify.com/", "http://acme.myshopify.com"] {
            let config = Config { shop: shop.to_string(), ..Config::default() };
            assert_eq!(config.shop_name(), "acme", "{shop}");
        }

        let config = Config { shop: "shop.example.com".to_string(), ..Config::default() };
        assert_eq!(config.shop_name(), "shop.example.com");
    }

    #[test]
    fn test_config_from_toml_all_fields() {
        let toml = r#"
            shop = "acme"
            access_token = "shpat_abc"
            api_key = "key"
            api_password = "secret"
            api = "rest"
            api_version = "2023-10"
            page_size = 100
            timeout_secs = 30
            proxy = "socks5://localhost:1080"
            format = "json"
            json_root = "sku"
            output_dir = "/tmp/exports"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.shop, "acme");
        assert_eq!(config.access_token.as_deref(), Some("shpat_abc"));
        assert_eq!(config.api, Api::Rest);
        assert_eq!(config.api_version, "2023-10");
        assert_eq!(config.page_size, 100);
        assert_eq!(config.timeout_secs, Some(30));
        assert_eq!(config.proxy.as_deref(), Some("socks5://localhost:1080"));
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.json_root, "sku");
        assert_eq!(config.output_dir, Some(PathBuf::from("/tmp/exports")));
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            page_size = 50
            format = "json"
            "#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.page_size, 50);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.api_version, "2024-07");
    }

    #[test]
    fn test_config_from_file_rejects_page_size_out_of_range() {
        for size in [0, 251] {
            let mut file = NamedTempFile::new().unwrap();
            writeln!(file, "page_size = {size}").unwrap();

            let err = Config::from_file(file.path()).unwrap_err().to_string();
            assert!(err.contains("Invalid page_size"), "{err}");
        }
    }

    #[test]
    fn test_config_from_file_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"shop = "acme""#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.api, Api::Rest);
        assert_eq!(config.page_size, MAX_PAGE_SIZE);
        assert_eq!(config.timeout_secs, Some(10));
    }

    #[test]
    fn test_config_from_file_not_found() {
        let result = Config::from_file("/nonexistent/path/config.toml");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_config_from_file_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml {{{{").unwrap();

        let err = Config::from_file(file.path()).unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_config_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"api = "graphql""#).unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.api, Api::Graphql);
    }

    #[test]
    fn test_config_with_env() {
        let saved: Vec<(&str, Option<String>)> =
            ["SHOPIFY_API_KEY", "SHOPIFY_API_PASSWORD", "SHOPIFY_API_TOKEN", "SHOPIFY_API_VERSION"]
                .into_iter()
                .map(|name| (name, std::env::var(name).ok()))
                .collect();

        std::env::set_var("SHOPIFY_API_KEY", "env-key");
        std::env::set_var("SHOPIFY_API_PASSWORD", "env-pass");
        std::env::set_var("SHOPIFY_API_TOKEN", "env-token");
        std::env::set_var("SHOPIFY_API_VERSION", "2025-01");

        let config = Config::new().with_env();
        assert_eq!(config.api_key.as_deref(), Some("env-key"));
        assert_eq!(config.api_password.as_deref(), Some("env-pass"));
        assert_eq!(config.access_token.as_deref(), Some("env-token"));
        assert_eq!(config.api_version, "2025-01");

        for (name, value) in saved {
            match value {
                Some(v) => std::env::set_var(name, v),
                None => std::env::remove_var(name),
            }
        }
    }
}
