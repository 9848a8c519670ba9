//! Defines the configuration settings for the scanlens application.

use crate::classifier::DEFAULT_APK_URL;
use anyhow::Context;
use clap::Args;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration flags shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct ConfigArgs {
    /// Path to configuration file (TOML format)
    #[arg(long, global = true, env = "SCANLENS_CONFIG")]
    pub config_file: Option<String>,

    /// Comma-separated list of links always treated as APK downloads
    #[arg(long, global = true, env = "SCANLENS_KNOWN_APK_URLS")]
    pub known_apk_urls: Option<String>,

    /// Window in milliseconds during which a repeated identical scan is ignored
    #[arg(long, global = true, env = "SCANLENS_SCAN_COOLDOWN_MS")]
    pub scan_cooldown_ms: Option<u64>,

    /// Directory APK downloads are saved to
    #[arg(long, global = true, env = "SCANLENS_DOWNLOAD_DIR")]
    pub download_dir: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long, global = true, env = "SCANLENS_REQUEST_TIMEOUT")]
    pub request_timeout: Option<u64>,

    /// User agent string for HTTP requests
    #[arg(long, global = true, env = "SCANLENS_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Path to the JSON product catalog used for cart lookups
    #[arg(long, global = true, env = "SCANLENS_CATALOG")]
    pub catalog: Option<String>,

    /// Maximum number of concurrently handled API requests
    #[arg(long, global = true, env = "SCANLENS_MAX_CONCURRENCY")]
    pub max_concurrency: Option<usize>,
}

/// TOML Configuration file structure
#[derive(Deserialize, Debug, Default)]
struct ConfigFile {
    classifier: Option<ClassifierConfig>,
    download: Option<DownloadConfig>,
    cart: Option<CartConfig>,
    server: Option<ServerConfig>,
}

#[derive(Deserialize, Debug, Default)]
struct ClassifierConfig {
    known_apk_urls: Option<Vec<String>>,
    scan_cooldown_ms: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
struct DownloadConfig {
    download_dir: Option<String>,
    request_timeout: Option<u64>,
    user_agent: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct CartConfig {
    catalog_file: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct ServerConfig {
    port: Option<u16>,
    max_concurrency: Option<usize>,
}

const DEFAULT_USER_AGENT: &str = concat!("scanlens/", env!("CARGO_PKG_VERSION"));
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Application configuration settings.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    /// Links classified as APK downloads even without a `.apk` suffix.
    pub known_apk_urls: Vec<String>,
    /// Identical payloads scanned again within this window are ignored.
    pub scan_cooldown: Duration,
    /// Where downloaded packages are written.
    pub download_dir: PathBuf,
    /// Timeout for the APK download request.
    pub request_timeout: Duration,
    /// User agent string to use for HTTP requests.
    pub user_agent: String,
    /// Optional product catalog used to match scanned serial numbers.
    pub catalog_file: Option<PathBuf>,
    /// Port the API server listens on.
    pub server_port: u16,
    /// Maximum number of API requests processed at once.
    pub max_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            known_apk_urls: vec![DEFAULT_APK_URL.to_string()],
            scan_cooldown: Duration::from_millis(2000),
            download_dir: PathBuf::from("downloads"),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            catalog_file: None,
            server_port: 8080,
            max_concurrency: 10,
        }
    }
}

/// Load configuration from a TOML file
fn load_config_file(file_path: &str) -> anyhow::Result<ConfigFile> {
    let path = Path::new(file_path);
    if !path.exists() {
        tracing::warn!("Configuration file {} not found, using defaults", file_path);
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", file_path))?;

    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML configuration from {}", file_path))?;

    tracing::info!("Loaded configuration from {}", file_path);
    Ok(config)
}

fn apply_file_config(config: &mut Config, file_config: &ConfigFile) {
    if let Some(classifier) = &file_config.classifier {
        if let Some(urls) = &classifier.known_apk_urls {
            config.known_apk_urls = urls.clone();
        }
        if let Some(cooldown) = classifier.scan_cooldown_ms {
            config.scan_cooldown = Duration::from_millis(cooldown);
        }
    }

    if let Some(download) = &file_config.download {
        if let Some(dir) = &download.download_dir {
            config.download_dir = PathBuf::from(dir);
        }
        if let Some(timeout) = download.request_timeout {
            config.request_timeout = Duration::from_secs(timeout);
        }
        if let Some(user_agent) = &download.user_agent {
            config.user_agent = user_agent.clone();
        }
    }

    if let Some(cart) = &file_config.cart {
        if let Some(catalog) = &cart.catalog_file {
            config.catalog_file = Some(PathBuf::from(catalog));
        }
    }

    if let Some(server) = &file_config.server {
        if let Some(port) = server.port {
            config.server_port = port;
        }
        if let Some(concurrency) = server.max_concurrency {
            config.max_concurrency = concurrency;
        }
    }
}

/// Apply command line arguments to the Config instance
fn apply_cli_args(config: &mut Config, args: &ConfigArgs) {
    if let Some(ref urls) = args.known_apk_urls {
        config.known_apk_urls = urls
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    if let Some(cooldown) = args.scan_cooldown_ms {
        config.scan_cooldown = Duration::from_millis(cooldown);
    }

    if let Some(ref dir) = args.download_dir {
        config.download_dir = PathBuf::from(dir);
    }

    if let Some(timeout) = args.request_timeout {
        config.request_timeout = Duration::from_secs(timeout);
    }

    if let Some(ref agent) = args.user_agent {
        config.user_agent = agent.clone();
    }

    if let Some(ref catalog) = args.catalog {
        config.catalog_file = Some(PathBuf::from(catalog));
    }

    if let Some(concurrency) = args.max_concurrency {
        config.max_concurrency = concurrency;
    }
}

fn validate_config(config: &mut Config) {
    let before = config.known_apk_urls.len();
    config.known_apk_urls.retain(|url| !url.trim().is_empty());
    if config.known_apk_urls.len() != before {
        tracing::warn!("Ignoring empty entries in known APK URL list.");
    }

    if config.request_timeout.is_zero() {
        config.request_timeout = DEFAULT_REQUEST_TIMEOUT;
        tracing::warn!(
            "Request timeout was set to 0. Setting to {}s.",
            DEFAULT_REQUEST_TIMEOUT.as_secs()
        );
    }

    if config.user_agent.trim().is_empty() {
        config.user_agent = DEFAULT_USER_AGENT.to_string();
        tracing::warn!("User agent was empty. Setting to {}.", DEFAULT_USER_AGENT);
    }

    if config.max_concurrency == 0 {
        config.max_concurrency = 1;
        tracing::warn!("Concurrency was set to 0. Setting to 1.");
    }
}

/// Builds the final configuration: defaults, then the TOML file, then CLI/env.
pub(crate) fn build_config(args: &ConfigArgs) -> anyhow::Result<Config> {
    let mut config = Config::default();

    if let Some(ref file_path) = args.config_file {
        let file_config = load_config_file(file_path)?;
        apply_file_config(&mut config, &file_config);
    } else {
        for path in ["./scanlens.toml", "./config.toml"].iter() {
            if Path::new(path).exists() {
                match load_config_file(path) {
                    Ok(file_config) => {
                        apply_file_config(&mut config, &file_config);
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load configuration from {}: {}", path, e);
                    }
                }
            }
        }
    }

    apply_cli_args(&mut config, args);

    validate_config(&mut config);

    tracing::debug!("Final configuration: {:?}", config);

    Ok(config)
}
