//! Application configuration: loading, validation and router assembly.

use std::sync::Arc;
use std::time::Duration;
use std::{fs, path::Path};

use hopchain_chain::config::{validate_chains, validate_router};
use hopchain_chain::{build_chains, ChainConfig, ChainError, Registry, Router, RouterConfig};
use hopchain_dns::{DnsConfig, DnsError, DnsResolver, HostEntry, Hosts};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub router: RouterConfig,

    /// Resolver settings. Absent means destinations are dialed unresolved
    /// (hosts entries still apply).
    #[serde(default)]
    pub dns: Option<DnsConfig>,

    #[serde(default)]
    pub hosts: Vec<HostEntry>,

    #[serde(default)]
    pub chains: Vec<ChainConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported config format")]
    UnsupportedFormat,
    #[error("validation: {0}")]
    Validation(String),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Dns(#[from] DnsError),
}

/// Load a config file, choosing the format by extension.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)?;
    match path.extension().and_then(|s| s.to_str()).unwrap_or("") {
        "json" => Ok(serde_json::from_str(&data)?),
        "toml" => Ok(toml::from_str(&data)?),
        _ => Err(ConfigError::UnsupportedFormat),
    }
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let invalid = |e: ChainError| match e {
        ChainError::Config(msg) => ConfigError::Validation(msg),
        other => ConfigError::Chain(other),
    };
    validate_chains(&config.chains).map_err(invalid)?;
    validate_router(&config.router, &config.chains).map_err(invalid)?;
    if let Some(entry) = config.hosts.iter().find(|h| h.host.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "hosts entry with empty name: {:?}",
            entry.ips
        )));
    }
    Ok(())
}

/// Validate `config` and build the router it describes.
pub fn build_router(config: &Config, registry: &Registry) -> Result<Router, ConfigError> {
    validate_config(config)?;

    let mut chains = build_chains(&config.chains, registry)?;
    let mut builder = Router::builder()
        .retries(config.router.retries)
        .timeout(Duration::from_secs(config.router.timeout_secs));

    if let Some(name) = &config.router.chain {
        let chain = chains
            .remove(name)
            .ok_or_else(|| ConfigError::Validation(format!("unknown chain: {name}")))?;
        info!(chain = %name, hops = chain.groups().len(), "routing through chain");
        builder = builder.chain(chain);
    }
    if !config.hosts.is_empty() {
        builder = builder.hosts(Arc::new(Hosts::from_entries(&config.hosts)));
    }
    if let Some(dns) = &config.dns {
        builder = builder.resolver(Arc::new(DnsResolver::new(dns)?));
    }

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[router]
retries = 2
timeout_secs = 10
chain = "main"

[[hosts]]
host = "example.internal"
ips = ["10.0.0.5"]

[[chains]]
name = "main"

[[chains.hops]]
name = "hop-0"
selector = { strategy = "round", max_fails = 1, fail_timeout_secs = 10 }

[[chains.hops.nodes]]
name = "a"
addr = "10.0.0.1:1080"
dialer = "tcp"
connector = "forward"
bypass = { patterns = ["10.0.0.0/8", ".internal"], reverse = false }
"#;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("hopchain-{}-{name}", std::process::id()));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn load_toml_and_build() {
        let path = write_temp("config.toml", SAMPLE);
        let config = load_config(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(config.router.retries, 2);
        assert_eq!(config.hosts.len(), 1);
        assert!(config.dns.is_none());

        let router = build_router(&config, &Registry::with_builtins()).unwrap();
        assert_eq!(router.retries(), 2);
        assert_eq!(router.timeout(), Some(Duration::from_secs(10)));
        let route = router.route("tcp", "example.com:443");
        assert_eq!(route.len(), 1);
        assert!(router.route("tcp", "db.internal:5432").is_empty());
    }

    #[test]
    fn load_json() {
        let path = write_temp(
            "config.json",
            r#"{"router": {"retries": 1}, "chains": [{"name": "direct"}]}"#,
        );
        let config = load_config(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(config.router.retries, 1);
        assert_eq!(config.chains[0].name, "direct");
    }

    #[test]
    fn unknown_extension_rejected() {
        let path = write_temp("config.ini", "");
        let err = load_config(&path).unwrap_err();
        fs::remove_file(&path).ok();
        assert!(matches!(err, ConfigError::UnsupportedFormat));
    }

    #[test]
    fn validation_errors() {
        let mut config: Config = toml::from_str(SAMPLE).unwrap();
        config.router.chain = Some("missing".into());
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Validation(_))
        ));

        let mut config: Config = toml::from_str(SAMPLE).unwrap();
        config.chains.push(config.chains[0].clone());
        assert!(matches!(
            build_router(&config, &Registry::with_builtins()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn unknown_connector_fails_build() {
        let config: Config = toml::from_str(&SAMPLE.replace("\"forward\"", "\"socks5\"")).unwrap();
        let err = build_router(&config, &Registry::with_builtins()).unwrap_err();
        assert!(err.to_string().contains("socks5"));
    }
}
