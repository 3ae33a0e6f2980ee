use archivarr_models::Config as ModelConfig;
use archivarr_web::DEFAULT_USER_HEADER;
use failure::Fail;
use log::LevelFilter;
use serde::Deserialize;
use std::{collections::HashMap, fs, net::SocketAddr};
use toml;

use crate::Result;

pub fn load() -> Result<Config> {
    let data = fs::read("config.toml").map_err(ReadConfigurationError)?;
    parse(&data)
}

fn parse(data: &[u8]) -> Result<Config> {
    toml::from_slice(data).map_err(|e| ConfigurationError(e).into())
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub server: Server,
    #[serde(default)]
    pub logging: Logging,
    #[serde(flatten)]
    pub model: ModelConfig,
}

impl Config {
    /// Validate configuration correctness.
    pub fn validate(&self) -> Result<(), failure::Error> {
        self.model.storage.validate()?;

        Ok(())
    }
}

/// HTTP server configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct Server {
    /// Address on which to listen.
    #[serde(default = "default_address")]
    pub address: SocketAddr,
    /// Domain (host name) of this server.
    pub domain: String,
    /// Header in which the authenticating proxy passes username.
    #[serde(default = "default_user_header")]
    pub user_header: String,
}

/// Logging configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct Logging {
    /// Default logging level.
    #[serde(default = "default_level_filter")]
    pub level: LevelFilter,
    /// Actix-web logging level.
    pub network: Option<LevelFilter>,
    /// Custom filters.
    #[serde(default)]
    pub filters: HashMap<String, LevelFilter>,
}

#[derive(Debug, Fail)]
#[fail(display = "Cannot read configuration file")]
pub struct ReadConfigurationError(#[fail(cause)] std::io::Error);

#[derive(Debug, Fail)]
#[fail(display = "Invalid configuration: {}", _0)]
pub struct ConfigurationError(#[fail(cause)] toml::de::Error);

fn default_address() -> SocketAddr {
    ([127, 0, 0, 1], 8080).into()
}

fn default_user_header() -> String {
    DEFAULT_USER_HEADER.to_string()
}

fn default_level_filter() -> LevelFilter {
    LevelFilter::Info
}

impl Default for Logging {
    fn default() -> Self {
        Logging {
            level: default_level_filter(),
            network: None,
            filters: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_configuration() {
        let config = parse(br#"
            [server]
            domain = "archivarr.test"

            [storage]
            path = "/tmp"
        "#).unwrap();

        assert_eq!(config.server.address, default_address());
        assert_eq!(config.server.user_header, "X-Remote-User");
        assert_eq!(config.logging.level, LevelFilter::Info);
        assert!(config.model.database.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn full_configuration() {
        let config = parse(br#"
            [server]
            address = "0.0.0.0:80"
            domain = "archivarr.test"
            user_header = "X-Forwarded-User"

            [database]
            url = "postgres://archivarr@localhost/archivarr"

            [storage]
            path = "/var/lib/archivarr"

            [logging]
            level = "warn"
            network = "error"
            filters = { "archivarr_models" = "debug" }
        "#).unwrap();

        assert_eq!(config.server.address, ([0, 0, 0, 0], 80).into());
        assert_eq!(config.server.user_header, "X-Forwarded-User");
        assert_eq!(config.model.database.unwrap().url,
            "postgres://archivarr@localhost/archivarr");
        assert_eq!(config.logging.level, LevelFilter::Warn);
        assert_eq!(config.logging.network, Some(LevelFilter::Error));
        assert_eq!(config.logging.filters["archivarr_models"], LevelFilter::Debug);
    }

    #[test]
    fn missing_storage_directory_is_rejected() {
        let config = parse(br#"
            [server]
            domain = "archivarr.test"

            [storage]
            path = "/nonexistent/archivarr/storage"
        "#).unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_server_section_is_rejected() {
        assert!(parse(b"[storage]\npath = \"/tmp\"\n").is_err());
    }
}
