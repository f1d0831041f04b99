// ============================================
// File: crates/gradelink-server/src/config.rs
// ============================================
//! # Server Configuration
//!
//! ## Creation Reason
//! Provides configuration management for the Gradelink server and client,
//! loaded from a TOML file with defaults for every field.
//!
//! ## Main Functionality
//! - `ServerConfig`: Main configuration structure
//! - TOML file loading and parsing
//! - Configuration validation
//!
//! ## Configuration Sections
//! - `network`: listen address, port, backlog, receive buffer
//! - `store`: backing CSV file, optional cache
//! - `client`: server to dial, receive limit, optional token TTL
//! - `logging`: log level
//!
//! ## Example Configuration
//! ```toml
//! [network]
//! listen_address = "0.0.0.0"
//! listen_port = 50000
//! backlog = 10
//! recv_buffer_size = 1024
//!
//! [store]
//! backing_file_path = "course_grades_2024.csv"
//! cache = false
//!
//! [client]
//! server_host = "localhost"
//! server_port = 50000
//! recv_buffer_size = 1024
//! token_ttl_secs = 60
//!
//! [logging]
//! level = "info"
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - All config changes require restart
//! - Client and server must point at copies of the same store, or the
//!   client cannot decrypt
//!
//! ## Last Modified
//! v0.1.0 - Initial configuration implementation

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, ServerError};

/// Smallest accepted server receive buffer. A request needs at least the
/// identifier plus the longest command token.
pub const MIN_BUFFER_SIZE: usize = 64;

/// Smallest accepted client receive buffer. Covers a sealed full-record
/// reply for a typical row; stores with long key or role fields need
/// a larger `client.recv_buffer_size`.
pub const MIN_CLIENT_BUFFER_SIZE: usize = 512;

// ============================================
// ServerConfig
// ============================================

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listener configuration.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Backing store configuration.
    #[serde(default)]
    pub store: StoreConfig,

    /// Client session configuration.
    #[serde(default)]
    pub client: ClientConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns error if file cannot be read, parsed, or validated.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        info!("Loading configuration from: {}", path_str);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ServerError::config_load(&path_str, e.to_string()))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ServerError::config_load(&path_str, e.to_string()))?;

        config.validate()?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Loads configuration from a string (useful for testing).
    ///
    /// # Errors
    /// Returns error if the text is not valid TOML or fails validation.
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ServerError::config_load("<string>", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// `ConfigInvalid` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        self.network.validate()?;
        self.store.validate()?;
        self.client.validate()?;
        Ok(())
    }

    /// Serializes configuration to TOML string.
    #[must_use]
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

// ============================================
// NetworkConfig
// ============================================

/// Listener configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// IP address to listen on.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub listen_port: u16,

    /// Pending-connection queue length.
    #[serde(default = "default_backlog")]
    pub backlog: u32,

    /// Size of the single read that receives a request.
    #[serde(default = "default_recv_buffer_size")]
    pub recv_buffer_size: usize,
}

fn default_listen_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    50000
}

fn default_backlog() -> u32 {
    10
}

fn default_recv_buffer_size() -> usize {
    1024
}

impl NetworkConfig {
    fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        if self.listen_port == 0 {
            return Err(ServerError::config_invalid(
                "network.listen_port",
                "port cannot be 0",
            ));
        }
        if self.backlog == 0 {
            return Err(ServerError::config_invalid(
                "network.backlog",
                "backlog must be at least 1",
            ));
        }
        validate_buffer("network.recv_buffer_size", self.recv_buffer_size, MIN_BUFFER_SIZE)
    }

    /// Returns the listen socket address.
    ///
    /// # Errors
    /// `ConfigInvalid` if `listen_address` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.listen_address.parse().map_err(|_| {
            ServerError::config_invalid(
                "network.listen_address",
                format!("'{}' is not an IP address", self.listen_address),
            )
        })?;
        Ok(SocketAddr::new(ip, self.listen_port))
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            listen_port: default_port(),
            backlog: default_backlog(),
            recv_buffer_size: default_recv_buffer_size(),
        }
    }
}

// ============================================
// StoreConfig
// ============================================

/// Backing store configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the CSV file holding the records.
    #[serde(default = "default_backing_file_path")]
    pub backing_file_path: PathBuf,

    /// Keep parsed rows in memory until the file changes.
    #[serde(default)]
    pub cache: bool,
}

fn default_backing_file_path() -> PathBuf {
    PathBuf::from("course_grades_2024.csv")
}

impl StoreConfig {
    fn validate(&self) -> Result<()> {
        if self.backing_file_path.as_os_str().is_empty() {
            return Err(ServerError::config_invalid(
                "store.backing_file_path",
                "path cannot be empty",
            ));
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backing_file_path: default_backing_file_path(),
            cache: false,
        }
    }
}

// ============================================
// ClientConfig
// ============================================

/// Client session configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Host name or address of the server.
    #[serde(default = "default_server_host")]
    pub server_host: String,

    /// Server TCP port.
    #[serde(default = "default_port")]
    pub server_port: u16,

    /// Largest response accepted. A full-record reply grows with the
    /// length of the row's key and role fields.
    #[serde(default = "default_recv_buffer_size")]
    pub recv_buffer_size: usize,

    /// Reject responses sealed longer ago than this many seconds.
    #[serde(default)]
    pub token_ttl_secs: Option<u64>,
}

fn default_server_host() -> String {
    "localhost".to_string()
}

impl ClientConfig {
    fn validate(&self) -> Result<()> {
        if self.server_host.trim().is_empty() {
            return Err(ServerError::config_invalid(
                "client.server_host",
                "host cannot be empty",
            ));
        }
        if self.server_port == 0 {
            return Err(ServerError::config_invalid(
                "client.server_port",
                "port cannot be 0",
            ));
        }
        validate_buffer(
            "client.recv_buffer_size",
            self.recv_buffer_size,
            MIN_CLIENT_BUFFER_SIZE,
        )
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_host: default_server_host(),
            server_port: default_port(),
            recv_buffer_size: default_recv_buffer_size(),
            token_ttl_secs: None,
        }
    }
}

// ============================================
// LoggingConfig
// ============================================

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn validate_buffer(field: &str, size: usize, min: usize) -> Result<()> {
    if size < min {
        return Err(ServerError::config_invalid(
            field,
            format!("must be at least {min} bytes"),
        ));
    }
    Ok(())
}

// ============================================
// Tests
// ============================================
