use crate::{ConfigError, FromEnv, env_or_default, env_parse};
use std::net::{Ipv4Addr, SocketAddr};

pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_GRPC_PORT: u16 = 9000;

/// Bind address of one listener (HTTP or gRPC)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Loads `{prefix}_HOST` / `{prefix}_PORT`, e.g. `GRPC_HOST` and `GRPC_PORT`.
    pub fn from_env_with_prefix(prefix: &str, default_port: u16) -> Result<Self, ConfigError> {
        let host = env_or_default(
            &format!("{prefix}_HOST"),
            &Ipv4Addr::UNSPECIFIED.to_string(),
        );
        let port = env_parse(&format!("{prefix}_PORT"), &default_port.to_string())?;

        Ok(Self { host, port })
    }

    /// gRPC listener, `GRPC_HOST` / `GRPC_PORT` (default 9000)
    pub fn grpc_from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_prefix("GRPC", DEFAULT_GRPC_PORT)
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parsed socket address; the host must be an IP literal.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.address()
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::ParseError {
                key: "HOST".to_string(),
                details: format!("{}: {e}", self.address()),
            })
    }
}

impl FromEnv for ServerConfig {
    /// HTTP listener, `HTTP_HOST` / `HTTP_PORT` (default 8080)
    fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_prefix("HTTP", DEFAULT_HTTP_PORT)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(Ipv4Addr::UNSPECIFIED.to_string(), DEFAULT_HTTP_PORT)
    }
}
