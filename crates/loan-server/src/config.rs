//! Server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Default bundle location, relative to the working directory.
pub const DEFAULT_MODEL_PATH: &str = "loan_predictor_model.json";

/// Where the server listens and which model it serves.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Socket address to bind (default `0.0.0.0:5000`).
    pub address: SocketAddr,
    /// Model bundle loaded at startup.
    pub model_path: PathBuf,
    /// Allow cross-origin requests from any origin.
    pub cors_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 5000),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            cors_enabled: false,
        }
    }
}

impl ServerConfig {
    pub fn with_address(mut self, address: SocketAddr) -> Self {
        self.address = address;
        self
    }

    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn with_cors(mut self, enabled: bool) -> Self {
        self.cors_enabled = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.address.port(), 5000);
        assert!(config.address.ip().is_unspecified());
        assert_eq!(config.model_path, PathBuf::from("loan_predictor_model.json"));
        assert!(!config.cors_enabled);
    }

    #[test]
    fn test_builder_methods() {
        let address: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        let config = ServerConfig::default()
            .with_address(address)
            .with_model_path("/tmp/model.json")
            .with_cors(true);

        assert_eq!(config.address, address);
        assert_eq!(config.model_path, PathBuf::from("/tmp/model.json"));
        assert!(config.cors_enabled);
    }
}
