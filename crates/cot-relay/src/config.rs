/// Relay configuration, read once at startup from a JSON file.
use std::{collections::HashSet, fs, net::SocketAddr, path::Path};

use serde::Deserialize;

use crate::{Error, RelayResult};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// CoT consumer (e.g. ATAK) receiving the datagrams.
    pub atak_host: String,
    pub atak_port: u16,
    pub api_keys: HashSet<String>,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

impl RelayConfig {
    pub fn load(path: impl AsRef<Path>) -> RelayResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&text).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_json(text: &str) -> RelayResult<Self> {
        let config: Self = serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        if config.atak_host.trim().is_empty() {
            return Err(Error::Config("atak_host must not be empty".to_string()));
        }
        Ok(config)
    }

    pub fn is_authorized(&self, api_key: &str) -> bool {
        self.api_keys.contains(api_key)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const CONFIG: &str = r#"{
        "atak_host": "192.168.1.50",
        "atak_port": 4242,
        "api_keys": ["key-one", "key-two"]
    }"#;

    #[test]
    fn test_config_defaults() {
        let config = RelayConfig::from_json(CONFIG).unwrap();
        assert_eq!(config.atak_host, "192.168.1.50");
        assert_eq!(config.atak_port, 4242);
        assert_eq!(config.listen_addr, "0.0.0.0:8000".parse::<SocketAddr>().unwrap());
        assert!(config.is_authorized("key-two"));
        assert!(!config.is_authorized("key-three"));
        assert!(!config.is_authorized(""));
    }

    #[test]
    fn test_config_listen_addr() {
        let json = r#"{"atak_host": "tak.local", "atak_port": 6969, "api_keys": [],
                       "listen_addr": "127.0.0.1:9000"}"#;
        let config = RelayConfig::from_json(json).unwrap();
        assert_eq!(config.listen_addr.port(), 9000);
        assert!(config.api_keys.is_empty());
    }

    #[test]
    fn test_config_errors() {
        assert!(matches!(RelayConfig::from_json("{not json"), Err(Error::Config(_))));
        assert!(RelayConfig::from_json(r#"{"atak_host": "h", "api_keys": []}"#).is_err());
        let blank_host = r#"{"atak_host": " ", "atak_port": 1, "api_keys": []}"#;
        assert!(RelayConfig::from_json(blank_host).is_err());
        let bad_port = r#"{"atak_host": "h", "atak_port": 70000, "api_keys": []}"#;
        assert!(RelayConfig::from_json(bad_port).is_err());
    }

    #[test]
    fn test_config_load_file() {
        let path =
            std::env::temp_dir().join(format!("cot-relay-config-{}.json", std::process::id()));
        fs::write(&path, CONFIG).unwrap();
        let config = RelayConfig::load(&path).unwrap();
        assert_eq!(config.atak_port, 4242);
        fs::remove_file(&path).unwrap();

        let err = RelayConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("cot-relay-config"), "{err}");
    }
}
