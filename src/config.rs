use crate::domain::{Address, AssetId};
use crate::engine::{StaticAssetRegistry, DEFAULT_SETTLEMENT_WINDOW_SECS};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    /// Only principal allowed to execute physical settlements.
    pub settlement_driver: Address,
    /// The service's own principal; collateral is held here.
    pub engine_address: Address,
    pub engine_id: u8,
    pub settlement_window_secs: u64,
    pub assets: Vec<AssetConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetConfig {
    pub id: AssetId,
    pub address: Address,
    pub decimals: u8,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let settlement_driver = env_map
            .get("SETTLEMENT_DRIVER")
            .ok_or_else(|| ConfigError::MissingEnv("SETTLEMENT_DRIVER".to_string()))?
            .parse::<Address>()
            .map_err(|e| ConfigError::InvalidValue("SETTLEMENT_DRIVER".to_string(), e.to_string()))?;

        let engine_address = env_map
            .get("ENGINE_ADDRESS")
            .map(|s| s.as_str())
            .unwrap_or("marginbook")
            .parse::<Address>()
            .map_err(|e| ConfigError::InvalidValue("ENGINE_ADDRESS".to_string(), e.to_string()))?;

        let engine_id = env_map
            .get("ENGINE_ID")
            .map(|s| s.as_str())
            .unwrap_or("1")
            .parse::<u8>()
            .map_err(|_| {
                ConfigError::InvalidValue("ENGINE_ID".to_string(), "must be a valid u8".to_string())
            })?;

        let settlement_window_secs = match env_map.get("SETTLEMENT_WINDOW_SECS") {
            Some(v) => v.parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue(
                    "SETTLEMENT_WINDOW_SECS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?,
            None => DEFAULT_SETTLEMENT_WINDOW_SECS,
        };

        let assets = parse_assets(env_map.get("ASSETS").map(|s| s.as_str()).unwrap_or(""))?;

        Ok(Config {
            port,
            database_path,
            settlement_driver,
            engine_address,
            engine_id,
            settlement_window_secs,
            assets,
        })
    }

    pub fn asset_registry(&self) -> StaticAssetRegistry {
        self.assets
            .iter()
            .fold(StaticAssetRegistry::new(), |registry, a| {
                registry.with_asset(a.id, a.address.clone(), a.decimals)
            })
    }
}

/// `id:address:decimals` entries separated by commas.
fn parse_assets(raw: &str) -> Result<Vec<AssetConfig>, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidValue("ASSETS".to_string(), msg);
    let mut assets: Vec<AssetConfig> = Vec::new();

    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
        let [id, address, decimals] = parts.as_slice() else {
            return Err(invalid(format!("expected id:address:decimals, got {}", entry)));
        };
        let id = id
            .parse::<u8>()
            .map_err(|_| invalid(format!("bad asset id in {}", entry)))?;
        if id == 0 {
            return Err(invalid("asset id 0 is reserved".to_string()));
        }
        let address = address
            .parse::<Address>()
            .map_err(|e| invalid(format!("{} in {}", e, entry)))?;
        let decimals = decimals
            .parse::<u8>()
            .map_err(|_| invalid(format!("bad decimals in {}", entry)))?;
        if assets.iter().any(|a| a.id.0 == id) {
            return Err(invalid(format!("duplicate asset id {}", id)));
        }
        assets.push(AssetConfig {
            id: AssetId(id),
            address,
            decimals,
        });
    }
    Ok(assets)
}
