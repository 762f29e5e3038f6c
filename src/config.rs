use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

// --- PROVIDER CONFIG ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_fal_provider")]
    pub fal: ProviderConfig,
    #[serde(default = "default_runpod_provider")]
    pub runpod: ProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            fal: default_fal_provider(),
            runpod: default_runpod_provider(),
        }
    }
}

fn default_fal_provider() -> ProviderConfig {
    ProviderConfig {
        api_key: String::new(),
        base_url: "https://api.fal.ai".to_string(),
    }
}

fn default_runpod_provider() -> ProviderConfig {
    ProviderConfig {
        api_key: String::new(),
        base_url: "https://api.runpod.ai".to_string(),
    }
}

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialProviderConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl PartialProviderConfig {
    fn merge_into(self, final_config: &mut ProviderConfig) {
        if let Some(api_key) = self.api_key {
            final_config.api_key = api_key;
        }
        if let Some(base_url) = self.base_url {
            final_config.base_url = base_url;
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialProvidersConfig {
    pub fal: Option<PartialProviderConfig>,
    pub runpod: Option<PartialProviderConfig>,
}

impl PartialProvidersConfig {
    fn merge_into(self, final_config: &mut ProvidersConfig) {
        if let Some(fal) = self.fal {
            fal.merge_into(&mut final_config.fal);
        }
        if let Some(runpod) = self.runpod {
            runpod.merge_into(&mut final_config.runpod);
        }
    }
}

// --- UPSTREAM CONFIG ---

/// Upstream calls have no deadline unless one is configured here.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpstreamConfig {
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialUpstreamConfig {
    pub timeout_secs: Option<u64>,
}

impl PartialUpstreamConfig {
    fn merge_into(self, final_config: &mut UpstreamConfig) {
        if let Some(timeout_secs) = self.timeout_secs {
            final_config.timeout_secs = Some(timeout_secs);
        }
    }
}

// --- ASSETS CONFIG ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Prefix from which stored objects are publicly addressable.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            public_base_url: default_public_base_url(),
        }
    }
}

fn default_public_base_url() -> String {
    "http://localhost:8787/assets".to_string()
}

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialAssetsConfig {
    pub public_base_url: Option<String>,
}

impl PartialAssetsConfig {
    fn merge_into(self, final_config: &mut AssetsConfig) {
        if let Some(public_base_url) = self.public_base_url {
            final_config.public_base_url = public_base_url;
        }
    }
}

// --- STORAGE CONFIG ---

/// Storage driver type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StorageDriver {
    Local,
    S3,
}

impl Default for StorageDriver {
    fn default() -> Self {
        StorageDriver::Local
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorageConfig {
    #[serde(default = "default_local_storage_root")]
    pub root: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root: default_local_storage_root(),
        }
    }
}

fn default_local_storage_root() -> String {
    "storage/assets".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3StorageConfig {
    pub bucket: String,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub driver: StorageDriver,
    #[serde(default)]
    pub local: LocalStorageConfig,
    #[serde(default)]
    pub s3: Option<S3StorageConfig>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialLocalStorageConfig {
    pub root: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialStorageConfig {
    pub driver: Option<StorageDriver>,
    pub local: Option<PartialLocalStorageConfig>,
    pub s3: Option<S3StorageConfig>,
}

impl PartialStorageConfig {
    fn merge_into(self, final_config: &mut StorageConfig) {
        if let Some(driver) = self.driver {
            final_config.driver = driver;
        }
        if let Some(local) = self.local {
            if let Some(root) = local.root {
                final_config.local.root = root;
            }
        }
        if let Some(s3) = self.s3 {
            final_config.s3 = Some(s3);
        }
    }
}

// --- GATEWAY CONFIG ---

// The fully resolved configuration. Built once in `main` and carried inside
// the application state; routing logic never reads the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub providers: ProvidersConfig,
    pub upstream: UpstreamConfig,
    pub assets: AssetsConfig,
    pub storage: StorageConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8787,
            log_level: "info".to_string(),
            providers: ProvidersConfig::default(),
            upstream: UpstreamConfig::default(),
            assets: AssetsConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

// Used for deserializing user-provided config files where all fields are optional.
#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub providers: Option<PartialProvidersConfig>,
    pub upstream: Option<PartialUpstreamConfig>,
    pub assets: Option<PartialAssetsConfig>,
    pub storage: Option<PartialStorageConfig>,
}

impl PartialConfig {
    /// Merges the fields of this partial config into a final config, overwriting existing values.
    fn merge_into(self, final_config: &mut GatewayConfig) {
        if let Some(host) = self.host {
            final_config.host = host;
        }
        if let Some(port) = self.port {
            final_config.port = port;
        }
        if let Some(log_level) = self.log_level {
            final_config.log_level = log_level;
        }
        if let Some(providers) = self.providers {
            providers.merge_into(&mut final_config.providers);
        }
        if let Some(upstream) = self.upstream {
            upstream.merge_into(&mut final_config.upstream);
        }
        if let Some(assets) = self.assets {
            assets.merge_into(&mut final_config.assets);
        }
        if let Some(storage) = self.storage {
            storage.merge_into(&mut final_config.storage);
        }
    }
}

fn get_env_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn get_config_from_env() -> PartialConfig {
    PartialConfig {
        host: get_env_var("HOST"),
        port: get_env_var("PORT"),
        log_level: get_env_var("LOG_LEVEL"),
        providers: Some(PartialProvidersConfig {
            fal: Some(PartialProviderConfig {
                api_key: get_env_var("FAL_API_KEY"),
                base_url: None,
            }),
            runpod: Some(PartialProviderConfig {
                api_key: get_env_var("RUNPOD_API_KEY"),
                base_url: None,
            }),
        }),
        upstream: None,
        assets: Some(PartialAssetsConfig {
            public_base_url: get_env_var("ASSET_BASE_URL"),
        }),
        storage: None,
    }
}

impl GatewayConfig {
    /// Resolves the effective configuration: programmatic defaults, overridden
    /// by an optional `config.yaml`, overridden by environment variables.
    pub fn load() -> Self {
        let mut final_config = GatewayConfig::default();

        let user_config_path = Path::new("config.yaml");
        if user_config_path.exists() {
            if let Ok(config_str) = fs::read_to_string(user_config_path) {
                let user_config: PartialConfig =
                    serde_yaml::from_str(&config_str).unwrap_or_else(|e| {
                        panic!(
                            "Failed to parse configuration file at {:?}: {}",
                            user_config_path, e
                        )
                    });
                user_config.merge_into(&mut final_config);
            }
        }

        get_config_from_env().merge_into(&mut final_config);

        if final_config.storage.driver == StorageDriver::S3 && final_config.storage.s3.is_none() {
            final_config.storage.driver = StorageDriver::Local;
        }

        final_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_overrides_defaults_only_where_set() {
        let yaml = r#"
port: 9000
providers:
  fal:
    api_key: "fal-secret"
assets:
  public_base_url: "https://assets.example.com"
"#;
        let partial: PartialConfig = serde_yaml::from_str(yaml).unwrap();
        let mut config = GatewayConfig::default();
        partial.merge_into(&mut config);

        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.providers.fal.api_key, "fal-secret");
        assert_eq!(config.providers.fal.base_url, "https://api.fal.ai");
        assert_eq!(config.providers.runpod.base_url, "https://api.runpod.ai");
        assert_eq!(config.assets.public_base_url, "https://assets.example.com");
    }

    #[test]
    fn s3_driver_without_s3_config_falls_back_to_local() {
        let yaml = r#"
storage:
  driver: s3
"#;
        let partial: PartialConfig = serde_yaml::from_str(yaml).unwrap();
        let mut config = GatewayConfig::default();
        partial.merge_into(&mut config);
        if config.storage.driver == StorageDriver::S3 && config.storage.s3.is_none() {
            config.storage.driver = StorageDriver::Local;
        }

        assert_eq!(config.storage.driver, StorageDriver::Local);
    }
}
