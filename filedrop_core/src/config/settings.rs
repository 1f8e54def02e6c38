use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub websocket: WebSocketConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Local,
    Gcs,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Local => "local",
            StorageBackend::Gcs => "gcs",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub bucket: String,
    /// Service account key for the `gcs` backend; the GCP project comes from it.
    pub credentials_path: Option<PathBuf>,
    pub local_root: PathBuf,
    pub max_file_size_mb: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketConfig {
    pub max_connections: usize,
    pub send_timeout_ms: u64,
    pub message_buffer_size: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            websocket: WebSocketConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            static_dir: PathBuf::from("./static"),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            bucket: "filedrop-uploads".to_string(),
            credentials_path: None,
            local_root: PathBuf::from("./data"),
            max_file_size_mb: 10,
        }
    }
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
            send_timeout_ms: 1000,
            message_buffer_size: 64,
        }
    }
}

impl StorageConfig {
    pub fn max_file_size_bytes(&self) -> usize {
        (self.max_file_size_mb as usize).saturating_mul(1024 * 1024)
    }
}

impl WebSocketConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?);

        if std::path::Path::new("config.toml").exists() {
            builder = builder.add_source(File::with_name("config"));
        }

        builder = builder.add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("cors.allowed_origins")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if self.storage.bucket.trim().is_empty() {
            return Err(ConfigError::Message(
                "Storage bucket cannot be empty".to_string(),
            ));
        }

        if self.storage.max_file_size_mb == 0 {
            return Err(ConfigError::Message(
                "Max file size must be greater than 0".to_string(),
            ));
        }

        if self.storage.backend == StorageBackend::Gcs && self.storage.credentials_path.is_none() {
            tracing::warn!("No GCS credentials path configured - relying on environment credentials");
        }

        if self.websocket.max_connections == 0 {
            return Err(ConfigError::Message(
                "WebSocket max connections must be greater than 0".to_string(),
            ));
        }

        if self.websocket.send_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "WebSocket send timeout must be greater than 0".to_string(),
            ));
        }

        if self.websocket.message_buffer_size == 0 {
            return Err(ConfigError::Message(
                "WebSocket message buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
