pub mod settings;

pub use settings::{
    AppConfig, CorsConfig, ServerConfig, StorageBackend, StorageConfig, WebSocketConfig,
};
