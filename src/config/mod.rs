//! Configuration loading

mod app_config;

pub use app_config::{
    AppConfig, CacheConfig, IdentityConfig, LoaderConfig, LogFormat, LoggingConfig,
};
