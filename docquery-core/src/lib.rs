pub mod config;

// Config re-exports
pub use config::{
    Config,
    ConfigError,
    FetchSettings,
    GatewaySettings,
    KnowledgeOverrides,
    KnowledgeSettings,
    LlmSettings,
    LoggingSettings,
    Secrets,
    SecretsError,
    Settings,
    SettingsError,
    load_dotenv,
};
