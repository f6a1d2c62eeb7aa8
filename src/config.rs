use secrecy::Secret;
use serde::Deserialize;

pub const DEFAULT_EXPIRY_SWEEP_CRON: &str = "0 0 3 * * *";
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub base_url: String, // Front-end origin, also the allowed CORS origin
    pub host: String,
    pub port: u16,

    // Admin login
    pub admin_username: String,
    pub admin_password: Secret<String>,

    // Security
    pub session_secret: Secret<String>,
    pub card_signing_key: Secret<String>, // HMAC key for QR card signatures
    pub secure_cookies: bool,

    // Jobs
    pub expiry_sweep_cron: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        Ok(Self {
            database_url: config.get("database_url")?,
            database_max_connections: config
                .get("database_max_connections")
                .unwrap_or(DEFAULT_DATABASE_MAX_CONNECTIONS),
            base_url: config.get("base_url")?,
            host: config.get("host").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: config.get("port")?,

            admin_username: config.get("admin_username")?,
            admin_password: Secret::new(config.get("admin_password")?),

            session_secret: Secret::new(config.get("session_secret")?),
            card_signing_key: Secret::new(config.get("card_signing_key")?),
            secure_cookies: config.get("secure_cookies").unwrap_or(true),

            expiry_sweep_cron: config
                .get("expiry_sweep_cron")
                .unwrap_or_else(|_| DEFAULT_EXPIRY_SWEEP_CRON.to_string()),
        })
    }
}
