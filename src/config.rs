use std::net::IpAddr;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub session_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub max_upload_size: usize,
    pub db_max_connections: u32,
    pub log_level: String,
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let session_secret = env_required("SESSION_SECRET")?;

        let host: IpAddr = env_or("SITEBOOK_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid SITEBOOK_HOST: {e}"))?;

        let port: u16 = env_or("SITEBOOK_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid SITEBOOK_PORT: {e}"))?;

        let max_upload_size: usize = env_or("SITEBOOK_MAX_UPLOAD_SIZE", "5242880")
            .parse()
            .map_err(|e| format!("Invalid SITEBOOK_MAX_UPLOAD_SIZE: {e}"))?;

        let db_max_connections: u32 = env_or("SITEBOOK_DB_MAX_CONNECTIONS", "10")
            .parse()
            .map_err(|e| format!("Invalid SITEBOOK_DB_MAX_CONNECTIONS: {e}"))?;

        let log_level = env_or("SITEBOOK_LOG_LEVEL", "info");

        let gemini = GeminiConfig {
            api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            base_url: env_or("SITEBOOK_GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            model: env_or("SITEBOOK_GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
        };

        Ok(Config {
            database_url,
            session_secret,
            host,
            port,
            max_upload_size,
            db_max_connections,
            log_level,
            gemini,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
