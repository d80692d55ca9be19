use std::env;
use std::str::FromStr;

/// Credentials for an HTTP notification provider
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub api_url: String,
    pub api_key: String,
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// HMAC secret for signing access tokens
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    /// Domain serving uploaded objects, e.g. `cdn.agrilink.in`
    pub cdn_domain: String,
    pub storage_endpoint: Option<String>,
    pub storage_bucket: String,
    pub storage_token: Option<String>,
    pub max_upload_bytes: usize,
    pub email: Option<ProviderConfig>,
    pub email_from: String,
    /// Primary SMS gateway
    pub sms: Option<ProviderConfig>,
    pub sms_sender_id: String,
    /// Secondary cloud SMS provider, used when the primary gateway fails
    pub cloud_sms: Option<ProviderConfig>,
    pub push: Option<ProviderConfig>,
    pub sms_limit_per_window: u32,
    pub push_limit_per_window: u32,
    pub email_limit_per_window: u32,
    pub rate_limit_window_secs: i64,
    pub admin_cache_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            port: parse_or("PORT", 8080),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "dev-secret-not-for-production".to_string()),
            jwt_ttl_hours: parse_or("JWT_TTL_HOURS", 24),
            cdn_domain: env::var("CDN_DOMAIN").unwrap_or_else(|_| "localhost:9000".to_string()),
            storage_endpoint: env::var("STORAGE_ENDPOINT").ok(),
            storage_bucket: env::var("STORAGE_BUCKET").unwrap_or_else(|_| "agrilink".to_string()),
            storage_token: env::var("STORAGE_TOKEN").ok(),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", 5 * 1024 * 1024),
            email: provider("EMAIL_API_URL", "EMAIL_API_KEY"),
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "AgriLink <no-reply@agrilink.in>".to_string()),
            sms: provider("SMS_API_URL", "SMS_API_KEY"),
            sms_sender_id: env::var("SMS_SENDER_ID").unwrap_or_else(|_| "AGRLNK".to_string()),
            cloud_sms: provider("CLOUD_SMS_API_URL", "CLOUD_SMS_API_KEY"),
            push: provider("PUSH_API_URL", "PUSH_SERVER_KEY"),
            sms_limit_per_window: parse_or("SMS_LIMIT_PER_HOUR", 3),
            push_limit_per_window: parse_or("PUSH_LIMIT_PER_HOUR", 30),
            email_limit_per_window: parse_or("EMAIL_LIMIT_PER_HOUR", 20),
            rate_limit_window_secs: parse_or("RATE_LIMIT_WINDOW_SECS", 3600),
            admin_cache_ttl_secs: parse_or("ADMIN_CACHE_TTL_SECS", 300),
        })
    }

    /// Check if object storage uploads are possible
    pub fn storage_enabled(&self) -> bool {
        self.storage_endpoint.is_some() && self.storage_token.is_some()
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn provider(url_key: &str, key_key: &str) -> Option<ProviderConfig> {
    match (env::var(url_key), env::var(key_key)) {
        (Ok(api_url), Ok(api_key)) if !api_url.is_empty() && !api_key.is_empty() => {
            Some(ProviderConfig { api_url, api_key })
        }
        _ => None,
    }
}
