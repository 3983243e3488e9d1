use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    /// Secret for the Google recaptcha siteverify call. When absent the
    /// remote check is skipped (a token is still required from the client).
    pub recaptcha_secret: Option<String>,
    pub recaptcha_url: String,
    /// OAuth client id the `aud` claim of Google ID tokens must match.
    pub google_client_id: Option<String>,
    pub google_tokeninfo_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("OHP_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid OHP_HOST: {e}"))?;

        let port: u16 = env_or("OHP_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid OHP_PORT: {e}"))?;

        let log_level = env_or("OHP_LOG_LEVEL", "info");

        let recaptcha_secret = std::env::var("GOOGLE_RECAPTCHA_SECRET").ok();
        let recaptcha_url = env_or(
            "OHP_RECAPTCHA_URL",
            "https://www.google.com/recaptcha/api/siteverify",
        );

        let google_client_id = std::env::var("GOOGLE_SIGNIN_CLIENT_ID").ok();
        let google_tokeninfo_url = env_or(
            "OHP_GOOGLE_TOKENINFO_URL",
            "https://oauth2.googleapis.com/tokeninfo",
        );

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            log_level,
            recaptcha_secret,
            recaptcha_url,
            google_client_id,
            google_tokeninfo_url,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
