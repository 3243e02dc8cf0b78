use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub quill_env: String,
    pub api_bind: String,
    pub server_secret: String,
    pub telegram_api_base: String,
    pub rate_limit_comment_max: i32,
    pub rate_limit_reaction_max: i32,
    pub rate_limit_view_max: i32,
}

impl Settings {
    pub fn from_env() -> Result<Self, std::env::VarError> {
        let database_url =
            std::env::var("DATABASE_URL").or_else(|_| std::env::var("QUILL_DATABASE_URL"))?;
        let quill_env = std::env::var("QUILL_ENV").unwrap_or_else(|_| "dev".to_string());
        let api_bind =
            std::env::var("QUILL_API_BIND").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let server_secret =
            std::env::var("QUILL_SERVER_SECRET").or_else(|_| std::env::var("SERVER_SECRET"))?;
        let telegram_api_base = std::env::var("QUILL_TELEGRAM_API_BASE")
            .unwrap_or_else(|_| "https://api.telegram.org".to_string());
        let rate_limit_comment_max = std::env::var("QUILL_RATE_LIMIT_COMMENT_MAX")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);
        let rate_limit_reaction_max = std::env::var("QUILL_RATE_LIMIT_REACTION_MAX")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);
        let rate_limit_view_max = std::env::var("QUILL_RATE_LIMIT_VIEW_MAX")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(2);

        Ok(Self {
            database_url,
            quill_env,
            api_bind,
            server_secret,
            telegram_api_base,
            rate_limit_comment_max,
            rate_limit_reaction_max,
            rate_limit_view_max,
        })
    }
}
