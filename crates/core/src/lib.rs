pub mod domain;
pub mod gateway;
pub mod knowledge;
pub mod prompt;

pub mod config {
    const DEFAULT_GATEWAY_BASE_URL: &str = "http://127.0.0.1:11434";
    const DEFAULT_MODEL: &str = "llama3";
    const DEFAULT_PORT: u16 = 3001;
    const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub gateway_base_url: String,
        pub model: String,
        pub port: u16,
        pub allowed_origin: String,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> Self {
            Self {
                gateway_base_url: env_or("OLLAMA_HOST", DEFAULT_GATEWAY_BASE_URL),
                model: env_or("MODEL_NAME", DEFAULT_MODEL),
                port: std::env::var("PORT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_PORT),
                allowed_origin: env_or("CORS_ALLOW_ORIGIN", DEFAULT_ALLOWED_ORIGIN),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            }
        }
    }

    fn env_or(key: &str, default: &str) -> String {
        std::env::var(key)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| default.to_string())
    }
}
