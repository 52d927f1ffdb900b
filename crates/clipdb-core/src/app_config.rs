use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub apify_api_token: String,
    pub apify_base_url: String,
    pub tiktok_actor: String,
    pub instagram_actor: String,
    pub youtube_actor: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    pub dataset_max_retries: u32,
    pub dataset_retry_delay_ms: u64,
    pub cache_freshness_hours: u32,
    pub default_result_limit: u32,
    pub poll_interval_secs: u64,
    pub poll_max_attempts: u32,
    pub disable_rate_limit: bool,
    pub rate_limit_max_requests: usize,
    pub rate_limit_window_secs: u64,
    pub api_keys: Vec<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("apify_api_token", &"[redacted]")
            .field("apify_base_url", &self.apify_base_url)
            .field("tiktok_actor", &self.tiktok_actor)
            .field("instagram_actor", &self.instagram_actor)
            .field("youtube_actor", &self.youtube_actor)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("dataset_max_retries", &self.dataset_max_retries)
            .field("dataset_retry_delay_ms", &self.dataset_retry_delay_ms)
            .field("cache_freshness_hours", &self.cache_freshness_hours)
            .field("default_result_limit", &self.default_result_limit)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("poll_max_attempts", &self.poll_max_attempts)
            .field("disable_rate_limit", &self.disable_rate_limit)
            .field("rate_limit_max_requests", &self.rate_limit_max_requests)
            .field("rate_limit_window_secs", &self.rate_limit_window_secs)
            .field("api_keys", &format!("[{} redacted]", self.api_keys.len()))
            .finish()
    }
}
