use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL connection URL. Without one the service keeps its data in memory.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Redis connection URL used to cache TMDB lookups
    #[serde(default)]
    pub redis_url: Option<String>,

    /// TMDB v4 read access token
    #[serde(default)]
    pub tmdb_access_token: Option<String>,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Full wheel turns before the winning sector comes around
    #[serde(default = "default_base_rotations")]
    pub base_rotations: u32,

    /// Whether a night that already has a pick may be spun again
    #[serde(default = "default_allow_repick")]
    pub allow_repick: bool,

    /// Seconds after which an uncommitted spin stops blocking new ones
    #[serde(default = "default_spin_reveal_timeout_secs")]
    pub spin_reveal_timeout_secs: u64,

    #[serde(default = "default_search_cache_ttl_secs")]
    pub search_cache_ttl_secs: u64,

    #[serde(default = "default_details_cache_ttl_secs")]
    pub details_cache_ttl_secs: u64,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_base_rotations() -> u32 {
    4
}

fn default_allow_repick() -> bool {
    true
}

fn default_spin_reveal_timeout_secs() -> u64 {
    30
}

fn default_search_cache_ttl_secs() -> u64 {
    3600 // 1 hour
}

fn default_details_cache_ttl_secs() -> u64 {
    604800 // 1 week
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            redis_url: None,
            tmdb_access_token: None,
            tmdb_api_url: default_tmdb_api_url(),
            host: default_host(),
            port: default_port(),
            base_rotations: default_base_rotations(),
            allow_repick: default_allow_repick(),
            spin_reveal_timeout_secs: default_spin_reveal_timeout_secs(),
            search_cache_ttl_secs: default_search_cache_ttl_secs(),
            details_cache_ttl_secs: default_details_cache_ttl_secs(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Reads a `.env` file first when one exists, then maps upper-case variables onto the
    /// fields (`DATABASE_URL`, `ALLOW_REPICK`, ...). Unset fields take their defaults;
    /// a set but unparseable value is an error.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn spin_reveal_timeout(&self) -> Duration {
        Duration::from_secs(self.spin_reveal_timeout_secs)
    }

    /// Address the HTTP listener binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
