//! Application configuration from environment variables.
//!
//! Load configuration using `Config::from_env()` after calling `dotenvy::dotenv()`.

/// Default bind address when `BIND_ADDR` is not set.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8001";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Socket address the server binds to
    /// Example: 0.0.0.0:8001
    pub bind_addr: String,

    /// Allowed CORS origin for the browser frontend
    /// Example: https://poll.example.com
    /// When unset, CORS is permissive (any origin).
    pub cors_origin: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv()` before this to load from `.env` file.
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            cors_origin: std::env::var("CORS_ORIGIN").ok(),
        }
    }

    /// Check if a CORS origin is pinned
    pub fn has_cors_origin(&self) -> bool {
        self.cors_origin.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
