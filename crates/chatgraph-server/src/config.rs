//! Server configuration read from the environment.
//!
//! - `CHATGRAPH_DB_PATH`: SQLite database file path (default: "chatgraph.db")
//! - `CHATGRAPH_PORT`: listen port (default: 3000)
//! - `CHATGRAPH_BIND`: listen address (default: "0.0.0.0")
//!
//! The log filter comes from `RUST_LOG` and is handled by the binary.

pub const DEFAULT_DB_PATH: &str = "chatgraph.db";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND: &str = "0.0.0.0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub db_path: String,
    pub port: u16,
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            db_path: DEFAULT_DB_PATH.to_string(),
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Unset keys and
    /// an unparseable port fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = ServerConfig::default();

        let port = match lookup("CHATGRAPH_PORT") {
            Some(raw) => match raw.parse() {
                Ok(port) => port,
                Err(_) => {
                    tracing::warn!(value = %raw, default = DEFAULT_PORT, "invalid CHATGRAPH_PORT; using default");
                    defaults.port
                }
            },
            None => defaults.port,
        };

        ServerConfig {
            db_path: lookup("CHATGRAPH_DB_PATH").unwrap_or(defaults.db_path),
            port,
            bind: lookup("CHATGRAPH_BIND").unwrap_or(defaults.bind),
        }
    }

    /// The `host:port` string to bind the listener to.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}
