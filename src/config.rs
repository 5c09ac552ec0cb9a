use std::time::Duration;

/// Default number of pooled SQLite connections.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default time a writer waits for another writer to release the database.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection settings for the ledger database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Path to the SQLite database file
    pub database_path: String,
    pub max_connections: u32,
    pub busy_timeout: Duration,
    /// Create the database file when it does not exist yet
    pub create_if_missing: bool,
}

impl LedgerConfig {
    pub fn new(database_path: impl Into<String>) -> Self {
        Self {
            database_path: database_path.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            create_if_missing: false,
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// The `sqlx` connection URL for this configuration.
    pub fn database_url(&self) -> String {
        format!("sqlite:{}", self.database_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::new("teller.db");
        assert_eq!(config.database_url(), "sqlite:teller.db");
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.busy_timeout, DEFAULT_BUSY_TIMEOUT);
        assert!(!config.create_if_missing);
    }

    #[test]
    fn test_max_connections_is_at_least_one() {
        let config = LedgerConfig::new("teller.db").with_max_connections(0);
        assert_eq!(config.max_connections, 1);
    }
}
