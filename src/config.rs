use anyhow::{Context, Result};

/// Runtime configuration for a store and the operations running against it.
///
/// Built either with the builder methods or from `ORDERGRAPH_*` environment
/// variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Logical database name, used in log fields.
    pub database: String,

    /// Whether the store offers multi-document transactions. When disabled
    /// order creation falls back to write-then-compensate.
    pub transactions: bool,

    /// Upper bound on keys handed to one batch fetch.
    pub max_batch_size: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceConfig {
    pub const DEFAULT_DATABASE: &'static str = "ordergraph";
    pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;

    pub fn new() -> Self {
        Self {
            database: Self::DEFAULT_DATABASE.to_string(),
            transactions: true,
            max_batch_size: Self::DEFAULT_MAX_BATCH_SIZE,
        }
    }

    /// Set the database name
    pub fn database(mut self, database: &str) -> Self {
        self.database = database.to_string();
        self
    }

    /// Enable or disable multi-document transactions
    pub fn transactions(mut self, enabled: bool) -> Self {
        self.transactions = enabled;
        self
    }

    /// Set the maximum batch size. Zero is treated as one.
    pub fn max_batch_size(mut self, max: usize) -> Self {
        self.max_batch_size = max.max(1);
        self
    }

    /// Read configuration from the process environment.
    ///
    /// - `ORDERGRAPH_DATABASE` (default `ordergraph`)
    /// - `ORDERGRAPH_TRANSACTIONS` (`true`/`false`, default `true`)
    /// - `ORDERGRAPH_MAX_BATCH_SIZE` (default `100`)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::new();

        if let Some(database) = lookup("ORDERGRAPH_DATABASE") {
            config.database = database;
        }

        if let Some(raw) = lookup("ORDERGRAPH_TRANSACTIONS") {
            config.transactions = raw
                .trim()
                .parse::<bool>()
                .context("ORDERGRAPH_TRANSACTIONS must be true or false")?;
        }

        if let Some(raw) = lookup("ORDERGRAPH_MAX_BATCH_SIZE") {
            let max = raw
                .trim()
                .parse::<usize>()
                .context("ORDERGRAPH_MAX_BATCH_SIZE must be a positive integer")?;
            config = config.max_batch_size(max);
        }

        Ok(config)
    }
}
