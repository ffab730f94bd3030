use crate::error::CliError;
use async_trait::async_trait;
use connectors::{
    error::AdapterError,
    sql::{base::adapter::SqlAdapter, postgres::adapter::PgAdapter},
};
use engine_config::env::redact_connection_string;
use tracing::{error, info};

/// Trait for "pinging" a destination
#[async_trait]
pub trait ConnectionPinger {
    /// Attempts to ping; returns Err if unreachable
    async fn ping(&self) -> Result<(), CliError>;
}

/// Postgres pinger
pub struct PostgresConnectionPinger {
    pub conn_str: String,
}

#[async_trait]
impl ConnectionPinger for PostgresConnectionPinger {
    async fn ping(&self) -> Result<(), CliError> {
        let target = redact_connection_string(&self.conn_str);
        info!(target = %target, "Pinging Postgres");

        let adapter = PgAdapter::connect(&self.conn_str).await.map_err(|e| {
            error!(target = %target, error = %e, "Postgres connection failed");
            AdapterError::from(e)
        })?;

        adapter.ping().await.map_err(|e| {
            error!(target = %target, error = %e, "Postgres ping query failed");
            AdapterError::from(e)
        })?;

        info!(target = %target, "Postgres ping succeeded");
        Ok(())
    }
}
