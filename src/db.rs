use sqlx::{
    postgres::{PgConnectOptions, PgConnection},
    Connection,
};
use tracing::{debug, error, info, instrument};

use crate::{
    config::{DbConfig, TableName},
    error::StoreError,
};

/// Opens one connection per unit of work. There is no pool: every
/// [`Session`] owns its own socket and gives it back when closed or dropped.
#[derive(Debug, Clone)]
pub struct Store {
    options: PgConnectOptions,
    table: TableName,
}

impl Store {
    pub fn new(options: PgConnectOptions, table: TableName) -> Self {
        Self { options, table }
    }

    pub fn from_config(cfg: &DbConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&cfg.host)
            .port(cfg.port)
            .username(&cfg.user)
            .password(&cfg.password)
            .database(&cfg.database);
        Self::new(options, cfg.table.clone())
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    #[instrument(skip_all)]
    pub async fn open(&self) -> Result<Session, StoreError> {
        let host = self.options.get_host();
        let port = self.options.get_port();
        let conn = PgConnection::connect_with(&self.options)
            .await
            .map_err(|e| {
                error!(error = %e, host, port, "database connection failed");
                StoreError::Connect(e)
            })?;
        info!(host, port, "database connection opened");
        Ok(Session {
            conn,
            table: self.table.clone(),
        })
    }
}

/// A single open store connection bound to the configured user table.
pub struct Session {
    conn: PgConnection,
    table: TableName,
}

impl Session {
    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub(crate) fn conn_mut(&mut self) -> &mut PgConnection {
        &mut self.conn
    }

    /// Gracefully terminates the connection.
    pub async fn close(self) -> Result<(), StoreError> {
        self.conn.close().await.map_err(|e| {
            error!(error = %e, "closing database connection failed");
            StoreError::Query(e)
        })?;
        debug!("database connection closed");
        Ok(())
    }

    /// Closes the session and hands back `result`. An error from the work
    /// itself takes precedence over one raised while closing.
    pub async fn finish<T>(self, result: Result<T, StoreError>) -> Result<T, StoreError> {
        let closed = self.close().await;
        let value = result?;
        closed?;
        Ok(value)
    }
}
