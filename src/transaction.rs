//! Transactions over a single checked-out connection.
//!
//! A [`Transaction`] implements [`SqlExecutor`] so repository code can run the
//! same statements inside or outside a transaction. Product writes (product
//! row plus stock row) are the main user.

use crate::executor::{observe_query, DbError, SqlExecutor};
use may_postgres::types::ToSql;
use may_postgres::{Client, Error as PostgresError, Row};
use std::fmt;
use std::time::Instant;

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;
#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

/// Transaction error type
#[derive(Debug)]
pub enum TransactionError {
    /// PostgreSQL error from may_postgres
    PostgresError(PostgresError),
    /// Transaction already committed or rolled back
    TransactionClosed,
    /// Other transaction errors
    Other(String),
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionError::PostgresError(e) => {
                write!(f, "PostgreSQL error: {}", e)
            }
            TransactionError::TransactionClosed => {
                write!(f, "Transaction has already been committed or rolled back")
            }
            TransactionError::Other(s) => {
                write!(f, "Transaction error: {}", s)
            }
        }
    }
}

impl std::error::Error for TransactionError {}

impl From<PostgresError> for TransactionError {
    fn from(err: PostgresError) -> Self {
        TransactionError::PostgresError(err)
    }
}

impl From<TransactionError> for DbError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::PostgresError(e) => DbError::Postgres(e),
            TransactionError::TransactionClosed => DbError::Other("Transaction closed".to_string()),
            TransactionError::Other(s) => DbError::Other(s),
        }
    }
}

/// A database transaction
///
/// Dropping an open transaction issues a best-effort `ROLLBACK` so a failed
/// request never returns a connection to the pool mid-transaction.
pub struct Transaction {
    client: Client,
    closed: bool,
}

impl Transaction {
    pub(crate) fn new(client: Client) -> Result<Self, TransactionError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::begin_transaction_span().entered();

        client.execute("BEGIN", &[]).map_err(TransactionError::from)?;

        Ok(Self {
            client,
            closed: false,
        })
    }

    /// Commit the transaction
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction is already closed or `COMMIT` fails.
    pub fn commit(mut self) -> Result<(), TransactionError> {
        if self.closed {
            return Err(TransactionError::TransactionClosed);
        }

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::commit_transaction_span().entered();

        self.closed = true;
        self.client
            .execute("COMMIT", &[])
            .map_err(TransactionError::from)?;
        Ok(())
    }

    /// Rollback the transaction
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction is already closed or `ROLLBACK` fails.
    pub fn rollback(mut self) -> Result<(), TransactionError> {
        if self.closed {
            return Err(TransactionError::TransactionClosed);
        }

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::rollback_transaction_span().entered();

        self.closed = true;
        self.client
            .execute("ROLLBACK", &[])
            .map_err(TransactionError::from)?;
        Ok(())
    }

    /// Check if the transaction is closed
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<(), DbError> {
        if self.closed {
            return Err(DbError::Other("Transaction is closed".to_string()));
        }
        Ok(())
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.client.execute("ROLLBACK", &[]) {
                log::error!("rollback of abandoned transaction failed: {}", e);
            }
        }
    }
}

impl SqlExecutor for Transaction {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, DbError> {
        self.ensure_open()?;

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::execute_query_span(query).entered();

        let start = Instant::now();
        let result = self.client.execute(query, params).map_err(|e| {
            #[cfg(feature = "metrics")]
            METRICS.record_query_error();
            DbError::Postgres(e)
        });

        observe_query(query, start);
        result
    }

    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, DbError> {
        self.ensure_open()?;

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::execute_query_span(query).entered();

        let start = Instant::now();
        let result = self.client.query_one(query, params).map_err(|e| {
            #[cfg(feature = "metrics")]
            METRICS.record_query_error();
            DbError::Postgres(e)
        });

        observe_query(query, start);
        result
    }

    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, DbError> {
        self.ensure_open()?;

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::execute_query_span(query).entered();

        let start = Instant::now();
        let result = self.client.query(query, params).map_err(|e| {
            #[cfg(feature = "metrics")]
            METRICS.record_query_error();
            DbError::Postgres(e)
        });

        observe_query(query, start);
        result
    }
}
