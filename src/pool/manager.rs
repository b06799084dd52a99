//! Connection pool with persistent `may_postgres` slots.
//!
//! Every slot owns one connection. Free slots sit in a bounded crossbeam
//! channel; checking a connection out takes a slot off the channel and the
//! [`PooledConnection`] guard puts it back on drop. A checkout that finds the
//! channel empty parks the calling coroutine in short sleeps until a slot is
//! returned or `pool_timeout_seconds` elapses.

use crate::connection::connect;
use crate::executor::{DbError, PgExecutor, SqlExecutor};
use crate::pool::config::DatabaseConfig;
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use may_postgres::types::ToSql;
use may_postgres::Row;
use std::ops::Deref;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;
#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

/// Slots idle longer than this are probed with `SELECT 1` before reuse.
const IDLE_HEALTH_CHECK_AFTER: Duration = Duration::from_secs(30);
const CHECKOUT_BACKOFF: Duration = Duration::from_millis(2);

struct Slot {
    id: usize,
    executor: PgExecutor,
    last_used: Instant,
}

struct PoolInner {
    connection_string: String,
    size: usize,
    timeout: Duration,
    free_tx: Sender<Slot>,
    free_rx: Receiver<Slot>,
}

/// Fixed-size pool of PostgreSQL connections.
#[derive(Clone)]
pub struct DbPool {
    inner: Arc<PoolInner>,
}

impl DbPool {
    /// Open `max_connections` connections up front.
    ///
    /// # Errors
    ///
    /// Fails if the configuration asks for zero connections or any
    /// connection cannot be established.
    pub fn new(config: &DatabaseConfig) -> Result<Self, DbError> {
        if config.max_connections == 0 {
            return Err(DbError::Pool(
                "max_connections must be at least 1".to_string(),
            ));
        }

        let connection_string = config.connection_string();
        let (free_tx, free_rx) = bounded(config.max_connections);

        for id in 0..config.max_connections {
            let client = connect(&connection_string)?;
            let slot = Slot {
                id,
                executor: PgExecutor::new(client),
                last_used: Instant::now(),
            };
            free_tx
                .send(slot)
                .map_err(|_| DbError::Pool("pool channel closed during startup".to_string()))?;
        }

        log::info!(
            "database pool ready with {} connections (checkout timeout {}s)",
            config.max_connections,
            config.pool_timeout_seconds
        );

        Ok(Self {
            inner: Arc::new(PoolInner {
                connection_string,
                size: config.max_connections,
                timeout: Duration::from_secs(config.pool_timeout_seconds),
                free_tx,
                free_rx,
            }),
        })
    }

    /// Total number of slots.
    pub fn size(&self) -> usize {
        self.inner.size
    }

    /// Slots currently free.
    pub fn idle(&self) -> usize {
        self.inner.free_rx.len()
    }

    /// Check a connection out, waiting up to the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Pool` when no slot frees up in time, or when an idle
    /// slot failed its health check and could not be reconnected.
    pub fn get(&self) -> Result<PooledConnection, DbError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::acquire_connection_span().entered();

        let start = Instant::now();
        let deadline = start + self.inner.timeout;

        let slot = loop {
            match self.inner.free_rx.try_recv() {
                Ok(slot) => break slot,
                Err(TryRecvError::Empty) => {
                    if Instant::now() >= deadline {
                        #[cfg(feature = "metrics")]
                        METRICS.record_pool_timeout();
                        log::warn!(
                            "timed out after {:?} waiting for a database connection ({} of {} idle)",
                            self.inner.timeout,
                            self.idle(),
                            self.size()
                        );
                        return Err(DbError::Pool(format!(
                            "no connection available within {}s ({} of {} in use)",
                            self.inner.timeout.as_secs(),
                            self.size().saturating_sub(self.idle()),
                            self.size()
                        )));
                    }
                    may::coroutine::sleep(CHECKOUT_BACKOFF);
                }
                Err(TryRecvError::Disconnected) => {
                    return Err(DbError::Pool("pool has been shut down".to_string()));
                }
            }
        };

        #[cfg(feature = "metrics")]
        {
            METRICS.record_connection_wait(start.elapsed());
            METRICS.connection_checked_out();
        }

        let mut guard = PooledConnection {
            slot: Some(slot),
            pool: Arc::clone(&self.inner),
        };
        guard.revalidate()?;
        Ok(guard)
    }
}

/// A checked-out connection. Returned to the pool when dropped.
pub struct PooledConnection {
    slot: Option<Slot>,
    pool: Arc<PoolInner>,
}

impl PooledConnection {
    fn slot(&self) -> &Slot {
        // only `None` while being dropped
        match &self.slot {
            Some(slot) => slot,
            None => unreachable!("pooled connection used after release"),
        }
    }

    fn revalidate(&mut self) -> Result<(), DbError> {
        let Some(slot) = self.slot.as_mut() else {
            return Ok(());
        };
        if slot.last_used.elapsed() < IDLE_HEALTH_CHECK_AFTER {
            return Ok(());
        }

        if matches!(slot.executor.check_health(), Ok(true)) {
            return Ok(());
        }

        log::warn!("pool slot {} failed its health check, reconnecting", slot.id);
        let client = connect(&self.pool.connection_string)?;
        slot.executor = PgExecutor::new(client);
        slot.last_used = Instant::now();
        Ok(())
    }
}

impl Deref for PooledConnection {
    type Target = PgExecutor;

    fn deref(&self) -> &PgExecutor {
        &self.slot().executor
    }
}

impl SqlExecutor for PooledConnection {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, DbError> {
        self.slot().executor.execute(query, params)
    }

    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, DbError> {
        self.slot().executor.query_one(query, params)
    }

    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, DbError> {
        self.slot().executor.query_all(query, params)
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(mut slot) = self.slot.take() {
            slot.last_used = Instant::now();
            if self.pool.free_tx.try_send(slot).is_err() {
                log::error!("could not return connection to the pool");
            }
            #[cfg(feature = "metrics")]
            METRICS.connection_returned();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_connections_rejected() {
        let cfg = DatabaseConfig {
            max_connections: 0,
            ..DatabaseConfig::default()
        };
        match DbPool::new(&cfg) {
            Err(DbError::Pool(msg)) => assert!(msg.contains("at least 1")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("pool with zero connections should not build"),
        }
    }

    #[test]
    fn test_invalid_connection_string_fails_fast() {
        let cfg = DatabaseConfig {
            url: Some("not-a-connection-string".into()),
            max_connections: 1,
            ..DatabaseConfig::default()
        };
        assert!(DbPool::new(&cfg).is_err());
    }
}
