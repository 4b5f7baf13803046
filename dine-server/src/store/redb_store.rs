//! redb-backed session store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `sessions` | `session_id` | `Session` (JSON) | Session records |
//! | `active_tables` | `table_number` | `session_id` | At most one ACTIVE session per table |
//! | `orders` | `order_id` | `Order` (JSON) | Order records |
//! | `session_orders` | `(session_id, seq)` | `order_id` | Insertion order per session |
//! | `open_orders` | `order_id` | `()` | Non-terminal order index (kitchen board) |
//! | `bills` | `session_id` | bytes | Bill, exactly as first serialized |
//! | `counters` | `&str` | `u64` | Insertion sequence |
//!
//! # Atomicity
//!
//! redb serializes write transactions, so each check-then-write below runs
//! against a stable view and commits as one unit.

use async_trait::async_trait;
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use shared::order::{Order, OrderStatus};
use shared::session::{Session, SessionStatus};
use shared::util::snowflake_id;
use std::path::Path;
use std::sync::Arc;

use super::{
    CasOutcome, ResolvedSession, SessionStore, StorageError, StorageResult, StoreStats,
};

/// key = session_id, value = JSON-serialized Session
const SESSIONS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("sessions");

/// key = table_number, value = ACTIVE session_id
const ACTIVE_TABLES_TABLE: TableDefinition<&str, i64> = TableDefinition::new("active_tables");

/// key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("orders");

/// key = (session_id, seq), value = order_id
const SESSION_ORDERS_TABLE: TableDefinition<(i64, u64), i64> =
    TableDefinition::new("session_orders");

/// key = order_id, value = empty (existence check)
const OPEN_ORDERS_TABLE: TableDefinition<i64, ()> = TableDefinition::new("open_orders");

/// key = session_id, value = bill bytes
const BILLS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("bills");

/// key = counter name, value = u64
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

const ORDER_SEQ_KEY: &str = "order_seq";

/// Fresh snowflake draws before giving up on a new session id
const MAX_ID_ATTEMPTS: usize = 8;

/// Session store backed by redb
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create the database at the given path
    ///
    /// redb commits with `Durability::Immediate` by default: once `commit()`
    /// returns, the transition or bill is on disk.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests and ephemeral runs)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            // Create all tables if they don't exist
            let _ = write_txn.open_table(SESSIONS_TABLE)?;
            let _ = write_txn.open_table(ACTIVE_TABLES_TABLE)?;
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(SESSION_ORDERS_TABLE)?;
            let _ = write_txn.open_table(OPEN_ORDERS_TABLE)?;
            let _ = write_txn.open_table(BILLS_TABLE)?;

            let mut counters = write_txn.open_table(COUNTERS_TABLE)?;
            if counters.get(ORDER_SEQ_KEY)?.is_none() {
                counters.insert(ORDER_SEQ_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    // ========== Transaction helpers ==========

    fn read_session_txn(txn: &WriteTransaction, session_id: i64) -> StorageResult<Option<Session>> {
        let table = txn.open_table(SESSIONS_TABLE)?;
        match table.get(session_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    fn write_session_txn(txn: &WriteTransaction, session: &Session) -> StorageResult<()> {
        let bytes = serde_json::to_vec(session)?;
        let mut table = txn.open_table(SESSIONS_TABLE)?;
        table.insert(session.session_id, bytes.as_slice())?;
        Ok(())
    }

    fn read_order_txn(txn: &WriteTransaction, order_id: i64) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    fn write_order_txn(txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let bytes = serde_json::to_vec(order)?;
        let mut table = txn.open_table(ORDERS_TABLE)?;
        table.insert(order.order_id, bytes.as_slice())?;
        Ok(())
    }

    /// First candidate id not yet present in `table`
    fn allocate_id_txn(
        txn: &WriteTransaction,
        table: TableDefinition<i64, &[u8]>,
        mut candidate: impl FnMut() -> i64,
    ) -> StorageResult<i64> {
        let table = txn.open_table(table)?;
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = candidate();
            if table.get(id)?.is_none() {
                return Ok(id);
            }
            tracing::debug!(id, "Id collision, drawing again");
        }
        Err(StorageError::IdExhausted(MAX_ID_ATTEMPTS))
    }

    fn next_order_seq_txn(txn: &WriteTransaction) -> StorageResult<u64> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let current = table
            .get(ORDER_SEQ_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0);
        let next = current + 1;
        table.insert(ORDER_SEQ_KEY, next)?;
        Ok(next)
    }

    // ========== Synchronous operations ==========

    fn resolve_active_session_sync(&self, table_number: &str) -> StorageResult<ResolvedSession> {
        self.resolve_active_session_with(table_number, snowflake_id)
    }

    fn resolve_active_session_with(
        &self,
        table_number: &str,
        next_id: impl FnMut() -> i64,
    ) -> StorageResult<ResolvedSession> {
        let txn = self.db.begin_write()?;

        let indexed = {
            let table = txn.open_table(ACTIVE_TABLES_TABLE)?;
            table.get(table_number)?.map(|guard| guard.value())
        };

        if let Some(session_id) = indexed {
            match Self::read_session_txn(&txn, session_id)? {
                Some(session) if session.is_active() => {
                    // read-only path, nothing to commit
                    txn.abort()?;
                    return Ok(ResolvedSession {
                        session,
                        created: false,
                    });
                }
                _ => {
                    tracing::warn!(
                        table_number = %table_number,
                        session_id = session_id,
                        "Stale active-table index entry, opening a new session"
                    );
                }
            }
        }

        let session = Session {
            session_id: Self::allocate_id_txn(&txn, SESSIONS_TABLE, next_id)?,
            table_number: table_number.to_string(),
            status: SessionStatus::Active,
            created_at: shared::util::now_millis(),
            finished_at: None,
        };
        Self::write_session_txn(&txn, &session)?;
        {
            let mut table = txn.open_table(ACTIVE_TABLES_TABLE)?;
            table.insert(table_number, session.session_id)?;
        }
        txn.commit()?;

        Ok(ResolvedSession {
            session,
            created: true,
        })
    }

    fn finish_session_sync(
        &self,
        session_id: i64,
        finished_at: i64,
    ) -> StorageResult<CasOutcome<Session>> {
        let txn = self.db.begin_write()?;
        let mut session = Self::read_session_txn(&txn, session_id)?
            .ok_or(StorageError::SessionNotFound(session_id))?;

        if session.status == SessionStatus::Finished {
            txn.abort()?;
            return Ok(CasOutcome::Rejected(session));
        }

        session.status = SessionStatus::Finished;
        session.finished_at = Some(finished_at);
        Self::write_session_txn(&txn, &session)?;
        {
            let mut table = txn.open_table(ACTIVE_TABLES_TABLE)?;
            let indexed = table
                .get(session.table_number.as_str())?
                .map(|guard| guard.value());
            if indexed == Some(session_id) {
                table.remove(session.table_number.as_str())?;
            }
        }
        txn.commit()?;

        Ok(CasOutcome::Applied(session))
    }

    fn insert_order_sync(&self, order: &Order) -> StorageResult<CasOutcome<Session>> {
        let txn = self.db.begin_write()?;
        let session = Self::read_session_txn(&txn, order.session_id)?
            .ok_or(StorageError::SessionNotFound(order.session_id))?;

        if !session.is_active() {
            txn.abort()?;
            return Ok(CasOutcome::Rejected(session));
        }
        if Self::read_order_txn(&txn, order.order_id)?.is_some() {
            txn.abort()?;
            return Err(StorageError::OrderIdTaken(order.order_id));
        }

        let seq = Self::next_order_seq_txn(&txn)?;
        Self::write_order_txn(&txn, order)?;
        {
            let mut table = txn.open_table(SESSION_ORDERS_TABLE)?;
            table.insert((order.session_id, seq), order.order_id)?;
        }
        if !order.status.is_terminal() {
            let mut table = txn.open_table(OPEN_ORDERS_TABLE)?;
            table.insert(order.order_id, ())?;
        }
        txn.commit()?;

        Ok(CasOutcome::Applied(session))
    }

    fn compare_and_swap_order_sync(
        &self,
        expected_status: OrderStatus,
        expected_version: u32,
        next: &Order,
    ) -> StorageResult<CasOutcome<Order>> {
        let txn = self.db.begin_write()?;
        let current = Self::read_order_txn(&txn, next.order_id)?
            .ok_or(StorageError::OrderNotFound(next.order_id))?;

        if current.status != expected_status || current.version != expected_version {
            txn.abort()?;
            return Ok(CasOutcome::Rejected(current));
        }

        Self::write_order_txn(&txn, next)?;
        if next.status.is_terminal() {
            let mut table = txn.open_table(OPEN_ORDERS_TABLE)?;
            table.remove(next.order_id)?;
        }
        txn.commit()?;

        Ok(CasOutcome::Applied(next.clone()))
    }

    fn insert_bill_sync(&self, session_id: i64, bill: Vec<u8>) -> StorageResult<CasOutcome<Vec<u8>>> {
        let txn = self.db.begin_write()?;
        let existing = {
            let table = txn.open_table(BILLS_TABLE)?;
            table.get(session_id)?.map(|guard| guard.value().to_vec())
        };

        if let Some(existing) = existing {
            txn.abort()?;
            return Ok(CasOutcome::Rejected(existing));
        }

        if Self::read_session_txn(&txn, session_id)?.is_none() {
            txn.abort()?;
            return Err(StorageError::SessionNotFound(session_id));
        }

        {
            let mut table = txn.open_table(BILLS_TABLE)?;
            table.insert(session_id, bill.as_slice())?;
        }
        txn.commit()?;

        Ok(CasOutcome::Applied(bill))
    }

    // ========== Read operations ==========

    fn get_session_sync(&self, session_id: i64) -> StorageResult<Option<Session>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSIONS_TABLE)?;
        match table.get(session_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    fn active_session_for_table_sync(&self, table_number: &str) -> StorageResult<Option<Session>> {
        let session_id = {
            let read_txn = self.db.begin_read()?;
            let table = read_txn.open_table(ACTIVE_TABLES_TABLE)?;
            table.get(table_number)?.map(|guard| guard.value())
        };
        match session_id {
            Some(id) => Ok(self.get_session_sync(id)?.filter(Session::is_active)),
            None => Ok(None),
        }
    }

    fn get_order_sync(&self, order_id: i64) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    fn list_session_orders_sync(&self, session_id: i64) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(SESSION_ORDERS_TABLE)?;
        let orders = read_txn.open_table(ORDERS_TABLE)?;

        let range_start = (session_id, 0u64);
        let range_end = (session_id, u64::MAX);

        let mut result = Vec::new();
        for entry in index.range(range_start..=range_end)? {
            let (_, order_id) = entry?;
            let order_id = order_id.value();
            match orders.get(order_id)? {
                Some(guard) => result.push(serde_json::from_slice(guard.value())?),
                None => {
                    tracing::warn!(session_id, order_id, "Session index points at missing order");
                }
            }
        }
        Ok(result)
    }

    fn list_open_orders_sync(&self) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let open = read_txn.open_table(OPEN_ORDERS_TABLE)?;
        let orders = read_txn.open_table(ORDERS_TABLE)?;

        let mut result = Vec::new();
        for entry in open.iter()? {
            let (order_id, _) = entry?;
            if let Some(guard) = orders.get(order_id.value())? {
                result.push(serde_json::from_slice(guard.value())?);
            }
        }
        Ok(result)
    }

    fn get_bill_sync(&self, session_id: i64) -> StorageResult<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(BILLS_TABLE)?;
        Ok(table.get(session_id)?.map(|guard| guard.value().to_vec()))
    }

    fn stats_sync(&self) -> StorageResult<StoreStats> {
        let read_txn = self.db.begin_read()?;
        Ok(StoreStats {
            sessions: read_txn.open_table(SESSIONS_TABLE)?.len()?,
            active_sessions: read_txn.open_table(ACTIVE_TABLES_TABLE)?.len()?,
            orders: read_txn.open_table(ORDERS_TABLE)?.len()?,
            open_orders: read_txn.open_table(OPEN_ORDERS_TABLE)?.len()?,
            bills: read_txn.open_table(BILLS_TABLE)?.len()?,
        })
    }
}

// redb transactions are short and never await, so they run inline on the
// calling task.
#[async_trait]
impl SessionStore for RedbStore {
    async fn resolve_active_session(&self, table_number: &str) -> StorageResult<ResolvedSession> {
        self.resolve_active_session_sync(table_number)
    }

    async fn get_session(&self, session_id: i64) -> StorageResult<Option<Session>> {
        self.get_session_sync(session_id)
    }

    async fn active_session_for_table(
        &self,
        table_number: &str,
    ) -> StorageResult<Option<Session>> {
        self.active_session_for_table_sync(table_number)
    }

    async fn finish_session(
        &self,
        session_id: i64,
        finished_at: i64,
    ) -> StorageResult<CasOutcome<Session>> {
        self.finish_session_sync(session_id, finished_at)
    }

    async fn insert_order(&self, order: &Order) -> StorageResult<CasOutcome<Session>> {
        self.insert_order_sync(order)
    }

    async fn get_order(&self, order_id: i64) -> StorageResult<Option<Order>> {
        self.get_order_sync(order_id)
    }

    async fn compare_and_swap_order(
        &self,
        expected_status: OrderStatus,
        expected_version: u32,
        next: &Order,
    ) -> StorageResult<CasOutcome<Order>> {
        self.compare_and_swap_order_sync(expected_status, expected_version, next)
    }

    async fn list_session_orders(&self, session_id: i64) -> StorageResult<Vec<Order>> {
        self.list_session_orders_sync(session_id)
    }

    async fn list_open_orders(&self) -> StorageResult<Vec<Order>> {
        self.list_open_orders_sync()
    }

    async fn get_bill(&self, session_id: i64) -> StorageResult<Option<Vec<u8>>> {
        self.get_bill_sync(session_id)
    }

    async fn insert_bill_if_absent(
        &self,
        session_id: i64,
        bill: Vec<u8>,
    ) -> StorageResult<CasOutcome<Vec<u8>>> {
        self.insert_bill_sync(session_id, bill)
    }

    async fn stats(&self) -> StorageResult<StoreStats> {
        self.stats_sync()
    }
}
