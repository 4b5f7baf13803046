//! Session store
//!
//! Durable home of sessions, orders and bills. Every mutation that must be
//! atomic against concurrent requests (get-or-create of the active session,
//! status compare-and-set, finish, first bill insert) runs inside a single
//! store write transaction.
//!
//! # Modules
//!
//! - [`redb_store`]: [`RedbStore`], file-backed or in-memory

mod redb_store;

pub use redb_store::RedbStore;

use async_trait::async_trait;
use serde::Serialize;
use shared::order::{Order, OrderStatus};
use shared::session::Session;
use std::sync::Arc;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session not found: {0}")]
    SessionNotFound(i64),

    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    /// Another order already holds this id; nothing was written
    #[error("Order id already in use: {0}")]
    OrderIdTaken(i64),

    #[error("No free id after {0} attempts")]
    IdExhausted(usize),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Result of a conditional write
///
/// `Rejected` carries the current stored value so the caller can report it
/// (or, for bills, converge on it).
#[derive(Debug, Clone, PartialEq)]
pub enum CasOutcome<T> {
    Applied(T),
    Rejected(T),
}

impl<T> CasOutcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, CasOutcome::Applied(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            CasOutcome::Applied(v) | CasOutcome::Rejected(v) => v,
        }
    }
}

/// Active session lookup result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSession {
    pub session: Session,
    /// `true` if this call opened the session
    pub created: bool,
}

/// Row counts for health reporting
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct StoreStats {
    pub sessions: u64,
    pub active_sessions: u64,
    pub orders: u64,
    pub open_orders: u64,
    pub bills: u64,
}

/// Store operations used by the lifecycle engine
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    // ========== Sessions ==========

    /// Return the table's ACTIVE session, opening one if there is none.
    ///
    /// Concurrent calls for one table return the same session.
    async fn resolve_active_session(&self, table_number: &str) -> StorageResult<ResolvedSession>;

    async fn get_session(&self, session_id: i64) -> StorageResult<Option<Session>>;

    async fn active_session_for_table(&self, table_number: &str)
    -> StorageResult<Option<Session>>;

    /// ACTIVE → FINISHED. `Rejected` carries the already finished session.
    async fn finish_session(
        &self,
        session_id: i64,
        finished_at: i64,
    ) -> StorageResult<CasOutcome<Session>>;

    // ========== Orders ==========

    /// Insert a new order into its session.
    ///
    /// `Rejected` carries the session if it is no longer ACTIVE; nothing is
    /// written in that case. An id collision fails with
    /// [`StorageError::OrderIdTaken`] and also writes nothing.
    async fn insert_order(&self, order: &Order) -> StorageResult<CasOutcome<Session>>;

    async fn get_order(&self, order_id: i64) -> StorageResult<Option<Order>>;

    /// Replace the order only if its stored status and version still match.
    ///
    /// `Rejected` carries the current stored order.
    async fn compare_and_swap_order(
        &self,
        expected_status: OrderStatus,
        expected_version: u32,
        next: &Order,
    ) -> StorageResult<CasOutcome<Order>>;

    /// Orders of a session in insertion order
    async fn list_session_orders(&self, session_id: i64) -> StorageResult<Vec<Order>>;

    /// Non-terminal orders across all sessions, oldest first
    async fn list_open_orders(&self) -> StorageResult<Vec<Order>>;

    // ========== Bills ==========

    /// Stored bill bytes, exactly as first written
    async fn get_bill(&self, session_id: i64) -> StorageResult<Option<Vec<u8>>>;

    /// Store the bill unless one exists. `Rejected` carries the existing bytes.
    async fn insert_bill_if_absent(
        &self,
        session_id: i64,
        bill: Vec<u8>,
    ) -> StorageResult<CasOutcome<Vec<u8>>>;

    // ========== Stats ==========

    async fn stats(&self) -> StorageResult<StoreStats>;
}

pub type DynStore = Arc<dyn SessionStore>;
