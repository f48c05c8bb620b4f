//! Repository trait for durable link storage.

use crate::domain::entities::{Link, NewLink};
use crate::error::AppError;
use async_trait::async_trait;

/// Durable CRUD over link rows, with a transactional create path.
///
/// "Not found" is a valid return value (`Ok(None)`), never an error. All
/// operations run on the caller's task and are cancelled by dropping the
/// future, so a client disconnect does not leak in-flight work.
///
/// # Transactions
///
/// [`LinkRepository::Tx`] is an opaque transaction handle. The only consumer
/// of the transactional variants is the service's create path, which composes
/// an existence check with the insert atomically: two concurrent creates
/// racing for the same alias are linearized by the store, exactly one
/// commits, and the other observes a conflict.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL via SQLx
/// - [`crate::infrastructure::persistence::MemoryLinkRepository`] - in-memory map for tests
#[cfg_attr(test, mockall::automock(type Tx = ();))]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Opaque transaction handle.
    type Tx: Send;

    /// Opens a transaction against the durable store.
    async fn begin(&self) -> Result<Self::Tx, AppError>;

    /// Commits a transaction, making its writes visible atomically.
    async fn commit(&self, tx: Self::Tx) -> Result<(), AppError>;

    /// Rolls a transaction back, discarding its writes.
    async fn rollback(&self, tx: Self::Tx) -> Result<(), AppError>;

    /// Inserts a new link row.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the code already exists.
    async fn create(&self, link: &NewLink) -> Result<(), AppError>;

    /// Inserts a new link row within an open transaction.
    async fn create_in_tx(&self, tx: &mut Self::Tx, link: &NewLink) -> Result<(), AppError>;

    /// Fetches a link by code; `Ok(None)` when absent.
    async fn get_by_code(&self, code: &str) -> Result<Option<Link>, AppError>;

    /// Fetches a link by code within an open transaction.
    async fn get_by_code_in_tx(
        &self,
        tx: &mut Self::Tx,
        code: &str,
    ) -> Result<Option<Link>, AppError>;

    /// Overwrites the mutable fields of an existing row.
    ///
    /// `click_count` is excluded: the counter is owned by the click sync path
    /// and must never be clobbered with a stale read.
    async fn update(&self, link: &Link) -> Result<(), AppError>;

    /// Removes the row. Deleting a non-existent code is idempotent.
    async fn delete(&self, code: &str) -> Result<(), AppError>;

    /// Relative `+1` on the durable counter. Used only when the fast cache
    /// counter is unavailable, never on every redirect.
    async fn increment_click_count(&self, code: &str) -> Result<(), AppError>;

    /// Writes a synced fast-counter value into the durable counter.
    ///
    /// Implementations must keep the column monotonic (never decrease it),
    /// since sync writes can arrive out of order.
    async fn set_click_count(&self, code: &str, count: i64) -> Result<(), AppError>;

    /// Draws the next value from the store's atomic code sequence.
    async fn next_code_id(&self) -> Result<i64, AppError>;
}
