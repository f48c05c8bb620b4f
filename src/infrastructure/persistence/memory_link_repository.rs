//! In-memory implementation of the link repository.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// Map-backed repository for tests and single-process development.
///
/// Transactions hold the table lock for their whole lifetime, which gives the
/// same linearization the database provides: two concurrent creates racing
/// for one alias serialize on the lock, the first commit wins, and the second
/// observes the row and reports a conflict.
pub struct MemoryLinkRepository {
    links: Arc<Mutex<HashMap<String, Link>>>,
    sequence: AtomicI64,
}

/// Transaction handle: the table guard plus inserts staged until commit.
pub struct MemoryTx {
    guard: OwnedMutexGuard<HashMap<String, Link>>,
    staged: Vec<Link>,
}

impl MemoryLinkRepository {
    pub fn new() -> Self {
        Self {
            links: Arc::new(Mutex::new(HashMap::new())),
            sequence: AtomicI64::new(1),
        }
    }

    fn materialize(link: &NewLink) -> Link {
        Link {
            code: link.code.clone(),
            long_url: link.long_url.clone(),
            alias: link.alias.clone(),
            password_hash: link.password_hash.clone(),
            expires_at: link.expires_at,
            max_clicks: link.max_clicks,
            click_count: 0,
            created_at: Utc::now(),
            owner_id: Some(link.owner_id),
        }
    }

    fn conflict(code: &str) -> AppError {
        AppError::conflict("Code already exists", json!({ "code": code }))
    }
}

impl Default for MemoryLinkRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkRepository for MemoryLinkRepository {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<Self::Tx, AppError> {
        let guard = Arc::clone(&self.links).lock_owned().await;
        Ok(MemoryTx {
            guard,
            staged: Vec::new(),
        })
    }

    async fn commit(&self, mut tx: Self::Tx) -> Result<(), AppError> {
        for link in tx.staged.drain(..) {
            tx.guard.insert(link.code.clone(), link);
        }
        Ok(())
    }

    async fn rollback(&self, _tx: Self::Tx) -> Result<(), AppError> {
        // Dropping the handle discards staged writes and releases the lock.
        Ok(())
    }

    async fn create(&self, link: &NewLink) -> Result<(), AppError> {
        let mut links = self.links.lock().await;

        if links.contains_key(&link.code) {
            return Err(Self::conflict(&link.code));
        }

        links.insert(link.code.clone(), Self::materialize(link));
        Ok(())
    }

    async fn create_in_tx(&self, tx: &mut Self::Tx, link: &NewLink) -> Result<(), AppError> {
        let staged_hit = tx.staged.iter().any(|l| l.code == link.code);
        if staged_hit || tx.guard.contains_key(&link.code) {
            return Err(Self::conflict(&link.code));
        }

        tx.staged.push(Self::materialize(link));
        Ok(())
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        Ok(self.links.lock().await.get(code).cloned())
    }

    async fn get_by_code_in_tx(
        &self,
        tx: &mut Self::Tx,
        code: &str,
    ) -> Result<Option<Link>, AppError> {
        if let Some(staged) = tx.staged.iter().find(|l| l.code == code) {
            return Ok(Some(staged.clone()));
        }
        Ok(tx.guard.get(code).cloned())
    }

    async fn update(&self, link: &Link) -> Result<(), AppError> {
        let mut links = self.links.lock().await;

        if let Some(existing) = links.get_mut(&link.code) {
            existing.long_url = link.long_url.clone();
            existing.alias = link.alias.clone();
            existing.password_hash = link.password_hash.clone();
            existing.expires_at = link.expires_at;
            existing.max_clicks = link.max_clicks;
            existing.owner_id = link.owner_id;
        }

        Ok(())
    }

    async fn delete(&self, code: &str) -> Result<(), AppError> {
        self.links.lock().await.remove(code);
        Ok(())
    }

    async fn increment_click_count(&self, code: &str) -> Result<(), AppError> {
        let mut links = self.links.lock().await;
        if let Some(link) = links.get_mut(code) {
            link.click_count += 1;
        }
        Ok(())
    }

    async fn set_click_count(&self, code: &str, count: i64) -> Result<(), AppError> {
        let mut links = self.links.lock().await;
        if let Some(link) = links.get_mut(code) {
            link.click_count = link.click_count.max(count);
        }
        Ok(())
    }

    async fn next_code_id(&self) -> Result<i64, AppError> {
        Ok(self.sequence.fetch_add(1, Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn new_link(code: &str) -> NewLink {
        NewLink {
            code: code.to_string(),
            long_url: "https://example.com".to_string(),
            alias: None,
            password_hash: None,
            expires_at: None,
            max_clicks: None,
            owner_id: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = MemoryLinkRepository::new();

        repo.create(&new_link("abc")).await.unwrap();

        let link = repo.get_by_code("abc").await.unwrap().unwrap();
        assert_eq!(link.code, "abc");
        assert_eq!(link.click_count, 0);
        assert!(repo.get_by_code("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let repo = MemoryLinkRepository::new();

        repo.create(&new_link("abc")).await.unwrap();
        let err = repo.create(&new_link("abc")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_transaction_commit_makes_row_visible() {
        let repo = MemoryLinkRepository::new();

        let mut tx = repo.begin().await.unwrap();
        assert!(repo.get_by_code_in_tx(&mut tx, "abc").await.unwrap().is_none());
        repo.create_in_tx(&mut tx, &new_link("abc")).await.unwrap();

        // Visible inside the transaction before commit.
        assert!(repo.get_by_code_in_tx(&mut tx, "abc").await.unwrap().is_some());

        repo.commit(tx).await.unwrap();
        assert!(repo.get_by_code("abc").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_transaction_rollback_discards_insert() {
        let repo = MemoryLinkRepository::new();

        let mut tx = repo.begin().await.unwrap();
        repo.create_in_tx(&mut tx, &new_link("abc")).await.unwrap();
        repo.rollback(tx).await.unwrap();

        assert!(repo.get_by_code("abc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let repo = MemoryLinkRepository::new();

        repo.create(&new_link("abc")).await.unwrap();
        repo.delete("abc").await.unwrap();
        repo.delete("abc").await.unwrap();
        repo.delete("never-existed").await.unwrap();
    }

    #[tokio::test]
    async fn test_set_click_count_is_monotonic() {
        let repo = MemoryLinkRepository::new();
        repo.create(&new_link("abc")).await.unwrap();

        repo.set_click_count("abc", 20).await.unwrap();
        repo.set_click_count("abc", 10).await.unwrap();

        let link = repo.get_by_code("abc").await.unwrap().unwrap();
        assert_eq!(link.click_count, 20);
    }

    #[tokio::test]
    async fn test_sequence_is_strictly_increasing() {
        let repo = MemoryLinkRepository::new();

        let a = repo.next_code_id().await.unwrap();
        let b = repo.next_code_id().await.unwrap();
        assert!(b > a);
    }
}
