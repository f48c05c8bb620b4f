//! PostgreSQL implementation of the link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// PostgreSQL repository for link rows.
///
/// All statements use bound parameters. The `links.code` primary key enforces
/// uniqueness at the store, and `links_code_seq` feeds the code generator;
/// both are created by the migrations in `migrations/`.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository over a connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct LinkRow {
    code: String,
    long_url: String,
    alias: Option<String>,
    password_hash: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    max_clicks: Option<i32>,
    click_count: i64,
    created_at: DateTime<Utc>,
    owner_id: Option<Uuid>,
}

impl From<LinkRow> for Link {
    fn from(row: LinkRow) -> Self {
        Link {
            code: row.code,
            long_url: row.long_url,
            alias: row.alias,
            password_hash: row.password_hash,
            expires_at: row.expires_at,
            max_clicks: row.max_clicks,
            click_count: row.click_count,
            created_at: row.created_at,
            owner_id: row.owner_id,
        }
    }
}

const SELECT_BY_CODE: &str = "\
    SELECT code, long_url, alias, password_hash, expires_at, max_clicks, \
           click_count, created_at, owner_id \
    FROM links WHERE code = $1";

const INSERT_LINK: &str = "\
    INSERT INTO links (code, long_url, alias, password_hash, expires_at, max_clicks, owner_id) \
    VALUES ($1, $2, $3, $4, $5, $6, $7)";

fn bind_insert<'q>(
    query: sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments>,
    link: &'q NewLink,
) -> sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(&link.code)
        .bind(&link.long_url)
        .bind(&link.alias)
        .bind(&link.password_hash)
        .bind(link.expires_at)
        .bind(link.max_clicks)
        .bind(link.owner_id)
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self) -> Result<Self::Tx, AppError> {
        Ok(self.pool.begin().await?)
    }

    async fn commit(&self, tx: Self::Tx) -> Result<(), AppError> {
        Ok(tx.commit().await?)
    }

    async fn rollback(&self, tx: Self::Tx) -> Result<(), AppError> {
        Ok(tx.rollback().await?)
    }

    async fn create(&self, link: &NewLink) -> Result<(), AppError> {
        bind_insert(sqlx::query(INSERT_LINK), link)
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    async fn create_in_tx(&self, tx: &mut Self::Tx, link: &NewLink) -> Result<(), AppError> {
        bind_insert(sqlx::query(INSERT_LINK), link)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(SELECT_BY_CODE)
            .bind(code)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Link::from))
    }

    async fn get_by_code_in_tx(
        &self,
        tx: &mut Self::Tx,
        code: &str,
    ) -> Result<Option<Link>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(SELECT_BY_CODE)
            .bind(code)
            .fetch_optional(&mut **tx)
            .await?;

        Ok(row.map(Link::from))
    }

    async fn update(&self, link: &Link) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE links \
             SET long_url = $2, alias = $3, password_hash = $4, expires_at = $5, \
                 max_clicks = $6, owner_id = $7 \
             WHERE code = $1",
        )
        .bind(&link.code)
        .bind(&link.long_url)
        .bind(&link.alias)
        .bind(&link.password_hash)
        .bind(link.expires_at)
        .bind(link.max_clicks)
        .bind(link.owner_id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn delete(&self, code: &str) -> Result<(), AppError> {
        // Zero rows affected is fine: delete is idempotent.
        sqlx::query("DELETE FROM links WHERE code = $1")
            .bind(code)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn increment_click_count(&self, code: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE links SET click_count = click_count + 1 WHERE code = $1")
            .bind(code)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn set_click_count(&self, code: &str, count: i64) -> Result<(), AppError> {
        // GREATEST keeps the column monotonic when sync writes race.
        sqlx::query("UPDATE links SET click_count = GREATEST(click_count, $2) WHERE code = $1")
            .bind(code)
            .bind(count)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn next_code_id(&self) -> Result<i64, AppError> {
        let id = sqlx::query_scalar::<_, i64>("SELECT nextval('links_code_seq')")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(id)
    }
}
