//! PostgreSQL repositories over an r2d2 pool.

use crate::models::{ExecutionRow, ImageAssetRow, NewExecutionRow, NewImageAssetRow};
use crate::schema::{image_assets, prompt_executions};
use crate::{DatabaseResult, ExecutionRepository, ImageRepository};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use tabula_core::{ExecutionRecord, ImageAsset, NewExecutionRecord, NewImageAsset, UserId};
use tabula_error::{DatabaseError, DatabaseErrorKind};
use tracing::{debug, info, instrument};
use uuid::Uuid;

type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Repository backed by PostgreSQL.
///
/// Queries run on the blocking thread pool with a pooled connection each.
#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    /// Connect with a pool of `pool_size` connections.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the pool cannot be built.
    pub fn new(database_url: &str, pool_size: u32) -> DatabaseResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder().max_size(pool_size).build(manager).map_err(|e| {
            DatabaseError::new(DatabaseErrorKind::Connection(format!(
                "Failed to create connection pool: {}",
                e
            )))
        })?;
        info!(pool_size, "Created PostgreSQL connection pool");
        Ok(Self { pool })
    }

    /// Run pending migrations.
    pub fn run_migrations(&self) -> DatabaseResult<()> {
        use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

        const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

        let mut conn = connection(&self.pool)?;
        conn.run_pending_migrations(MIGRATIONS)
            .map(|applied| debug!(count = applied.len(), "Applied migrations"))
            .map_err(|e| DatabaseError::new(DatabaseErrorKind::Migration(e.to_string())))
    }

    /// Run a blocking query with a pooled connection.
    async fn with_conn<T, F>(&self, f: F) -> DatabaseResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> DatabaseResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = connection(&pool)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| {
            DatabaseError::new(DatabaseErrorKind::Query(format!("Task join error: {}", e)))
        })?
    }
}

fn connection(pool: &PgPool) -> DatabaseResult<PooledConnection<ConnectionManager<PgConnection>>> {
    pool.get().map_err(|e| {
        DatabaseError::new(DatabaseErrorKind::Connection(format!(
            "Failed to get connection from pool: {}",
            e
        )))
    })
}

fn limit_i64(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait::async_trait]
impl ImageRepository for PgRepository {
    #[instrument(skip(self))]
    async fn find_by_checksum(
        &self,
        user_id: UserId,
        checksum: &str,
    ) -> DatabaseResult<Option<ImageAsset>> {
        let checksum = checksum.to_string();
        self.with_conn(move |conn| {
            let row = image_assets::table
                .filter(image_assets::user_id.eq(user_id.get()))
                .filter(image_assets::checksum.eq(&checksum))
                .select(ImageAssetRow::as_select())
                .first(conn)
                .optional()?;
            Ok(row.map(ImageAsset::from))
        })
        .await
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<ImageAsset>> {
        self.with_conn(move |conn| {
            let row = image_assets::table
                .find(id)
                .select(ImageAssetRow::as_select())
                .first(conn)
                .optional()?;
            Ok(row.map(ImageAsset::from))
        })
        .await
    }

    #[instrument(skip(self, new_asset), fields(user_id = %new_asset.user_id))]
    async fn insert(&self, new_asset: NewImageAsset) -> DatabaseResult<ImageAsset> {
        let row = NewImageAssetRow::from(new_asset);
        self.with_conn(move |conn| {
            let inserted = diesel::insert_into(image_assets::table)
                .values(&row)
                .returning(ImageAssetRow::as_returning())
                .get_result(conn)?;
            info!(id = %inserted.id, "Inserted image asset");
            Ok(ImageAsset::from(inserted))
        })
        .await
    }

    #[instrument(skip(self))]
    async fn list_for_user(&self, user_id: UserId, limit: usize) -> DatabaseResult<Vec<ImageAsset>> {
        self.with_conn(move |conn| {
            let rows = image_assets::table
                .filter(image_assets::user_id.eq(user_id.get()))
                .order(image_assets::created_at.desc())
                .limit(limit_i64(limit))
                .select(ImageAssetRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(ImageAsset::from).collect())
        })
        .await
    }
}

#[async_trait::async_trait]
impl ExecutionRepository for PgRepository {
    #[instrument(skip(self, new_record), fields(user_id = %new_record.user_id, status = %new_record.status))]
    async fn record(&self, new_record: NewExecutionRecord) -> DatabaseResult<ExecutionRecord> {
        let row = NewExecutionRow::try_from(new_record)?;
        self.with_conn(move |conn| {
            let inserted = diesel::insert_into(prompt_executions::table)
                .values(&row)
                .returning(ExecutionRow::as_returning())
                .get_result(conn)?;
            info!(id = %inserted.id, "Recorded prompt execution");
            inserted.into_record()
        })
        .await
    }

    #[instrument(skip(self))]
    async fn recent(&self, user_id: UserId, limit: usize) -> DatabaseResult<Vec<ExecutionRecord>> {
        self.with_conn(move |conn| {
            prompt_executions::table
                .filter(prompt_executions::user_id.eq(user_id.get()))
                .order(prompt_executions::created_at.desc())
                .limit(limit_i64(limit))
                .select(ExecutionRow::as_select())
                .load(conn)?
                .into_iter()
                .map(ExecutionRow::into_record)
                .collect()
        })
        .await
    }
}
