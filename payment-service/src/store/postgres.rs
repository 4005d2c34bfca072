use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::{Connection, PgConnection};
use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;

use super::PaymentStore;
use crate::error::StoreError;
use crate::models::{NewPayment, Payment, PaymentFilter};
use crate::schema::payments;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

type DbPool = Pool<AsyncPgConnection>;
type DbConn<'a> = bb8::PooledConnection<'a, AsyncDieselConnectionManager<AsyncPgConnection>>;

/// Applies pending migrations over a short-lived synchronous connection.
pub fn run_migrations(database_url: &str) -> anyhow::Result<()> {
    info!("Running database migrations...");
    let mut conn = PgConnection::establish(database_url)?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Migration error: {}", e))?;
    info!("Migrations completed successfully");
    Ok(())
}

#[derive(Clone)]
pub struct PgPaymentStore {
    pool: DbPool,
}

impl PgPaymentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Runs migrations, then builds the connection pool.
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let url = database_url.to_string();
        tokio::task::spawn_blocking(move || run_migrations(&url)).await??;

        let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let pool = bb8::Pool::builder()
            .max_size(max_connections)
            .build(config)
            .await?;
        Ok(Self::new(pool))
    }

    async fn conn(&self) -> Result<DbConn<'_>, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Pool(e.to_string()))
    }
}

#[async_trait]
impl PaymentStore for PgPaymentStore {
    async fn insert(&self, payment: NewPayment) -> Result<Payment, StoreError> {
        let mut conn = self.conn().await?;

        let result = diesel::insert_into(payments::table)
            .values(&payment)
            .get_result::<Payment>(&mut conn)
            .await;

        match result {
            Ok(stored) => Ok(stored),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Err(StoreError::DuplicateKey(payment.reference))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>, StoreError> {
        let mut conn = self.conn().await?;
        let payment = payments::table
            .filter(payments::reference.eq(reference))
            .first::<Payment>(&mut conn)
            .await
            .optional()?;
        Ok(payment)
    }

    async fn find_by_id(&self, payment_id: i32) -> Result<Option<Payment>, StoreError> {
        let mut conn = self.conn().await?;
        let payment = payments::table
            .find(payment_id)
            .first::<Payment>(&mut conn)
            .await
            .optional()?;
        Ok(payment)
    }

    async fn list(&self, filter: PaymentFilter) -> Result<Vec<Payment>, StoreError> {
        let mut conn = self.conn().await?;

        let mut query = payments::table.into_boxed();
        if let Some(bill_id) = filter.bill_id {
            query = query.filter(payments::bill_id.eq(bill_id));
        }

        let rows = query
            .order(payments::payment_id.asc())
            .offset(filter.skip)
            .limit(filter.limit)
            .load::<Payment>(&mut conn)
            .await?;
        Ok(rows)
    }
}
