//! Persistence port for payments and its adapters.
//!
//! Every adapter must enforce uniqueness of `reference` atomically inside
//! `insert`: the coordinator relies on `StoreError::DuplicateKey` as the
//! final arbiter when two requests race on the same idempotency key.

mod memory;
mod postgres;

pub use memory::MemoryPaymentStore;
pub use postgres::{run_migrations, PgPaymentStore};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{NewPayment, Payment, PaymentFilter};

#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Insert a payment, assigning `payment_id` and `paid_at`.
    ///
    /// Returns `StoreError::DuplicateKey` if `reference` is already taken.
    async fn insert(&self, payment: NewPayment) -> Result<Payment, StoreError>;

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>, StoreError>;

    async fn find_by_id(&self, payment_id: i32) -> Result<Option<Payment>, StoreError>;

    /// Payments matching `filter`, ordered by `payment_id`.
    async fn list(&self, filter: PaymentFilter) -> Result<Vec<Payment>, StoreError>;
}
