//! Payment service: records payments against bills, exactly once per
//! client-supplied idempotency key.
//!
//! - [`store`]: the `PaymentStore` port with PostgreSQL and in-memory adapters
//! - [`handlers`]: `PaymentCoordinator`, the idempotent create protocol
//! - [`api`]: axum routes translating HTTP into coordinator calls

pub mod api;
pub mod error;
pub mod handlers;
pub mod models;
pub mod schema;
pub mod store;

pub use error::{PaymentError, StoreError};
pub use handlers::{CreateOutcome, PaymentCoordinator};
pub use models::{NewPayment, Payment, PaymentFilter};
pub use store::{MemoryPaymentStore, PaymentStore, PgPaymentStore};
