//! In-memory store used by tests and `--storage memory` runs.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::PaymentStore;
use crate::error::StoreError;
use crate::models::{NewPayment, Payment, PaymentFilter};

#[derive(Default)]
struct Tables {
    payments: BTreeMap<i32, Payment>,
    by_reference: HashMap<String, i32>,
    last_id: i32,
}

/// Keeps rows, the reference index and the id sequence behind one lock so
/// the uniqueness check and the write happen under a single guard.
#[derive(Default)]
pub struct MemoryPaymentStore {
    tables: RwLock<Tables>,
}

impl MemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tables.read().await.payments.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn count_by_reference(&self, reference: &str) -> usize {
        self.tables
            .read()
            .await
            .payments
            .values()
            .filter(|p| p.reference == reference)
            .count()
    }
}

#[async_trait]
impl PaymentStore for MemoryPaymentStore {
    async fn insert(&self, payment: NewPayment) -> Result<Payment, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.by_reference.contains_key(&payment.reference) {
            return Err(StoreError::DuplicateKey(payment.reference));
        }

        tables.last_id += 1;
        let stored = Payment {
            payment_id: tables.last_id,
            bill_id: payment.bill_id,
            amount: payment.amount,
            method: payment.method,
            reference: payment.reference,
            paid_at: Utc::now(),
        };
        tables.by_reference.insert(stored.reference.clone(), stored.payment_id);
        tables.payments.insert(stored.payment_id, stored.clone());

        Ok(stored)
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_reference
            .get(reference)
            .and_then(|id| tables.payments.get(id))
            .cloned())
    }

    async fn find_by_id(&self, payment_id: i32) -> Result<Option<Payment>, StoreError> {
        Ok(self.tables.read().await.payments.get(&payment_id).cloned())
    }

    async fn list(&self, filter: PaymentFilter) -> Result<Vec<Payment>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .payments
            .values()
            .filter(|p| filter.matches(p))
            .skip(usize::try_from(filter.skip).unwrap_or(0))
            .take(usize::try_from(filter.limit).unwrap_or(0))
            .cloned()
            .collect())
    }
}
