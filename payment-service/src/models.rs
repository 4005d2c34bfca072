use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use shared::PaymentResponse;

#[derive(Debug, Clone, PartialEq, Queryable)]
#[diesel(table_name = crate::schema::payments)]
pub struct Payment {
    pub payment_id: i32,
    pub bill_id: i32,
    pub amount: BigDecimal,
    pub method: String,
    pub reference: String,
    pub paid_at: DateTime<Utc>,
}

/// A validated payment waiting for the store to assign `payment_id` and `paid_at`.
#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = crate::schema::payments)]
pub struct NewPayment {
    pub bill_id: i32,
    pub amount: BigDecimal,
    pub method: String,
    pub reference: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentFilter {
    pub bill_id: Option<i32>,
    pub skip: i64,
    pub limit: i64,
}

impl Default for PaymentFilter {
    fn default() -> Self {
        Self {
            bill_id: None,
            skip: shared::DEFAULT_SKIP,
            limit: shared::DEFAULT_LIMIT,
        }
    }
}

impl PaymentFilter {
    pub fn matches(&self, payment: &Payment) -> bool {
        self.bill_id.map_or(true, |bill_id| payment.bill_id == bill_id)
    }
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            payment_id: payment.payment_id,
            bill_id: payment.bill_id,
            amount: payment.amount,
            method: payment.method,
            reference: payment.reference,
            paid_at: payment.paid_at,
        }
    }
}
