use bigdecimal::{BigDecimal, RoundingMode};
use num_traits::Signed;
use shared::{ListPaymentsQuery, PaymentRequest};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{PaymentError, StoreError};
use crate::models::{NewPayment, Payment, PaymentFilter};
use crate::store::PaymentStore;

pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

// NUMERIC(10, 2) leaves eight integer digits.
const MAX_AMOUNT_DIGITS: u64 = 10;
const MAX_INTEGER_DIGITS: i64 = 8;
const AMOUNT_SCALE: i64 = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created(Payment),
    Replayed(Payment),
}

impl CreateOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, CreateOutcome::Created(_))
    }

    pub fn payment(&self) -> &Payment {
        match self {
            CreateOutcome::Created(p) | CreateOutcome::Replayed(p) => p,
        }
    }

    pub fn into_payment(self) -> Payment {
        match self {
            CreateOutcome::Created(p) | CreateOutcome::Replayed(p) => p,
        }
    }
}

/// Runs the idempotent create-payment protocol on top of a `PaymentStore`.
///
/// The store's uniqueness constraint on `reference` decides who wins a race;
/// the initial lookup only saves a doomed insert on ordinary retries.
#[derive(Clone)]
pub struct PaymentCoordinator {
    store: Arc<dyn PaymentStore>,
}

impl PaymentCoordinator {
    pub fn new(store: Arc<dyn PaymentStore>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        request: PaymentRequest,
        idempotency_key: &str,
    ) -> Result<CreateOutcome, PaymentError> {
        let new_payment = validate(request, idempotency_key)?;

        if let Some(existing) = self.store.find_by_reference(idempotency_key).await? {
            info!(idempotency_key, payment_id = existing.payment_id, "payment_already_exists");
            return Ok(CreateOutcome::Replayed(existing));
        }

        match self.store.insert(new_payment).await {
            Ok(payment) => {
                info!(
                    payment_id = payment.payment_id,
                    bill_id = payment.bill_id,
                    amount = %payment.amount,
                    reference = %payment.reference,
                    "payment_created"
                );
                Ok(CreateOutcome::Created(payment))
            }
            Err(StoreError::DuplicateKey(_)) => self.resolve_lost_race(idempotency_key).await,
            Err(e) => Err(e.into()),
        }
    }

    async fn resolve_lost_race(&self, idempotency_key: &str) -> Result<CreateOutcome, PaymentError> {
        match self.store.find_by_reference(idempotency_key).await? {
            Some(winner) => {
                info!(idempotency_key, payment_id = winner.payment_id, "payment_insert_race_resolved");
                Ok(CreateOutcome::Replayed(winner))
            }
            None => {
                // Rows are never deleted, so a duplicate without a visible
                // winner means the store broke its own contract.
                warn!(idempotency_key, "duplicate reference reported but no row found");
                Err(StoreError::Inconsistent(format!(
                    "reference {} reported duplicate but is missing",
                    idempotency_key
                ))
                .into())
            }
        }
    }

    pub async fn get(&self, payment_id: i32) -> Result<Payment, PaymentError> {
        self.store
            .find_by_id(payment_id)
            .await?
            .ok_or(PaymentError::NotFound(payment_id))
    }

    pub async fn list(&self, query: &ListPaymentsQuery) -> Result<Vec<Payment>, PaymentError> {
        let filter = PaymentFilter {
            bill_id: query.bill_id,
            skip: query.skip(),
            limit: query.limit(),
        };
        if filter.skip < 0 {
            return Err(PaymentError::invalid("skip must not be negative"));
        }
        if filter.limit < 0 {
            return Err(PaymentError::invalid("limit must not be negative"));
        }
        Ok(self.store.list(filter).await?)
    }
}

fn validate(request: PaymentRequest, idempotency_key: &str) -> Result<NewPayment, PaymentError> {
    if idempotency_key.trim().is_empty() {
        return Err(PaymentError::invalid("idempotency key must not be empty"));
    }
    if idempotency_key.len() > MAX_IDEMPOTENCY_KEY_LEN {
        return Err(PaymentError::invalid(format!(
            "idempotency key exceeds {} bytes",
            MAX_IDEMPOTENCY_KEY_LEN
        )));
    }
    if request.method.trim().is_empty() {
        return Err(PaymentError::invalid("method is required"));
    }

    let amount = normalize_amount(&request.amount)?;

    Ok(NewPayment {
        bill_id: request.bill_id,
        amount,
        method: request.method,
        reference: idempotency_key.to_string(),
    })
}

fn normalize_amount(amount: &BigDecimal) -> Result<BigDecimal, PaymentError> {
    if !amount.is_positive() {
        return Err(PaymentError::invalid("amount must be positive"));
    }
    // Size check runs on the unscaled digits first: rescaling "1e5000000"
    // would materialize millions of digits.
    let (_, scale) = amount.as_bigint_and_exponent();
    let integer_digits = (amount.digits() as i64).saturating_sub(scale);
    if integer_digits > MAX_INTEGER_DIGITS {
        return Err(PaymentError::invalid("amount exceeds 99999999.99"));
    }

    let rounded = amount.with_scale_round(AMOUNT_SCALE, RoundingMode::HalfUp);
    if !rounded.is_positive() {
        return Err(PaymentError::invalid("amount must be positive"));
    }
    if rounded.digits() > MAX_AMOUNT_DIGITS {
        return Err(PaymentError::invalid("amount exceeds 99999999.99"));
    }
    Ok(rounded)
}
