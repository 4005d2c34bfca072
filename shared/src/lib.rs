use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";
pub const IDEMPOTENT_REPLAYED_HEADER: &str = "idempotent-replayed";

pub const DEFAULT_SKIP: i64 = 0;
pub const DEFAULT_LIMIT: i64 = 100;

/// Body of `POST /v1/payments`. `amount` accepts a JSON string or number and
/// is parsed from its decimal text, never through a binary float.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub bill_id: i32,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: BigDecimal,
    pub method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub payment_id: i32,
    pub bill_id: i32,
    #[serde(serialize_with = "serialize_amount", deserialize_with = "deserialize_amount")]
    pub amount: BigDecimal,
    pub method: String,
    pub reference: String,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPaymentsQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub bill_id: Option<i32>,
}

impl ListPaymentsQuery {
    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(DEFAULT_SKIP)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

impl HealthResponse {
    pub fn healthy(service: &str) -> Self {
        Self {
            status: "healthy".to_string(),
            service: service.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Text(String),
    Number(serde_json::Number),
}

pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match RawAmount::deserialize(deserializer)? {
        RawAmount::Text(s) => s,
        // serde_json prints floats in their shortest round-trip form, so
        // 19.99 comes back as "19.99" rather than its binary expansion.
        RawAmount::Number(n) => n.to_string(),
    };
    BigDecimal::from_str(text.trim())
        .map_err(|e| de::Error::custom(format!("invalid decimal amount {:?}: {}", text, e)))
}

pub fn serialize_amount<S>(amount: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&amount.with_scale(2).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn amount_from_number_keeps_decimal_text() {
        let req: PaymentRequest =
            serde_json::from_value(json!({"bill_id": 42, "amount": 19.99, "method": "card"})).unwrap();
        assert_eq!(req.amount, BigDecimal::from_str("19.99").unwrap());
    }

    #[test]
    fn amount_from_string() {
        let req: PaymentRequest =
            serde_json::from_value(json!({"bill_id": 1, "amount": " 100.5 ", "method": "cash"})).unwrap();
        assert_eq!(req.amount, BigDecimal::from_str("100.50").unwrap());
    }

    #[test]
    fn amount_rejects_garbage() {
        let err = serde_json::from_value::<PaymentRequest>(
            json!({"bill_id": 1, "amount": "ten", "method": "cash"}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid decimal amount"));
    }

    #[test]
    fn missing_field_is_rejected() {
        assert!(serde_json::from_value::<PaymentRequest>(json!({"bill_id": 1, "amount": 5})).is_err());
    }

    #[test]
    fn response_amount_has_two_fraction_digits() {
        let resp = PaymentResponse {
            payment_id: 7,
            bill_id: 42,
            amount: BigDecimal::from(20),
            method: "card".to_string(),
            reference: "abc-1".to_string(),
            paid_at: Utc::now(),
        };
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["amount"], json!("20.00"));
        assert_eq!(value["reference"], json!("abc-1"));
    }

    #[test]
    fn list_query_defaults() {
        let query = ListPaymentsQuery::default();
        assert_eq!(query.skip(), 0);
        assert_eq!(query.limit(), 100);
        assert_eq!(query.bill_id, None);
    }
}
