use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequestParts, Path, Query, State,
    },
    http::{request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use shared::*;
use tower_http::{cors, trace::TraceLayer};
use tracing::error;

use crate::error::PaymentError;
use crate::handlers::PaymentCoordinator;

pub const SERVICE_NAME: &str = "payment-service";

#[derive(Clone)]
pub struct AppState {
    pub coordinator: PaymentCoordinator,
}

/// The `Idempotency-Key` request header. Extracted before the body so a
/// request without it is rejected without parsing the payload.
#[derive(Debug, Clone)]
pub struct IdempotencyKey(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for IdempotencyKey
where
    S: Send + Sync,
{
    type Rejection = PaymentError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(IDEMPOTENCY_KEY_HEADER)
            .ok_or_else(|| PaymentError::invalid("missing Idempotency-Key header"))?;
        let key = value
            .to_str()
            .map_err(|_| PaymentError::invalid("Idempotency-Key header is not valid ASCII"))?;
        if key.trim().is_empty() {
            return Err(PaymentError::invalid("Idempotency-Key header is empty"));
        }
        Ok(Self(key.to_string()))
    }
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            PaymentError::InvalidPayload(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            PaymentError::NotFound(_) => (StatusCode::NOT_FOUND, "Payment not found".to_string()),
            PaymentError::Storage(e) => {
                error!("Storage failure while serving request: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal storage error".to_string())
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/payments", get(list_payments).post(create_payment))
        .route("/v1/payments/:payment_id", get(get_payment))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods(cors::Any)
                .allow_headers(cors::Any),
        )
}

pub async fn create_payment(
    State(state): State<AppState>,
    IdempotencyKey(key): IdempotencyKey,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> Result<Response, PaymentError> {
    let Json(request) = payload.map_err(|e| PaymentError::invalid(e.body_text()))?;

    let outcome = state.coordinator.create(request, &key).await?;
    let replayed = !outcome.is_created();

    let body = PaymentResponse::from(outcome.into_payment());
    let mut response = (StatusCode::CREATED, Json(body)).into_response();
    if replayed {
        response
            .headers_mut()
            .insert(IDEMPOTENT_REPLAYED_HEADER, HeaderValue::from_static("true"));
    }
    Ok(response)
}

pub async fn list_payments(
    State(state): State<AppState>,
    query: Result<Query<ListPaymentsQuery>, QueryRejection>,
) -> Result<Json<Vec<PaymentResponse>>, PaymentError> {
    let Query(query) = query.map_err(|e| PaymentError::invalid(e.body_text()))?;
    let payments = state.coordinator.list(&query).await?;
    Ok(Json(payments.into_iter().map(PaymentResponse::from).collect()))
}

pub async fn get_payment(
    State(state): State<AppState>,
    payment_id: Result<Path<i32>, PathRejection>,
) -> Result<Json<PaymentResponse>, PaymentError> {
    let Path(payment_id) = payment_id.map_err(|e| PaymentError::invalid(e.body_text()))?;
    let payment = state.coordinator.get(payment_id).await?;
    Ok(Json(payment.into()))
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy(SERVICE_NAME))
}
