use axum::Json;
use axum::extract::{FromRequest, Request, rejection::JsonRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::order::OrderType;

/// A `Json` extractor whose rejection renders through `ApiError` — the
/// same `{error:{code,message}}` envelope every handler-level failure
/// uses — instead of axum's default plain-text rejection body. Spec §6
/// requires "Malformed body... → 400" in that shape for every route.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(classify_json_rejection(rejection)),
        }
    }
}

fn classify_json_rejection(rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::bad_request("expected request with `Content-Type: application/json`")
        }
        other => ApiError::bad_request(other.to_string()),
    }
}

/// Wire envelope for every frontend HTTP response (spec §6): success
/// wraps its payload under `data`, failure under `error`.
pub enum ApiResponse<T: Serialize> {
    Ok(T),
    Err(ApiError),
}

#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: u16,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            code: status.as_u16(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorPayload,
}

#[derive(Serialize)]
struct ErrorPayload {
    code: u16,
    message: String,
}

#[derive(Serialize)]
struct DataBody<T: Serialize> {
    data: T,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: ErrorPayload {
                    code: self.code,
                    message: self.message,
                },
            }),
        )
            .into_response()
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            ApiResponse::Ok(data) => (StatusCode::OK, Json(DataBody { data })).into_response(),
            ApiResponse::Err(err) => err.into_response(),
        }
    }
}

/// `GET /stocks/{name}` success payload (spec §6).
#[derive(Debug, Serialize)]
pub struct StockView {
    pub name: String,
    pub price: f64,
    pub quantity: u64,
}

/// `POST /orders` request body (spec §6).
#[derive(Debug, Deserialize)]
pub struct PlaceOrderBody {
    pub name: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub quantity: i64,
}

/// `POST /orders` success payload.
#[derive(Debug, Serialize)]
pub struct PlaceOrderView {
    pub transaction_id: i64,
}

/// `GET /orders/{tid}` success payload.
#[derive(Debug, Serialize)]
pub struct OrderView {
    pub transaction_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub quantity: u64,
}
