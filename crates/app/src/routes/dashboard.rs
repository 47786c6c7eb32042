//! Embedded app dashboard actions.
//!
//! The dashboard posts a single form (or JSON body) whose `intent` picks the
//! action: compute metrics, ingest a resource, or create a demo product.

use axum::{
    Json, Router,
    extract::{Form, FromRequest, Request, State},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::instrument;

use crate::error::AppError;
use crate::models::SyncResource;
use crate::services::{DateRange, IngestSummary, MetricsSummary};
use crate::shopify::random_color;
use crate::state::AppState;

/// Create dashboard routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/app", post(action))
}

/// What the dashboard asked for. Unknown intents create a demo product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Metrics,
    IngestProducts,
    IngestCustomers,
    IngestOrders,
    IngestAll,
    #[default]
    #[serde(other)]
    GenerateProduct,
}

impl Intent {
    const fn resource(self) -> Option<SyncResource> {
        match self {
            Self::IngestProducts => Some(SyncResource::Products),
            Self::IngestCustomers => Some(SyncResource::Customers),
            Self::IngestOrders => Some(SyncResource::Orders),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardAction {
    #[serde(default)]
    pub intent: Intent,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
struct MetricsResponse {
    metrics: MetricsSummary,
}

#[derive(Debug, Serialize)]
struct IngestResponse {
    ingested: IngestSummary,
    ok: bool,
}

/// Accepts `application/json` bodies and falls back to form encoding.
pub struct FormOrJson<T>(pub T);

impl<T, S> FromRequest<S> for FormOrJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(Self(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(Self(value))
        }
    }
}

#[instrument(skip(state, action), fields(intent = ?action.intent))]
async fn action(
    State(state): State<AppState>,
    FormOrJson(action): FormOrJson<DashboardAction>,
) -> Result<Response, AppError> {
    match action.intent {
        Intent::Metrics => {
            let range = DateRange::parse(
                action.start_date.as_deref(),
                action.end_date.as_deref(),
                Utc::now().date_naive(),
            )?;
            let metrics = state.metrics().compute(&range).await?;
            Ok(Json(MetricsResponse { metrics }).into_response())
        }
        Intent::IngestAll => {
            let tenant = state
                .store()
                .register_tenant(&state.config().shopify.store)
                .await?;
            let ingested = state.ingestor().ingest_all(&tenant).await?;
            Ok(Json(IngestResponse { ingested, ok: true }).into_response())
        }
        Intent::IngestProducts | Intent::IngestCustomers | Intent::IngestOrders => {
            let resource = action
                .intent
                .resource()
                .ok_or_else(|| AppError::Internal("ingest intent without resource".into()))?;
            let tenant = state
                .store()
                .register_tenant(&state.config().shopify.store)
                .await?;
            let count = state.ingestor().ingest(&tenant, resource).await?;
            let mut ingested = IngestSummary::default();
            ingested.record(resource, count);
            Ok(Json(IngestResponse { ingested, ok: true }).into_response())
        }
        Intent::GenerateProduct => {
            let generated = state
                .shopify()
                .generate_demo_product(random_color())
                .await?;
            Ok(Json(generated).into_response())
        }
    }
}
