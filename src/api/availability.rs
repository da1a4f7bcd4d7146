//! Availability endpoints: bibs, Top Textbooks and holdings

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::HoldingsReport,
    services::availability::{AvailabilityReport, BibOptions},
    AppState,
};

use super::JsonPayload;

/// Bib availability query parameters
#[derive(Deserialize, IntoParams, Validate, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct BibsQuery {
    /// Only report copies shelved in this location code
    #[validate(length(min = 1, max = 64, message = "limit_collection must be 1-64 characters"))]
    pub limit_collection: Option<String>,
    /// Report one item per course code
    #[serde(default)]
    pub include_course: bool,
    /// Resolve due dates of unavailable items
    #[serde(default)]
    pub check_holdings: bool,
}

/// Top Textbooks query parameters
#[derive(Deserialize, IntoParams, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct TextbooksQuery {
    /// Report one item per course code
    #[serde(default)]
    pub include_course: bool,
    /// Resolve due dates of unavailable items
    #[serde(default)]
    pub check_holdings: bool,
}

/// Availability of a list of bibs
#[utoipa::path(
    post,
    path = "/bibs",
    tag = "availability",
    params(BibsQuery),
    request_body(content = Vec<String>, description = "MMS ids", example = json!(["990008536900108238"])),
    responses(
        (status = 200, description = "Availability per item key", body = std::collections::HashMap<String, crate::models::AggregatedItem>),
        (status = 400, description = "Request was not JSON or not a list of strings", body = crate::error::ErrorResponse),
        (status = 502, description = "Alma returned no usable data", body = crate::error::ErrorResponse)
    )
)]
pub async fn bibs(
    State(state): State<AppState>,
    Query(query): Query<BibsQuery>,
    JsonPayload(input): JsonPayload,
) -> AppResult<Json<AvailabilityReport>> {
    query
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let options = BibOptions {
        limit_collection: query.limit_collection,
        include_course: query.include_course,
        check_holdings: query.check_holdings,
    };

    let report = state.services.availability.process_bibs(input, &options).await?;
    Ok(Json(report))
}

/// Availability of course-reserve (Top Textbook) copies
#[utoipa::path(
    post,
    path = "/textbooks",
    tag = "availability",
    params(TextbooksQuery),
    request_body(content = Vec<String>, description = "MMS ids", example = json!(["990008536900108238"])),
    responses(
        (status = 200, description = "Reserve availability per item key", body = std::collections::HashMap<String, crate::models::AggregatedItem>),
        (status = 400, description = "Request was not JSON or not a list of strings", body = crate::error::ErrorResponse),
        (status = 502, description = "Alma returned no usable data", body = crate::error::ErrorResponse)
    )
)]
pub async fn textbooks(
    State(state): State<AppState>,
    Query(query): Query<TextbooksQuery>,
    JsonPayload(input): JsonPayload,
) -> AppResult<Json<AvailabilityReport>> {
    let options = BibOptions {
        limit_collection: Some(state.config.catalog.reserve_location_code.clone()),
        include_course: query.include_course,
        check_holdings: query.check_holdings,
    };

    let report = state.services.availability.process_bibs(input, &options).await?;
    Ok(Json(report))
}

/// Item-level availability of reserve copies per holding
#[utoipa::path(
    post,
    path = "/holdings",
    tag = "availability",
    request_body(
        content = std::collections::HashMap<String, String>,
        description = "MMS id to holding id",
        example = json!({"990000000000000002": "22200000000008238"})
    ),
    responses(
        (status = 200, description = "mms_id -> holding_id -> barcode -> item", body = std::collections::HashMap<String, std::collections::HashMap<String, std::collections::HashMap<String, crate::models::HoldingItem>>>),
        (status = 400, description = "Request was not JSON or not an object of strings", body = crate::error::ErrorResponse),
        (status = 502, description = "Alma returned no items", body = crate::error::ErrorResponse)
    )
)]
pub async fn holdings(
    State(state): State<AppState>,
    JsonPayload(input): JsonPayload,
) -> AppResult<Json<HoldingsReport>> {
    let report = state.services.holdings.process_holdings(input).await?;
    Ok(Json(report))
}
