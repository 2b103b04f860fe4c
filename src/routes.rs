use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::{
    error::AppError,
    models::{Decision, MealPeriod, RatingSubmission},
    query::{QcLogPage, RatedItem, SummaryStats, TimeRange, TopItem},
    state::AppState,
};

pub async fn submit_handler(
    State(state): State<Arc<AppState>>,
    Json(submission): Json<RatingSubmission>,
) -> impl IntoResponse {
    let outcome = state.pipeline.process(&submission);

    (StatusCode::OK, Json(outcome)).into_response()
}

pub async fn menu_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<RatedItem>>, AppError> {
    let meal = match params.get("meal") {
        Some(raw) => Some(MealPeriod::parse(raw).ok_or(AppError::InvalidQuery("meal"))?),
        None => None,
    };
    let hall = params.get("hall").map(String::as_str);

    Ok(Json(state.query.menu(hall, meal)))
}

pub async fn item_handler(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<String>,
) -> Result<Json<RatedItem>, AppError> {
    state
        .query
        .aggregate_for(&item_id)
        .map(Json)
        .ok_or(AppError::NotFound)
}

pub async fn summary_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<SummaryStats>, AppError> {
    let range = parse_range(&params)?;

    Ok(Json(state.query.summary(range)))
}

pub async fn qc_log_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<QcLogPage>, AppError> {
    let range = parse_range(&params)?;
    let status = parse_status(&params)?;
    let before = parse_number::<u64>(&params, "before")?;
    let limit = parse_number::<usize>(&params, "limit")?
        .unwrap_or(50)
        .clamp(1, 200);

    Ok(Json(state.query.qc_log(range, status, before, limit)))
}

pub async fn export_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let csv = state
        .query
        .export_qc_log()
        .map_err(|e| AppError::Internal(Box::new(e)))?;

    Ok(([(CONTENT_TYPE, "text/csv")], csv))
}

pub async fn top_items_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<TopItem>>, AppError> {
    let limit = parse_number::<usize>(&params, "limit")?
        .unwrap_or(5)
        .clamp(1, 50);

    Ok(Json(state.query.top_items(limit)))
}

fn parse_range(params: &HashMap<String, String>) -> Result<TimeRange, AppError> {
    match params.get("range") {
        Some(raw) => TimeRange::parse(raw).ok_or(AppError::InvalidQuery("range")),
        None => Ok(TimeRange::AllTime),
    }
}

fn parse_status(params: &HashMap<String, String>) -> Result<Option<Decision>, AppError> {
    match params.get("status").map(|s| s.to_ascii_lowercase()) {
        None => Ok(None),
        Some(raw) if raw == "approved" => Ok(Some(Decision::Approved)),
        Some(raw) if raw == "rejected" => Ok(Some(Decision::Rejected)),
        Some(_) => Err(AppError::InvalidQuery("status")),
    }
}

fn parse_number<T: std::str::FromStr>(
    params: &HashMap<String, String>,
    key: &'static str,
) -> Result<Option<T>, AppError> {
    match params.get(key) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| AppError::InvalidQuery(key)),
        None => Ok(None),
    }
}
