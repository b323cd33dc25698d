use axum::{
    extract::{
        path::ErrorKind,
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::AppState;
use crate::api::envelope::{
    ErrorResponseModel, PagedResponseModel, ResponseModel, ValidationErrors, TITLE_FOUND,
    TITLE_NOT_FOUND,
};
use crate::paging::PagedResult;
use crate::schedules::Schedule;

pub const PAGE_SIZE_MIN: i32 = 1;
pub const PAGE_SIZE_MAX: i32 = 1000;

const FIELD_SCHEDULE_KEY: &str = "scheduleKey";
const FIELD_PAGE_INDEX: &str = "pageIndex";
const FIELD_PAGE_SIZE: &str = "pageSize";

/// Public shape of a schedule. The internal `schedule_id` is never exposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleView {
    pub schedule_key: Uuid,
    pub name: String,
    pub default_min_value: f64,
    pub default_max_value: Option<f64>,
    pub minimum_difference: f64,
}

impl ScheduleView {
    pub fn from_schedule(schedule: &Schedule) -> Self {
        ScheduleView {
            schedule_key: schedule.schedule_key,
            name: schedule.name.clone(),
            default_min_value: schedule.default_min_value,
            default_max_value: schedule.default_max_value,
            minimum_difference: schedule.minimum_difference,
        }
    }
}

/// Decoded query string pairs. Repeated keys are kept so they can be reported.
type QueryPairs = Result<Query<Vec<(String, String)>>, QueryRejection>;

/// GET /api/schedule?scheduleKey=...
pub async fn get_schedule_by_query(State(state): State<AppState>, query: QueryPairs) -> Response {
    let pairs = match query_pairs(query, &[FIELD_SCHEDULE_KEY]) {
        Ok(pairs) => pairs,
        Err(validation) => return invalid_request(validation),
    };

    let schedule_key = query_value(&pairs, FIELD_SCHEDULE_KEY);
    get_schedule(&state, schedule_key.as_deref()).await
}

/// GET /api/schedule/{scheduleKey}
pub async fn get_schedule_by_path(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Response {
    match path {
        Ok(Path(schedule_key)) => get_schedule(&state, Some(&schedule_key)).await,
        Err(rejection) => invalid_request(path_errors(&rejection, &[FIELD_SCHEDULE_KEY])),
    }
}

/// GET /api/schedule/Paged?pageIndex=..&pageSize=..
pub async fn get_paged_by_query(State(state): State<AppState>, query: QueryPairs) -> Response {
    let pairs = match query_pairs(query, &[FIELD_PAGE_INDEX, FIELD_PAGE_SIZE]) {
        Ok(pairs) => pairs,
        Err(validation) => return invalid_request(validation),
    };

    let page_index = query_value(&pairs, FIELD_PAGE_INDEX);
    let page_size = query_value(&pairs, FIELD_PAGE_SIZE);
    get_paged(&state, page_index.as_deref(), page_size.as_deref()).await
}

/// GET /api/schedule/Paged/{pageIndex}/{pageSize}
pub async fn get_paged_by_path(
    State(state): State<AppState>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Response {
    match path {
        Ok(Path((page_index, page_size))) => {
            get_paged(&state, Some(&page_index), Some(&page_size)).await
        }
        Err(rejection) => {
            invalid_request(path_errors(&rejection, &[FIELD_PAGE_INDEX, FIELD_PAGE_SIZE]))
        }
    }
}

fn invalid_request(validation: ValidationErrors) -> Response {
    info!("Rejected request with undecodable parameters");
    ErrorResponseModel::from(validation).into_response()
}

fn query_pairs(
    query: QueryPairs,
    fields: &[&str],
) -> Result<Vec<(String, String)>, ValidationErrors> {
    match query {
        Ok(Query(pairs)) => Ok(pairs),
        Err(rejection) => {
            error!("Query string rejected: {}", rejection.body_text());
            let mut validation = ValidationErrors::default();
            for field in fields {
                validation.add(field, ValidationErrors::undecodable(field));
            }
            Err(validation)
        }
    }
}

// Repeated keys are joined with ',' and so never parse as a single value
fn query_value(pairs: &[(String, String)], field: &str) -> Option<String> {
    let values: Vec<&str> = pairs
        .iter()
        .filter(|(key, _)| key == field)
        .map(|(_, value)| value.as_str())
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.join(","))
    }
}

/// Attributes a path rejection to the offending segment, or to every
/// segment when axum does not say which one failed.
fn path_errors(rejection: &PathRejection, fields: &[&str]) -> ValidationErrors {
    let failed_key = match rejection {
        PathRejection::FailedToDeserializePathParams(e) => match e.kind() {
            ErrorKind::InvalidUtf8InPathParam { key } => Some(key.as_str()),
            _ => None,
        },
        _ => None,
    };

    let mut validation = ValidationErrors::default();
    for field in fields {
        if failed_key.is_none_or(|key| key == *field) {
            validation.add(field, ValidationErrors::undecodable(field));
        }
    }
    validation
}

async fn get_schedule(state: &AppState, raw_key: Option<&str>) -> Response {
    let schedule_key = match parse_schedule_key(raw_key) {
        Ok(key) => key,
        Err(validation) => {
            info!("Invalid request to get schedule");
            return ErrorResponseModel::from(validation).into_response();
        }
    };

    match state.schedules.get_schedule(schedule_key).await {
        Ok(Some(schedule)) => ResponseModel::new(
            StatusCode::OK,
            TITLE_FOUND,
            Some(ScheduleView::from_schedule(&schedule)),
        )
        .into_response(),
        Ok(None) => {
            info!("Unable to find schedule with schedulekey {}", schedule_key);
            ResponseModel::<ScheduleView>::new(StatusCode::NOT_FOUND, TITLE_NOT_FOUND, None)
                .into_response()
        }
        Err(e) => {
            error!("Failed to get schedule {}: {}", schedule_key, e);
            ErrorResponseModel::server_error().into_response()
        }
    }
}

async fn get_paged(
    state: &AppState,
    raw_page_index: Option<&str>,
    raw_page_size: Option<&str>,
) -> Response {
    let (page_index, page_size) = match parse_page_params(raw_page_index, raw_page_size) {
        Ok(params) => params,
        Err(validation) => {
            info!(
                "Invalid request to get paged. pageIndex: {} pageSize: {}",
                raw_page_index.unwrap_or_default(),
                raw_page_size.unwrap_or_default()
            );
            return ErrorResponseModel::from(validation).into_response();
        }
    };

    match state.schedules.get_schedules(page_index, page_size).await {
        Ok(page) => {
            // An absent page is reported as an empty one, never as a failure
            let page = page.unwrap_or_else(|| PagedResult::empty(page_index, page_size));
            PagedResponseModel::from_page(page.map(|s| ScheduleView::from_schedule(&s)))
                .into_response()
        }
        Err(e) => {
            error!(
                "Failed to get schedules page {} (size {}): {}",
                page_index, page_size, e
            );
            ErrorResponseModel::server_error().into_response()
        }
    }
}

fn parse_schedule_key(raw: Option<&str>) -> Result<Uuid, ValidationErrors> {
    let mut validation = ValidationErrors::default();

    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => validation.add(
            FIELD_SCHEDULE_KEY,
            ValidationErrors::required(FIELD_SCHEDULE_KEY),
        ),
        Some(text) => match Uuid::parse_str(text) {
            Ok(key) => return Ok(key),
            Err(_) => validation.add(
                FIELD_SCHEDULE_KEY,
                ValidationErrors::not_valid(FIELD_SCHEDULE_KEY, text),
            ),
        },
    }

    Err(validation)
}

fn parse_page_params(
    raw_page_index: Option<&str>,
    raw_page_size: Option<&str>,
) -> Result<(u32, u32), ValidationErrors> {
    let mut validation = ValidationErrors::default();

    let page_index = parse_bounded(
        &mut validation,
        FIELD_PAGE_INDEX,
        raw_page_index,
        0,
        i32::MAX,
    );
    let page_size = parse_bounded(
        &mut validation,
        FIELD_PAGE_SIZE,
        raw_page_size,
        PAGE_SIZE_MIN,
        PAGE_SIZE_MAX,
    );

    match (page_index, page_size) {
        (Some(index), Some(size)) if validation.is_empty() => Ok((index, size)),
        _ => Err(validation),
    }
}

// Records at most one message per field
fn parse_bounded(
    validation: &mut ValidationErrors,
    field: &str,
    raw: Option<&str>,
    min: i32,
    max: i32,
) -> Option<u32> {
    let Some(text) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        validation.add(field, ValidationErrors::required(field));
        return None;
    };

    let Ok(value) = text.parse::<i32>() else {
        validation.add(field, ValidationErrors::not_valid(field, text));
        return None;
    };

    if value < min || value > max {
        validation.add(
            field,
            ValidationErrors::out_of_range(field, i64::from(min), i64::from(max)),
        );
        return None;
    }

    u32::try_from(value).ok()
}
