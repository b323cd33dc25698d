use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::paging::PagedResult;

pub const TITLE_FOUND: &str = "Found";
pub const TITLE_NOT_FOUND: &str = "Not Found";
pub const TITLE_INVALID_MODEL: &str = "Invalid Model";
pub const TITLE_PAGED_RESULTS: &str = "Paged Results";
pub const TITLE_SERVER_ERROR: &str = "Internal Server Error";

/// Single-item envelope: `{statusCode, title, data}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseModel<T> {
    pub status_code: u16,
    pub title: String,
    pub data: Option<T>,
}

impl<T> ResponseModel<T> {
    pub fn new(status: StatusCode, title: &str, data: Option<T>) -> Self {
        ResponseModel {
            status_code: status.as_u16(),
            title: title.to_string(),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ResponseModel<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// Failure envelope carrying per-field messages: `{statusCode, title, errors}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponseModel {
    pub status_code: u16,
    pub title: String,
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ErrorResponseModel {
    pub fn new(status: StatusCode, title: &str) -> Self {
        ErrorResponseModel {
            status_code: status.as_u16(),
            title: title.to_string(),
            errors: BTreeMap::new(),
        }
    }

    pub fn server_error() -> Self {
        ErrorResponseModel::new(StatusCode::INTERNAL_SERVER_ERROR, TITLE_SERVER_ERROR)
    }
}

impl IntoResponse for ErrorResponseModel {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Listing envelope: `{title, data, totalCount, page, pageSize}`. Always sent
/// with 200, including for an empty page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponseModel<T> {
    pub title: String,
    pub data: Vec<T>,
    pub total_count: i64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> PagedResponseModel<T> {
    pub fn from_page(page: PagedResult<T>) -> Self {
        PagedResponseModel {
            title: TITLE_PAGED_RESULTS.to_string(),
            data: page.data,
            total_count: page.total_count,
            page: page.page,
            page_size: page.page_size,
        }
    }
}

impl<T: Serialize> IntoResponse for PagedResponseModel<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Field-level request validation failures, collected before any lookup runs.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn required(field: &str) -> String {
        format!("The {} field is required.", field)
    }

    pub fn not_valid(field: &str, value: &str) -> String {
        format!("The value '{}' is not valid for {}.", value, field)
    }

    /// For values that could not be decoded from the request at all.
    pub fn undecodable(field: &str) -> String {
        format!("The value supplied for {} could not be decoded.", field)
    }

    pub fn out_of_range(field: &str, min: i64, max: i64) -> String {
        format!("The field {} must be between {} and {}.", field, min, max)
    }
}

impl From<ValidationErrors> for ErrorResponseModel {
    fn from(validation: ValidationErrors) -> Self {
        ErrorResponseModel {
            status_code: StatusCode::BAD_REQUEST.as_u16(),
            title: TITLE_INVALID_MODEL.to_string(),
            errors: validation.errors,
        }
    }
}
