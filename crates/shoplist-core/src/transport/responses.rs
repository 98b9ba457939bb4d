//! Decoders for backend and data-service responses.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::transport::TransportError;

/// Answer to an item creation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub success: bool,
    pub new_id: String,
    pub revision: i64,
}

/// Answer to an item update.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateResponse {
    pub success: bool,
    pub revision: i64,
}

#[derive(Deserialize)]
struct SuccessResponse {
    success: bool,
}

#[derive(Deserialize)]
struct SortResponse {
    sort_indices: Vec<i64>,
}

pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, TransportError> {
    serde_json::from_str(raw).map_err(|e| TransportError::BadBody(e.to_string()))
}

/// `success` flag of a done or delete response.
pub fn decode_success(raw: &str) -> Result<bool, TransportError> {
    decode::<SuccessResponse>(raw).map(|response| response.success)
}

pub fn decode_sort_indices(raw: &str) -> Result<Vec<i64>, TransportError> {
    decode::<SortResponse>(raw).map(|response| response.sort_indices)
}
