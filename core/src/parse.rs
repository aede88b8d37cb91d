//! Response body decoding.

use crate::error::HttpError;
use crate::http::{ResponseData, ResponseType};
use crate::transport::RawResponse;

/// Decode `raw` according to `response_type`.
///
/// Only successful responses are decoded strictly. A failed response gets a
/// best-effort JSON decode and yields `None` when that fails, so a parse
/// error never hides the status failure. An empty body always yields `None`.
pub fn parse_response(
    raw: &RawResponse,
    response_type: ResponseType,
) -> Result<Option<ResponseData>, HttpError> {
    if !raw.ok() {
        return Ok(raw.json().ok().map(ResponseData::Json));
    }

    match response_type {
        ResponseType::Json if raw.body.is_empty() => Ok(None),
        ResponseType::Json => raw
            .json()
            .map(|value| Some(ResponseData::Json(value)))
            .map_err(|e| HttpError::decode(e.to_string())),
        ResponseType::Text => Ok(Some(ResponseData::Text(raw.text()))),
        ResponseType::Blob => Ok(Some(ResponseData::Blob(raw.blob()))),
    }
}
