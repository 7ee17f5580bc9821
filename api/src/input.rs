//! Pulls labels and data out of a `POST /put` request.

use std::collections::HashMap;

use axum::extract::{FromRequest, Multipart, Query, Request};
use axum::http::StatusCode;
use axum::Form;
use axum::Json;
use librarian_core::{
    DataPayload, FilePayload, InputConfig, InputError, InputMode, LabelSet, DEFAULT_FILENAME,
};
use serde_json::Value;

pub fn labels_from_query(req: &Request) -> Result<LabelSet, InputError> {
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(req.uri())
        .map_err(|e| InputError::Malformed(e.body_text()))?;
    Ok(LabelSet::from_query(pairs))
}

/// Labels from the query string, data according to the configured input mode.
pub async fn extract(input: &InputConfig, req: Request) -> Result<(LabelSet, DataPayload), InputError> {
    let labels = labels_from_query(&req)?;

    let data = match &input.mode {
        InputMode::File => file_field(&input.tag, req).await?,
        InputMode::Json => {
            let Json(body) = Json::<Value>::from_request(req, &())
                .await
                .map_err(|e| rejected(e.status(), e.body_text()))?;
            DataPayload::from_json_body(body, &input.tag)?
        }
        InputMode::Base64 => {
            let Form(mut fields) = Form::<HashMap<String, String>>::from_request(req, &())
                .await
                .map_err(|e| rejected(e.status(), e.body_text()))?;
            let raw = fields
                .remove(&input.tag)
                .filter(|raw| !raw.is_empty())
                .ok_or_else(|| InputError::MissingData(input.tag.clone()))?;
            let filename = labels
                .get("filename")
                .map(ToString::to_string)
                .unwrap_or_else(|| DEFAULT_FILENAME.to_string());
            DataPayload::from_base64(&raw, filename)?
        }
        InputMode::Unsupported(mode) => return Err(InputError::UnsupportedMode(mode.clone())),
    };

    if data.is_empty() {
        return Err(InputError::MissingData(input.tag.clone()));
    }
    Ok((labels, data))
}

/// A body over the configured limit is not malformed, just too big.
fn rejected(status: StatusCode, text: String) -> InputError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        InputError::TooLarge(text)
    } else {
        InputError::Malformed(text)
    }
}

async fn file_field(tag: &str, req: Request) -> Result<DataPayload, InputError> {
    // A body that is not multipart simply carries no files.
    let mut multipart = Multipart::from_request(req, &())
        .await
        .map_err(|_| InputError::MissingData(tag.to_string()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| rejected(e.status(), e.body_text()))?
    {
        if field.name() != Some(tag) {
            continue;
        }
        // Parts without a filename are plain form values, not uploads.
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| rejected(e.status(), e.body_text()))?;

        let mut file = FilePayload::new(filename, bytes);
        file.content_type = content_type;
        return Ok(DataPayload::File(file));
    }
    Err(InputError::MissingData(tag.to_string()))
}
