//! Validated request models for the three rebuild entry points.
//!
//! Each constructor either returns a usable model or the full field error map;
//! a model is never built with errors attached.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde_json::{Map, Value};

use rebuild_core::policy::ContentManagementPolicy;

pub use rebuild_core::policy::FieldErrors;

use crate::transfer::FormPart;

pub const NOT_SUPPLIED: &str = "Not Supplied";
pub const INVALID_JSON_BODY: &str = "The request was not a valid JSON.";
pub const INVALID_FORM: &str = "Could not read the supplied form.";
pub const EMPTY_FILE: &str = "File does not have any data";
pub const INVALID_FLAGS_JSON: &str = "The JSON supplied was invalid";

/// Request body key (and form field, lower-cased) carrying the policy.
pub const FLAGS_KEY: &str = "ContentManagementFlags";
pub const FILE_FIELD: &str = "file";
pub const FLAGS_FIELD: &str = "contentmanagementflags";

fn field_error(field: &str, message: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.insert(field.to_string(), message.to_string());
    errors
}

/// Parse a JSON request body into an object.
///
/// Absent, blank or `null` bodies are "Not Supplied". Any other non-object
/// value has no fields.
fn parse_body(body: Option<&[u8]>) -> Result<Map<String, Value>, FieldErrors> {
    let raw = match body {
        Some(raw) if !raw.iter().all(u8::is_ascii_whitespace) => raw,
        _ => return Err(field_error("Body", NOT_SUPPLIED)),
    };

    match serde_json::from_slice::<Value>(raw) {
        Ok(Value::Null) => Err(field_error("Body", NOT_SUPPLIED)),
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Ok(Map::new()),
        Err(_) => Err(field_error("Body", INVALID_JSON_BODY)),
    }
}

fn required_str(payload: &Map<String, Value>, key: &str, errors: &mut FieldErrors) -> String {
    match payload.get(key).and_then(Value::as_str) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => {
            errors.insert(key.to_string(), NOT_SUPPLIED.to_string());
            String::new()
        }
    }
}

fn load_policy(candidate: Option<&Value>) -> Result<ContentManagementPolicy, FieldErrors> {
    ContentManagementPolicy::load_from_untrusted(candidate.unwrap_or(&Value::Null))
}

/// `POST /api/v1/rebuild/url`.
#[derive(Debug, Clone)]
pub struct UrlRequest {
    pub input_get_url: String,
    pub output_put_url: String,
    /// Extra headers sent with the upload.
    pub output_put_url_request_headers: BTreeMap<String, String>,
    pub policy: ContentManagementPolicy,
}

impl UrlRequest {
    pub fn parse(body: Option<&[u8]>) -> Result<Self, FieldErrors> {
        let payload = parse_body(body)?;

        let mut errors = FieldErrors::new();
        let input_get_url = required_str(&payload, "InputGetUrl", &mut errors);
        let output_put_url = required_str(&payload, "OutputPutUrl", &mut errors);
        if !errors.is_empty() {
            return Err(errors);
        }

        let output_put_url_request_headers = payload
            .get("OutputPutUrlRequestHeaders")
            .and_then(Value::as_object)
            .map(|headers| {
                headers
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            input_get_url,
            output_put_url,
            output_put_url_request_headers,
            policy: load_policy(payload.get(FLAGS_KEY))?,
        })
    }
}

/// `POST /api/v1/rebuild/base64`.
#[derive(Debug, Clone)]
pub struct Base64Request {
    /// Base64 text as supplied; decoded by the workflow.
    pub base64: String,
    pub policy: ContentManagementPolicy,
}

impl Base64Request {
    pub fn parse(body: Option<&[u8]>) -> Result<Self, FieldErrors> {
        let payload = parse_body(body)?;

        let mut errors = FieldErrors::new();
        let base64 = required_str(&payload, "Base64", &mut errors);

        match load_policy(payload.get(FLAGS_KEY)) {
            Ok(policy) if errors.is_empty() => Ok(Self { base64, policy }),
            Ok(_) => Err(errors),
            Err(policy_errors) => {
                errors.extend(policy_errors);
                Err(errors)
            }
        }
    }
}

/// `POST /api/v1/rebuild/file`.
#[derive(Debug, Clone)]
pub struct FormFileRequest {
    pub file: Bytes,
    pub file_name: Option<String>,
    pub policy: ContentManagementPolicy,
}

impl FormFileRequest {
    /// Build from parsed form parts; `None` means the form could not be read.
    pub fn from_parts(parts: Option<Vec<FormPart>>) -> Result<Self, FieldErrors> {
        let parts = parts.ok_or_else(|| field_error("Form", INVALID_FORM))?;

        let file = parts
            .iter()
            .find(|p| p.field_name == FILE_FIELD)
            .ok_or_else(|| field_error("File", NOT_SUPPLIED))?;
        if file.data.is_empty() {
            return Err(field_error("File", EMPTY_FILE));
        }

        let flags = match parts.iter().find(|p| p.field_name == FLAGS_FIELD) {
            None => Value::Null,
            Some(part) => serde_json::from_slice(&part.data)
                .map_err(|_| field_error(FLAGS_KEY, INVALID_FLAGS_JSON))?,
        };

        Ok(Self {
            file: file.data.clone(),
            file_name: file.file_name.clone(),
            policy: ContentManagementPolicy::load_from_untrusted(&flags)?,
        })
    }
}
